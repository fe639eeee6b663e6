//! frpc supervision
//!
//! Materializes the client config into a transient file, runs frpc against
//! it, forwards interrupts as a bounded graceful shutdown, and always removes
//! the transient file and the child process before returning.

pub mod controller;
pub mod materializer;
pub mod process;
pub mod signals;
pub mod state;
pub mod supervisor;

// Public re-exports
pub use controller::{
    ChildProcessController, ChildProcessHandle, ExitOutcome, Liveness, TerminationOutcome,
    DEFAULT_GRACE_PERIOD,
};
pub use materializer::{ConfigMaterializer, ConfigSource, EphemeralConfig};
pub use signals::{InterceptedSignal, SignalInterceptor, TerminationRequest};
pub use state::{StateTracker, SupervisorState};
pub use supervisor::{RunOutcome, RunReport, Supervisor};
