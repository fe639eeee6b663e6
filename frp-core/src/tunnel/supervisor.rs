//! frpc run orchestration
//!
//! One [`Supervisor::run`] materializes the config, arms signal handling,
//! spawns frpc and waits. Whatever happens after the config file exists, the
//! run ends by stopping frpc, disarming signals and deleting the file.

use crate::error::SupervisorError;
use crate::tunnel::controller::{ChildProcessController, ChildProcessHandle, TerminationOutcome};
use crate::tunnel::materializer::{ConfigMaterializer, ConfigSource, EphemeralConfig};
use crate::tunnel::signals::{SignalInterceptor, TerminationRequest};
use crate::tunnel::state::{StateTracker, SupervisorState};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// How a supervised run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// frpc exited on its own
    ChildExited { status: Option<ExitStatus> },
    /// A signal asked us to stop and frpc was terminated
    Interrupted {
        request: TerminationRequest,
        termination: TerminationOutcome,
    },
}

impl RunOutcome {
    /// Exit code for the supervisor process
    ///
    /// Interrupts are a normal way to end a tunnel and map to 0; otherwise
    /// frpc's own exit code is passed through.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::ChildExited { status: Some(status) } => status.code().unwrap_or(1),
            RunOutcome::ChildExited { status: None } => 0,
            RunOutcome::Interrupted { .. } => 0,
        }
    }

    pub fn was_interrupted(&self) -> bool {
        matches!(self, RunOutcome::Interrupted { .. })
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Transient config used for the run (already deleted)
    pub config_path: PathBuf,
    pub pid: Option<u32>,
}

enum Wakeup {
    ChildExited(Option<ExitStatus>),
    TerminationRequested(TerminationRequest),
}

/// Runs frpc against a transient config and guarantees cleanup
pub struct Supervisor {
    executable: PathBuf,
    controller: ChildProcessController,
    materializer: ConfigMaterializer,
    state: StateTracker,
}

impl Supervisor {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            controller: ChildProcessController::default(),
            materializer: ConfigMaterializer::new(),
            state: StateTracker::new(),
        }
    }

    /// Override the graceful shutdown window
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.controller = ChildProcessController::new(grace_period);
        self
    }

    /// Write transient configs into `dir` instead of the system temp dir
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.materializer = ConfigMaterializer::in_dir(dir);
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn state(&self) -> SupervisorState {
        self.state.current()
    }

    /// States visited by the latest run
    pub fn history(&self) -> &[SupervisorState] {
        self.state.history()
    }

    /// Supervise one frpc run until it exits or a signal stops it
    pub async fn run(&mut self, source: ConfigSource) -> Result<RunReport, SupervisorError> {
        self.state.begin()?;
        self.state.transition(SupervisorState::Materializing)?;

        let config = match self.materializer.materialize_source(&source) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to prepare frpc config: {}", e);
                self.abort()?;
                return Err(e);
            }
        };

        let config_path = config.path().to_path_buf();
        let result = self.supervise(&config).await;

        // Cleanup runs on every path once the file exists
        let removed = config.remove();
        self.state.transition(SupervisorState::Cleaned)?;

        let (outcome, pid) = result?;
        if let Err(e) = removed {
            error!("Failed to remove transient config: {}", e);
            return Err(e);
        }

        info!("frpc run finished: {:?}", outcome);
        Ok(RunReport {
            outcome,
            config_path,
            pid,
        })
    }

    async fn supervise(
        &mut self,
        config: &EphemeralConfig,
    ) -> Result<(RunOutcome, Option<u32>), SupervisorError> {
        // Armed before frpc exists so no signal can orphan it
        let (request_tx, request_rx) = oneshot::channel();
        let mut interceptor = SignalInterceptor::new();
        let armed = interceptor.arm(move |request| {
            // Receiver gone means the run already finished
            let _ = request_tx.send(request);
        });

        if let Err(e) = armed {
            error!("{}", e);
            self.state.transition(SupervisorState::Aborted)?;
            return Err(e);
        }

        let mut handle = match self.controller.spawn(&self.executable, config.path()) {
            Ok(handle) => handle,
            Err(e) => {
                error!("{}", e);
                self.state.transition(SupervisorState::Aborted)?;
                return Err(e);
            }
        };
        self.state.transition(SupervisorState::Spawned)?;
        let pid = handle.pid();
        debug!("Supervising {} (pid {:?})", handle.executable().display(), pid);

        self.state.transition(SupervisorState::Running)?;

        let outcome = self.wait_or_terminate(&mut handle, request_rx).await;
        interceptor.disarm();

        Ok((outcome?, pid))
    }

    async fn wait_or_terminate(
        &mut self,
        handle: &mut ChildProcessHandle,
        request_rx: oneshot::Receiver<TerminationRequest>,
    ) -> Result<RunOutcome, SupervisorError> {
        let wakeup = tokio::select! {
            exit = self.controller.wait(handle) => Wakeup::ChildExited(exit.status()),
            Ok(request) = request_rx => Wakeup::TerminationRequested(request),
        };

        match wakeup {
            Wakeup::ChildExited(status) => Ok(RunOutcome::ChildExited { status }),
            Wakeup::TerminationRequested(request) => {
                self.state.transition(SupervisorState::Terminating)?;
                let termination = self.controller.terminate(handle).await;
                if matches!(termination, TerminationOutcome::Killed(_)) {
                    warn!("frpc had to be killed after {:?}", self.controller.grace_period());
                }
                Ok(RunOutcome::Interrupted {
                    request,
                    termination,
                })
            }
        }
    }

    fn abort(&mut self) -> Result<(), SupervisorError> {
        self.state.transition(SupervisorState::Aborted)?;
        self.state.transition(SupervisorState::Cleaned)
    }
}
