//! Interrupt and terminate signal interception
//!
//! A [`SignalInterceptor`] belongs to one supervisor run. SIGINT (Ctrl-C) and
//! SIGTERM are treated alike: the first one flips an atomic flag and fires
//! the run's callback with a [`TerminationRequest`]; later ones are absorbed.
//!
//! On Unix the OS-level handler only bumps per-signal counters and a listener
//! task polls them. The handler stays installed while any interceptor is
//! armed; the last `disarm` puts back the dispositions that were in place
//! before, so a later Ctrl-C behaves as it would without us. On Windows only
//! Ctrl-C is observed, through tokio.

use crate::error::SupervisorError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Signal class that triggered a termination request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptedSignal {
    /// SIGINT / Ctrl-C
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl std::fmt::Display for InterceptedSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterceptedSignal::Interrupt => write!(f, "interrupt"),
            InterceptedSignal::Terminate => write!(f, "terminate"),
        }
    }
}

/// "Stop now", raised at most once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationRequest {
    pub signal: InterceptedSignal,
}

type Callback = Box<dyn FnOnce(TerminationRequest) + Send + 'static>;

struct Shared {
    fired: AtomicBool,
    on_signal: Mutex<Option<Callback>>,
}

impl Shared {
    /// One-shot transition; only the first caller runs the callback
    fn fire(&self, signal: InterceptedSignal) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Termination already in progress, ignoring {}", signal);
            return false;
        }

        info!("Received {} signal, requesting termination", signal);
        let callback = self
            .on_signal
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if let Some(callback) = callback {
            callback(TerminationRequest { signal });
        }
        true
    }
}

/// Routes interrupt and terminate signals to a one-shot callback
pub struct SignalInterceptor {
    shared: Arc<Shared>,
    listener: Option<JoinHandle<()>>,
    handler: Option<os::HandlerGuard>,
}

impl SignalInterceptor {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                fired: AtomicBool::new(false),
                on_signal: Mutex::new(None),
            }),
            listener: None,
            handler: None,
        }
    }

    /// Install the signal handler and register `on_signal`
    ///
    /// Must be called from within a Tokio runtime. Signals delivered from
    /// this call on are reported, even before the listener task first runs.
    /// Arming again replaces the previous listener and callback.
    pub fn arm<F>(&mut self, on_signal: F) -> Result<(), SupervisorError>
    where
        F: FnOnce(TerminationRequest) + Send + 'static,
    {
        self.disarm();

        // Snapshot before installing so nothing delivered in between is lost
        let mut signals = os::SignalStream::listen().map_err(SupervisorError::Signal)?;
        let handler = os::HandlerGuard::install().map_err(SupervisorError::Signal)?;

        *self
            .shared
            .on_signal
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Box::new(on_signal));

        let shared = Arc::clone(&self.shared);
        self.listener = Some(tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                shared.fire(signal);
            }
        }));
        self.handler = Some(handler);

        debug!("Signal interceptor armed");
        Ok(())
    }

    /// Stop listening, drop the callback and restore default signal behaviour
    pub fn disarm(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }

        // The last guard to go puts the previous dispositions back
        if self.handler.take().is_some() {
            debug!("Signal interceptor disarmed");
        }

        self.shared
            .on_signal
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }

    /// Raise a termination request without an OS signal
    ///
    /// Returns false when a request was already raised.
    #[cfg(test)]
    fn request_termination(&self, signal: InterceptedSignal) -> bool {
        self.shared.fire(signal)
    }

    #[cfg(test)]
    fn is_armed(&self) -> bool {
        self.listener.is_some() && self.handler.is_some()
    }

    #[cfg(test)]
    fn has_fired(&self) -> bool {
        self.shared.fired.load(Ordering::SeqCst)
    }
}

impl Default for SignalInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SignalInterceptor {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(unix)]
mod os {
    use super::InterceptedSignal;
    use nix::errno::Errno;
    use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
    use std::os::raw::c_int;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tracing::{debug, warn};

    /// How often listeners look at the counters
    const POLL_INTERVAL: Duration = Duration::from_millis(20);

    static INTERRUPTS: AtomicUsize = AtomicUsize::new(0);
    static TERMINATES: AtomicUsize = AtomicUsize::new(0);

    struct Installed {
        armed: usize,
        /// SIGINT and SIGTERM actions found when the handler went in
        previous: Option<[SigAction; 2]>,
    }

    static INSTALLED: Mutex<Installed> = Mutex::new(Installed {
        armed: 0,
        previous: None,
    });

    /// Runs in signal context: atomics only
    extern "C" fn record(signal: c_int) {
        if signal == Signal::SIGINT as c_int {
            INTERRUPTS.fetch_add(1, Ordering::SeqCst);
        } else if signal == Signal::SIGTERM as c_int {
            TERMINATES.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn to_io(errno: Errno) -> std::io::Error {
        std::io::Error::from_raw_os_error(errno as i32)
    }

    /// Keeps the recording handler installed while alive
    pub(super) struct HandlerGuard {
        _private: (),
    }

    impl HandlerGuard {
        pub(super) fn install() -> std::io::Result<Self> {
            let mut installed = INSTALLED
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            if installed.armed == 0 {
                let action = SigAction::new(
                    SigHandler::Handler(record),
                    SaFlags::SA_RESTART,
                    SigSet::empty(),
                );

                // SAFETY: `record` is async-signal-safe
                let interrupt = unsafe { sigaction(Signal::SIGINT, &action) }.map_err(to_io)?;
                let terminate = match unsafe { sigaction(Signal::SIGTERM, &action) } {
                    Ok(previous) => previous,
                    Err(e) => {
                        // SAFETY: reinstates the action we just replaced
                        let _ = unsafe { sigaction(Signal::SIGINT, &interrupt) };
                        return Err(to_io(e));
                    }
                };

                installed.previous = Some([interrupt, terminate]);
                debug!("Installed SIGINT/SIGTERM handler");
            }

            installed.armed += 1;
            Ok(Self { _private: () })
        }
    }

    impl Drop for HandlerGuard {
        fn drop(&mut self) {
            let mut installed = INSTALLED
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            installed.armed = installed.armed.saturating_sub(1);
            if installed.armed > 0 {
                return;
            }

            if let Some([interrupt, terminate]) = installed.previous.take() {
                for (signal, previous) in [(Signal::SIGINT, interrupt), (Signal::SIGTERM, terminate)]
                {
                    // SAFETY: restores the action found at install time
                    if let Err(e) = unsafe { sigaction(signal, &previous) } {
                        warn!("Failed to restore {:?} disposition: {}", signal, e);
                    }
                }
                debug!("Restored previous SIGINT/SIGTERM dispositions");
            }
        }
    }

    /// Delivery counts as last seen by one listener
    pub(super) struct SignalStream {
        interrupts: usize,
        terminates: usize,
    }

    impl SignalStream {
        /// Only signals delivered after this call are reported
        pub(super) fn listen() -> std::io::Result<Self> {
            Ok(Self {
                interrupts: INTERRUPTS.load(Ordering::SeqCst),
                terminates: TERMINATES.load(Ordering::SeqCst),
            })
        }

        pub(super) async fn recv(&mut self) -> Option<InterceptedSignal> {
            loop {
                if let Some(signal) = self.poll() {
                    return Some(signal);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }

        fn poll(&mut self) -> Option<InterceptedSignal> {
            let interrupts = INTERRUPTS.load(Ordering::SeqCst);
            if interrupts != self.interrupts {
                self.interrupts = interrupts;
                return Some(InterceptedSignal::Interrupt);
            }

            let terminates = TERMINATES.load(Ordering::SeqCst);
            if terminates != self.terminates {
                self.terminates = terminates;
                return Some(InterceptedSignal::Terminate);
            }

            None
        }
    }
}

#[cfg(not(unix))]
mod os {
    use super::InterceptedSignal;

    /// tokio owns the console handler on Windows
    pub(super) struct HandlerGuard;

    impl HandlerGuard {
        pub(super) fn install() -> std::io::Result<Self> {
            Ok(Self)
        }
    }

    pub(super) struct SignalStream {
        ctrl_c: tokio::signal::windows::CtrlC,
    }

    impl SignalStream {
        pub(super) fn listen() -> std::io::Result<Self> {
            Ok(Self {
                ctrl_c: tokio::signal::windows::ctrl_c()?,
            })
        }

        pub(super) async fn recv(&mut self) -> Option<InterceptedSignal> {
            self.ctrl_c
                .recv()
                .await
                .map(|_| InterceptedSignal::Interrupt)
        }
    }
}
