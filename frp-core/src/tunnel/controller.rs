//! frpc child process lifecycle
//!
//! Spawns frpc as `<executable> -c <config-path>`, waits for it, and stops
//! it with a bounded graceful shutdown that escalates to a process tree kill.

use crate::error::SupervisorError;
use crate::tunnel::process;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

/// How long frpc gets to exit after a graceful stop request
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// How long to wait for the kernel to reap a killed process
const KILL_REAP_TIMEOUT: Duration = Duration::from_millis(500);

/// Liveness of a spawned process as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Running,
    Terminating,
    Exited,
}

/// Handle to a spawned frpc process
#[derive(Debug)]
pub struct ChildProcessHandle {
    child: Child,
    pid: Option<u32>,
    executable: PathBuf,
    liveness: Liveness,
    exit_status: Option<ExitStatus>,
}

impl ChildProcessHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    pub fn is_alive(&self) -> bool {
        self.liveness != Liveness::Exited
    }

    fn mark_exited(&mut self, status: Option<ExitStatus>) {
        self.liveness = Liveness::Exited;
        if status.is_some() {
            self.exit_status = status;
        }
    }

    /// Pick up an exit that happened without us waiting on it
    fn poll_exit(&mut self) -> bool {
        if self.liveness == Liveness::Exited {
            return true;
        }

        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.mark_exited(Some(status));
                true
            }
            Ok(None) => false,
            Err(e) => {
                debug!("Process {:?} can no longer be polled: {}", self.pid, e);
                self.mark_exited(None);
                true
            }
        }
    }
}

/// Result of waiting for frpc
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// frpc exited while we waited
    Exited(ExitStatus),
    /// frpc was already gone; the status is known if we reaped it earlier
    AlreadyExited(Option<ExitStatus>),
}

impl ExitOutcome {
    pub fn status(&self) -> Option<ExitStatus> {
        match self {
            ExitOutcome::Exited(status) => Some(*status),
            ExitOutcome::AlreadyExited(status) => *status,
        }
    }
}

/// Result of a termination request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// frpc exited within the grace period
    Graceful(ExitStatus),
    /// The grace period ran out and the process tree was killed
    Killed(Option<ExitStatus>),
    /// Nothing to do, frpc had already exited
    AlreadyExited,
}

impl std::fmt::Display for TerminationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationOutcome::Graceful(_) => write!(f, "stopped gracefully"),
            TerminationOutcome::Killed(_) => write!(f, "killed after grace period"),
            TerminationOutcome::AlreadyExited => write!(f, "already exited"),
        }
    }
}

/// Spawns and stops frpc processes
#[derive(Debug, Clone)]
pub struct ChildProcessController {
    grace_period: Duration,
}

impl ChildProcessController {
    pub fn new(grace_period: Duration) -> Self {
        Self { grace_period }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Resolve `executable` to an existing executable file
    ///
    /// Bare names are looked up on PATH.
    pub fn resolve_executable(executable: &Path) -> Result<PathBuf, SupervisorError> {
        let not_found = || SupervisorError::ExecutableNotFound {
            path: executable.to_path_buf(),
        };

        let resolved = which::which(executable).map_err(|e| {
            debug!("Could not resolve {:?}: {}", executable, e);
            not_found()
        })?;

        if !resolved.is_file() {
            return Err(not_found());
        }

        Ok(resolved)
    }

    /// Start frpc against `config_path`
    pub fn spawn(
        &self,
        executable: &Path,
        config_path: &Path,
    ) -> Result<ChildProcessHandle, SupervisorError> {
        let resolved = Self::resolve_executable(executable)?;

        let mut std_cmd = std::process::Command::new(&resolved);
        std_cmd.arg("-c").arg(config_path).stdin(Stdio::null());

        // Own process group, so the tree can be killed and a terminal Ctrl-C
        // reaches only the supervisor
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }

        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| SupervisorError::Spawn {
            path: resolved.clone(),
            source: e,
        })?;

        let pid = child.id();
        info!("Spawned {:?} with PID {:?}", resolved, pid);

        Ok(ChildProcessHandle {
            child,
            pid,
            executable: resolved,
            liveness: Liveness::Running,
            exit_status: None,
        })
    }

    /// Block until frpc exits on its own
    ///
    /// Cancel safe, so it can race a termination request.
    pub async fn wait(&self, handle: &mut ChildProcessHandle) -> ExitOutcome {
        if handle.liveness == Liveness::Exited {
            return ExitOutcome::AlreadyExited(handle.exit_status);
        }

        match handle.child.wait().await {
            Ok(status) => {
                info!("frpc (PID {:?}) exited with {}", handle.pid, status);
                handle.mark_exited(Some(status));
                ExitOutcome::Exited(status)
            }
            Err(e) => {
                debug!("Waiting on PID {:?} failed: {}", handle.pid, e);
                handle.mark_exited(None);
                ExitOutcome::AlreadyExited(None)
            }
        }
    }

    /// Stop frpc: graceful request, bounded wait, then process tree kill
    ///
    /// Idempotent; returns `AlreadyExited` once the process is gone.
    pub async fn terminate(&self, handle: &mut ChildProcessHandle) -> TerminationOutcome {
        if handle.poll_exit() {
            debug!("frpc (PID {:?}) already exited, nothing to stop", handle.pid);
            return TerminationOutcome::AlreadyExited;
        }

        let Some(pid) = handle.pid else {
            handle.mark_exited(None);
            return TerminationOutcome::AlreadyExited;
        };

        handle.liveness = Liveness::Terminating;
        info!("Stopping frpc (PID {})", pid);

        if let Err(e) = process::request_graceful_exit(pid) {
            warn!("{}", e);
        }

        // No stop signal to send on Windows; end the direct child instead
        #[cfg(not(unix))]
        {
            if let Err(e) = handle.child.start_kill() {
                debug!("Failed to stop PID {}: {}", pid, e);
            }
        }

        match tokio::time::timeout(self.grace_period, handle.child.wait()).await {
            Ok(Ok(status)) => {
                info!("frpc (PID {}) stopped gracefully with {}", pid, status);
                process::sweep_process_group(pid);
                handle.mark_exited(Some(status));
                TerminationOutcome::Graceful(status)
            }
            Ok(Err(e)) => {
                debug!("Waiting on PID {} failed: {}", pid, e);
                handle.mark_exited(None);
                TerminationOutcome::AlreadyExited
            }
            Err(_) => {
                warn!(
                    "frpc (PID {}) still running after {:?}, killing process tree",
                    pid, self.grace_period
                );
                self.force_kill(handle, pid).await
            }
        }
    }

    async fn force_kill(&self, handle: &mut ChildProcessHandle, pid: u32) -> TerminationOutcome {
        if let Err(e) = process::kill_process_tree(pid) {
            error!("{}", e);
            if let Err(e) = handle.child.start_kill() {
                debug!("Direct kill of PID {} failed: {}", pid, e);
            }
        }

        let status = match tokio::time::timeout(KILL_REAP_TIMEOUT, handle.child.wait()).await {
            Ok(Ok(status)) => Some(status),
            Ok(Err(e)) => {
                debug!("Waiting on killed PID {} failed: {}", pid, e);
                None
            }
            Err(_) => {
                warn!("Killed PID {} was not reaped within {:?}", pid, KILL_REAP_TIMEOUT);
                None
            }
        };

        handle.mark_exited(status);
        TerminationOutcome::Killed(status)
    }
}

impl Default for ChildProcessController {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}
