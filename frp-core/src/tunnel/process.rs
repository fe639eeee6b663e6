//! Platform process control
//!
//! Graceful termination requests and process tree kills. On Unix frpc is
//! started as the leader of its own process group, so the group id equals
//! its pid and the whole tree can be signalled at once.

use tracing::{debug, warn};

/// Error types for process operations
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to signal process {pid}: {reason}")]
    SignalFailed { pid: u32, reason: String },

    #[error("Failed to terminate process tree {pid}: {reason}")]
    TerminationFailed { pid: u32, reason: String },
}

/// Check whether a process with this pid exists
///
/// Zombies still count as existing until they are reaped.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Ask a process to shut down on its own (SIGTERM)
///
/// A process that is already gone is not an error.
#[cfg(unix)]
pub fn request_graceful_exit(pid: u32) -> Result<(), ProcessError> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) => {
            debug!("Sent SIGTERM to process {}", pid);
            Ok(())
        }
        Err(Errno::ESRCH) => {
            debug!("Process {} already exited before SIGTERM", pid);
            Ok(())
        }
        Err(e) => Err(ProcessError::SignalFailed {
            pid,
            reason: e.to_string(),
        }),
    }
}

/// Forcefully kill a process and all of its descendants
///
/// Sends SIGKILL to the process group led by `pid`, then to `pid` itself in
/// case it left the group.
#[cfg(unix)]
pub fn kill_process_tree(pid: u32) -> Result<(), ProcessError> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, killpg, Signal};
    use nix::unistd::Pid;

    let target = Pid::from_raw(pid as i32);

    match killpg(target, Signal::SIGKILL) {
        Ok(()) => debug!("Sent SIGKILL to process group {}", pid),
        Err(Errno::ESRCH) => debug!("Process group {} already gone", pid),
        Err(e) => warn!("Failed to SIGKILL process group {}: {}", pid, e),
    }

    match kill(target, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(ProcessError::TerminationFailed {
            pid,
            reason: e.to_string(),
        }),
    }
}

/// Kill whatever is left in the process group led by `pid`
///
/// Used after the leader exited on its own; descendants that did not follow
/// it would otherwise outlive the run. An empty group is fine.
#[cfg(unix)]
pub fn sweep_process_group(pid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) => debug!("Swept leftover members of process group {}", pid),
        Err(Errno::ESRCH) => {}
        Err(e) => warn!("Failed to sweep process group {}: {}", pid, e),
    }
}

#[cfg(not(unix))]
pub fn is_process_alive(pid: u32) -> bool {
    use std::process::Command;

    Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH"])
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).contains(&pid.to_string()))
        .unwrap_or(false)
}

/// Console programs on Windows have no catchable stop signal
#[cfg(not(unix))]
pub fn request_graceful_exit(pid: u32) -> Result<(), ProcessError> {
    debug!("No graceful stop signal on Windows for process {}", pid);
    Ok(())
}

#[cfg(not(unix))]
pub fn sweep_process_group(pid: u32) {
    debug!("No process group to sweep for {} on Windows", pid);
}

#[cfg(not(unix))]
pub fn kill_process_tree(pid: u32) -> Result<(), ProcessError> {
    use std::process::Command;

    let output = Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid.to_string()])
        .output()
        .map_err(|e| ProcessError::TerminationFailed {
            pid,
            reason: format!("Failed to run taskkill: {}", e),
        })?;

    if output.status.success() {
        debug!("taskkill terminated process tree {}", pid);
        Ok(())
    } else {
        Err(ProcessError::TerminationFailed {
            pid,
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
