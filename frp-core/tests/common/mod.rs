//! Shared helpers for the supervisor integration tests
//!
//! Fake frpc executables are small shell scripts. They are started as
//! `<script> -c <config>` just like the real client.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Write an executable shell script named `name` into `dir`
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod script");
    path
}

/// Fake frpc that ignores SIGTERM and SIGINT and keeps a grandchild alive
///
/// Writes the grandchild pid to `pid_file` once the traps are in place.
pub fn stubborn_frpc(dir: &Path, pid_file: &Path) -> PathBuf {
    let body = format!(
        "trap '' TERM INT\nsleep 30 &\necho $! > '{tmp}'\nmv '{tmp}' '{out}'\nwait",
        tmp = pid_file.with_extension("tmp").display(),
        out = pid_file.display(),
    );
    write_script(dir, "stubborn-frpc", &body)
}

/// Fake frpc that dies on SIGTERM but leaves a grandchild behind
///
/// Writes the grandchild pid to `pid_file`.
pub fn forking_frpc(dir: &Path, pid_file: &Path) -> PathBuf {
    let body = format!(
        "sleep 30 &\necho $! > '{tmp}'\nmv '{tmp}' '{out}'\nwait",
        tmp = pid_file.with_extension("tmp").display(),
        out = pid_file.display(),
    );
    write_script(dir, "forking-frpc", &body)
}

/// Fake frpc that exits promptly on SIGTERM
///
/// Writes its own pid to `pid_file` before turning into `sleep`.
pub fn cooperative_frpc(dir: &Path, pid_file: &Path) -> PathBuf {
    let body = format!(
        "echo $$ > '{tmp}'\nmv '{tmp}' '{out}'\nexec sleep 30",
        tmp = pid_file.with_extension("tmp").display(),
        out = pid_file.display(),
    );
    write_script(dir, "cooperative-frpc", &body)
}

/// Fake frpc that copies its config to `copy_to` and exits with `code`
pub fn copying_frpc(dir: &Path, copy_to: &Path, code: i32) -> PathBuf {
    let body = format!("cp \"$2\" '{}'\nexit {}", copy_to.display(), code);
    write_script(dir, "copying-frpc", &body)
}

/// Poll until `pid_file` holds a pid
pub async fn wait_for_pid(pid_file: &Path) -> i32 {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Ok(contents) = std::fs::read_to_string(pid_file) {
            if let Ok(pid) = contents.trim().parse() {
                return pid;
            }
        }
        assert!(
            Instant::now() < deadline,
            "fake frpc never wrote {:?}",
            pid_file
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Whether `pid` no longer runs
///
/// Zombies count as gone since nothing in the test reaps reparented
/// grandchildren.
pub fn process_gone(pid: i32) -> bool {
    #[cfg(target_os = "linux")]
    {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Err(_) => true,
            Ok(stat) => stat
                .rsplit_once(')')
                .map(|(_, rest)| rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
        }
    }

    #[cfg(not(target_os = "linux"))]
    {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        kill(Pid::from_raw(pid), None).is_err()
    }
}

/// Poll until `pid` is gone, giving SIGKILL delivery a moment
pub async fn wait_until_gone(pid: i32) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if process_gone(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    process_gone(pid)
}

/// Transient frpc configs left behind in `dir`
pub fn leftover_configs(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .expect("read temp dir")
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().starts_with("frpc-"))
                .unwrap_or(false)
        })
        .collect()
}
