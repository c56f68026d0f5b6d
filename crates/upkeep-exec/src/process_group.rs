//! Process-group ownership for task processes.
//!
//! Every task is spawned as the leader of a fresh process group so that
//! killing the task also kills whatever it forked. The group is killed when
//! the guard is dropped, so nothing a task started outlives its attempt.

use tokio::process::Command;

/// Put the command's child into a new process group.
#[cfg(unix)]
pub(crate) fn isolate(cmd: &mut Command) {
    cmd.process_group(0);
}

#[cfg(not(unix))]
pub(crate) fn isolate(_cmd: &mut Command) {}

/// Kills the task's process group on demand and on drop.
pub(crate) struct ProcessGroup {
    pgid: Option<i32>,
}

impl ProcessGroup {
    /// Track the group led by the child with `pid`.
    pub(crate) fn new(pid: Option<u32>) -> Self {
        Self {
            pgid: pid.and_then(|pid| i32::try_from(pid).ok()),
        }
    }

    /// SIGKILL every process in the group. An already empty group is fine.
    #[cfg(unix)]
    pub(crate) fn kill(&self) {
        let Some(pgid) = self.pgid else {
            return;
        };
        let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::ESRCH) {
                tracing::warn!(pgid, error = %err, "Failed to kill task process group");
            }
        }
    }

    #[cfg(not(unix))]
    pub(crate) fn kill(&self) {
        let _ = self.pgid;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}
