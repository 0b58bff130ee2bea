//! Process control operations.

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerminateError {
    #[error("invalid pid {0}")]
    InvalidPid(i64),
    #[error("no such process: {0}")]
    NoSuchProcess(i32),
    #[error("permission denied signalling pid {0}")]
    PermissionDenied(i32),
    #[error("failed to signal pid {pid}: {errno}")]
    Signal { pid: i32, errno: Errno },
}

impl TerminateError {
    /// Client errors map to 400; everything else keeps the blanket 500.
    pub fn is_client_error(&self) -> bool {
        matches!(self, TerminateError::InvalidPid(_))
    }
}

/// Send SIGTERM, giving the process a chance to shut down cleanly.
/// Non-positive pids are rejected up front: pid 0 would signal our own
/// process group and negative pids address whole groups.
pub fn terminate(pid: i64) -> Result<(), TerminateError> {
    let pid = i32::try_from(pid)
        .ok()
        .filter(|p| *p > 0)
        .ok_or(TerminateError::InvalidPid(pid))?;

    signal::kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(|errno| match errno {
        Errno::ESRCH => TerminateError::NoSuchProcess(pid),
        Errno::EPERM => TerminateError::PermissionDenied(pid),
        errno => TerminateError::Signal { pid, errno },
    })
}
