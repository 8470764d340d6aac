//! Platform-specific enumeration and termination of forwarding processes.

mod listing;

#[cfg(unix)]
mod posix;

#[cfg(windows)]
mod windows;

use crate::error::Result;
use crate::ports::{ProcessEntry, ProcessTablePort};

/// The process table of the current platform.
pub struct ProcessTable {
    #[cfg(unix)]
    inner: posix::PosixProcessTable,

    #[cfg(windows)]
    inner: windows::WindowsProcessTable,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            inner: posix::PosixProcessTable,

            #[cfg(windows)]
            inner: windows::WindowsProcessTable,
        }
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTablePort for ProcessTable {
    async fn forward_processes(&self) -> Result<Vec<ProcessEntry>> {
        self.inner.forward_processes().await
    }

    async fn terminate(&self, pid: u32) -> Result<bool> {
        self.inner.terminate(pid).await
    }
}
