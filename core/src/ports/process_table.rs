//! Process table port (interface).

use crate::error::Result;

/// One row of the OS process table: a PID and its full command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub command_line: String,
}

impl ProcessEntry {
    pub fn new(pid: u32, command_line: impl Into<String>) -> Self {
        Self {
            pid,
            command_line: command_line.into(),
        }
    }
}

/// Port for enumerating and terminating forwarding processes.
pub trait ProcessTablePort: Send + Sync {
    /// Processes whose command line looks like a port-forward. Rows may still
    /// be unrelated; callers parse each command line.
    fn forward_processes(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ProcessEntry>>> + Send;

    /// Kill a process. `Ok(false)` when it was already gone.
    fn terminate(&self, pid: u32) -> impl std::future::Future<Output = Result<bool>> + Send;
}
