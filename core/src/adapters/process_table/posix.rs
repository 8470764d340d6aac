//! POSIX process table using `ps` and `kill(2)`.

use std::process::Stdio;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ports::{ProcessEntry, ProcessTablePort};

use super::listing::parse_ps_output;

pub struct PosixProcessTable;

impl ProcessTablePort for PosixProcessTable {
    async fn forward_processes(&self) -> Result<Vec<ProcessEntry>> {
        // `ww` keeps long command lines from being cut at the terminal width.
        let output = Command::new("ps")
            .args(["-axww", "-o", "pid=,command="])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run ps: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let entries = parse_ps_output(&stdout);
        debug!(count = entries.len(), "Scanned process table");
        Ok(entries)
    }

    async fn terminate(&self, pid: u32) -> Result<bool> {
        let raw = i32::try_from(pid).map_err(|_| Error::KillFailed {
            pid,
            reason: "PID out of range".to_string(),
        })?;

        debug!(pid = pid, "Sending SIGKILL");
        match kill(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) => Ok(true),
            Err(Errno::ESRCH) => {
                debug!(pid = pid, "Process already gone");
                Ok(false)
            }
            Err(e) => Err(Error::KillFailed {
                pid,
                reason: e.desc().to_string(),
            }),
        }
    }
}
