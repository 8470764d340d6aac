//! Windows process table using CIM process enumeration and `taskkill`.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ports::{ProcessEntry, ProcessTablePort};

use super::listing::parse_cim_json;

const CREATE_NO_WINDOW: u32 = 0x0800_0000;

const CIM_QUERY: &str = "Get-CimInstance Win32_Process -Filter \"CommandLine LIKE '%port-forward%'\" \
     | Select-Object ProcessId,CommandLine | ConvertTo-Json -Compress";

pub struct WindowsProcessTable;

impl ProcessTablePort for WindowsProcessTable {
    async fn forward_processes(&self) -> Result<Vec<ProcessEntry>> {
        let output = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", CIM_QUERY])
            .creation_flags(CREATE_NO_WINDOW)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to query processes: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let entries = parse_cim_json(&stdout)?;
        debug!(count = entries.len(), "Scanned process table");
        Ok(entries)
    }

    async fn terminate(&self, pid: u32) -> Result<bool> {
        debug!(pid = pid, "Executing taskkill /F");

        let output = Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/F"])
            .creation_flags(CREATE_NO_WINDOW)
            .output()
            .await?;

        if output.status.success() {
            return Ok(true);
        }

        let combined = format!(
            "{} {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if combined.contains("not found") || combined.contains("could not be found") {
            debug!(pid = pid, "Process already gone");
            return Ok(false);
        }

        Err(Error::KillFailed {
            pid,
            reason: combined.trim().to_string(),
        })
    }
}
