//! Parsing of raw process listings into [`ProcessEntry`] rows.

use serde::Deserialize;

use crate::domain::{FORWARD_VERB, SERVICE_REF_PREFIX};
use crate::error::{Error, Result};
use crate::ports::ProcessEntry;

/// Cheap pre-filter: the command line mentions the forwarding verb and a service reference.
pub fn is_forward_command(command_line: &str) -> bool {
    command_line.contains(FORWARD_VERB) && command_line.contains(SERVICE_REF_PREFIX)
}

/// Parse `ps -o pid=,command=` output.
///
/// Each line is a leading PID token followed by the full command text.
/// Lines that are not forwarding invocations are dropped.
pub fn parse_ps_output(output: &str) -> Vec<ProcessEntry> {
    let mut entries = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some((pid_str, command)) = trimmed.split_once(char::is_whitespace) else {
            continue;
        };

        let pid: u32 = match pid_str.parse() {
            Ok(p) => p,
            Err(_) => continue,
        };

        let command = command.trim();
        if !is_forward_command(command) {
            continue;
        }

        entries.push(ProcessEntry::new(pid, command));
    }

    entries
}

/// A `Win32_Process` row as emitted by `ConvertTo-Json`.
#[cfg_attr(not(windows), allow(dead_code))]
#[derive(Debug, Deserialize)]
struct CimProcess {
    #[serde(rename = "ProcessId")]
    process_id: u32,
    #[serde(rename = "CommandLine")]
    command_line: Option<String>,
}

/// `ConvertTo-Json` writes a bare object for a single result and an array otherwise.
#[cfg_attr(not(windows), allow(dead_code))]
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CimResult {
    Many(Vec<CimProcess>),
    One(CimProcess),
}

/// Parse the JSON process enumeration used on Windows.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn parse_cim_json(output: &str) -> Result<Vec<ProcessEntry>> {
    let output = output.trim();
    if output.is_empty() {
        return Ok(Vec::new());
    }

    let rows = match serde_json::from_str::<CimResult>(output)
        .map_err(|e| Error::ParseError(format!("Invalid process list JSON: {}", e)))?
    {
        CimResult::Many(rows) => rows,
        CimResult::One(row) => vec![row],
    };

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let command = row.command_line?;
            is_forward_command(&command).then(|| ProcessEntry::new(row.process_id, command))
        })
        .collect())
}
