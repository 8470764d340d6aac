//! Forward launcher adapters.
//!
//! Starting a tunnel is asynchronous but callers want a yes/no answer, so a
//! launch spawns the client detached, waits a fixed grace period, and then
//! checks whether the process already died.
//!
//! The client's stderr goes to `<log dir>/<service>-<local port>.log`, which
//! is truncated on every launch of that tunnel.

#[cfg(unix)]
mod posix;

#[cfg(windows)]
mod windows;

#[cfg(unix)]
use posix as platform;

#[cfg(windows)]
use windows as platform;

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::domain::ForwardRequest;
use crate::error::{Error, Result};
use crate::ports::{ForwardLauncherPort, LaunchOutcome};
use crate::settings::Settings;

/// Launches forwarding clients as detached background processes.
pub struct ForwardLauncher {
    primary: String,
    fallback: Option<String>,
    grace_period: Duration,
    probe_timeout: Duration,
    log_dir: PathBuf,
}

impl ForwardLauncher {
    /// Create a launcher from tool settings.
    pub fn new(settings: &Settings) -> Self {
        Self {
            primary: settings.primary_client.clone(),
            fallback: settings.fallback_client.clone(),
            grace_period: settings.launch_grace(),
            probe_timeout: settings.probe_timeout(),
            log_dir: settings.log_dir(),
        }
    }

    /// Log file for a tunnel's stderr.
    pub fn log_path(&self, request: &ForwardRequest) -> PathBuf {
        self.log_dir
            .join(format!("{}-{}.log", request.service_name, request.local_port))
    }

    fn open_log(&self, request: &ForwardRequest) -> Result<File> {
        fs::create_dir_all(&self.log_dir)?;
        Ok(OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.log_path(request))?)
    }

    fn binary_not_found(&self, reason: impl Into<String>) -> Error {
        Error::BinaryNotFound {
            binary: self.primary.clone(),
            reason: reason.into(),
        }
    }
}

impl Default for ForwardLauncher {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl ForwardLauncherPort for ForwardLauncher {
    fn client(&self) -> &str {
        &self.primary
    }

    async fn probe(&self) -> Result<()> {
        let mut probe = std::process::Command::new(&self.primary);
        probe
            .args(["version", "--client"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        platform::background(&mut probe);

        let mut probe = Command::from(probe);
        probe.kill_on_drop(true);

        match timeout(self.probe_timeout, probe.status()).await {
            Ok(Ok(status)) if status.success() => {
                debug!(client = %self.primary, "Forwarding client is available");
                Ok(())
            }
            Ok(Ok(status)) => Err(self.binary_not_found(format!(
                "`{} version --client` exited with {}",
                self.primary, status
            ))),
            Ok(Err(e)) => Err(self.binary_not_found(e.to_string())),
            Err(_) => Err(self.binary_not_found(format!(
                "no answer within {}s",
                self.probe_timeout.as_secs()
            ))),
        }
    }

    async fn launch(&self, request: &ForwardRequest) -> Result<LaunchOutcome> {
        // A file rather than a pipe: the tunnel outlives kfwd and must not
        // die writing to a closed pipe.
        let stderr_log = self.open_log(request)?;

        let mut command =
            platform::detached_command(&self.primary, self.fallback.as_deref(), request);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_log.try_clone()?));

        debug!(
            service = %request.service_name,
            local_port = request.local_port,
            remote_port = request.remote_port,
            "Spawning port-forward"
        );

        let child = Command::from(command).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                self.binary_not_found(e.to_string())
            } else {
                Error::CommandFailed(format!("Failed to spawn port-forward: {}", e))
            }
        })?;

        settle(child, stderr_log, self.grace_period).await
    }
}

/// Wait out the grace period, then classify the child.
///
/// `try_wait` reports an exit that happened at any point before the check,
/// so a process that died immediately is never mistaken for a live one.
async fn settle(mut child: Child, mut stderr_log: File, grace_period: Duration) -> Result<LaunchOutcome> {
    sleep(grace_period).await;

    match child.try_wait()? {
        Some(status) if !status.success() => {
            let stderr = read_log(&mut stderr_log);
            debug!(status = %status, "Port-forward exited during grace period");
            Ok(LaunchOutcome::Failed {
                code: status.code(),
                stderr,
            })
        }
        Some(_) => {
            debug!("Port-forward exited cleanly during grace period");
            Ok(LaunchOutcome::Detached { pid: None })
        }
        None => {
            let pid = child.id();
            debug!(pid = ?pid, "Port-forward detached");
            Ok(LaunchOutcome::Detached { pid })
        }
    }
}

fn read_log(log: &mut File) -> String {
    let mut text = String::new();
    if log.seek(SeekFrom::Start(0)).is_ok() {
        let mut bytes = Vec::new();
        if log.read_to_end(&mut bytes).is_ok() {
            text = String::from_utf8_lossy(&bytes).trim().to_string();
        }
    }
    text
}
