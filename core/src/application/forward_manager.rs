//! Port-forward lifecycle service.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::domain::{
    dedupe_forwards, is_fallback_chain, is_valid_port, ForwardKey, ForwardRequest, PortForward,
};
use crate::error::{Error, Result};
use crate::ports::{ForwardLauncherPort, LaunchOutcome, ProcessEntry, ProcessTablePort};

/// Result of a stop request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopOutcome {
    /// Distinct logical tunnels that matched.
    pub tunnels: usize,
    /// Physical processes a kill was sent to.
    pub processes: usize,
    /// Kill calls that reported an error (ignored otherwise).
    pub failed_kills: usize,
}

impl StopOutcome {
    pub fn nothing_matched(&self) -> bool {
        self.tunnels == 0
    }
}

/// Result of starting several tunnels in one go.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub started: Vec<ForwardRequest>,
    pub failed: Vec<(ForwardRequest, Error)>,
}

impl BatchOutcome {
    pub fn attempted(&self) -> usize {
        self.started.len() + self.failed.len()
    }
}

/// Starts, lists and stops port-forward tunnels.
///
/// Keeps no registry of its own: every call reads the live process table,
/// so tunnels killed or crashed out-of-band are never reported as running.
pub struct PortForwardManager<T: ProcessTablePort, L: ForwardLauncherPort> {
    table: T,
    launcher: L,
}

impl<T: ProcessTablePort, L: ForwardLauncherPort> PortForwardManager<T, L> {
    pub fn new(table: T, launcher: L) -> Self {
        Self { table, launcher }
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Start one detached tunnel.
    ///
    /// Inputs are checked before anything touches the OS. A missing client
    /// yields `Error::BinaryNotFound`; a client that dies within the grace
    /// period yields `Error::ProcessLaunch` carrying its stderr.
    pub async fn start(&self, request: &ForwardRequest) -> Result<()> {
        validate_request(request)?;

        self.launcher.probe().await?;

        match self.launcher.launch(request).await? {
            LaunchOutcome::Detached { pid } => {
                info!(
                    service = %request.service_name,
                    local_port = request.local_port,
                    remote_port = request.remote_port,
                    pid = ?pid,
                    "Port-forward started"
                );
                Ok(())
            }
            LaunchOutcome::Failed { code, stderr } => {
                let reason = if stderr.is_empty() {
                    match code {
                        Some(code) => format!("{} exited with status {}", self.launcher.client(), code),
                        None => format!("{} was terminated by a signal", self.launcher.client()),
                    }
                } else {
                    stderr
                };

                Err(Error::ProcessLaunch {
                    service: request.service_name.clone(),
                    reason,
                })
            }
        }
    }

    /// Start each request in order.
    ///
    /// A tunnel that fails to come up is logged and skipped. A missing client
    /// aborts the rest of the batch. Fails when nothing started.
    pub async fn start_batch(&self, requests: &[ForwardRequest]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();

        for request in requests {
            match self.start(request).await {
                Ok(()) => outcome.started.push(request.clone()),
                Err(e) if e.is_systemic() => return Err(e),
                Err(e) => {
                    warn!(service = %request.service_name, "{}", e);
                    outcome.failed.push((request.clone(), e));
                }
            }
        }

        if outcome.started.is_empty() {
            return Err(Error::NothingStarted {
                attempted: outcome.attempted(),
            });
        }
        Ok(outcome)
    }

    /// Every forwarding process in the table, one entry per process.
    ///
    /// Command lines that do not carry a `service/<name> <local>:<remote>`
    /// reference are skipped.
    pub async fn scan(&self) -> Result<Vec<PortForward>> {
        let entries = self.table.forward_processes().await?;
        Ok(to_forwards(&entries))
    }

    /// Running tunnels, one per logical tunnel (first PID seen wins).
    pub async fn list(&self) -> Result<Vec<PortForward>> {
        let forwards = self.scan().await?;
        Ok(dedupe_forwards(&forwards))
    }

    /// Kill every process whose service name starts with `prefix`.
    pub async fn stop(&self, prefix: &str) -> Result<StopOutcome> {
        self.stop_matching(|forward| forward.matches_prefix(prefix))
            .await
    }

    /// Kill every forwarding process found.
    pub async fn stop_all(&self) -> Result<StopOutcome> {
        self.stop_matching(|_| true).await
    }

    async fn stop_matching<F>(&self, predicate: F) -> Result<StopOutcome>
    where
        F: Fn(&PortForward) -> bool,
    {
        // The full undeduplicated scan: wrapper and client processes of one
        // tunnel must all go. Fallback wrappers go first, otherwise a wrapper
        // that outlives its client launches the fallback client.
        let mut entries = self.table.forward_processes().await?;
        entries.sort_by_key(|entry| !is_fallback_chain(&entry.command_line));

        let targets: Vec<PortForward> = to_forwards(&entries)
            .into_iter()
            .filter(|forward| predicate(forward))
            .collect();

        let mut outcome = StopOutcome::default();
        let mut tunnels: HashSet<ForwardKey> = HashSet::new();

        for forward in &targets {
            tunnels.insert(forward.key());

            let Some(pid) = forward.pid else {
                continue;
            };

            outcome.processes += 1;
            match self.table.terminate(pid).await {
                Ok(true) => debug!(pid = pid, service = %forward.service_name, "Killed"),
                Ok(false) => debug!(pid = pid, "Already exited"),
                Err(e) => {
                    outcome.failed_kills += 1;
                    warn!(pid = pid, error = %e, "Kill failed, ignoring");
                }
            }
        }

        outcome.tunnels = tunnels.len();
        Ok(outcome)
    }
}

fn to_forwards(entries: &[ProcessEntry]) -> Vec<PortForward> {
    entries
        .iter()
        .filter_map(|entry| PortForward::from_command_line(Some(entry.pid), &entry.command_line))
        .collect()
}

fn validate_request(request: &ForwardRequest) -> Result<()> {
    if request.service_name.trim().is_empty() {
        return Err(Error::InvalidInput("service name must not be empty".to_string()));
    }

    for (label, port) in [("local", request.local_port), ("remote", request.remote_port)] {
        if !is_valid_port(port) {
            return Err(Error::InvalidInput(format!(
                "{} port must be between 1 and 65535, got {}",
                label, port
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Process table serving a fixed snapshot and recording kills.
    #[derive(Default)]
    struct MockTable {
        entries: Vec<ProcessEntry>,
        killed: Arc<Mutex<Vec<u32>>>,
        dead: Vec<u32>,
    }

    impl MockTable {
        fn new(rows: &[(u32, &str)]) -> Self {
            Self {
                entries: rows
                    .iter()
                    .map(|(pid, line)| ProcessEntry::new(*pid, *line))
                    .collect(),
                ..Self::default()
            }
        }
    }

    impl ProcessTablePort for MockTable {
        async fn forward_processes(&self) -> Result<Vec<ProcessEntry>> {
            Ok(self.entries.clone())
        }

        async fn terminate(&self, pid: u32) -> Result<bool> {
            self.killed.lock().push(pid);
            if self.dead.contains(&pid) {
                return Err(Error::KillFailed {
                    pid,
                    reason: "No such process".to_string(),
                });
            }
            Ok(true)
        }
    }

    /// Launcher with a scripted probe result and launch outcome.
    struct MockLauncher {
        available: bool,
        outcome: LaunchOutcome,
        failing: Vec<&'static str>,
        launches: AtomicUsize,
    }

    impl MockLauncher {
        fn ok() -> Self {
            Self {
                available: true,
                outcome: LaunchOutcome::Detached { pid: Some(4242) },
                failing: Vec::new(),
                launches: AtomicUsize::new(0),
            }
        }

        fn failing_for(services: &[&'static str]) -> Self {
            Self {
                failing: services.to_vec(),
                ..Self::ok()
            }
        }
    }

    impl ForwardLauncherPort for MockLauncher {
        fn client(&self) -> &str {
            "kubectl"
        }

        async fn probe(&self) -> Result<()> {
            if self.available {
                Ok(())
            } else {
                Err(Error::BinaryNotFound {
                    binary: "kubectl".to_string(),
                    reason: "not installed".to_string(),
                })
            }
        }

        async fn launch(&self, request: &ForwardRequest) -> Result<LaunchOutcome> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&request.service_name.as_str()) {
                return Ok(LaunchOutcome::Failed {
                    code: Some(1),
                    stderr: "error: unable to listen on any of the requested ports".to_string(),
                });
            }
            Ok(self.outcome.clone())
        }
    }

    fn manager(rows: &[(u32, &str)]) -> PortForwardManager<MockTable, MockLauncher> {
        PortForwardManager::new(MockTable::new(rows), MockLauncher::ok())
    }

    const API_WRAPPER: &str =
        "/bin/sh -c kubectl port-forward service/api 8080:80 || oc port-forward service/api 8080:80";
    const API_CLIENT: &str = "kubectl port-forward service/api 8080:80";

    #[tokio::test]
    async fn test_start_success() {
        let manager = manager(&[]);
        let request = ForwardRequest::new("api", 8080, 80, Some("prod".to_string()));

        manager.start(&request).await.unwrap();
        assert_eq!(manager.launcher().launches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_input_before_launch() {
        let manager = manager(&[]);

        for request in [
            ForwardRequest::new("", 8080, 80, None),
            ForwardRequest::new("api", 0, 80, None),
            ForwardRequest::new("api", 8080, 0, None),
        ] {
            let err = manager.start(&request).await.unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }
        assert_eq!(manager.launcher().launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_missing_binary() {
        let launcher = MockLauncher {
            available: false,
            ..MockLauncher::ok()
        };
        let manager = PortForwardManager::new(MockTable::default(), launcher);

        let err = manager
            .start(&ForwardRequest::new("api", 8080, 80, None))
            .await
            .unwrap_err();
        assert!(err.is_systemic());
        assert_eq!(manager.launcher().launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_immediate_exit() {
        let launcher = MockLauncher {
            outcome: LaunchOutcome::Failed {
                code: Some(1),
                stderr: "error: services \"api\" not found".to_string(),
            },
            ..MockLauncher::ok()
        };
        let manager = PortForwardManager::new(MockTable::default(), launcher);

        let err = manager
            .start(&ForwardRequest::new("api", 8080, 80, None))
            .await
            .unwrap_err();
        match err {
            Error::ProcessLaunch { service, reason } => {
                assert_eq!(service, "api");
                assert!(reason.contains("not found"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_start_failure_without_stderr() {
        let launcher = MockLauncher {
            outcome: LaunchOutcome::Failed {
                code: Some(3),
                stderr: String::new(),
            },
            ..MockLauncher::ok()
        };
        let manager = PortForwardManager::new(MockTable::default(), launcher);

        let err = manager
            .start(&ForwardRequest::new("api", 8080, 80, None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exited with status 3"));
    }

    fn requests(names: &[&str]) -> Vec<ForwardRequest> {
        names
            .iter()
            .zip(8080u16..)
            .map(|(name, port)| ForwardRequest::new(*name, port, 80, None))
            .collect()
    }

    #[tokio::test]
    async fn test_batch_continues_after_failure() {
        let manager = PortForwardManager::new(MockTable::default(), MockLauncher::failing_for(&["api"]));

        let outcome = manager.start_batch(&requests(&["api", "web"])).await.unwrap();
        assert_eq!(manager.launcher().launches.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.started.len(), 1);
        assert_eq!(outcome.started[0].service_name, "web");
        assert_eq!(outcome.failed.len(), 1);
        assert!(matches!(outcome.failed[0].1, Error::ProcessLaunch { ref service, .. } if service == "api"));
    }

    #[tokio::test]
    async fn test_batch_aborts_on_missing_binary() {
        let launcher = MockLauncher {
            available: false,
            ..MockLauncher::ok()
        };
        let manager = PortForwardManager::new(MockTable::default(), launcher);

        let err = manager
            .start_batch(&requests(&["api", "web", "db"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BinaryNotFound { .. }));
        assert_eq!(err.exit_code(), crate::error::EXIT_BINARY_NOT_FOUND);
        assert_eq!(manager.launcher().launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batch_with_no_successes_fails() {
        let manager =
            PortForwardManager::new(MockTable::default(), MockLauncher::failing_for(&["api", "web"]));

        let err = manager.start_batch(&requests(&["api", "web"])).await.unwrap_err();
        assert!(matches!(err, Error::NothingStarted { attempted: 2 }));
        assert_eq!(err.exit_code(), crate::error::EXIT_FAILURE);
        assert_eq!(manager.launcher().launches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_list_dedupes_wrapper_and_client() {
        let manager = manager(&[
            (100, API_WRAPPER),
            (101, API_CLIENT),
            (200, "kubectl port-forward --context prod service/db 15432:5432"),
            (300, "kubectl port-forward pod/web 3000:80"),
        ]);

        let scanned = manager.scan().await.unwrap();
        assert_eq!(scanned.len(), 3);

        let listed = manager.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].service_name, "api");
        assert_eq!(listed[0].pid, Some(100));
        assert_eq!(listed[1].service_name, "db");
    }

    #[tokio::test]
    async fn test_list_empty() {
        assert!(manager(&[]).list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_is_idempotent() {
        let manager = manager(&[(1, API_CLIENT), (2, API_CLIENT), (3, "kubectl port-forward service/web 3000:80")]);

        let first = manager.list().await.unwrap();
        let second = manager.list().await.unwrap();
        assert_eq!(first, second);
        assert!(first.len() <= manager.scan().await.unwrap().len());
    }

    #[tokio::test]
    async fn test_stop_kills_every_process_but_counts_tunnels() {
        let manager = manager(&[(10, API_CLIENT), (11, API_CLIENT)]);

        let outcome = manager.stop("api").await.unwrap();
        assert_eq!(outcome.tunnels, 1);
        assert_eq!(outcome.processes, 2);
        assert_eq!(*manager.table().killed.lock(), vec![10, 11]);
    }

    #[tokio::test]
    async fn test_stop_by_prefix() {
        let manager = manager(&[
            (10, "kubectl port-forward service/api 8080:80"),
            (11, "kubectl port-forward service/api-admin 8081:80"),
            (12, "kubectl port-forward service/db 5432:5432"),
        ]);

        let outcome = manager.stop("api").await.unwrap();
        assert_eq!(outcome.tunnels, 2);
        assert_eq!(*manager.table().killed.lock(), vec![10, 11]);
    }

    #[tokio::test]
    async fn test_stop_nothing_matched() {
        let manager = manager(&[(10, API_CLIENT)]);

        let outcome = manager.stop("web").await.unwrap();
        assert!(outcome.nothing_matched());
        assert!(manager.table().killed.lock().is_empty());
    }

    #[tokio::test]
    async fn test_stop_ignores_failed_kills() {
        let mut table = MockTable::new(&[(10, API_CLIENT), (11, "kubectl port-forward service/db 5432:5432")]);
        table.dead = vec![10];
        let manager = PortForwardManager::new(table, MockLauncher::ok());

        let outcome = manager.stop_all().await.unwrap();
        assert_eq!(outcome.tunnels, 2);
        assert_eq!(outcome.failed_kills, 1);
        assert_eq!(*manager.table().killed.lock(), vec![10, 11]);
    }

    #[tokio::test]
    async fn test_stop_kills_wrapper_before_client() {
        // Client listed first, as happens once PIDs wrap around.
        let manager = manager(&[(100, API_CLIENT), (101, API_WRAPPER)]);

        let outcome = manager.stop("api").await.unwrap();
        assert_eq!(outcome.tunnels, 1);
        assert_eq!(*manager.table().killed.lock(), vec![101, 100]);
    }

    #[tokio::test]
    async fn test_stop_all() {
        let manager = manager(&[
            (100, API_WRAPPER),
            (101, API_CLIENT),
            (200, "kubectl port-forward service/db 15432:5432"),
        ]);

        let outcome = manager.stop_all().await.unwrap();
        assert_eq!(outcome.tunnels, 2);
        assert_eq!(outcome.processes, 3);
    }
}
