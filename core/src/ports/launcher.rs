//! Forward launcher port (interface).

use crate::domain::ForwardRequest;
use crate::error::Result;

/// What a launch attempt looked like once the grace period elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Still running; handles were released and the process left detached.
    Detached { pid: Option<u32> },
    /// Exited with a failure status before the grace period was over.
    Failed { code: Option<i32>, stderr: String },
}

/// Port for starting detached forwarding processes.
pub trait ForwardLauncherPort: Send + Sync {
    /// Name of the primary forwarding client, for error messages.
    fn client(&self) -> &str;

    /// Fails with `Error::BinaryNotFound` when the primary client cannot run.
    fn probe(&self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Spawn the tunnel, wait out the grace period, and report what happened.
    fn launch(
        &self,
        request: &ForwardRequest,
    ) -> impl std::future::Future<Output = Result<LaunchOutcome>> + Send;
}
