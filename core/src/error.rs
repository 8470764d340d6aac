//! Error types for the kfwd-core library.

use std::fmt;

use thiserror::Error;

/// Result type alias for kfwd operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Exit code used when the forwarding client cannot be found.
pub const EXIT_BINARY_NOT_FOUND: i32 = 127;

/// Exit code used for every other fatal error.
pub const EXIT_FAILURE: i32 = 1;

/// A malformed or semantically invalid grouping file.
///
/// Always carries the 1-based line number of the offending construct and,
/// when known, the name of the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigParseError {
    pub source_name: Option<String>,
    pub line: usize,
    pub message: String,
}

impl ConfigParseError {
    pub fn new(source_name: Option<&str>, line: usize, message: impl Into<String>) -> Self {
        Self {
            source_name: source_name.map(str::to_string),
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_name {
            Some(name) => write!(f, "{}:{}: {}", name, self.line, self.message),
            None => write!(f, "line {}: {}", self.line, self.message),
        }
    }
}

impl std::error::Error for ConfigParseError {}

/// Errors that can occur while parsing groups and managing tunnels.
#[derive(Error, Debug)]
pub enum Error {
    /// The grouping file could not be parsed.
    #[error("{0}")]
    ConfigParse(#[from] ConfigParseError),

    /// No group with the requested name exists.
    #[error("Group '{0}' not found")]
    GroupNotFound(String),

    /// No service in the group matched.
    #[error("{}", service_not_found_message(.prefix, .group))]
    ServiceNotFound {
        prefix: Option<String>,
        group: String,
    },

    /// The forwarding client is not installed or not runnable.
    #[error("Forwarding client '{binary}' not found: {reason}")]
    BinaryNotFound { binary: String, reason: String },

    /// The tunnel process was spawned but exited straight away.
    #[error("Port-forward for '{service}' failed: {reason}")]
    ProcessLaunch { service: String, reason: String },

    /// None of the tunnels in a batch came up.
    #[error("None of the {attempted} port-forwards started")]
    NothingStarted { attempted: usize },

    /// A caller passed an invalid service name or port.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to parse command output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// Failed to kill a process.
    #[error("Failed to kill process {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },

    /// Settings or grouping file could not be located or read.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error category.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::BinaryNotFound { .. } => EXIT_BINARY_NOT_FOUND,
            _ => EXIT_FAILURE,
        }
    }

    /// Whether this error should abort a whole batch of starts.
    pub fn is_systemic(&self) -> bool {
        matches!(self, Error::BinaryNotFound { .. })
    }
}

fn service_not_found_message(prefix: &Option<String>, group: &str) -> String {
    match prefix {
        Some(prefix) => format!("No service matching '{}' in group '{}'", prefix, group),
        None => format!("Group '{}' has no services", group),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ConfigParseError::new(Some("groups.conf"), 4, "empty group 'g'");
        assert_eq!(err.to_string(), "groups.conf:4: empty group 'g'");

        let err = ConfigParseError::new(None, 2, "unexpected content outside group");
        assert_eq!(err.to_string(), "line 2: unexpected content outside group");
    }

    #[test]
    fn test_exit_codes() {
        let err = Error::BinaryNotFound {
            binary: "kubectl".to_string(),
            reason: "No such file or directory".to_string(),
        };
        assert_eq!(err.exit_code(), EXIT_BINARY_NOT_FOUND);
        assert!(err.is_systemic());

        let err = Error::GroupNotFound("missing".to_string());
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        assert!(!err.is_systemic());
    }

    #[test]
    fn test_service_not_found_display() {
        let err = Error::ServiceNotFound {
            prefix: Some("api".to_string()),
            group: "dev".to_string(),
        };
        assert_eq!(err.to_string(), "No service matching 'api' in group 'dev'");

        let err = Error::ServiceNotFound {
            prefix: None,
            group: "dev".to_string(),
        };
        assert_eq!(err.to_string(), "Group 'dev' has no services");
    }
}
