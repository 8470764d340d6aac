//! kfwd Core Library
//!
//! Groups of Kubernetes port-forward tunnels, driven by a small grouping file.
//! Provides functionality to:
//! - Parse and validate the grouping file with line-level errors
//! - Start tunnels as detached background processes
//! - Discover running tunnels from the OS process table
//! - Stop tunnels by service-name prefix
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//!
//! # Platform Support
//! - macOS / Linux: `ps` listing, `kill(2)`, `sh -c 'primary || fallback'`
//! - Windows: CIM process enumeration, `taskkill`, hidden-window launch

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod error;
pub mod parser;
pub mod settings;

// Re-export domain types (primary API)
pub use domain::{Config, ForwardKey, ForwardRequest, Group, PortForward, Service};

// Re-export other commonly used types
pub use adapters::{ForwardLauncher, ProcessTable};
pub use application::{BatchOutcome, PortForwardManager, StopOutcome};
pub use error::{ConfigParseError, Error, Result};
pub use parser::{find_group, find_services_with_prefix, parse, parse_file};
pub use settings::{Settings, SettingsStore};

/// Manager wired to the current platform's process table and launcher.
pub type PlatformManager = PortForwardManager<ProcessTable, ForwardLauncher>;

/// Build a [`PlatformManager`] from tool settings.
pub fn platform_manager(settings: &Settings) -> PlatformManager {
    PortForwardManager::new(ProcessTable::new(), ForwardLauncher::new(settings))
}
