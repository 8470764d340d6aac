//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with external systems.

pub mod launcher;
pub mod process_table;

// Re-export main types for convenience
pub use launcher::ForwardLauncher;
pub use process_table::ProcessTable;
