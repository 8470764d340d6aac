//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with external systems. Implementations live in `adapters`.

mod launcher;
mod process_table;

pub use launcher::{ForwardLauncherPort, LaunchOutcome};
pub use process_table::{ProcessEntry, ProcessTablePort};
