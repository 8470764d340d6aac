//! Application layer - Use case services.
//!
//! Services are thin orchestrators that:
//! - Accept domain types as inputs
//! - Use ports (traits) for external dependencies
//! - Return domain types as outputs

mod forward_manager;

pub use forward_manager::{BatchOutcome, PortForwardManager, StopOutcome};
