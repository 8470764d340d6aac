//! Domain layer - Pure business logic and data models.
//!
//! This module contains domain entities that represent core business concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod forward;
mod group;
mod validate;

// Re-export all domain types
pub use forward::{
    dedupe_forwards, is_fallback_chain, ForwardKey, ForwardRequest, PortForward, FALLBACK_SEPARATOR,
    FORWARD_VERB, SERVICE_REF_PREFIX,
};
pub use group::{Config, Group, Service};
pub use validate::{
    is_valid_context, is_valid_group_name, is_valid_port, is_valid_service_name, parse_port,
};
