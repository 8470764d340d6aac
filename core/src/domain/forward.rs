//! Port-forward tunnels and the command-line contract used to find them.
//!
//! A tunnel is never recorded anywhere: it is launched with a command line
//! containing `service/<name> <local>:<remote>`, and later recognised in the
//! OS process table by that same text. [`ForwardRequest::forward_args`] emits
//! the text and [`PortForward::from_command_line`] reads it back; both use the
//! constants below so the two sides cannot drift apart.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::group::Service;
use super::validate::{is_valid_service_name, parse_port};

/// Subcommand shared by the primary and fallback forwarding clients.
pub const FORWARD_VERB: &str = "port-forward";

/// Resource prefix of the service reference argument.
pub const SERVICE_REF_PREFIX: &str = "service/";

/// Joins the primary and fallback client invocations in a launch wrapper.
pub const FALLBACK_SEPARATOR: &str = " || ";

static FORWARD_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:^|\s){}([a-z0-9][-a-z0-9.]*)\s+(\d+):(\d+)(?:\s|$)",
        regex::escape(SERVICE_REF_PREFIX)
    ))
    .unwrap()
});

/// A tunnel the caller wants to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRequest {
    pub service_name: String,
    pub local_port: u16,
    pub remote_port: u16,
    pub context: Option<String>,
}

impl ForwardRequest {
    pub fn new(
        service_name: impl Into<String>,
        local_port: u16,
        remote_port: u16,
        context: Option<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            local_port,
            remote_port,
            context,
        }
    }

    /// Builds a request for a configured service.
    pub fn for_service(service: &Service, context: Option<&str>) -> Self {
        Self::new(
            service.name.clone(),
            service.local_port,
            service.remote_port,
            context.map(str::to_string),
        )
    }

    /// Arguments passed to the forwarding client, verb included:
    /// `port-forward [--context <ctx>] service/<name> <local>:<remote>`.
    pub fn forward_args(&self) -> Vec<String> {
        let mut args = vec![FORWARD_VERB.to_string()];
        if let Some(context) = &self.context {
            args.push("--context".to_string());
            args.push(context.clone());
        }
        args.push(format!("{}{}", SERVICE_REF_PREFIX, self.service_name));
        args.push(format!("{}:{}", self.local_port, self.remote_port));
        args
    }

    pub fn key(&self) -> ForwardKey {
        ForwardKey {
            service_name: self.service_name.clone(),
            local_port: self.local_port,
            remote_port: self.remote_port,
        }
    }
}

/// Identity of a logical tunnel.
///
/// One logical tunnel may be backed by two processes (a shell wrapper and
/// the client it runs), which share this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForwardKey {
    pub service_name: String,
    pub local_port: u16,
    pub remote_port: u16,
}

/// A tunnel observed in the process table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortForward {
    pub service_name: String,
    pub local_port: u16,
    pub remote_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

impl PortForward {
    /// Extracts a tunnel from a process command line.
    ///
    /// Returns `None` for anything that does not carry a well-formed
    /// `service/<name> <local>:<remote>` reference.
    pub fn from_command_line(pid: Option<u32>, command_line: &str) -> Option<Self> {
        let caps = FORWARD_TARGET.captures(command_line)?;

        let service_name = &caps[1];
        if !is_valid_service_name(service_name) {
            return None;
        }

        Some(Self {
            service_name: service_name.to_string(),
            local_port: parse_port(&caps[2])?,
            remote_port: parse_port(&caps[3])?,
            pid,
        })
    }

    pub fn key(&self) -> ForwardKey {
        ForwardKey {
            service_name: self.service_name.clone(),
            local_port: self.local_port,
            remote_port: self.remote_port,
        }
    }

    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.service_name.starts_with(prefix)
    }
}

/// Collapses entries that share a [`ForwardKey`], keeping the first one seen.
/// Whether a command line is a wrapper that runs a fallback client.
pub fn is_fallback_chain(command_line: &str) -> bool {
    command_line.contains(FALLBACK_SEPARATOR)
}

pub fn dedupe_forwards(forwards: &[PortForward]) -> Vec<PortForward> {
    let mut seen: HashSet<ForwardKey> = HashSet::new();

    forwards
        .iter()
        .filter(|f| seen.insert(f.key()))
        .cloned()
        .collect()
}
