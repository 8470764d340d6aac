//! Groups of services as declared in the grouping file.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One forwarding rule: `name,local_port,remote_port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    pub local_port: u16,
    pub remote_port: u16,
}

impl Service {
    pub fn new(name: impl Into<String>, local_port: u16, remote_port: u16) -> Self {
        Self {
            name: name.into(),
            local_port,
            remote_port,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.name, self.local_port, self.remote_port)
    }
}

/// A named set of services sharing an optional cluster context.
///
/// Services keep the order in which they were declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub services: Vec<Service>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: None,
            services: Vec::new(),
        }
    }

    /// Looks up a service by exact name.
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn contains_service(&self, name: &str) -> bool {
        self.service(name).is_some()
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {{", self.name)?;
        if let Some(context) = &self.context {
            writeln!(f, "    context: {}", context)?;
        }
        for service in &self.services {
            writeln!(f, "    {}", service)?;
        }
        writeln!(f, "}}")
    }
}

/// Parsed grouping file: group name -> group.
///
/// Rendering a `Config` with `Display` yields canonical grouping-file text
/// that parses back to an equal `Config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub groups: BTreeMap<String, Group>,
}

impl Config {
    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterates groups in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, group) in self.groups.values().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", group)?;
        }
        Ok(())
    }
}
