//! Group and service resolution on a parsed [`Config`].

use crate::domain::{Config, Group, Service};
use crate::error::{Error, Result};

/// Finds a group by exact name.
pub fn find_group<'a>(config: &'a Config, name: &str) -> Result<&'a Group> {
    config
        .get(name)
        .ok_or_else(|| Error::GroupNotFound(name.to_string()))
}

/// Returns the group's services, optionally narrowed to names starting with `prefix`.
///
/// The match is a plain case-sensitive string prefix. An empty result is an
/// error in both cases.
pub fn find_services_with_prefix<'a>(
    group: &'a Group,
    prefix: Option<&str>,
) -> Result<Vec<&'a Service>> {
    let services: Vec<&Service> = match prefix {
        Some(prefix) => group
            .services
            .iter()
            .filter(|s| s.name.starts_with(prefix))
            .collect(),
        None => group.services.iter().collect(),
    };

    if services.is_empty() {
        return Err(Error::ServiceNotFound {
            prefix: prefix.map(str::to_string),
            group: group.name.clone(),
        });
    }

    Ok(services)
}
