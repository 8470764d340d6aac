//! Naming and port rules shared by the parser and the manager.

use std::sync::LazyLock;

use regex::Regex;

/// Longest DNS subdomain Kubernetes accepts for a service reference.
const MAX_SERVICE_NAME_LEN: usize = 253;

/// Longest single DNS label.
const MAX_LABEL_LEN: usize = 63;

static GROUP_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());

static DNS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap());

/// Group names: letters, digits, `-` and `_`.
pub fn is_valid_group_name(name: &str) -> bool {
    GROUP_NAME.is_match(name)
}

/// RFC-1123 names: lowercase alphanumeric labels joined by `.`,
/// each label starting and ending with an alphanumeric.
pub fn is_valid_service_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_SERVICE_NAME_LEN {
        return false;
    }

    name.split('.')
        .all(|label| label.len() <= MAX_LABEL_LEN && DNS_LABEL.is_match(label))
}

/// Contexts are opaque identifiers but must be a single token.
pub fn is_valid_context(context: &str) -> bool {
    !context.is_empty() && !context.chars().any(char::is_whitespace)
}

pub fn is_valid_port(port: u16) -> bool {
    port != 0
}

/// Parse a base-10 port in `1..=65535`. Signs and other notations are rejected.
pub fn parse_port(text: &str) -> Option<u16> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    text.parse::<u16>().ok().filter(|p| is_valid_port(*p))
}
