//! Grouping-file parser.
//!
//! The format is line oriented:
//!
//! ```text
//! # comment
//! dev: {
//!     context: minikube
//!     api,8080,80
//!     db,5432,5432;
//! }
//! ```
//!
//! Parsing stops at the first invalid construct and reports it with its
//! 1-based line number.

mod lookup;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tokio::fs;
use tracing::warn;

use crate::domain::{
    is_valid_context, is_valid_group_name, is_valid_service_name, parse_port, Config, Group,
    Service,
};
use crate::error::{ConfigParseError, Error, Result};

pub use lookup::{find_group, find_services_with_prefix};

static GROUP_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\s:{}]+)\s*:\s*\{").unwrap());

static CONTEXT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^context\s*:\s*(.+)$").unwrap());

/// Parses grouping-file text into a [`Config`].
///
/// `source_name` is only used to label errors, e.g. `groups.conf:3: ...`.
pub fn parse(text: &str, source_name: Option<&str>) -> std::result::Result<Config, ConfigParseError> {
    let mut parser = Parser::new(source_name);
    let mut last_line = 0;

    for (index, raw) in text.lines().enumerate() {
        last_line = index + 1;
        parser.feed(raw.trim(), last_line)?;
    }

    parser.finish(last_line.max(1))
}

/// Reads and parses a grouping file from disk.
pub async fn parse_file(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path).await.map_err(|e| {
        Error::Config(format!("Failed to read groups file {}: {}", path.display(), e))
    })?;

    let source_name = path.display().to_string();
    Ok(parse(&text, Some(&source_name))?)
}

struct OpenGroup {
    group: Group,
    line: usize,
}

struct Parser<'a> {
    source_name: Option<&'a str>,
    groups: BTreeMap<String, Group>,
    declared_at: HashMap<String, usize>,
    current: Option<OpenGroup>,
}

impl<'a> Parser<'a> {
    fn new(source_name: Option<&'a str>) -> Self {
        Self {
            source_name,
            groups: BTreeMap::new(),
            declared_at: HashMap::new(),
            current: None,
        }
    }

    fn error(&self, line: usize, message: impl Into<String>) -> ConfigParseError {
        ConfigParseError::new(self.source_name, line, message)
    }

    fn feed(&mut self, line: &str, line_no: usize) -> std::result::Result<(), ConfigParseError> {
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        if let Some(caps) = GROUP_OPEN.captures(line) {
            let name = caps.get(1).map_or("", |m| m.as_str());
            let rest = line[caps.get(0).map_or(0, |m| m.end())..].trim();
            self.open_group(name, line_no)?;
            // Anything after `{` is the first line of the group body.
            return self.feed(rest, line_no);
        }

        if self.current.is_none() {
            return Err(if line == "}" {
                self.error(line_no, "unexpected '}' with no open group")
            } else {
                self.error(line_no, format!("unexpected content outside group: '{}'", line))
            });
        }

        if line == "}" {
            return self.close_group(line_no);
        }

        if let Some(caps) = CONTEXT_LINE.captures(line) {
            return self.set_context(caps[1].trim(), line_no);
        }

        self.add_service(line, line_no)
    }

    fn open_group(&mut self, name: &str, line_no: usize) -> std::result::Result<(), ConfigParseError> {
        if let Some(open) = &self.current {
            return Err(self.error(
                line_no,
                format!(
                    "nested groups unsupported: group '{}' opened inside '{}'",
                    name, open.group.name
                ),
            ));
        }

        if !is_valid_group_name(name) {
            return Err(self.error(
                line_no,
                format!(
                    "invalid group name '{}': use letters, digits, '-' or '_'",
                    name
                ),
            ));
        }

        if let Some(first) = self.declared_at.get(name) {
            return Err(self.error(
                line_no,
                format!("duplicate group name '{}' (first declared on line {})", name, first),
            ));
        }

        self.declared_at.insert(name.to_string(), line_no);
        self.current = Some(OpenGroup {
            group: Group::new(name),
            line: line_no,
        });
        Ok(())
    }

    fn close_group(&mut self, line_no: usize) -> std::result::Result<(), ConfigParseError> {
        let Some(open) = self.current.take() else {
            return Err(self.error(line_no, "unexpected '}' with no open group"));
        };

        if open.group.services.is_empty() {
            return Err(self.error(line_no, format!("empty group '{}'", open.group.name)));
        }

        self.groups.insert(open.group.name.clone(), open.group);
        Ok(())
    }

    fn set_context(&mut self, value: &str, line_no: usize) -> std::result::Result<(), ConfigParseError> {
        if !is_valid_context(value) {
            return Err(self.error(
                line_no,
                format!("invalid context '{}': must be a single word", value),
            ));
        }

        if let Some(open) = self.current.as_mut() {
            if let Some(previous) = &open.group.context {
                warn!(
                    group = %open.group.name,
                    line = line_no,
                    previous = %previous,
                    context = %value,
                    "Context redefined, later value wins"
                );
            }
            open.group.context = Some(value.to_string());
        }
        Ok(())
    }

    fn add_service(&mut self, line: &str, line_no: usize) -> std::result::Result<(), ConfigParseError> {
        let body = line.strip_suffix(';').unwrap_or(line);
        let fields: Vec<&str> = body.split(',').map(str::trim).collect();

        if fields.len() != 3 {
            return Err(self.error(
                line_no,
                format!(
                    "expected 3 comma-separated fields (name,local-port,remote-port), found {}",
                    fields.len()
                ),
            ));
        }

        let name = fields[0];
        if !is_valid_service_name(name) {
            return Err(self.error(
                line_no,
                format!(
                    "invalid service name '{}': must be a lowercase RFC 1123 name",
                    name
                ),
            ));
        }

        let local_port = parse_port(fields[1]).ok_or_else(|| {
            self.error(
                line_no,
                format!("invalid local port '{}': must be between 1 and 65535", fields[1]),
            )
        })?;
        let remote_port = parse_port(fields[2]).ok_or_else(|| {
            self.error(
                line_no,
                format!("invalid remote port '{}': must be between 1 and 65535", fields[2]),
            )
        })?;

        let duplicate_in = self
            .current
            .as_ref()
            .filter(|open| open.group.contains_service(name))
            .map(|open| open.group.name.clone());
        if let Some(group) = duplicate_in {
            return Err(self.error(
                line_no,
                format!("duplicate service name '{}' in group '{}'", name, group),
            ));
        }

        if let Some(open) = self.current.as_mut() {
            open.group
                .services
                .push(Service::new(name, local_port, remote_port));
        }
        Ok(())
    }

    fn finish(self, last_line: usize) -> std::result::Result<Config, ConfigParseError> {
        if let Some(open) = &self.current {
            return Err(self.error(
                open.line,
                format!("group '{}' is never closed (missing '}}')", open.group.name),
            ));
        }

        if self.groups.is_empty() {
            return Err(self.error(last_line, "no groups found"));
        }

        Ok(Config {
            groups: self.groups,
        })
    }
}
