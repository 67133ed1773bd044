//! Where allow/deny entries come from. Sources are consulted on every decision.

use crate::unit::{normalize, ServiceIdentifier, SuffixMode};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A list of units, loaded fresh each time it is asked for.
pub trait PolicySource: Send + Sync {
    fn load(&self) -> Vec<ServiceIdentifier>;
}

/// One unit per line; blank lines and `#` comments are skipped.
///
/// The file is re-read on every call so operator edits apply to the next request.
/// A missing or unreadable file counts as an empty list.
#[derive(Debug, Clone)]
pub struct FilePolicySource {
    path: PathBuf,
    mode: SuffixMode,
}

impl FilePolicySource {
    pub fn new<P: AsRef<Path>>(path: P, mode: SuffixMode) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PolicySource for FilePolicySource {
    fn load(&self) -> Vec<ServiceIdentifier> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "policy file not readable, treating as empty");
                return Vec::new();
            }
        };
        parse_lines(&content, self.mode, &self.path)
    }
}

fn parse_lines(content: &str, mode: SuffixMode, origin: &Path) -> Vec<ServiceIdentifier> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|(lineno, line)| {
            let unit = normalize(line, mode);
            if unit.is_none() {
                warn!(path = %origin.display(), line = lineno, "skipping malformed policy entry");
            }
            unit
        })
        .collect()
}

/// Fixed list taken from configuration, e.g. `nginx, redis.service`.
#[derive(Debug, Clone, Default)]
pub struct InlinePolicySource {
    entries: Vec<ServiceIdentifier>,
}

impl InlinePolicySource {
    /// Parses a comma-separated value once; entries are trimmed and normalized.
    pub fn parse(value: &str, mode: SuffixMode) -> Self {
        let entries = value
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .enumerate()
            .filter_map(|(idx, t)| {
                let unit = normalize(t, mode);
                if unit.is_none() {
                    warn!(position = idx + 1, "skipping malformed inline policy entry");
                }
                unit
            })
            .collect();
        Self { entries }
    }

    pub fn from_units(entries: Vec<ServiceIdentifier>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl PolicySource for InlinePolicySource {
    fn load(&self) -> Vec<ServiceIdentifier> {
        self.entries.clone()
    }
}
