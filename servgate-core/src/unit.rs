//! Service name validation and canonicalization.

use serde::Serialize;
use std::fmt;

/// Suffix every canonical unit name carries.
pub const UNIT_SUFFIX: &str = ".service";

/// How strictly caller-supplied names are matched against the unit suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuffixMode {
    /// `nginx` and `nginx.service` are both accepted; the suffix is appended when missing.
    #[default]
    Optional,
    /// Only names already ending in `.service` are accepted.
    Required,
}

/// Canonical unit name, always `[A-Za-z0-9._-]+` ending in [`UNIT_SUFFIX`].
///
/// Only [`normalize`] constructs one, so holding a value means the name is safe
/// to pass as a single argument to the service manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ServiceIdentifier(String);

impl ServiceIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Checks the raw name exactly as received; no trimming.
pub fn validate(raw: &str, mode: SuffixMode) -> bool {
    if raw.is_empty() || !raw.chars().all(is_name_char) {
        return false;
    }
    match mode {
        SuffixMode::Optional => true,
        SuffixMode::Required => raw
            .strip_suffix(UNIT_SUFFIX)
            .is_some_and(|stem| !stem.is_empty()),
    }
}

/// Trims and canonicalizes a name, returning `None` when nothing valid remains.
pub fn normalize(raw: &str, mode: SuffixMode) -> Option<ServiceIdentifier> {
    let trimmed = raw.trim();
    if !validate(trimmed, mode) {
        return None;
    }
    if trimmed.ends_with(UNIT_SUFFIX) {
        return Some(ServiceIdentifier(trimmed.to_string()));
    }
    Some(ServiceIdentifier(format!("{trimmed}{UNIT_SUFFIX}")))
}
