use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid package name '{raw}'")]
pub struct InvalidPackageName {
    pub raw: String,
}

/// A package name in the index's canonical form: lowercase ASCII letters,
/// digits and single `-` separators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    pub fn parse(raw: &str) -> Result<Self, InvalidPackageName> {
        normalize_package_name(raw)
            .map(Self)
            .ok_or_else(|| InvalidPackageName {
                raw: raw.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PackageName {
    type Error = InvalidPackageName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PackageName> for String {
    fn from(value: PackageName) -> Self {
        value.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Collapses runs of `-`, `_` and `.` into one `-` and lowercases the result.
/// Returns `None` when anything outside `[a-z0-9-]` is left.
pub fn normalize_package_name(raw: &str) -> Option<String> {
    let mut normalized = String::with_capacity(raw.len());
    let mut in_separator_run = false;
    for ch in raw.chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !in_separator_run {
                normalized.push('-');
                in_separator_run = true;
            }
            continue;
        }
        in_separator_run = false;
        normalized.extend(ch.to_lowercase());
    }

    if normalized.is_empty() {
        return None;
    }
    let valid = normalized
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');
    valid.then_some(normalized)
}
