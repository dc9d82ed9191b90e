use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::PackageName;

pub const STATE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDocument {
    pub schema_version: u32,
    pub index_url: String,
    pub client_packages: Vec<ClientPackage>,
    pub entry_points: Vec<EntryPointRecord>,
    pub index_fingerprints: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPackage {
    pub name: PackageName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPointRecord {
    pub name: String,
    pub callable_ref: String,
    pub owning_package: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateParseError {
    #[error("corrupt state document: {0}")]
    Corrupt(String),
    #[error("unsupported state schema version {found} (expected {})", STATE_SCHEMA_VERSION)]
    UnsupportedSchema { found: String },
}

impl StateDocument {
    pub fn new(index_url: impl Into<String>, client_packages: Vec<PackageName>) -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            index_url: index_url.into(),
            client_packages: client_packages
                .into_iter()
                .map(|name| ClientPackage { name })
                .collect(),
            entry_points: Vec::new(),
            index_fingerprints: BTreeMap::new(),
        }
    }

    pub fn entry_point(&self, name: &str) -> Option<&EntryPointRecord> {
        self.entry_points.iter().find(|record| record.name == name)
    }

    pub fn entry_point_names(&self) -> impl Iterator<Item = &str> {
        self.entry_points.iter().map(|record| record.name.as_str())
    }
}

pub fn parse_state_document(content: &str) -> Result<StateDocument, StateParseError> {
    let value = serde_json::from_str::<serde_json::Value>(content)
        .map_err(|err| StateParseError::Corrupt(err.to_string()))?;

    let Some(version) = value.get("schema_version") else {
        return Err(StateParseError::Corrupt(
            "missing schema_version".to_string(),
        ));
    };
    if version.as_u64() != Some(u64::from(STATE_SCHEMA_VERSION)) {
        return Err(StateParseError::UnsupportedSchema {
            found: version.to_string(),
        });
    }

    let document = serde_json::from_value::<StateDocument>(value)
        .map_err(|err| StateParseError::Corrupt(err.to_string()))?;
    validate_entry_points(&document.entry_points)?;
    Ok(document)
}

pub fn render_state_document(document: &StateDocument) -> Result<String, serde_json::Error> {
    let mut rendered = serde_json::to_string_pretty(document)?;
    rendered.push('\n');
    Ok(rendered)
}

fn validate_entry_points(entry_points: &[EntryPointRecord]) -> Result<(), StateParseError> {
    let mut seen = HashSet::with_capacity(entry_points.len());
    for record in entry_points {
        if !seen.insert(record.name.as_str()) {
            return Err(StateParseError::Corrupt(format!(
                "duplicate entry point name '{}'",
                record.name
            )));
        }
    }
    Ok(())
}
