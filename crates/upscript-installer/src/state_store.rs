use std::fs;
use std::io;
use std::path::PathBuf;

use upscript_core::{parse_state_document, render_state_document, StateDocument};

use crate::fs_utils::write_atomic;
use crate::{EnvironmentLayout, StateError};

pub fn load_state(environment: &EnvironmentLayout) -> Result<StateDocument, StateError> {
    let path = environment.state_path();
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::InvalidData => {
            return Err(StateError::CorruptState {
                path,
                reason: "state document is not valid UTF-8".to_string(),
            });
        }
        Err(source) => return Err(StateError::Io { path, source }),
    };
    parse_state_document(&content).map_err(|err| StateError::from_parse(path, err))
}

/// Replaces the whole document. Callers invoke this once, after every other
/// step of their unit of work has succeeded.
pub fn save_state(
    environment: &EnvironmentLayout,
    document: &StateDocument,
) -> Result<(), StateError> {
    let path = environment.state_path();
    let rendered =
        render_state_document(document).map_err(|err| encoding_failure(path.clone(), err))?;
    write_atomic(&path, rendered.as_bytes()).map_err(|source| StateError::Io { path, source })
}

// The document on disk is left as it was.
pub(crate) fn encoding_failure(
    path: PathBuf,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> StateError {
    StateError::Io {
        path,
        source: io::Error::other(err),
    }
}
