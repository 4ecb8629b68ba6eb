use std::path::PathBuf;

use thiserror::Error;

use crate::picks::catalog::FormatError;

// ---------------------------------------------------------------------------
// Engine-level error type
// ---------------------------------------------------------------------------

/// Errors reported by the annotation engine and its stores.
///
/// None of these are fatal to a running session: the engine stays in its
/// last known good state and only the failed operation is aborted.
#[derive(Error, Debug)]
pub enum PickError {
    /// Bad filter parameters, unknown station, empty collection, bad index.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Catalog document malformed or unreadable.
    #[error("Catalog format error: {0}")]
    Format(#[from] FormatError),

    /// Filter preset store missing or corrupt.
    #[error("Filter preset store {path:?} unavailable: {reason}")]
    StoreUnavailable { path: PathBuf, reason: String },

    /// A save target could not be written.
    #[error("Could not write {path:?}: {source}")]
    PersistenceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PickError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PersistenceIo {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = PickError> = std::result::Result<T, E>;
