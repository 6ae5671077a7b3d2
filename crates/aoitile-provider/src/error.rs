//! Error types for imagery providers.

use aoitile_grid::{ErrorKind, GridError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while exporting tiles from an imagery provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP transport error (connection, timeout, TLS).
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Provider returned HTTP {status} for {url}")]
    Status {
        status: u16,
        url: String,
    },

    /// The provider has no imagery for the tile.
    #[error("No imagery returned for tile row={row} col={col}")]
    EmptyResult {
        row: u32,
        col: u32,
    },

    /// The URL template is malformed or uses an unknown placeholder.
    #[error("Invalid URL template: {0}")]
    InvalidTemplate(String),

    /// I/O error writing the tile file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tiling or reconciliation failure.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// A download run stopped part-way. Tiles already written are kept.
    #[error(
        "Export of tile row={row} col={col} -> {} failed after {completed}/{total} tiles: {source}",
        .path.display()
    )]
    Interrupted {
        /// Tiles exported successfully before the failure.
        completed: usize,
        total: usize,
        row: u32,
        col: u32,
        path: PathBuf,
        #[source]
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::Http(_)
            | ProviderError::Status { .. }
            | ProviderError::EmptyResult { .. } => ErrorKind::Provider,
            ProviderError::InvalidTemplate(_) => ErrorKind::Configuration,
            ProviderError::Io(_) => ErrorKind::Io,
            ProviderError::Grid(e) => e.kind(),
            ProviderError::Interrupted { source, .. } => source.kind(),
        }
    }

    /// Number of tiles written before the run stopped, if it stopped part-way.
    pub fn completed(&self) -> Option<usize> {
        match self {
            ProviderError::Interrupted { completed, .. } => Some(*completed),
            _ => None,
        }
    }
}
