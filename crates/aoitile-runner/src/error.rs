//! Runner errors and their process exit codes.

use aoitile_grid::{ErrorKind, GridError};
use aoitile_index::IndexError;
use aoitile_mosaic::MosaicError;
use aoitile_provider::ProviderError;
use aoitile_raster::RasterError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the `aoitile` command.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unknown dataset '{name}'; configured datasets: {known}")]
    UnknownDataset {
        name: String,
        known: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Mosaic(#[from] MosaicError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl RunnerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunnerError::ConfigRead { .. }
            | RunnerError::ConfigParse { .. }
            | RunnerError::UnknownDataset { .. }
            | RunnerError::Config(_) => ErrorKind::Configuration,
            RunnerError::Io(_) => ErrorKind::Io,
            RunnerError::Grid(e) => e.kind(),
            RunnerError::Raster(e) => e.kind(),
            RunnerError::Mosaic(e) => e.kind(),
            RunnerError::Provider(e) => e.kind(),
            RunnerError::Index(e) => e.kind(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Configuration => 2,
            ErrorKind::Precondition => 3,
            ErrorKind::Provider => 4,
            ErrorKind::Io => 1,
        }
    }
}
