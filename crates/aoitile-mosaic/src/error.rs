//! Error types for mosaic accumulation.

use aoitile_grid::{ErrorKind, GridError};
use aoitile_raster::RasterError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building a mosaic.
#[derive(Debug, Error)]
pub enum MosaicError {
    /// Raster read or write failure.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// Tile listing failure.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// I/O error outside raster access (e.g. creating the output directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The tile list is empty.
    #[error("No tiles found.")]
    NoTiles,

    /// `start_tile` is outside `1..=total`.
    #[error("start_tile must be between 1 and {total}, got {start}")]
    StartTileOutOfRange {
        start: usize,
        total: usize,
    },

    /// The output exists and neither overwrite nor resume was requested.
    #[error("Output {} already exists; pass --overwrite to replace it", .0.display())]
    OutputExists(PathBuf),

    /// Resume was requested but there is nothing to resume.
    #[error(
        "Cannot resume because {} does not exist. Re-run without --start-tile or delete the corrupt output.",
        .0.display()
    )]
    ResumeWithoutOutput(PathBuf),

    /// The existing output does not match the mosaic being resumed.
    #[error("Existing mosaic {} does not match the input tiles ({reason}). Delete the mosaic and restart.", .path.display())]
    ResumeMismatch {
        path: PathBuf,
        reason: String,
    },

    /// A tile uses a different CRS than the reference tile.
    #[error("CRS mismatch for {}", .path.display())]
    CrsMismatch {
        path: PathBuf,
    },

    /// A tile uses a different pixel size than the reference tile.
    #[error(
        "Resolution/transform mismatch for {}: pixel size {found:?}, reference {expected:?}",
        .path.display()
    )]
    ResolutionMismatch {
        path: PathBuf,
        /// Reference pixel width and height.
        expected: (f64, f64),
        /// This tile's pixel width and height.
        found: (f64, f64),
    },

    /// A tile differs from the reference tile in band count or sample type.
    #[error("Band layout mismatch for {}: {reason}", .path.display())]
    LayoutMismatch {
        path: PathBuf,
        reason: String,
    },

    /// The placement window does not match the tile's pixel dimensions.
    #[error(
        "Window mismatch for {}: tile is {tile_width}x{tile_height} pixels, window is {window_width}x{window_height}",
        .path.display()
    )]
    WindowMismatch {
        path: PathBuf,
        tile_width: u32,
        tile_height: u32,
        window_width: u32,
        window_height: u32,
    },

    /// Copying a tile failed after earlier tiles were written.
    ///
    /// The output is left in place; re-running with `start_tile = tile`
    /// resumes from the failed tile.
    #[error(
        "Failed at tile {tile}/{total} ({}); re-run with --start-tile {tile} to resume: {source}",
        .path.display()
    )]
    Interrupted {
        /// 1-based index of the tile that failed.
        tile: usize,
        total: usize,
        path: PathBuf,
        #[source]
        source: Box<MosaicError>,
    },
}

impl MosaicError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MosaicError::Raster(e) => e.kind(),
            MosaicError::Grid(e) => e.kind(),
            MosaicError::Io(_) => ErrorKind::Io,
            MosaicError::StartTileOutOfRange { .. } => ErrorKind::Configuration,
            MosaicError::NoTiles
            | MosaicError::OutputExists(_)
            | MosaicError::ResumeWithoutOutput(_)
            | MosaicError::ResumeMismatch { .. }
            | MosaicError::CrsMismatch { .. }
            | MosaicError::ResolutionMismatch { .. }
            | MosaicError::LayoutMismatch { .. }
            | MosaicError::WindowMismatch { .. } => ErrorKind::Precondition,
            MosaicError::Interrupted { source, .. } => source.kind(),
        }
    }

    /// 1-based tile index to pass as `start_tile` to resume, if the run
    /// stopped part-way.
    pub fn resume_tile(&self) -> Option<usize> {
        match self {
            MosaicError::Interrupted { tile, .. } => Some(*tile),
            _ => None,
        }
    }
}
