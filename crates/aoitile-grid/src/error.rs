//! Error types for the grid crate.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification shared by every aoitile error type.
///
/// Callers use it to tell fatal misconfiguration apart from a failed
/// precondition or an imagery provider failure without matching on every
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid tile spec, AOI or other user-supplied setting. Reported before any I/O.
    Configuration,
    /// Inputs on disk are not in the state the operation requires.
    Precondition,
    /// The imagery provider failed or returned nothing.
    Provider,
    /// Underlying filesystem or encoding failure.
    Io,
}

/// Errors that can occur while tiling an AOI or reconciling tile files.
#[derive(Debug, Error)]
pub enum GridError {
    /// Tile width or height is zero, negative or not finite.
    #[error("Tile width/height must be greater than zero (got {width_km} km x {height_km} km)")]
    NonPositiveTileSize {
        /// Requested tile width in kilometres.
        width_km: f64,
        /// Requested tile height in kilometres.
        height_km: f64,
    },

    /// Overlap is negative or not finite.
    #[error("Tile overlap must be zero or positive (got {0} km)")]
    NegativeOverlap(f64),

    /// Overlap is at least as large as one of the tile dimensions.
    #[error(
        "Tile overlap must be smaller than the tile dimensions \
         (overlap {overlap_km} km, tile {width_km} km x {height_km} km)"
    )]
    OverlapTooLarge {
        /// Requested tile width in kilometres.
        width_km: f64,
        /// Requested tile height in kilometres.
        height_km: f64,
        /// Requested overlap in kilometres.
        overlap_km: f64,
    },

    /// Longitude degrees are undefined at the reference latitude.
    #[error("Cannot compute longitude degrees at the poles (reference latitude {0})")]
    PolarReference(f64),

    /// The AOI polygon is malformed.
    #[error("Invalid area of interest: {0}")]
    InvalidAoi(String),

    /// No grid cell overlaps the AOI.
    #[error("No tiles generated for the provided geometry")]
    NoTiles,

    /// A tile directory listing found nothing.
    #[error("No tiles found matching pattern {pattern} in directory {}", .dir.display())]
    NoTileFiles {
        /// Glob-style description of the expected names.
        pattern: String,
        /// Directory that was scanned.
        dir: PathBuf,
    },

    /// I/O error while inspecting or creating the tile directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GridError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GridError::NonPositiveTileSize { .. }
            | GridError::NegativeOverlap(_)
            | GridError::OverlapTooLarge { .. }
            | GridError::PolarReference(_)
            | GridError::InvalidAoi(_)
            | GridError::NoTiles => ErrorKind::Configuration,
            GridError::NoTileFiles { .. } => ErrorKind::Precondition,
            GridError::Io(_) => ErrorKind::Io,
        }
    }
}
