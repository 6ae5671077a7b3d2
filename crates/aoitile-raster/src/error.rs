//! Error types for the raster crate.

use aoitile_grid::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing GeoTIFF rasters.
#[derive(Debug, Error)]
pub enum RasterError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF encoding or decoding error.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// The file is a TIFF but lacks required GeoTIFF information.
    #[error("Invalid GeoTIFF {}: {reason}", .path.display())]
    InvalidGeoTiff {
        /// Offending file.
        path: PathBuf,
        /// What is missing or malformed.
        reason: String,
    },

    /// The file uses a layout or sample type this crate does not handle.
    #[error("Unsupported raster {}: {reason}", .path.display())]
    Unsupported {
        /// Offending file.
        path: PathBuf,
        /// Which feature is unsupported.
        reason: String,
    },

    /// A window does not fit inside the raster.
    #[error(
        "Window {width}x{height} at ({col_off}, {row_off}) exceeds raster size \
         {raster_width}x{raster_height}"
    )]
    WindowOutOfBounds {
        col_off: u32,
        row_off: u32,
        width: u32,
        height: u32,
        raster_width: u32,
        raster_height: u32,
    },

    /// The buffer passed to a window write has the wrong length.
    #[error("Buffer holds {actual} bytes but the window needs {expected}")]
    BufferSize {
        /// Bytes required by the window.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },

    /// A 1-based band index is out of range.
    #[error("Band {band} out of range (raster has {bands} bands)")]
    BandOutOfRange {
        /// Requested band.
        band: u16,
        /// Band count of the raster.
        bands: u16,
    },
}

impl RasterError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RasterError::Io(_) | RasterError::Tiff(_) => ErrorKind::Io,
            RasterError::InvalidGeoTiff { .. }
            | RasterError::Unsupported { .. }
            | RasterError::WindowOutOfBounds { .. } => ErrorKind::Precondition,
            RasterError::BufferSize { .. } => ErrorKind::Io,
            RasterError::BandOutOfRange { .. } => ErrorKind::Configuration,
        }
    }

    pub(crate) fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RasterError::InvalidGeoTiff {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RasterError::Unsupported {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
