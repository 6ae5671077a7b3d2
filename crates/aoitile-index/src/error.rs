//! Error types for raster products.

use aoitile_grid::{ErrorKind, GridError};
use aoitile_raster::RasterError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while deriving index or clipped rasters.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Raster read or write failure.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// Invalid AOI.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// I/O error creating the output directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The two inputs are not on the same grid.
    #[error(
        "Input rasters differ in CRS or transform; align them first ({} vs {})",
        .first.display(),
        .second.display()
    )]
    Misaligned {
        first: PathBuf,
        second: PathBuf,
    },

    /// The raster CRS cannot be clipped against a lon/lat AOI.
    #[error("Unsupported CRS {crs} for {}; expected EPSG:4326 or a WGS84 UTM zone", .path.display())]
    UnsupportedCrs {
        path: PathBuf,
        /// `EPSG:<code>`, or `unknown` when the raster declares none.
        crs: String,
    },

    /// The AOI does not overlap the raster.
    #[error("AOI does not overlap {}", .0.display())]
    NoOverlap(PathBuf),

    /// Reprojecting the AOI failed.
    #[error("Failed to reproject AOI to EPSG:{epsg}: {reason}")]
    Projection {
        epsg: u16,
        reason: String,
    },
}

impl IndexError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            IndexError::Raster(e) => e.kind(),
            IndexError::Grid(e) => e.kind(),
            IndexError::Io(_) => ErrorKind::Io,
            IndexError::Misaligned { .. }
            | IndexError::UnsupportedCrs { .. }
            | IndexError::NoOverlap(_)
            | IndexError::Projection { .. } => ErrorKind::Precondition,
        }
    }
}
