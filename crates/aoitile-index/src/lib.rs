//! Raster products derived from assembled imagery.
//!
//! - [`vegetation`]: NDVI and CIgreen from two bands on the same grid,
//!   written as single-band float32 GeoTIFFs with NaN nodata.
//! - [`clip`]: crop a raster to an AOI and mask pixels outside it.

pub mod clip;
pub mod error;
pub mod vegetation;

pub use clip::{clip, to_raster_crs, ClipReport};
pub use error::IndexError;
pub use vegetation::{
    cigreen, cigreen_pixel, compute, ndvi, ndvi_pixel, BandRef, IndexSummary, VegetationIndex,
    DEFAULT_NIR_BAND, DEFAULT_RED_BAND, DEFAULT_REFLECTANCE_SCALE,
};

/// Result type for index and clip operations.
pub type Result<T> = std::result::Result<T, IndexError>;
