//! # aoitile-mosaic
//!
//! Assembles GeoTIFF tiles into one raster.
//!
//! The first tile is the reference: every other tile must share its CRS,
//! pixel size, band count and sample type. The output grid spans the union
//! of all tile bounds and each tile is copied into its window, whole or
//! block by block depending on its size. Overlapping pixels take the value
//! of the tile written last.
//!
//! A run that fails part-way leaves the output in place and reports the tile
//! it stopped at ([`MosaicError::resume_tile`]); passing that index as
//! [`MosaicOptions::start_tile`] resumes into the existing file after
//! checking that its grid still matches the tiles.
//!
//! ```no_run
//! use aoitile_grid::TileTemplate;
//! use aoitile_mosaic::{accumulate, MosaicOptions};
//!
//! let template = TileTemplate::from_base("map/2020/naturalforest/brahmanbaria_naturalforest_2020.tif");
//! let tiles: Vec<_> = template.list()?.into_iter().map(|t| t.path).collect();
//! let report = accumulate(&tiles, "map/2020/naturalforest/mosaic.tif", &MosaicOptions::default())?;
//! println!("{}x{} pixels", report.width, report.height);
//! # Ok::<(), aoitile_mosaic::MosaicError>(())
//! ```

mod accumulate;
mod error;
mod plan;

pub use accumulate::{
    accumulate, Accumulator, CopyMode, MosaicOptions, MosaicReport,
    DEFAULT_MAX_TILE_MB, DEFAULT_PROGRESS_INTERVAL,
};
pub use error::MosaicError;
pub use plan::{placement_window, MosaicPlan, PlacedTile, RESOLUTION_TOLERANCE};

/// Result type for mosaic operations.
pub type Result<T> = std::result::Result<T, MosaicError>;
