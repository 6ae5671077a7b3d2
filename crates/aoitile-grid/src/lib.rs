//! # aoitile-grid
//!
//! Partitions a geographic area of interest (AOI) into an ordered grid of
//! overlapping rectangular tiles and keeps track of which tiles exist on disk.
//!
//! ## Overview
//!
//! A tile grid is a pure function of the AOI polygon and a [`TileSpec`]
//! (tile width, height and overlap in kilometres). The same grid can be
//! recomputed at download time, check time and mosaic time without persisting
//! any tile metadata:
//!
//! - Rows start at the southern edge of the AOI bounding box and grow northward.
//! - Columns start at the western edge and grow eastward.
//! - Tiles are emitted in `(row, col)` ascending order.
//! - Grid cells that do not overlap the AOI polygon are dropped, so the
//!   numbering has gaps for irregular AOIs.
//!
//! Tile files follow the naming convention `{stem}_r{row:02}_c{col:02}{suffix}`.
//!
//! ## Example
//!
//! ```no_run
//! use aoitile_grid::{reconcile, tile, AreaOfInterest, TileSpec, TileTemplate};
//!
//! let aoi = AreaOfInterest::brahmanbaria();
//! let spec = TileSpec::new(2.5, 2.5, 0.5)?;
//! let tiles = tile(&aoi, &spec)?;
//!
//! let template = TileTemplate::from_base("map/2017/alphaearth/brahmanbaria_alphaearth_2017.tif");
//! let report = reconcile(&tiles, &template)?;
//! println!("{} of {} tiles missing", report.missing.len(), tiles.len());
//! # Ok::<(), aoitile_grid::GridError>(())
//! ```

mod aoi;
mod error;
mod naming;
mod reconcile;
mod spec;
mod tiler;

pub use aoi::{AreaOfInterest, BRAHMANBARIA_AOI_NAME, BRAHMANBARIA_VERTICES};
pub use error::{ErrorKind, GridError};
pub use naming::{TileFile, TileTemplate, DEFAULT_TILE_STEM, DEFAULT_TILE_SUFFIX};
pub use reconcile::{reconcile, Reconciliation};
pub use spec::{km_to_deg_lat, km_to_deg_lon, TileSpec, KM_PER_DEGREE};
pub use tiler::{tile, Tile, TileBounds, MIN_TILE_AREA_M2};

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
