//! Imagery export for AOI tile sets.
//!
//! The [`ImageryProvider`] trait is the seam between the tile grid and
//! whatever service renders pixels for a tile. [`HttpProvider`] talks to an
//! export endpoint through a URL template; [`download_tiles`] walks a tile
//! set and writes one file per tile with the grid's naming convention.
//!
//! ```no_run
//! use aoitile_grid::{tile, AreaOfInterest, TileSpec, TileTemplate};
//! use aoitile_provider::{download_tiles, DownloadMode, ExportParams, HttpProvider, HttpProviderConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tiles = tile(&AreaOfInterest::brahmanbaria(), &TileSpec::square(10.0, 1.0)?)?;
//! let provider = HttpProvider::new(HttpProviderConfig::new(
//!     "https://export.example.org/s2?bbox={lon_min},{lat_min},{lon_max},{lat_max}",
//! ))?;
//! let template = TileTemplate::from_base("data/s2/brahmanbaria_s2.tif");
//! download_tiles(&provider, &tiles, &template, &ExportParams::default(), DownloadMode::MissingOnly)?;
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod error;
pub mod http;
pub mod provider;
pub mod request;

pub use driver::{download_tiles, DownloadMode, DownloadReport};
pub use error::ProviderError;
pub use http::{part_path, DownloadStats, HttpProvider, HttpProviderConfig, DEFAULT_TIMEOUT_SECS};
pub use provider::ImageryProvider;
pub use request::{ExportParams, TileRequest};

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
