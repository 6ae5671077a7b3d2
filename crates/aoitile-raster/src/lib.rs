//! # aoitile-raster
//!
//! GeoTIFF access for tile mosaics, implemented on the `tiff` crate without
//! GDAL.
//!
//! ## Overview
//!
//! - [`RasterInfo`] describes a raster: size, band count, [`SampleType`],
//!   north-up [`GeoTransform`], nodata value and GeoTIFF keys. The transform
//!   is taken from `ModelPixelScale` + `ModelTiepoint` or from a non-rotated
//!   `ModelTransformation`; nodata comes from the `GDAL_NODATA` tag.
//! - [`RasterReader`] decodes pixels, either the whole image at once or one
//!   strip/tile at a time to bound memory.
//! - [`RasterWriter`] creates an uncompressed strip GeoTIFF pre-filled with
//!   nodata (BigTIFF above 4 GiB) and overwrites arbitrary pixel
//!   [`Window`]s in place.
//!
//! Only pixel-interleaved (chunky) files with 8-64 bit samples are handled.
//!
//! ## Example
//!
//! ```no_run
//! use aoitile_raster::{RasterInfo, RasterReader, RasterWriter, Window};
//!
//! let info = RasterInfo::read("tiles/s2_r00_c00.tif")?;
//! let mut out = RasterWriter::create("mosaic.tif", &RasterInfo { width: info.width * 2, ..info.clone() })?;
//!
//! let mut reader = RasterReader::open("tiles/s2_r00_c00.tif")?;
//! let data = reader.read_bytes(out.byte_order())?;
//! out.write_window(Window::full(info.width, info.height), &data)?;
//! out.finish()?;
//! # Ok::<(), aoitile_raster::RasterError>(())
//! ```

mod error;
mod info;
mod reader;
mod sample;
mod transform;
mod window;
mod writer;

pub use error::RasterError;
pub use info::RasterInfo;
pub use reader::RasterReader;
pub use sample::{ByteOrder, SampleType};
pub use transform::{GeoKeys, GeoTransform, RasterBounds};
pub use window::Window;
pub use writer::{write_raster, RasterWriter};

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
