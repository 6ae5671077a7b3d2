//! Raster metadata.

use crate::reader::RasterReader;
use crate::sample::SampleType;
use crate::transform::{GeoKeys, GeoTransform, RasterBounds};
use crate::Result;
use std::path::Path;

/// Logical description of a GeoTIFF: grid, sample layout, nodata and CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    pub width: u32,
    pub height: u32,
    /// Samples per pixel.
    pub bands: u16,
    pub sample_type: SampleType,
    pub transform: GeoTransform,
    /// Value of the `GDAL_NODATA` tag, if present and numeric.
    pub nodata: Option<f64>,
    /// Georeferencing keys, if present.
    pub geokeys: Option<GeoKeys>,
}

impl RasterInfo {
    /// Read the metadata of the GeoTIFF at `path` without decoding pixels.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        Ok(RasterReader::open(path)?.into_info())
    }

    /// Extent of the raster in CRS units.
    pub fn bounds(&self) -> RasterBounds {
        self.transform.bounds(self.width, self.height)
    }

    /// EPSG code of the raster CRS, if declared.
    pub fn epsg(&self) -> Option<u16> {
        self.geokeys.as_ref().and_then(GeoKeys::epsg)
    }

    /// True when both rasters declare the same CRS.
    ///
    /// EPSG codes are compared when both are known, otherwise the raw key
    /// directories must match.
    pub fn same_crs(&self, other: &RasterInfo) -> bool {
        match (self.epsg(), other.epsg()) {
            (Some(a), Some(b)) => a == b,
            _ => self.geokeys == other.geokeys,
        }
    }

    /// Bytes per pixel across all bands.
    pub fn pixel_bytes(&self) -> usize {
        usize::from(self.bands) * self.sample_type.size()
    }

    /// Size of the uncompressed pixel data in bytes.
    pub fn data_bytes(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * self.pixel_bytes() as u64
    }

    /// Value used for pixels without data: the declared nodata, else NaN for
    /// float rasters and 0 for integer rasters.
    pub fn fill_value(&self) -> f64 {
        match self.nodata {
            Some(v) => v,
            None if self.sample_type.is_float() => f64::NAN,
            None => 0.0,
        }
    }
}
