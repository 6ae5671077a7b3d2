//! Pixel-wise vegetation indices from two single bands.

use crate::{IndexError, Result};
use aoitile_raster::{RasterInfo, RasterReader, SampleType};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Red band of the 8-band composite (B2, B3, B4, B5, B6, B7, B8, B8A).
pub const DEFAULT_RED_BAND: u16 = 3;
/// NIR band (B8) of the 8-band composite.
pub const DEFAULT_NIR_BAND: u16 = 7;
/// Sentinel-2 L2A digital numbers to reflectance.
pub const DEFAULT_REFLECTANCE_SCALE: f64 = 1.0 / 10_000.0;

/// Largest plausible L2A digital number.
const MAX_DN: f64 = 12_000.0;
/// Largest plausible surface reflectance.
const MAX_REFLECTANCE: f64 = 1.5;
/// CIgreen values outside `[-LIMIT, LIMIT]` are discarded.
const CIGREEN_LIMIT: f64 = 5.0;

/// One band of a raster file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandRef {
    pub path: PathBuf,
    /// 1-based band index.
    pub band: u16,
}

impl BandRef {
    pub fn new(path: impl Into<PathBuf>, band: u16) -> Self {
        Self {
            path: path.into(),
            band,
        }
    }
}

/// Supported indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VegetationIndex {
    /// `(NIR - Red) / (NIR + Red)`
    Ndvi,
    /// `NIR / Green - 1` on reflectances scaled by `scale`
    CiGreen { scale: f64 },
}

impl fmt::Display for VegetationIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VegetationIndex::Ndvi => write!(f, "NDVI"),
            VegetationIndex::CiGreen { .. } => write!(f, "CIgreen"),
        }
    }
}

/// Valid-value statistics of a written index raster.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSummary {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Pixels with a finite index value.
    pub valid: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// NDVI of one pixel; NaN when `nir + red` is zero.
pub fn ndvi_pixel(nir: f64, red: f64) -> f64 {
    let denom = nir + red;
    if denom == 0.0 {
        return f64::NAN;
    }
    (nir - red) / denom
}

/// CIgreen of one pixel from raw digital numbers.
///
/// NaN when either DN is outside `(0, 12000]`, either reflectance is
/// implausible (green not above zero, NIR negative, or either above 1.5) or
/// the index falls outside `[-5, 5]`.
pub fn cigreen_pixel(nir_dn: f64, green_dn: f64, scale: f64) -> f64 {
    let dn_ok = |dn: f64| dn > 0.0 && dn <= MAX_DN;
    if !dn_ok(nir_dn) || !dn_ok(green_dn) {
        return f64::NAN;
    }
    let green = green_dn * scale;
    let nir = nir_dn * scale;
    if green <= 0.0
        || green.abs() < 1e-6
        || nir < 0.0
        || green > MAX_REFLECTANCE
        || nir > MAX_REFLECTANCE
    {
        return f64::NAN;
    }
    let value = nir / green - 1.0;
    if !(-CIGREEN_LIMIT..=CIGREEN_LIMIT).contains(&value) {
        return f64::NAN;
    }
    value
}

/// Compute NDVI from `red` and `nir` into a float32 GeoTIFF at `output`.
pub fn ndvi(red: &BandRef, nir: &BandRef, output: impl AsRef<Path>) -> Result<IndexSummary> {
    compute(VegetationIndex::Ndvi, red, nir, output.as_ref())
}

/// Compute CIgreen from `green` and `nir` into a float32 GeoTIFF at `output`.
pub fn cigreen(
    green: &BandRef,
    nir: &BandRef,
    scale: f64,
    output: impl AsRef<Path>,
) -> Result<IndexSummary> {
    compute(VegetationIndex::CiGreen { scale }, green, nir, output.as_ref())
}

/// Compute `index` from a visible band (red for NDVI, green for CIgreen)
/// and a NIR band.
pub fn compute(
    index: VegetationIndex,
    visible: &BandRef,
    nir: &BandRef,
    output: &Path,
) -> Result<IndexSummary> {
    let (info, vis_values, vis_nodata) = load(visible)?;
    let (nir_info, nir_values, nir_nodata) = load(nir)?;

    if info.width != nir_info.width
        || info.height != nir_info.height
        || !info.same_crs(&nir_info)
        || !info.transform.approx_eq(&nir_info.transform, 1e-9)
    {
        return Err(IndexError::Misaligned {
            first: visible.path.clone(),
            second: nir.path.clone(),
        });
    }
    debug!(%index, width = info.width, height = info.height, "Computing index");

    let is_nodata = |v: f64, nodata: Option<f64>| nodata.is_some_and(|n| v == n);
    let values: Vec<f64> = vis_values
        .iter()
        .zip(&nir_values)
        .map(|(&v, &n)| {
            if is_nodata(v, vis_nodata) || is_nodata(n, nir_nodata) {
                return f64::NAN;
            }
            match index {
                VegetationIndex::Ndvi => ndvi_pixel(n, v),
                VegetationIndex::CiGreen { scale } => cigreen_pixel(n, v, scale),
            }
        })
        .collect();

    let out_info = RasterInfo {
        width: info.width,
        height: info.height,
        bands: 1,
        sample_type: SampleType::F32,
        transform: info.transform,
        nodata: Some(f64::NAN),
        geokeys: info.geokeys.clone(),
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    aoitile_raster::write_raster(output, &out_info, &values)?;

    let summary = summarize(output, &out_info, &values);
    match (summary.min, summary.max) {
        (Some(min), Some(max)) => info!(
            "Saved {} to {} ({} valid pixels, min {:.4} max {:.4})",
            index,
            output.display(),
            summary.valid,
            min,
            max
        ),
        _ => info!("Saved {} to {} (no valid pixels)", index, output.display()),
    }
    Ok(summary)
}

fn load(band: &BandRef) -> Result<(RasterInfo, Vec<f64>, Option<f64>)> {
    let mut reader = RasterReader::open(&band.path)?;
    let values = reader.read_band(band.band)?;
    let info = reader.into_info();
    let nodata = info.nodata;
    Ok((info, values, nodata))
}

fn summarize(output: &Path, info: &RasterInfo, values: &[f64]) -> IndexSummary {
    let mut summary = IndexSummary {
        output: output.to_path_buf(),
        width: info.width,
        height: info.height,
        valid: 0,
        min: None,
        max: None,
    };
    for &v in values.iter().filter(|v| v.is_finite()) {
        summary.valid += 1;
        summary.min = Some(summary.min.map_or(v, |m| m.min(v)));
        summary.max = Some(summary.max.map_or(v, |m| m.max(v)));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ndvi_pixel() {
        assert_relative_eq!(ndvi_pixel(0.5, 0.1), 0.6667, epsilon = 1e-4);
        assert_relative_eq!(ndvi_pixel(0.1, 0.5), -0.6667, epsilon = 1e-4);
        assert!(ndvi_pixel(0.0, 0.0).is_nan());
        assert!(ndvi_pixel(0.3, -0.3).is_nan());
    }

    #[test]
    fn test_cigreen_pixel() {
        // Reflectances 0.4 / 0.1
        assert_relative_eq!(cigreen_pixel(4000.0, 1000.0, DEFAULT_REFLECTANCE_SCALE), 3.0, epsilon = 1e-12);
        assert_relative_eq!(cigreen_pixel(0.4, 0.2, 1.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cigreen_pixel_rejects_implausible_inputs() {
        let s = DEFAULT_REFLECTANCE_SCALE;
        assert!(cigreen_pixel(4000.0, 0.0, s).is_nan());
        assert!(cigreen_pixel(-1.0, 1000.0, s).is_nan());
        assert!(cigreen_pixel(4000.0, 12_001.0, s).is_nan());
        // 1.6 reflectance
        assert!(cigreen_pixel(16_000.0, 1000.0, s).is_nan());
        // 7.0 is outside [-5, 5]
        assert!(cigreen_pixel(8000.0, 1000.0, s).is_nan());
        // green reflectance below 1e-6
        assert!(cigreen_pixel(0.5, 1e-7, 1.0).is_nan());
    }
}
