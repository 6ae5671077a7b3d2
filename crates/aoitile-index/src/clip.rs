//! Clip a raster to an AOI polygon.

use crate::{IndexError, Result};
use aoitile_grid::AreaOfInterest;
use aoitile_raster::{RasterBounds, RasterInfo, RasterReader};
use geo::{BoundingRect, Contains, Coord, LineString, Point, Polygon};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const WGS84_LONLAT: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// Outcome of a clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipReport {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Pixels set to nodata because their centre is outside the AOI.
    pub masked: usize,
    /// Value written to masked pixels.
    pub nodata: f64,
}

/// PROJ.4 definition of a WGS84 UTM zone EPSG code (326zz north, 327zz south).
fn utm_proj4(epsg: u16) -> Option<String> {
    let (zone, south) = match epsg {
        32601..=32660 => (epsg - 32600, ""),
        32701..=32760 => (epsg - 32700, " +south"),
        _ => return None,
    };
    Some(format!(
        "+proj=utm +zone={zone}{south} +datum=WGS84 +units=m +no_defs +type=crs"
    ))
}

/// Express the lon/lat `polygon` in the CRS `epsg`.
///
/// Only EPSG:4326 (returned as is) and WGS84 UTM zones are supported;
/// `Ok(None)` means the CRS is not one of them.
pub fn to_raster_crs(polygon: &Polygon<f64>, epsg: u16) -> Result<Option<Polygon<f64>>> {
    if epsg == 4326 {
        return Ok(Some(polygon.clone()));
    }
    let Some(target) = utm_proj4(epsg) else {
        return Ok(None);
    };
    let projection_error = |reason: String| IndexError::Projection { epsg, reason };

    let from = Proj::from_proj_string(WGS84_LONLAT).map_err(|e| projection_error(format!("{e:?}")))?;
    let to = Proj::from_proj_string(&target).map_err(|e| projection_error(format!("{e:?}")))?;

    // Radians in, metres out
    let project_ring = |ring: &LineString<f64>| -> Result<LineString<f64>> {
        ring.coords()
            .map(|c| {
                let mut point = (c.x.to_radians(), c.y.to_radians(), 0.0);
                transform(&from, &to, &mut point).map_err(|e| projection_error(format!("{e:?}")))?;
                Ok(Coord {
                    x: point.0,
                    y: point.1,
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(LineString::from)
    };

    let exterior = project_ring(polygon.exterior())?;
    let interiors = polygon
        .interiors()
        .iter()
        .map(&project_ring)
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(Polygon::new(exterior, interiors)))
}

/// Crop `input` to the bounding box of `aoi` and set pixels whose centre is
/// outside the AOI to nodata, writing the result to `output`.
///
/// Masked pixels get the source nodata value, else NaN for float rasters,
/// else 0; the output declares that value as its nodata.
pub fn clip(input: impl AsRef<Path>, aoi: &AreaOfInterest, output: impl AsRef<Path>) -> Result<ClipReport> {
    let input = input.as_ref();
    let output = output.as_ref();

    let mut reader = RasterReader::open(input)?;
    let info = reader.info().clone();

    let unsupported = || IndexError::UnsupportedCrs {
        path: input.to_path_buf(),
        crs: info
            .epsg()
            .map_or_else(|| "unknown".to_string(), |c| format!("EPSG:{c}")),
    };
    let epsg = info.epsg().ok_or_else(unsupported)?;
    let polygon = to_raster_crs(aoi.polygon(), epsg)?.ok_or_else(unsupported)?;

    let rect = polygon
        .bounding_rect()
        .ok_or_else(|| IndexError::NoOverlap(input.to_path_buf()))?;
    let aoi_bounds = RasterBounds {
        min_x: rect.min().x,
        min_y: rect.min().y,
        max_x: rect.max().x,
        max_y: rect.max().y,
    };
    let overlap = info
        .bounds()
        .intersection(&aoi_bounds)
        .ok_or_else(|| IndexError::NoOverlap(input.to_path_buf()))?;

    let (col_off, row_off, width, height) = crop_window(&info, &overlap);
    if width == 0 || height == 0 {
        return Err(IndexError::NoOverlap(input.to_path_buf()));
    }
    debug!(col_off, row_off, width, height, "Crop window");

    let values = reader.read_f64()?;
    let bands = usize::from(info.bands);
    let transform = info.transform.offset(col_off, row_off);
    let fill = info.fill_value();

    let mut clipped = Vec::with_capacity(width as usize * height as usize * bands);
    let mut masked = 0usize;
    for row in 0..height {
        let src_row = (row_off + row) as usize;
        for col in 0..width {
            let (x, y) = transform.pixel_center(col, row);
            let inside = polygon.contains(&Point::new(x, y));
            if !inside {
                masked += 1;
            }
            let start = (src_row * info.width as usize + (col_off + col) as usize) * bands;
            for &v in &values[start..start + bands] {
                clipped.push(if inside { v } else { fill });
            }
        }
    }

    let out_info = RasterInfo {
        width,
        height,
        transform,
        nodata: Some(fill),
        ..info.clone()
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    aoitile_raster::write_raster(output, &out_info, &clipped)?;

    info!(
        "Saved clipped raster to {} ({}x{}, {} pixels outside {})",
        output.display(),
        width,
        height,
        masked,
        aoi.name()
    );
    Ok(ClipReport {
        output: output.to_path_buf(),
        width,
        height,
        masked,
        nodata: fill,
    })
}

/// Pixel window `(col_off, row_off, width, height)` covering `bounds`.
fn crop_window(info: &RasterInfo, bounds: &RasterBounds) -> (u32, u32, u32, u32) {
    let (left, top) = info.transform.to_pixel(bounds.min_x, bounds.max_y);
    let (right, bottom) = info.transform.to_pixel(bounds.max_x, bounds.min_y);

    let clamp = |v: f64, max: u32| v.clamp(0.0, f64::from(max)) as u32;
    let col0 = clamp(round6(left).floor(), info.width);
    let row0 = clamp(round6(top).floor(), info.height);
    let col1 = clamp(round6(right).ceil(), info.width);
    let row1 = clamp(round6(bottom).ceil(), info.height);
    (col0, row0, col1.saturating_sub(col0), row1.saturating_sub(row0))
}

fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}
