//! Output grid derivation and tile placement.

use crate::{MosaicError, Result};
use aoitile_raster::{GeoTransform, RasterBounds, RasterInfo, Window};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Relative tolerance when comparing pixel sizes and transforms.
pub const RESOLUTION_TOLERANCE: f64 = 1e-9;

/// Decimal places pixel coordinates are rounded to before snapping to
/// whole pixels.
const WINDOW_PRECISION: f64 = 1e6;

/// A tile and where it lands in the output grid.
#[derive(Debug, Clone)]
pub struct PlacedTile {
    pub path: PathBuf,
    pub info: RasterInfo,
    pub window: Window,
}

/// Everything known about a mosaic before any pixel is written.
#[derive(Debug, Clone)]
pub struct MosaicPlan {
    /// Metadata of the output raster.
    pub output: RasterInfo,
    /// Tiles in write order.
    pub tiles: Vec<PlacedTile>,
}

impl MosaicPlan {
    /// Read every tile's metadata, check them against the first tile, and
    /// place them in the union grid.
    ///
    /// The first tile is the reference for CRS, pixel size, band count and
    /// sample type. The output grid is anchored at the union's north-west
    /// corner; its nodata value is the reference's, or 0 when it has none.
    pub fn from_tiles<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut infos = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            infos.push((path.to_path_buf(), RasterInfo::read(path)?));
        }
        let Some((_, reference)) = infos.first() else {
            return Err(MosaicError::NoTiles);
        };
        let reference = reference.clone();

        let mut union: Option<RasterBounds> = None;
        for (path, info) in &infos {
            check_compatible(path, info, &reference)?;
            let bounds = info.bounds();
            union = Some(match union {
                Some(u) => u.union(&bounds),
                None => bounds,
            });
        }
        let Some(union) = union else {
            return Err(MosaicError::NoTiles);
        };

        let px = reference.transform.pixel_width;
        let py = reference.transform.pixel_height;
        let width = grid_size((union.max_x - union.min_x) / px);
        let height = grid_size((union.max_y - union.min_y) / py);
        let output = RasterInfo {
            width,
            height,
            transform: GeoTransform::new(union.min_x, union.max_y, px, py),
            nodata: Some(reference.nodata.unwrap_or(0.0)),
            ..reference
        };

        let mut tiles = Vec::with_capacity(infos.len());
        for (path, info) in infos {
            let window = placement_window(&path, &info, &output)?;
            debug!(
                path = %path.display(),
                col_off = window.col_off,
                row_off = window.row_off,
                width = window.width,
                height = window.height,
                "Placed tile"
            );
            tiles.push(PlacedTile { path, info, window });
        }

        Ok(Self { output, tiles })
    }

    /// Number of tiles.
    pub fn total(&self) -> usize {
        self.tiles.len()
    }

    /// Check that an existing raster can be resumed into.
    pub fn check_resumable(&self, path: &Path, existing: &RasterInfo) -> Result<()> {
        let expected = &self.output;
        let reason = if existing.width != expected.width || existing.height != expected.height {
            Some(format!(
                "dimensions {}x{}, expected {}x{}",
                existing.width, existing.height, expected.width, expected.height
            ))
        } else if !existing
            .transform
            .approx_eq(&expected.transform, RESOLUTION_TOLERANCE)
        {
            Some("transform differs".to_string())
        } else if existing.bands != expected.bands || existing.sample_type != expected.sample_type {
            Some(format!(
                "{} bands of {}, expected {} bands of {}",
                existing.bands, existing.sample_type, expected.bands, expected.sample_type
            ))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(MosaicError::ResumeMismatch {
                path: path.to_path_buf(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

fn check_compatible(path: &Path, info: &RasterInfo, reference: &RasterInfo) -> Result<()> {
    if !info.same_crs(reference) {
        return Err(MosaicError::CrsMismatch {
            path: path.to_path_buf(),
        });
    }
    if !info
        .transform
        .same_resolution(&reference.transform, RESOLUTION_TOLERANCE)
    {
        return Err(MosaicError::ResolutionMismatch {
            path: path.to_path_buf(),
            expected: (reference.transform.pixel_width, reference.transform.pixel_height),
            found: (info.transform.pixel_width, info.transform.pixel_height),
        });
    }
    if info.bands != reference.bands || info.sample_type != reference.sample_type {
        return Err(MosaicError::LayoutMismatch {
            path: path.to_path_buf(),
            reason: format!(
                "{} bands of {}, reference has {} bands of {}",
                info.bands, info.sample_type, reference.bands, reference.sample_type
            ),
        });
    }
    Ok(())
}

fn round_precision(v: f64) -> f64 {
    (v * WINDOW_PRECISION).round() / WINDOW_PRECISION
}

/// Whole pixels needed to span `pixels` (a fractional count).
fn grid_size(pixels: f64) -> u32 {
    round_precision(pixels).ceil().max(0.0) as u32
}

/// Window of `info` inside the `grid` raster.
///
/// Offsets are floored and lengths rounded after rounding to six decimals.
/// The result must have the tile's own pixel dimensions and fit inside the
/// grid; anything else means the tile is misaligned with the grid.
pub fn placement_window(path: &Path, info: &RasterInfo, grid: &RasterInfo) -> Result<Window> {
    let t = &grid.transform;
    let b = info.bounds();

    let col_off = round_precision((b.min_x - t.origin_x) / t.pixel_width).floor();
    let row_off = round_precision((t.origin_y - b.max_y) / t.pixel_height).floor();
    let width = round_precision((b.max_x - b.min_x) / t.pixel_width).round();
    let height = round_precision((b.max_y - b.min_y) / t.pixel_height).round();

    let mismatch = || MosaicError::WindowMismatch {
        path: path.to_path_buf(),
        tile_width: info.width,
        tile_height: info.height,
        window_width: width.max(0.0) as u32,
        window_height: height.max(0.0) as u32,
    };

    if col_off < 0.0 || row_off < 0.0 {
        return Err(mismatch());
    }
    let window = Window::new(col_off as u32, row_off as u32, width as u32, height as u32);
    if window.width != info.width
        || window.height != info.height
        || !window.fits(grid.width, grid.height)
    {
        return Err(mismatch());
    }
    Ok(window)
}
