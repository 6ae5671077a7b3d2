//! Per-tile export requests.

use aoitile_grid::{Tile, TileBounds};
use geo::MultiPolygon;

/// Export settings shared by every tile of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportParams {
    /// CRS of the exported raster, e.g. `EPSG:4326`.
    pub crs: String,
    /// Pixel size in metres.
    pub scale: f64,
    /// Acquisition year, when the dataset is yearly.
    pub year: Option<i32>,
}

impl Default for ExportParams {
    fn default() -> Self {
        Self {
            crs: "EPSG:4326".to_string(),
            scale: 10.0,
            year: None,
        }
    }
}

/// Everything a provider needs to export one tile.
///
/// The exported raster covers `bounds`, the tile rectangle; `region` is the
/// part of it inside the AOI.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRequest {
    pub row: u32,
    pub col: u32,
    pub bounds: TileBounds,
    pub region: MultiPolygon<f64>,
    pub params: ExportParams,
}

impl TileRequest {
    pub fn new(tile: &Tile, params: &ExportParams) -> Self {
        Self {
            row: tile.row,
            col: tile.col,
            bounds: tile.bounds,
            region: tile.geometry.clone(),
            params: params.clone(),
        }
    }

    /// GeoJSON `MultiPolygon` coordinates of the region.
    pub fn region_coordinates(&self) -> Vec<Vec<Vec<[f64; 2]>>> {
        self.region
            .0
            .iter()
            .map(|polygon| {
                std::iter::once(polygon.exterior())
                    .chain(polygon.interiors())
                    .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
                    .collect()
            })
            .collect()
    }
}
