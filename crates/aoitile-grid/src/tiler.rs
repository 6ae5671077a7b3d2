//! The AOI tiler: partitions an AOI bounding box into an ordered grid of
//! overlapping rectangles and keeps those that intersect the AOI.

use crate::aoi::AreaOfInterest;
use crate::spec::{km_to_deg_lat, km_to_deg_lon, TileSpec, KM_PER_DEGREE};
use crate::Result;
use geo::{Area, BooleanOps, Coord, MultiPolygon, Polygon, Rect};
use tracing::debug;

/// Minimum intersection area, in square metres, for a tile to be retained.
pub const MIN_TILE_AREA_M2: f64 = 1.0;

/// Geographic bounds of a tile rectangle (degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    /// Western edge (longitude)
    pub min_lon: f64,
    /// Southern edge (latitude)
    pub min_lat: f64,
    /// Eastern edge (longitude)
    pub max_lon: f64,
    /// Northern edge (latitude)
    pub max_lat: f64,
}

impl TileBounds {
    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Latitude halfway between the southern and northern edges.
    pub fn mid_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }

    /// Check if a point is within these bounds (edges inclusive).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// The bounds as a `geo` rectangle.
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_lon,
                y: self.min_lat,
            },
            Coord {
                x: self.max_lon,
                y: self.max_lat,
            },
        )
    }

    /// The bounds as a closed, counter-clockwise polygon.
    pub fn to_polygon(&self) -> Polygon<f64> {
        self.to_rect().to_polygon()
    }
}

/// One cell of the tile grid that overlaps the AOI.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Grid row, 0 at the south edge of the AOI bounding box
    pub row: u32,
    /// Grid column, 0 at the west edge of the AOI bounding box
    pub col: u32,
    /// Raw rectangle of the cell, clipped to the bounding box
    pub bounds: TileBounds,
    /// Intersection of the rectangle with the AOI polygon
    pub geometry: MultiPolygon<f64>,
}

impl Tile {
    /// `(row, col)` key used for ordering and lookups.
    pub fn key(&self) -> (u32, u32) {
        (self.row, self.col)
    }
}

/// Partition `aoi` into overlapping tiles of `spec`.
///
/// The grid starts at the south-west corner of the AOI bounding box. Cell
/// origins are `min + index * step` with `step = size - overlap`; the walk
/// continues while the origin is strictly inside the box, and the last cell
/// on each axis is clipped to the far edge. Longitude distances are scaled by
/// the cosine of the bounding box mid-latitude.
///
/// Cells whose intersection with the AOI is not larger than
/// [`MIN_TILE_AREA_M2`] are dropped, but still consume their `(row, col)`
/// index so that numbering depends only on the inputs. The result is ordered
/// by `(row, col)` ascending.
pub fn tile(aoi: &AreaOfInterest, spec: &TileSpec) -> Result<Vec<Tile>> {
    let bbox = aoi.bounds();
    let ref_lat = bbox.mid_lat();

    let tile_w = km_to_deg_lon(spec.width_km(), ref_lat)?;
    let tile_h = km_to_deg_lat(spec.height_km());
    let step_lon = tile_w - km_to_deg_lon(spec.overlap_km(), ref_lat)?;
    let step_lat = tile_h - km_to_deg_lat(spec.overlap_km());

    // Square degrees to square metres at the reference latitude
    let m_per_deg = KM_PER_DEGREE * 1000.0;
    let area_scale = m_per_deg * m_per_deg * ref_lat.to_radians().cos();

    let aoi_polygon = aoi.polygon();
    let mut tiles = Vec::new();
    let mut candidates = 0usize;

    let mut row = 0u32;
    loop {
        let lat_start = bbox.min_lat + f64::from(row) * step_lat;
        if lat_start >= bbox.max_lat {
            break;
        }
        let lat_end = (lat_start + tile_h).min(bbox.max_lat);

        let mut col = 0u32;
        loop {
            let lon_start = bbox.min_lon + f64::from(col) * step_lon;
            if lon_start >= bbox.max_lon {
                break;
            }
            let lon_end = (lon_start + tile_w).min(bbox.max_lon);
            candidates += 1;

            let bounds = TileBounds {
                min_lon: lon_start,
                min_lat: lat_start,
                max_lon: lon_end,
                max_lat: lat_end,
            };
            let geometry = bounds.to_polygon().intersection(aoi_polygon);
            let area_m2 = geometry.unsigned_area() * area_scale;
            if area_m2 > MIN_TILE_AREA_M2 {
                tiles.push(Tile {
                    row,
                    col,
                    bounds,
                    geometry,
                });
            }
            col += 1;
        }
        row += 1;
    }

    debug!(
        aoi = aoi.name(),
        candidates,
        retained = tiles.len(),
        step_lon,
        step_lat,
        "Tiled AOI"
    );

    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> AreaOfInterest {
        AreaOfInterest::from_vertices(
            "square",
            &[[min, min], [max, min], [max, max], [min, max], [min, min]],
        )
        .unwrap()
    }

    #[test]
    fn test_bounds_helpers() {
        let b = TileBounds {
            min_lon: 90.0,
            min_lat: 23.0,
            max_lon: 91.0,
            max_lat: 24.0,
        };
        assert_eq!(b.width(), 1.0);
        assert_eq!(b.height(), 1.0);
        assert_eq!(b.mid_lat(), 23.5);
        assert!(b.contains(90.5, 23.5));
        assert!(!b.contains(91.5, 23.5));
        assert_eq!(b.to_polygon().exterior().0.len(), 5);
    }

    #[test]
    fn test_single_tile_covers_small_aoi() {
        // AOI much smaller than one tile
        let aoi = square(0.0, 0.01);
        let spec = TileSpec::new(10.0, 10.0, 0.0).unwrap();
        let tiles = tile(&aoi, &spec).unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].key(), (0, 0));
        // Clipped to the bounding box
        assert_eq!(tiles[0].bounds.max_lon, 0.01);
        assert_eq!(tiles[0].bounds.max_lat, 0.01);
    }

    #[test]
    fn test_last_tile_clipped_to_far_edge() {
        let aoi = square(0.0, 0.25);
        let spec = TileSpec::new(11.132, 11.132, 0.0).unwrap();
        let tiles = tile(&aoi, &spec).unwrap();
        let max_row = tiles.iter().map(|t| t.row).max().unwrap();
        for t in &tiles {
            assert!(t.bounds.max_lat <= 0.25);
            assert!(t.bounds.max_lon <= 0.25);
            if t.row == max_row {
                assert_eq!(t.bounds.max_lat, 0.25);
            }
        }
        // 0.1 degree tiles on the latitude axis: 0.0, 0.1, 0.2
        assert_eq!(max_row, 2);
    }

    #[test]
    fn test_high_latitude_aoi_tiles() {
        let aoi = AreaOfInterest::from_vertices(
            "arctic",
            &[[0.0, 89.0], [10.0, 89.0], [10.0, 90.0], [0.0, 90.0]],
        )
        .unwrap();
        // Mid-latitude 89.5: one degree of longitude is under a kilometre
        let spec = TileSpec::new(10.0, 10.0, 1.0).unwrap();
        let tiles = tile(&aoi, &spec).unwrap();
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|t| t.col == 0));
    }
}
