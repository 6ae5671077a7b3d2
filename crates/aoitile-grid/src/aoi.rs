//! Area of interest polygon.

use crate::tiler::TileBounds;
use crate::{GridError, Result};
use geo::{Area, BoundingRect, Coord, LineString, Polygon};

/// Name of the built-in Brahmanbaria AOI.
pub const BRAHMANBARIA_AOI_NAME: &str = "BRAHMANBARIA_BBOX";

/// Vertices of the Brahmanbaria AOI as `[lon, lat]` pairs (closed ring).
pub const BRAHMANBARIA_VERTICES: [[f64; 2]; 5] = [
    [90.5024, 24.4451], // upper left
    [90.6174, 23.5101], // lower left
    [91.4834, 23.5049], // lower right
    [91.4655, 24.3480], // upper right
    [90.5024, 24.4451],
];

/// A named geographic polygon in EPSG:4326 (longitude, latitude).
///
/// The polygon is validated on construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOfInterest {
    name: String,
    polygon: Polygon<f64>,
}

impl AreaOfInterest {
    /// Build an AOI from `[lon, lat]` vertex pairs.
    ///
    /// The ring may be given closed (first == last) or open; an open ring is
    /// closed implicitly. Fails if the ring has fewer than three distinct
    /// vertices, contains coordinates outside the valid lon/lat range, or
    /// encloses no area.
    pub fn from_vertices(name: impl Into<String>, vertices: &[[f64; 2]]) -> Result<Self> {
        let name = name.into();

        for &[lon, lat] in vertices {
            if !lon.is_finite() || !lat.is_finite() {
                return Err(GridError::InvalidAoi(format!(
                    "{name}: vertex ({lon}, {lat}) is not finite"
                )));
            }
            if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
                return Err(GridError::InvalidAoi(format!(
                    "{name}: vertex ({lon}, {lat}) is outside the lon/lat range"
                )));
            }
        }

        let mut coords: Vec<Coord<f64>> = vertices
            .iter()
            .map(|&[x, y]| Coord { x, y })
            .collect();
        coords.dedup();
        if coords.len() > 1 && coords.first() == coords.last() {
            coords.pop();
        }
        if coords.len() < 3 {
            return Err(GridError::InvalidAoi(format!(
                "{name}: a polygon needs at least 3 distinct vertices, got {}",
                coords.len()
            )));
        }

        let polygon = Polygon::new(LineString::from(coords), vec![]);
        if polygon.unsigned_area() <= 0.0 {
            return Err(GridError::InvalidAoi(format!("{name}: polygon has no area")));
        }

        Ok(Self { name, polygon })
    }

    /// The Brahmanbaria district bounding polygon used by the default configuration.
    pub fn brahmanbaria() -> Self {
        let coords: Vec<Coord<f64>> = BRAHMANBARIA_VERTICES
            .iter()
            .map(|&[x, y]| Coord { x, y })
            .collect();
        Self {
            name: BRAHMANBARIA_AOI_NAME.to_string(),
            polygon: Polygon::new(LineString::from(coords), vec![]),
        }
    }

    /// AOI name, used in reports.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The AOI polygon.
    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Closed exterior ring as `[lon, lat]` pairs.
    pub fn vertices(&self) -> Vec<[f64; 2]> {
        self.polygon.exterior().coords().map(|c| [c.x, c.y]).collect()
    }

    /// Axis-aligned bounding box of the polygon.
    pub fn bounds(&self) -> TileBounds {
        // A validated polygon always has at least three coordinates.
        let rect = self
            .polygon
            .bounding_rect()
            .unwrap_or_else(|| geo::Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.0 }));
        TileBounds {
            min_lon: rect.min().x,
            min_lat: rect.min().y,
            max_lon: rect.max().x,
            max_lat: rect.max().y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brahmanbaria_bounds() {
        let aoi = AreaOfInterest::brahmanbaria();
        let b = aoi.bounds();
        assert_eq!(b.min_lon, 90.5024);
        assert_eq!(b.max_lon, 91.4834);
        assert_eq!(b.min_lat, 23.5049);
        assert_eq!(b.max_lat, 24.4451);
        assert_eq!(aoi.name(), BRAHMANBARIA_AOI_NAME);
    }

    #[test]
    fn test_open_ring_is_closed() {
        let aoi = AreaOfInterest::from_vertices(
            "square",
            &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        )
        .unwrap();
        let vertices = aoi.vertices();
        assert_eq!(vertices.first(), vertices.last());
        assert_eq!(vertices.len(), 5);
    }

    #[test]
    fn test_rejects_degenerate_polygons() {
        // Collinear
        assert!(AreaOfInterest::from_vertices("line", &[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]).is_err());
        // Too few vertices
        assert!(AreaOfInterest::from_vertices("pair", &[[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]).is_err());
        // Out of range
        assert!(AreaOfInterest::from_vertices(
            "bad",
            &[[0.0, 0.0], [1.0, 0.0], [1.0, 95.0], [0.0, 0.0]]
        )
        .is_err());
        assert!(AreaOfInterest::from_vertices(
            "nan",
            &[[0.0, 0.0], [f64::NAN, 0.0], [1.0, 1.0], [0.0, 0.0]]
        )
        .is_err());
    }
}
