//! Tile size and overlap specification.

use crate::{GridError, Result};

/// Kilometres per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEGREE: f64 = 111.32;

/// Physical tile size and overlap, in kilometres.
///
/// Construction enforces `width_km > 0`, `height_km > 0` and
/// `0 <= overlap_km < min(width_km, height_km)`, which guarantees a strictly
/// positive step on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSpec {
    width_km: f64,
    height_km: f64,
    overlap_km: f64,
}

impl TileSpec {
    /// Create a validated tile spec.
    pub fn new(width_km: f64, height_km: f64, overlap_km: f64) -> Result<Self> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(width_km) || !positive(height_km) {
            return Err(GridError::NonPositiveTileSize {
                width_km,
                height_km,
            });
        }
        if !overlap_km.is_finite() || overlap_km < 0.0 {
            return Err(GridError::NegativeOverlap(overlap_km));
        }
        if overlap_km >= width_km.min(height_km) {
            return Err(GridError::OverlapTooLarge {
                width_km,
                height_km,
                overlap_km,
            });
        }
        Ok(Self {
            width_km,
            height_km,
            overlap_km,
        })
    }

    /// Square tiles of `size_km` with the given overlap.
    pub fn square(size_km: f64, overlap_km: f64) -> Result<Self> {
        Self::new(size_km, size_km, overlap_km)
    }

    /// Tile width in kilometres.
    pub fn width_km(&self) -> f64 {
        self.width_km
    }

    /// Tile height in kilometres.
    pub fn height_km(&self) -> f64 {
        self.height_km
    }

    /// Overlap between neighbouring tiles in kilometres.
    pub fn overlap_km(&self) -> f64 {
        self.overlap_km
    }
}

/// Convert kilometres to degrees of latitude.
pub fn km_to_deg_lat(km: f64) -> f64 {
    km / KM_PER_DEGREE
}

/// Convert kilometres to degrees of longitude at `reference_lat` (degrees).
///
/// Fails at the poles, where a degree of longitude has no length.
pub fn km_to_deg_lon(km: f64, reference_lat: f64) -> Result<f64> {
    let cos_lat = reference_lat.to_radians().cos();
    if !reference_lat.is_finite() || reference_lat.abs() >= 90.0 || cos_lat <= 1e-12 {
        return Err(GridError::PolarReference(reference_lat));
    }
    Ok(km / (KM_PER_DEGREE * cos_lat))
}
