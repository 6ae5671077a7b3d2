//! North-up affine transforms and GeoTIFF georeferencing keys.

/// Affine transform of a north-up raster.
///
/// `origin_x`/`origin_y` is the outer corner of the top-left pixel. Columns
/// advance east by `pixel_width`, rows advance south by `pixel_height`; both
/// sizes are positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

/// Axis-aligned extent in raster CRS units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl RasterBounds {
    /// Smallest bounds containing both `self` and `other`.
    pub fn union(&self, other: &RasterBounds) -> RasterBounds {
        RasterBounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Overlap of `self` and `other`, or `None` when they do not overlap.
    pub fn intersection(&self, other: &RasterBounds) -> Option<RasterBounds> {
        let b = RasterBounds {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        };
        (b.min_x < b.max_x && b.min_y < b.max_y).then_some(b)
    }
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Extent of a `width` x `height` raster with this transform.
    pub fn bounds(&self, width: u32, height: u32) -> RasterBounds {
        RasterBounds {
            min_x: self.origin_x,
            min_y: self.origin_y - f64::from(height) * self.pixel_height,
            max_x: self.origin_x + f64::from(width) * self.pixel_width,
            max_y: self.origin_y,
        }
    }

    /// Coordinates of the centre of pixel `(col, row)`.
    pub fn pixel_center(&self, col: u32, row: u32) -> (f64, f64) {
        (
            self.origin_x + (f64::from(col) + 0.5) * self.pixel_width,
            self.origin_y - (f64::from(row) + 0.5) * self.pixel_height,
        )
    }

    /// Fractional pixel position `(col, row)` of a coordinate.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (self.origin_y - y) / self.pixel_height,
        )
    }

    /// Transform of the sub-raster starting at pixel `(col_off, row_off)`.
    pub fn offset(&self, col_off: u32, row_off: u32) -> GeoTransform {
        GeoTransform {
            origin_x: self.origin_x + f64::from(col_off) * self.pixel_width,
            origin_y: self.origin_y - f64::from(row_off) * self.pixel_height,
            ..*self
        }
    }

    /// True when both pixel sizes agree within `rel_tol`.
    pub fn same_resolution(&self, other: &GeoTransform, rel_tol: f64) -> bool {
        close(self.pixel_width, other.pixel_width, rel_tol)
            && close(self.pixel_height, other.pixel_height, rel_tol)
    }

    /// True when origin and pixel sizes agree within `rel_tol` of a pixel.
    pub fn approx_eq(&self, other: &GeoTransform, rel_tol: f64) -> bool {
        self.same_resolution(other, rel_tol)
            && (self.origin_x - other.origin_x).abs() <= rel_tol * self.pixel_width.abs()
            && (self.origin_y - other.origin_y).abs() <= rel_tol * self.pixel_height.abs()
    }

    /// `ModelPixelScaleTag` values.
    pub(crate) fn pixel_scale(&self) -> [f64; 3] {
        [self.pixel_width, self.pixel_height, 0.0]
    }

    /// `ModelTiepointTag` values anchoring pixel (0, 0) at the origin.
    pub(crate) fn tiepoint(&self) -> [f64; 6] {
        [0.0, 0.0, 0.0, self.origin_x, self.origin_y, 0.0]
    }
}

fn close(a: f64, b: f64, rel_tol: f64) -> bool {
    (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}

// GeoKey IDs
const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;
const USER_DEFINED: u16 = 32767;

/// Raw GeoTIFF key directory with its double and ASCII parameter tags.
///
/// Copied verbatim from a reference tile to the output so that the CRS
/// definition survives without interpreting it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoKeys {
    /// `GeoKeyDirectoryTag` (34735)
    pub directory: Vec<u16>,
    /// `GeoDoubleParamsTag` (34736)
    pub doubles: Option<Vec<f64>>,
    /// `GeoAsciiParamsTag` (34737)
    pub ascii: Option<String>,
}

impl GeoKeys {
    /// Minimal key directory for an EPSG code.
    ///
    /// Codes 4000-4999 are treated as geographic CRSs, everything else as
    /// projected.
    pub fn for_epsg(code: u16) -> Self {
        let geographic = (4000..5000).contains(&code);
        let (model_type, crs_key) = if geographic {
            (2, GEOGRAPHIC_TYPE)
        } else {
            (1, PROJECTED_CS_TYPE)
        };
        #[rustfmt::skip]
        let directory = vec![
            1, 1, 0, 3, // version 1.1.0, 3 keys
            GT_MODEL_TYPE, 0, 1, model_type,
            GT_RASTER_TYPE, 0, 1, 1, // RasterPixelIsArea
            crs_key, 0, 1, code,
        ];
        Self {
            directory,
            doubles: None,
            ascii: None,
        }
    }

    /// Value of a short key stored inline in the directory.
    pub fn key(&self, id: u16) -> Option<u16> {
        let count = usize::from(*self.directory.get(3)?);
        self.directory
            .get(4..)?
            .chunks_exact(4)
            .take(count)
            .find(|entry| entry[0] == id && entry[1] == 0)
            .map(|entry| entry[3])
    }

    /// EPSG code of the projected or geographic CRS, if one is declared.
    pub fn epsg(&self) -> Option<u16> {
        [PROJECTED_CS_TYPE, GEOGRAPHIC_TYPE]
            .into_iter()
            .filter_map(|id| self.key(id))
            .find(|&code| code != 0 && code != USER_DEFINED)
    }
}
