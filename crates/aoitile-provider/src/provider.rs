//! The imagery provider seam.

use crate::request::TileRequest;
use crate::Result;
use std::path::Path;

/// Something that can export the pixels of a tile to a local file.
///
/// Implementations write the complete file at `dest` or nothing at all, so
/// that the presence of the file means the tile is done.
pub trait ImageryProvider {
    /// Export `request` to `dest`, returning the number of bytes written.
    fn fetch(&self, request: &TileRequest, dest: &Path) -> Result<u64>;
}

impl<P: ImageryProvider + ?Sized> ImageryProvider for &P {
    fn fetch(&self, request: &TileRequest, dest: &Path) -> Result<u64> {
        (**self).fetch(request, dest)
    }
}
