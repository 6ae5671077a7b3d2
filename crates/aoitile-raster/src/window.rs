//! Pixel windows inside a raster.

/// A rectangular block of pixels: offset of its top-left pixel plus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub col_off: u32,
    pub row_off: u32,
    pub width: u32,
    pub height: u32,
}

impl Window {
    pub fn new(col_off: u32, row_off: u32, width: u32, height: u32) -> Self {
        Self {
            col_off,
            row_off,
            width,
            height,
        }
    }

    /// Window covering a whole `width` x `height` raster.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Number of pixels in the window.
    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when the window lies inside a `width` x `height` raster.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        u64::from(self.col_off) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.row_off) + u64::from(self.height) <= u64::from(height)
    }

    /// This window shifted by another window's offset.
    pub fn translate(&self, col_off: u32, row_off: u32) -> Window {
        Window::new(
            self.col_off + col_off,
            self.row_off + row_off,
            self.width,
            self.height,
        )
    }
}
