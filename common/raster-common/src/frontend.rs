use bincode::{Decode, Encode};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    #[must_use]
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[must_use]
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    #[inline]
    fn default() -> Self {
        Self::BLACK
    }
}

/// Active display geometry, reported to the presentation layer whenever the
/// screen mode or output configuration changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct DisplayGeometry {
    /// First active line within the output frame
    pub screen_offset: u16,
    /// Active line count (192, 224, or 240)
    pub lines: u16,
    /// First active column within the output frame
    pub column_offset: u16,
    /// Active column count (256, or 320 when software scaling)
    pub columns: u16,
}

/// Presentation-layer hooks invoked by the scanline renderer.
///
/// All callbacks are plain synchronous calls made from inside the per-line
/// render path; they must not re-enter the renderer.
pub trait FrameSink {
    /// Called before a line is rendered. Returns the number of following
    /// lines to skip entirely (used for frame-skip negotiation).
    fn scan_begin(&mut self, _line: u16) -> u16 {
        0
    }

    /// Called after a line has been finalized. Returns the number of
    /// following lines to skip entirely.
    fn scan_end(&mut self, _line: u16) -> u16 {
        0
    }

    fn geometry_changed(&mut self, geometry: DisplayGeometry);
}
