//! Per-scanline rendering driver.
//!
//! `frame_start` fixes the display geometry for the frame and notifies the
//! presentation layer on change; `draw_line` then runs once per scanline:
//! backdrop fill, background strip, sprites, foreground strip, left-column
//! mask, and output finalization, with skip-line negotiation through the
//! [`FrameSink`] hooks on either side.

pub(crate) mod mode4;
pub(crate) mod output;
pub(crate) mod tms9918;

use crate::memory::VideoMemory;
use crate::registers::{ScreenLines, VdpRegisters};
use bincode::{Decode, Encode};
use raster_common::frontend::{DisplayGeometry, FrameSink};

/// Widest finalized line (256 native pixels software-scaled to 320).
pub const MAX_LINE_WIDTH: usize = 320;
pub const MAX_LINES: usize = 240;

/// Indexed line width: an 8-pixel offscreen margin on each side of the widest
/// line, absorbing sprites and scrolled tiles that straddle the screen edges.
pub const LINE_BUFFER_LEN: usize = 8 + MAX_LINE_WIDTH + 8;
pub(crate) const LINE_LEFT_MARGIN: usize = 8;

const NATIVE_LINE_WIDTH: usize = 256;
const BORDER_COLUMN_OFFSET: u16 = 32;

/// Pixel code written by the left-column mask; the palette table always maps
/// it to black.
pub(crate) const BORDER_MASK_COLOR: u8 = 0xE0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hardware {
    #[default]
    MasterSystem,
    GameGear,
}

/// Bit layout of direct-color output pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelLayout {
    #[default]
    Rgb565,
    Bgr555,
    Bgr565,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutputMode {
    /// No conversion; each finished indexed line is stored in the indexed
    /// frame with its margins included, for an external renderer that does
    /// its own palette lookup.
    #[default]
    Internal,
    /// Indexed pixels copied to the visible region of the indexed frame.
    Indexed8,
    /// Palette-converted pixels written to the direct-color frame.
    Direct(PixelLayout),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RendererConfig {
    pub hardware: Hardware,
    /// Upscale 256-pixel lines to 320 pixels during finalization.
    pub software_scale: bool,
    /// Place 256-wide output at column 0 instead of centering it with a
    /// 32-column border.
    pub disable_border: bool,
    /// Diagnostic layer isolation: suppress the low-priority tile pass.
    pub kill_background_layer: bool,
    /// Diagnostic layer isolation: suppress the sprite pass.
    pub kill_sprite_layer: bool,
    /// Diagnostic layer isolation: suppress the high-priority tile pass.
    pub kill_foreground_layer: bool,
}

/// Per-frame rendering state. Constructed once, reconfigured only between
/// frames; the scanline sequence reads and advances it in place.
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RendererConfig,
    output: OutputMode,
    line_buffer: [u8; LINE_BUFFER_LEN],
    high_palette: [u16; 256],
    indexed_frame: Vec<u8>,
    direct_frame: Vec<u16>,
    skip_next_line: u16,
    screen_offset: u16,
    line_offset: u16,
    column_offset: u16,
    renotify_geometry: bool,
    geometry: Option<DisplayGeometry>,
}

impl Renderer {
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            output: OutputMode::default(),
            line_buffer: [0; LINE_BUFFER_LEN],
            high_palette: [0; 256],
            indexed_frame: vec![0; LINE_BUFFER_LEN * MAX_LINES],
            direct_frame: vec![0; MAX_LINE_WIDTH * MAX_LINES],
            skip_next_line: 0,
            screen_offset: 0,
            line_offset: 0,
            column_offset: 0,
            renotify_geometry: true,
            geometry: None,
        }
    }

    pub fn reload_config(&mut self, config: RendererConfig) {
        self.config = config;
        self.renotify_geometry = true;
    }

    /// Select the output form for subsequent frames. Must not be changed
    /// mid-frame; the next `frame_start` renotifies display geometry.
    pub fn set_output(&mut self, output: OutputMode) {
        if output != self.output {
            log::debug!("Output mode set to {output:?}");
        }
        self.output = output;
        self.renotify_geometry = true;
    }

    /// Fix display geometry for the coming frame from the current mode bits,
    /// notifying the sink only when the geometry actually changed.
    pub fn frame_start<S: FrameSink>(&mut self, registers: &VdpRegisters, sink: &mut S) {
        self.skip_next_line = 0;

        let ScreenLines { count: lines, offset: screen_offset } = registers.screen_lines();

        let (columns, column_offset) = if self.config.software_scale {
            (MAX_LINE_WIDTH as u16, 0)
        } else if self.config.disable_border {
            (NATIVE_LINE_WIDTH as u16, 0)
        } else {
            (NATIVE_LINE_WIDTH as u16, BORDER_COLUMN_OFFSET)
        };

        let geometry = DisplayGeometry { screen_offset, lines, column_offset, columns };
        if self.renotify_geometry || Some(geometry) != self.geometry {
            log::debug!("Display geometry changed: {geometry:?}");
            sink.geometry_changed(geometry);
            self.geometry = Some(geometry);
            self.renotify_geometry = false;
        }

        self.screen_offset = screen_offset;
        self.column_offset = column_offset;
        // Direct-color conversion applies the border offset itself, so tiles
        // are drawn unshifted in that case
        self.line_offset =
            if matches!(self.output, OutputMode::Direct(_)) { 0 } else { column_offset };
    }

    /// Render one scanline into the selected output frame.
    pub fn draw_line<S: FrameSink>(
        &mut self,
        line: u16,
        registers: &mut VdpRegisters,
        memory: &mut VideoMemory,
        sink: &mut S,
    ) {
        if self.skip_next_line > 0 {
            self.skip_next_line -= 1;
            return;
        }

        self.skip_next_line = sink.scan_begin(line + self.screen_offset);

        self.back_fill(registers.backdrop_color());

        if registers.display_enabled() {
            if registers.mode_4_enabled() {
                self.draw_display_mode4(line, registers, memory.vram());
            } else {
                self.draw_display_tms(line, registers, memory.vram());
            }
        }

        self.finalize_line(line, registers, memory);

        self.skip_next_line = sink.scan_end(line + self.screen_offset);
    }

    fn back_fill(&mut self, color: u8) {
        self.line_buffer[LINE_LEFT_MARGIN..LINE_LEFT_MARGIN + MAX_LINE_WIDTH].fill(color);
    }

    /// The working line in indexed form, margins included.
    #[must_use]
    pub fn line_buffer(&self) -> &[u8; LINE_BUFFER_LEN] {
        &self.line_buffer
    }

    /// Indexed output frame; row stride is [`LINE_BUFFER_LEN`]. `Internal`
    /// lines start at column 0 with margins; `Indexed8` lines start at the
    /// notified column offset.
    #[must_use]
    pub fn indexed_frame(&self) -> &[u8] {
        &self.indexed_frame
    }

    /// Direct-color output frame; row stride is [`MAX_LINE_WIDTH`], lines
    /// start at the notified column offset.
    #[must_use]
    pub fn direct_frame(&self) -> &[u16] {
        &self.direct_frame
    }

    #[must_use]
    pub fn high_palette(&self) -> &[u16; 256] {
        &self.high_palette
    }
}
