//! Scanline raster core for the Sega Master System / Game Gear VDP
//!
//! Reconstructs one horizontal line at a time from externally maintained
//! VRAM, color RAM, and control registers: the mode 4 tile+sprite display
//! (SMS and GG) and the legacy TMS9918 Graphics II mode, including the
//! documented hardware quirks (sprite overflow and collision flags, scroll
//! lock regions, zoomed sprites, left-column masking).
//!
//! The CPU core, PSG/FM audio, and platform presentation are external
//! collaborators: they mutate registers and memory in between lines, pump
//! [`Renderer::draw_line`] once per scanline, and consume the finished frames
//! through the [`raster_common::frontend::FrameSink`] hooks and the frame
//! buffer accessors.

pub mod debug;
mod memory;
mod registers;
mod render;

pub use memory::{CRAM_LEN, VRAM_LEN, VideoMemory};
pub use registers::{REGISTER_COUNT, ScreenLines, VdpRegisters};
pub use render::output::{convert_gg_color, convert_sms_color, gg_color_to_rgb, sms_color_to_rgb};
pub use render::{
    Hardware, LINE_BUFFER_LEN, MAX_LINE_WIDTH, MAX_LINES, OutputMode, PixelLayout, Renderer,
    RendererConfig,
};
