//! Palette table management and line finalization.
//!
//! Direct-color output lazily rebuilds a 256-entry lookup table from color
//! RAM whenever the palette-dirty flag is set, then converts the indexed line
//! to the selected 15/16-bit pixel layout. Indexed output skips conversion
//! entirely.

use crate::memory::{CRAM_LEN, VideoMemory};
use crate::registers::VdpRegisters;
use crate::render::{
    Hardware, LINE_BUFFER_LEN, LINE_LEFT_MARGIN, MAX_LINE_WIDTH, NATIVE_LINE_WIDTH, OutputMode,
    PixelLayout, Renderer,
};
use raster_common::frontend::Color;

/// Fixed TMS9918 palette, expressed as 6-bit SMS colors.
/// From <https://www.smspower.org/forums/8224-TMS9918ColorsForSMSVDP>
const TMS_PALETTE: [u16; 16] = [
    0x00, 0x00, 0x08, 0x0C, 0x10, 0x30, 0x01, 0x3C, 0x02, 0x03, 0x05, 0x0F, 0x04, 0x33, 0x15, 0x3F,
];

/// Expand a 6-bit SMS color (2 bits per channel) into the target layout,
/// replicating channel bits into the wider fields.
fn sms_color(color: u16, layout: PixelLayout) -> u16 {
    match layout {
        PixelLayout::Rgb565 => {
            let t = ((color & 0x03) << 14) | ((color & 0x0C) << 7) | ((color & 0x30) >> 1);
            t | (t >> 2) | ((t >> 4) & 0x0861)
        }
        PixelLayout::Bgr555 => {
            let t = ((color & 0x03) << 3) | ((color & 0x0C) << 6) | ((color & 0x30) << 9);
            t | (t >> 2) | ((t >> 4) & 0x0421)
        }
        PixelLayout::Bgr565 => {
            let t = ((color & 0x03) << 3) | ((color & 0x0C) << 7) | ((color & 0x30) << 10);
            t | (t >> 2) | ((t >> 4) & 0x0861)
        }
    }
}

/// Expand a 12-bit Game Gear color (4 bits per channel) into the target
/// layout.
fn gg_color(color: u16, layout: PixelLayout) -> u16 {
    match layout {
        PixelLayout::Rgb565 => {
            let t = ((color & 0x000F) << 12) | ((color & 0x00F0) << 3) | ((color & 0x0F00) >> 7);
            t | ((t >> 4) & 0x0861)
        }
        PixelLayout::Bgr555 => {
            let t = ((color & 0x000F) << 1) | ((color & 0x00F0) << 2) | ((color & 0x0F00) << 3);
            t | ((t >> 4) & 0x0421)
        }
        PixelLayout::Bgr565 => {
            let t = ((color & 0x000F) << 1) | ((color & 0x00F0) << 3) | ((color & 0x0F00) << 4);
            t | ((t >> 4) & 0x0861)
        }
    }
}

pub fn convert_sms_color(color: u16) -> u8 {
    [0, 85, 170, 255][usize::from(color)]
}

#[must_use]
pub fn sms_color_to_rgb(color: u16) -> Color {
    let r = convert_sms_color(color & 0x03);
    let g = convert_sms_color((color >> 2) & 0x03);
    let b = convert_sms_color((color >> 4) & 0x03);
    Color::rgb(r, g, b)
}

pub fn convert_gg_color(color: u16) -> u8 {
    [0, 17, 34, 51, 68, 85, 102, 119, 136, 153, 170, 187, 204, 221, 238, 255][usize::from(color)]
}

#[must_use]
pub fn gg_color_to_rgb(color: u16) -> Color {
    let r = convert_gg_color(color & 0x0F);
    let g = convert_gg_color((color >> 4) & 0x0F);
    let b = convert_gg_color((color >> 8) & 0x0F);
    Color::rgb(r, g, b)
}

/// Nearest-neighbour 4:5 horizontal upscale (256 to 320 pixels).
fn upscale_nn_4_5<T: Copy>(dest: &mut [T], src: &[T]) {
    for (out, group) in dest.chunks_exact_mut(5).zip(src.chunks_exact(4)) {
        out[0] = group[0];
        out[1] = group[1];
        out[2] = group[1];
        out[3] = group[2];
        out[4] = group[3];
    }
}

impl Renderer {
    /// Regenerate the direct-color lookup table from color RAM, or from the
    /// fixed TMS9918 palette when mode 4 is off. Runs lazily when the palette
    /// is dirty; call directly to force regeneration, e.g. after a state
    /// load.
    pub fn rebuild_palette(&mut self, registers: &VdpRegisters, memory: &mut VideoMemory) {
        memory.clear_palette_dirty();

        let layout = match self.output {
            OutputMode::Direct(layout) => layout,
            OutputMode::Internal | OutputMode::Indexed8 => PixelLayout::default(),
        };
        log::debug!("Rebuilding {layout:?} palette table");

        let convert = match self.config.hardware {
            Hardware::MasterSystem => sms_color,
            Hardware::GameGear => gg_color,
        };

        if registers.mode_4_enabled() {
            for (entry, &source) in self.high_palette.iter_mut().zip(memory.cram()) {
                *entry = convert(source, layout);
            }
        } else {
            // the TMS9918 has no writable palette
            for (entry, &source) in self.high_palette.iter_mut().zip(&TMS_PALETTE) {
                *entry = convert(source, layout);
            }
            self.high_palette[TMS_PALETTE.len()..CRAM_LEN].fill(0);
        }

        // the border-mask code always resolves to black
        self.high_palette[0xE0] = 0;
    }

    pub(crate) fn finalize_line(
        &mut self,
        line: u16,
        registers: &VdpRegisters,
        memory: &mut VideoMemory,
    ) {
        let row = usize::from(self.screen_offset + line);

        match self.output {
            OutputMode::Internal => {
                self.indexed_frame[row * LINE_BUFFER_LEN..(row + 1) * LINE_BUFFER_LEN]
                    .copy_from_slice(&self.line_buffer);
            }
            OutputMode::Indexed8 => {
                let offset = usize::from(self.line_offset);
                let dest = &mut self.indexed_frame[row * LINE_BUFFER_LEN + offset..];
                let src = &self.line_buffer[LINE_LEFT_MARGIN + offset..];
                if self.config.software_scale {
                    upscale_nn_4_5(&mut dest[..MAX_LINE_WIDTH], &src[..NATIVE_LINE_WIDTH]);
                } else {
                    dest[..NATIVE_LINE_WIDTH].copy_from_slice(&src[..NATIVE_LINE_WIDTH]);
                }
            }
            OutputMode::Direct(_) => {
                if memory.palette_dirty() {
                    self.rebuild_palette(registers, memory);
                }

                // tiles were drawn unshifted; centering is applied here
                let row_start = row * MAX_LINE_WIDTH + usize::from(self.column_offset);
                if self.config.software_scale {
                    let mut scaled = [0; MAX_LINE_WIDTH];
                    let src =
                        &self.line_buffer[LINE_LEFT_MARGIN..LINE_LEFT_MARGIN + NATIVE_LINE_WIDTH];
                    upscale_nn_4_5(&mut scaled, src);

                    let dest = &mut self.direct_frame[row_start..row_start + MAX_LINE_WIDTH];
                    for (pixel, &index) in dest.iter_mut().zip(&scaled) {
                        *pixel = self.high_palette[usize::from(index)];
                    }
                } else {
                    let dest = &mut self.direct_frame[row_start..row_start + NATIVE_LINE_WIDTH];
                    let src = &self.line_buffer[LINE_LEFT_MARGIN..LINE_LEFT_MARGIN + NATIVE_LINE_WIDTH];
                    for (pixel, &index) in dest.iter_mut().zip(src) {
                        *pixel = self.high_palette[usize::from(index)];
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RendererConfig;
    use raster_common::frontend::{DisplayGeometry, FrameSink};
    use test_log::test;

    struct NullSink;

    impl FrameSink for NullSink {
        fn geometry_changed(&mut self, _geometry: DisplayGeometry) {}
    }

    fn mode4_registers() -> VdpRegisters {
        let mut registers = VdpRegisters::new();
        registers.write(0, 0x04);
        registers.write(2, 0x0E);
        registers
    }

    #[test]
    fn sms_color_expansion() {
        assert_eq!(sms_color(0x3F, PixelLayout::Rgb565), 0xFFFF);
        assert_eq!(sms_color(0x3F, PixelLayout::Bgr555), 0x7FFF);
        assert_eq!(sms_color(0x3F, PixelLayout::Bgr565), 0xFFFF);
        assert_eq!(sms_color(0x00, PixelLayout::Rgb565), 0x0000);
        // full red
        assert_eq!(sms_color(0x03, PixelLayout::Rgb565), 0xF800);
        assert_eq!(sms_color(0x03, PixelLayout::Bgr555), 0x001F);
        // full blue
        assert_eq!(sms_color(0x30, PixelLayout::Rgb565), 0x001F);
        assert_eq!(sms_color(0x30, PixelLayout::Bgr555), 0x7C00);
    }

    #[test]
    fn gg_color_expansion() {
        assert_eq!(gg_color(0x0FFF, PixelLayout::Rgb565), 0xFFFF);
        assert_eq!(gg_color(0x0FFF, PixelLayout::Bgr555), 0x7FFF);
        assert_eq!(gg_color(0x000F, PixelLayout::Rgb565), 0xF800);
        assert_eq!(gg_color(0x0F00, PixelLayout::Rgb565), 0x001F);
    }

    #[test]
    fn palette_rebuilt_once_per_dirty_flag() {
        let mut renderer = Renderer::new(RendererConfig::default());
        let mut registers = mode4_registers();
        let mut memory = VideoMemory::new();
        let mut sink = NullSink;

        renderer.set_output(OutputMode::Direct(PixelLayout::Rgb565));
        memory.write_cram(0, 0x03);

        renderer.frame_start(&registers, &mut sink);
        renderer.draw_line(0, &mut registers, &mut memory, &mut sink);

        assert!(!memory.palette_dirty());
        // backdrop color 0 converted through the fresh table, placed after
        // the 32-column border
        assert_eq!(renderer.direct_frame()[24 * MAX_LINE_WIDTH + 32], 0xF800);
        assert_eq!(renderer.direct_frame()[24 * MAX_LINE_WIDTH + 31], 0);

        // a new CRAM write re-dirties the palette; the next line picks it up
        memory.write_cram(0, 0x30);
        renderer.draw_line(1, &mut registers, &mut memory, &mut sink);
        assert!(!memory.palette_dirty());
        assert_eq!(renderer.direct_frame()[25 * MAX_LINE_WIDTH + 32], 0x001F);
    }

    #[test]
    fn border_mask_entry_always_black() {
        let mut renderer = Renderer::new(RendererConfig::default());
        let registers = mode4_registers();
        let mut memory = VideoMemory::new();

        renderer.set_output(OutputMode::Direct(PixelLayout::Rgb565));
        for i in 0..32 {
            memory.write_cram(i, 0x3F);
        }
        renderer.rebuild_palette(&registers, &mut memory);

        assert_eq!(renderer.high_palette()[0x00], 0xFFFF);
        assert_eq!(renderer.high_palette()[0xE0], 0);
    }

    #[test]
    fn tms_mode_substitutes_fixed_palette() {
        let mut renderer = Renderer::new(RendererConfig::default());
        let mut registers = mode4_registers();
        let mut memory = VideoMemory::new();

        // CRAM contents are ignored once mode 4 is off
        for i in 0..32 {
            memory.write_cram(i, 0x15);
        }
        registers.write(0, 0x00);
        renderer.set_output(OutputMode::Direct(PixelLayout::Rgb565));
        renderer.rebuild_palette(&registers, &mut memory);

        assert_eq!(renderer.high_palette()[15], 0xFFFF);
        assert_eq!(renderer.high_palette()[1], 0x0000);
        assert!(renderer.high_palette()[16..32].iter().all(|&color| color == 0));
    }

    #[test]
    fn game_gear_palette_uses_wide_channels() {
        let config = RendererConfig { hardware: Hardware::GameGear, ..RendererConfig::default() };
        let mut renderer = Renderer::new(config);
        let registers = mode4_registers();
        let mut memory = VideoMemory::new();

        renderer.set_output(OutputMode::Direct(PixelLayout::Rgb565));
        memory.write_cram(3, 0x0FFF);
        renderer.rebuild_palette(&registers, &mut memory);

        assert_eq!(renderer.high_palette()[3], 0xFFFF);
    }

    #[test]
    fn internal_output_stores_margin_inclusive_lines() {
        let mut renderer = Renderer::new(RendererConfig::default());
        let mut registers = mode4_registers();
        let mut memory = VideoMemory::new();
        let mut sink = NullSink;

        registers.write(7, 0x02);
        renderer.frame_start(&registers, &mut sink);
        renderer.draw_line(0, &mut registers, &mut memory, &mut sink);

        let row = &renderer.indexed_frame()[24 * LINE_BUFFER_LEN..25 * LINE_BUFFER_LEN];
        assert_eq!(&row[..8], &[0; 8]);
        assert!(row[8..8 + MAX_LINE_WIDTH].iter().all(|&pixel| pixel == 0x02));
    }

    #[test]
    fn indexed_output_places_line_at_column_offset() {
        let mut renderer = Renderer::new(RendererConfig::default());
        let mut registers = mode4_registers();
        let mut memory = VideoMemory::new();
        let mut sink = NullSink;

        registers.write(7, 0x02);
        renderer.set_output(OutputMode::Indexed8);
        renderer.frame_start(&registers, &mut sink);
        renderer.draw_line(0, &mut registers, &mut memory, &mut sink);

        let row = &renderer.indexed_frame()[24 * LINE_BUFFER_LEN..25 * LINE_BUFFER_LEN];
        assert!(row[32..32 + NATIVE_LINE_WIDTH].iter().all(|&pixel| pixel == 0x02));
    }

    #[test]
    fn upscale_duplicates_every_fourth_pixel() {
        let src = [10_u8, 20, 30, 40, 50, 60, 70, 80];
        let mut dest = [0_u8; 10];
        upscale_nn_4_5(&mut dest, &src);
        assert_eq!(dest, [10, 20, 20, 30, 40, 50, 60, 60, 70, 80]);
    }

    #[test]
    fn masked_left_column_converts_to_black() {
        let mut renderer = Renderer::new(RendererConfig::default());
        let mut registers = mode4_registers();
        let mut memory = VideoMemory::new();
        let mut sink = NullSink;

        // display on, left column masked, bright tiles and palette everywhere
        registers.write(0, 0x24);
        registers.write(1, 0x40);
        for i in 0..32 {
            memory.write_cram(i, 0x3F);
        }
        for col in 0..2_u16 {
            memory.write_vram(0x3800 + 2 * col, 0x01);
        }
        for i in 0..4_u16 {
            memory.write_vram(0x20 + i, 0xFF);
        }

        renderer.set_output(OutputMode::Direct(PixelLayout::Rgb565));
        renderer.frame_start(&registers, &mut sink);
        renderer.draw_line(0, &mut registers, &mut memory, &mut sink);

        let row_start = 24 * MAX_LINE_WIDTH + 32;
        let row = &renderer.direct_frame()[row_start..row_start + 16];
        assert_eq!(&row[..8], &[0; 8]);
        assert_eq!(&row[8..16], &[0xFFFF; 8]);
    }
}
