//! TMS9918 Graphics II rendering: 1-bitplane tiles colored through per-row
//! color table bytes, and the legacy 4-sprite-per-line sprite system.

use crate::memory::VRAM_LEN;
use crate::registers::VdpRegisters;
use crate::render::{LINE_LEFT_MARGIN, Renderer};
use arrayvec::ArrayVec;
use raster_common::num::GetBit;

pub(crate) const MAX_SPRITES_PER_LINE: usize = 4;

/// Each color byte holds two 4-bit palette entries: high nibble for set
/// pattern bits, low nibble for clear ones.
fn draw_tile_bg(line: &mut [u8], x: usize, pack: u8, colors: u8) {
    for p in 0..8_u8 {
        let bit = (pack >> (7 - p)) & 1;
        line[x + usize::from(p)] = (colors >> (bit << 2)) & 0x0F;
    }
}

fn draw_tile_sprite(line: &mut [u8], x: usize, pack: u8, color: u8) {
    for p in 0..8_u8 {
        if pack.bit(7 - p) {
            line[x + usize::from(p)] = color;
        }
    }
}

fn draw_tile_sprite_double(line: &mut [u8], x: usize, pack: u8, color: u8) {
    for p in 0..8_u8 {
        if pack.bit(7 - p) {
            line[x + 2 * usize::from(p)] = color;
            line[x + 2 * usize::from(p) + 1] = color;
        }
    }
}

fn draw_sprite_tile(line: &mut [u8], x: usize, pack: u8, color: u8, zoomed: bool) {
    if zoomed {
        draw_tile_sprite_double(line, x, pack, color);
    } else {
        draw_tile_sprite(line, x, pack, color);
    }
}

struct SpriteSlot {
    /// Entry base address within the attribute table
    attr_addr: usize,
    pattern_addr: usize,
}

fn draw_sprites(
    line_buffer: &mut [u8],
    scanline: u16,
    registers: &mut VdpRegisters,
    vram: &[u8; VRAM_LEN],
    line_offset: u16,
) {
    let xoff = LINE_LEFT_MARGIN as i32 + i32::from(line_offset);

    let sat = registers.sprite_attribute_table_addr();
    let (index_mask, mut height) =
        if registers.tall_sprites() { (0xFC_u8, 16_i32) } else { (0xFF_u8, 8_i32) };
    let zoomed = registers.zoomed_sprites();
    let zoom_shift = i32::from(zoomed);
    if zoomed {
        height *= 2;
    }
    let pattern_base = registers.tms_sprite_pattern_addr();

    let scanline = i32::from(scanline);
    let mut slots: ArrayVec<SpriteSlot, MAX_SPRITES_PER_LINE> = ArrayVec::new();
    for i in 0..32_usize {
        let entry = sat + 4 * i;
        let stored = vram[entry].wrapping_add(1);
        if stored == 0xD1 {
            break;
        }
        // y positions above 0xE0 reach down from above the top of the screen
        let y = if stored > 0xE0 { i32::from(stored) - 256 } else { i32::from(stored) };
        if y + height <= scanline || scanline < y {
            continue;
        }
        if slots.is_full() {
            // the status register records which entry overflowed
            registers.set_sprite_overflow_at(i as u8);
            break;
        }

        let index = usize::from(vram[entry + 2] & index_mask);
        let row = ((scanline - y) >> zoom_shift) as usize;
        slots.push(SpriteSlot { attr_addr: entry, pattern_addr: pattern_base + (index << 3) + row });
    }

    // collision is flagged for any line with multiple candidates, without
    // checking actual pixel overlap
    if slots.len() > 1 {
        registers.set_sprite_collision();
    }

    let width = if zoomed { 16 } else { 8 };
    for slot in slots.iter().rev() {
        let attributes = vram[slot.attr_addr + 3];
        let color = attributes & 0x0F;

        let mut x = i32::from(vram[slot.attr_addr + 1]) + xoff;
        if attributes.bit(7) {
            // early clock shifts the sprite 32 pixels left
            x -= 32;
        }
        if x > 0 {
            draw_sprite_tile(line_buffer, x as usize, vram[slot.pattern_addr], color, zoomed);
        }
        // 16x16 sprites draw a second pattern one tile to the right, with
        // wraparound suppressed
        if registers.tall_sprites() {
            x += width;
            if x > 0 {
                draw_sprite_tile(
                    line_buffer,
                    x as usize,
                    vram[slot.pattern_addr + 0x10],
                    color,
                    zoomed,
                );
            }
        }
    }
}

impl Renderer {
    pub(crate) fn draw_display_tms(
        &mut self,
        line: u16,
        registers: &mut VdpRegisters,
        vram: &[u8; VRAM_LEN],
    ) {
        let line = usize::from(line);
        let name_table_addr = registers.tms_name_table_addr() + ((line >> 3) << 5);
        // pattern and color tables are split into three 2048-byte blocks, one
        // per 8-row third of the screen
        let block_offset = ((line >> 6) << 11) + (line & 7);
        let color_table_addr = registers.tms_color_table_addr() + block_offset;
        let pattern_table_addr = registers.tms_pattern_table_addr() + block_offset;

        let x0 = LINE_LEFT_MARGIN + usize::from(self.line_offset);

        if !self.config.kill_background_layer {
            for cell in 0..32 {
                let code = usize::from(vram[name_table_addr + cell]) << 3;
                let colors = vram[color_table_addr + code];
                let pack = vram[pattern_table_addr + code];
                draw_tile_bg(&mut self.line_buffer, x0 + 8 * cell, pack, colors);
            }
        }

        if !self.config.kill_sprite_layer {
            draw_sprites(
                &mut self.line_buffer,
                line as u16,
                registers,
                vram,
                self.line_offset,
            );
        }
    }
}
