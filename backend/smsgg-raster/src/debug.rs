//! Debugger-frontend helpers for visualizing palette and pattern memory.

use crate::memory::{CRAM_LEN, VRAM_LEN, VideoMemory};
use crate::registers::VdpRegisters;
use crate::render::Hardware;
use crate::render::mode4::{pattern_row, planar_pixel};
use crate::render::output::{gg_color_to_rgb, sms_color_to_rgb};
use raster_common::frontend::Color;
use raster_common::num::GetBit;

pub fn copy_cram(memory: &VideoMemory, hardware: Hardware, out: &mut [Color]) {
    match hardware {
        Hardware::MasterSystem => {
            for (out_color, &entry) in out.iter_mut().zip(memory.cram()) {
                *out_color = sms_color_to_rgb(entry);
            }
        }
        Hardware::GameGear => {
            for (out_color, &entry) in out.iter_mut().zip(memory.cram()) {
                *out_color = gg_color_to_rgb(entry);
            }
        }
    }
}

/// Render every pattern in VRAM through the given palette, `row_len` tiles
/// per output row.
pub fn copy_vram(
    memory: &VideoMemory,
    hardware: Hardware,
    palette: u8,
    row_len: usize,
    out: &mut [Color],
) {
    let vram = memory.vram();
    for pattern in 0..VRAM_LEN / 32 {
        let base_idx = pattern / row_len * row_len * 64 + (pattern % row_len) * 8;

        for row in 0..8 {
            let pack = pattern_row(vram, 32 * pattern + 4 * row);

            for col in 0..8 {
                let out_idx = base_idx + row * row_len * 8 + col;

                let color_id = planar_pixel(pack, col);
                let entry = usize::from((palette << 4) | color_id) & (CRAM_LEN - 1);
                let color = memory.cram()[entry];

                out[out_idx] = match hardware {
                    Hardware::MasterSystem => sms_color_to_rgb(color),
                    Hardware::GameGear => gg_color_to_rgb(color),
                };
            }
        }
    }
}

pub fn dump_registers(registers: &VdpRegisters, mut callback: impl FnMut(u32, &[(&str, &str)])) {
    let reg0 = registers.read(0);
    callback(0, &[
        ("Vertical scroll lock", bool_str(reg0.bit(7))),
        ("Horizontal scroll lock", bool_str(reg0.bit(6))),
        ("Hide left column", bool_str(reg0.bit(5))),
        ("Shift sprites left", bool_str(reg0.bit(3))),
        ("Mode 4", bool_str(reg0.bit(2))),
    ]);

    let reg1 = registers.read(1);
    callback(1, &[
        ("Display enabled", bool_str(reg1.bit(6))),
        ("224-line mode", bool_str(reg1.bit(4))),
        ("240-line mode", bool_str(reg1.bit(3))),
        ("Double sprite height", bool_str(reg1.bit(1))),
        ("Zoomed sprites", bool_str(reg1.bit(0))),
    ]);

    callback(2, &[(
        "Name table address",
        &format!("${:04X}", u16::from(registers.read(2) & 0x0E) << 10),
    )]);

    callback(3, &[(
        "Color table address (TMS9918)",
        &format!("${:04X}", (u16::from(registers.read(3)) << 6) & 0x3FC0),
    )]);

    callback(4, &[(
        "Pattern generator address (TMS9918)",
        &format!("${:04X}", u16::from(registers.read(4) & 0x07) << 11),
    )]);

    callback(5, &[(
        "Sprite attribute table address",
        &format!("${:04X}", u16::from(registers.read(5) & 0x7E) << 7),
    )]);

    callback(6, &[(
        "Sprite pattern table address",
        &format!("${:04X}", u16::from(registers.read(6) & 0x07) << 11),
    )]);

    callback(7, &[("Backdrop color ID", &registers.read(7).to_string())]);

    callback(8, &[("Horizontal scroll", &registers.read(8).to_string())]);

    callback(9, &[("Vertical scroll", &registers.read(9).to_string())]);
}

fn bool_str(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cram_viewer_expands_colors() {
        let mut memory = VideoMemory::new();
        memory.write_cram(0, 0x03);
        memory.write_cram(1, 0x30);

        let mut out = [Color::default(); CRAM_LEN];
        copy_cram(&memory, Hardware::MasterSystem, &mut out);

        assert_eq!(out[0], Color::rgb(255, 0, 0));
        assert_eq!(out[1], Color::rgb(0, 0, 255));
    }

    #[test]
    fn vram_viewer_renders_first_tile() {
        let mut memory = VideoMemory::new();
        // pixel 0 of tile 0 gets color index 15
        for i in 0..4 {
            memory.write_vram(i, 0x80);
        }
        memory.write_cram(15, 0x3F);

        let mut out = vec![Color::default(); (VRAM_LEN / 32) * 64];
        copy_vram(&memory, Hardware::MasterSystem, 0, 16, &mut out);

        assert_eq!(out[0], Color::rgb(255, 255, 255));
        assert_eq!(out[1], Color::rgb(0, 0, 0));
    }
}
