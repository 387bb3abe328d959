use crate::core::{
    ppu::{Ppu, SCREEN_HEIGHT, SCREEN_WIDTH, VRAM_WORDS},
    Error,
};

/// Bits per pixel of a background's tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Bpp2,
    Bpp4,
    Bpp8,
}

impl Depth {
    pub fn bits(self) -> usize {
        match self {
            Depth::Bpp2 => 2,
            Depth::Bpp4 => 4,
            Depth::Bpp8 => 8,
        }
    }
    /// Size of a single 8x8 tile in VRAM words
    pub fn words_per_tile(self) -> usize {
        self.bits() * 4
    }
}

// One pass over a background while compositing a line
#[derive(Clone, Copy)]
struct Pass {
    bg: usize,
    depth: Depth,
    palette_base: u8,
    // Only draw tiles with this priority bit, or every tile if None
    priority: Option<bool>,
}

const fn pass(bg: usize, depth: Depth, palette_base: u8, priority: Option<bool>) -> Pass {
    Pass {
        bg,
        depth,
        palette_base,
        priority,
    }
}

// Front to back
const MODE_0: [Pass; 4] = [
    pass(0, Depth::Bpp2, 0, None),
    pass(1, Depth::Bpp2, 32, None),
    pass(2, Depth::Bpp2, 64, None),
    pass(3, Depth::Bpp2, 96, None),
];
const MODE_1: [Pass; 6] = [
    pass(0, Depth::Bpp4, 0, Some(true)),
    pass(1, Depth::Bpp4, 0, Some(true)),
    pass(0, Depth::Bpp4, 0, Some(false)),
    pass(1, Depth::Bpp4, 0, Some(false)),
    pass(2, Depth::Bpp2, 0, Some(true)),
    pass(2, Depth::Bpp2, 0, Some(false)),
];
// BGMODE bit 3 moves high priority BG3 tiles in front of everything
const MODE_1_BG3_PRIORITY: [Pass; 6] = [
    pass(2, Depth::Bpp2, 0, Some(true)),
    pass(0, Depth::Bpp4, 0, Some(true)),
    pass(1, Depth::Bpp4, 0, Some(true)),
    pass(0, Depth::Bpp4, 0, Some(false)),
    pass(1, Depth::Bpp4, 0, Some(false)),
    pass(2, Depth::Bpp2, 0, Some(false)),
];
const MODE_3: [Pass; 1] = [pass(0, Depth::Bpp8, 0, None)];

impl Ppu {
    /// Render a single line of the backgrounds into the back buffer.
    ///
    /// * `line` The line to render, lines past the visible area are ignored.
    /// * `layer_mask` ANDed with TM to decide which backgrounds are drawn.
    ///
    /// Modes other than 0, 1 and 3 are not implemented and return an error instead of drawing anything.
    pub fn render_scanline(&mut self, line: usize, layer_mask: u8) -> Result<(), Error> {
        if line >= SCREEN_HEIGHT {
            return Ok(());
        }
        let start = line * SCREEN_WIDTH;
        let index = self.buffers.index;
        if self.inidisp & 0x80 != 0 {
            self.buffers.buffers[index][start..(start + SCREEN_WIDTH)].fill(0x000000FF);
            return Ok(());
        }
        let passes: &[Pass] = match self.bgmode & 0x07 {
            0 => &MODE_0,
            1 if self.bgmode & 0x08 != 0 => &MODE_1_BG3_PRIORITY,
            1 => &MODE_1,
            3 => &MODE_3,
            mode => return Err(Error::UnimplementedBgMode(mode)),
        };
        let enabled = self.tm & layer_mask;
        // CGRAM index of every pixel, 0 is the backdrop and means nothing has claimed it yet
        let mut indices = [0u8; SCREEN_WIDTH];
        passes
            .iter()
            .filter(|p| enabled & (1 << p.bg) != 0)
            .for_each(|p| self.draw_pass(&mut indices, line, p));

        let palette = &self.palette_cache;
        self.buffers.buffers[index][start..(start + SCREEN_WIDTH)]
            .iter_mut()
            .zip(indices.iter())
            .for_each(|(pixel, &i)| *pixel = palette[i as usize]);
        Ok(())
    }

    fn draw_pass(&self, indices: &mut [u8; SCREEN_WIDTH], line: usize, pass: &Pass) {
        let bg = pass.bg;
        let sc = self.bg_sc[bg];
        let tile_size = if self.bgmode & (0x10 << bg) != 0 {
            16
        } else {
            8
        };
        let width = if sc & 0x01 != 0 { 64 } else { 32 } * tile_size;
        let height = if sc & 0x02 != 0 { 64 } else { 32 } * tile_size;
        let y = (line + self.vofs[bg] as usize) % height;
        let hofs = self.hofs[bg] as usize;

        for (x, index) in indices.iter_mut().enumerate() {
            if *index != 0 {
                continue;
            }
            let px = (x + hofs) % width;
            let entry = self.map_entry(bg, px / tile_size, y / tile_size);
            if let Some(p) = pass.priority {
                if (entry & 0x2000 != 0) != p {
                    continue;
                }
            }
            let mut fine_x = px % tile_size;
            let mut fine_y = y % tile_size;
            if entry & 0x4000 != 0 {
                fine_x = tile_size - 1 - fine_x;
            }
            if entry & 0x8000 != 0 {
                fine_y = tile_size - 1 - fine_y;
            }
            // 16x16 tiles are made of 4 tiles, the lower two 16 tile numbers after the upper two
            let tile = ((entry & 0x3FF) as usize + (fine_y / 8) * 16 + fine_x / 8) & 0x3FF;
            let tile_addr =
                ((self.bg_nba[bg] as usize) << 12) + tile * pass.depth.words_per_tile();
            let color = self.tile_pixel(tile_addr, pass.depth, fine_x & 7, fine_y & 7);
            if color == 0 {
                continue;
            }
            *index = match pass.depth {
                Depth::Bpp8 => color,
                depth => {
                    let palette = ((entry >> 10) & 0x07) as u8;
                    pass.palette_base + (palette << depth.bits()) + color
                }
            };
        }
    }

    // The tile map entry for a tile coordinate, picking the right 32x32 screen for larger maps
    fn map_entry(&self, bg: usize, tile_x: usize, tile_y: usize) -> u16 {
        let sc = self.bg_sc[bg];
        let base = ((sc & 0xFC) as usize) << 8;
        let mut offset = ((tile_y & 31) << 5) | (tile_x & 31);
        if tile_x >= 32 && sc & 0x01 != 0 {
            offset += 0x400;
        }
        if tile_y >= 32 && sc & 0x02 != 0 {
            offset += if sc & 0x01 != 0 { 0x800 } else { 0x400 };
        }
        self.vram[(base + offset) & (VRAM_WORDS - 1)]
    }

    // Combine the bitplanes of a single pixel of an 8x8 tile.
    // Planes are stored in pairs, each word of a row holds two planes and the next pair is 8 words later.
    fn tile_pixel(&self, tile_addr: usize, depth: Depth, x: usize, y: usize) -> u8 {
        let shift = x ^ 7;
        (0..depth.bits() / 2).fold(0, |color, pair| {
            let word = self.vram[(tile_addr + y + pair * 8) & (VRAM_WORDS - 1)];
            let low = (word >> shift) & 1;
            let high = (word >> (8 + shift)) & 1;
            color | (((low | (high << 1)) as u8) << (pair * 2))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ppu::bgr555_to_rgba;

    const RED: u16 = 0x001F;
    const GREEN: u16 = 0x03E0;
    const BLUE: u16 = 0x7C00;

    // A ppu in mode 0 with BG1 enabled, its map at word 0x0400 and tiles at word 0x1000
    fn ppu() -> Ppu {
        let mut ppu = Ppu::new();
        ppu.inidisp = 0x0F;
        ppu.tm = 0x01;
        ppu.bg_sc[0] = 0x04;
        ppu.bg_nba[0] = 0x01;
        ppu
    }

    // Fill every row of 2bpp tile `n` at word 0x1000 with `color`
    fn solid_2bpp_tile(ppu: &mut Ppu, n: usize, color: u16) {
        let low = if color & 1 != 0 { 0xFF } else { 0 };
        let high = if color & 2 != 0 { 0xFF00 } else { 0 };
        (0..8).for_each(|y| ppu.vram[0x1000 + n * 8 + y] = low | high);
    }

    fn pixel(ppu: &Ppu, x: usize, y: usize) -> u32 {
        ppu.back_buffer()[y * SCREEN_WIDTH + x]
    }

    #[test]
    fn test_mode0_tile() {
        let mut ppu = ppu();
        solid_2bpp_tile(&mut ppu, 1, 3);
        // Tile 1 with palette 2 in the top left of the map
        ppu.vram[0x400] = 0x0801;
        ppu.write_cgram(2 * 4 + 3, RED);
        ppu.write_cgram(0, BLUE);
        ppu.render_scanline(0, 0xFF).unwrap();
        assert_eq!(pixel(&ppu, 0, 0), bgr555_to_rgba(RED));
        assert_eq!(pixel(&ppu, 7, 0), bgr555_to_rgba(RED));
        // Tile 0 is empty, so the backdrop shows through
        assert_eq!(pixel(&ppu, 8, 0), bgr555_to_rgba(BLUE));
    }

    #[test]
    fn test_horizontal_flip() {
        let mut ppu = ppu();
        // Only the leftmost pixel of each row is set
        (0..8).for_each(|y| ppu.vram[0x1008 + y] = 0x0080);
        ppu.write_cgram(1, GREEN);
        ppu.vram[0x400] = 0x0001;
        ppu.vram[0x401] = 0x4001;
        ppu.render_scanline(3, 0xFF).unwrap();
        assert_eq!(pixel(&ppu, 0, 3), bgr555_to_rgba(GREEN));
        assert_eq!(pixel(&ppu, 1, 3), bgr555_to_rgba(0));
        assert_eq!(pixel(&ppu, 15, 3), bgr555_to_rgba(GREEN));
        assert_eq!(pixel(&ppu, 8, 3), bgr555_to_rgba(0));
    }

    #[test]
    fn test_mode1_priority() {
        let mut ppu = ppu();
        ppu.bgmode = 0x01;
        ppu.tm = 0x03;
        // BG2 shares the tiles, with its map at word 0x0800
        ppu.bg_sc[1] = 0x08;
        ppu.bg_nba[1] = 0x01;
        // Solid 4bpp tile 1 of colour 1
        (0..8).for_each(|y| ppu.vram[0x1010 + y] = 0x00FF);
        ppu.write_cgram(1, RED);
        ppu.write_cgram(16 + 1, GREEN);
        // BG1 low priority palette 0, BG2 high priority palette 1
        ppu.vram[0x400] = 0x0001;
        ppu.vram[0x800] = 0x2401;
        ppu.render_scanline(0, 0xFF).unwrap();
        assert_eq!(pixel(&ppu, 0, 0), bgr555_to_rgba(GREEN));
        // Both low priority, BG1 wins
        ppu.vram[0x800] = 0x0401;
        ppu.render_scanline(0, 0xFF).unwrap();
        assert_eq!(pixel(&ppu, 0, 0), bgr555_to_rgba(RED));
        // Hidden by the layer mask
        ppu.render_scanline(0, 0x02).unwrap();
        assert_eq!(pixel(&ppu, 0, 0), bgr555_to_rgba(GREEN));
    }

    #[test]
    fn test_large_map_quadrant() {
        let mut ppu = ppu();
        ppu.bg_sc[0] = 0x05;
        solid_2bpp_tile(&mut ppu, 1, 1);
        ppu.write_cgram(1, RED);
        // First tile of the right hand screen
        ppu.vram[0x800] = 0x0001;
        ppu.hofs[0] = 256;
        ppu.render_scanline(0, 0xFF).unwrap();
        assert_eq!(pixel(&ppu, 0, 0), bgr555_to_rgba(RED));
        assert_eq!(pixel(&ppu, 8, 0), bgr555_to_rgba(0));
    }

    #[test]
    fn test_forced_blank() {
        let mut ppu = ppu();
        ppu.write_cgram(0, RED);
        ppu.inidisp = 0x80;
        ppu.render_scanline(10, 0xFF).unwrap();
        assert_eq!(pixel(&ppu, 0, 10), 0x000000FF);
    }

    #[test]
    fn test_unimplemented_mode() {
        let mut ppu = ppu();
        ppu.bgmode = 0x07;
        assert!(matches!(
            ppu.render_scanline(0, 0xFF),
            Err(Error::UnimplementedBgMode(7))
        ));
    }
}
