mod render;
pub use render::Depth;

use log::*;
use serde::{Deserialize, Serialize};

/// Width of the picture in pixels
pub const SCREEN_WIDTH: usize = 256;
/// Height of the picture in lines
pub const SCREEN_HEIGHT: usize = 224;
/// Size of VRAM in 16 bit words
pub const VRAM_WORDS: usize = 0x8000;
/// Size of OAM in bytes
pub const OAM_SIZE: usize = 0x220;

/// Convert a 5 bit colour component to 8 bits.
/// ```
/// use yase::core::ppu::expand_color;
/// assert_eq!(expand_color(0), 0);
/// assert_eq!(expand_color(0x1F), 0xFF);
/// assert_eq!(expand_color(0x10), 0x84);
/// ```
pub fn expand_color(c: u16) -> u8 {
    let c = (c & 0x1F) as u8;
    (c << 3) | (c >> 2)
}

/// Convert a BGR555 palette entry to RGBA8888, packed so that the bytes read R, G, B, A in big endian order.
/// ```
/// use yase::core::ppu::bgr555_to_rgba;
/// assert_eq!(bgr555_to_rgba(0x7FFF), 0xFFFFFFFF);
/// assert_eq!(bgr555_to_rgba(0x001F), 0xFF0000FF);
/// assert_eq!(bgr555_to_rgba(0x7C00), 0x0000FFFF);
/// ```
pub fn bgr555_to_rgba(color: u16) -> u32 {
    u32::from_be_bytes([
        expand_color(color),
        expand_color(color >> 5),
        expand_color(color >> 10),
        0xFF,
    ])
}

/// The two framebuffers the PPU draws into.
///
/// One is drawn into while the other is shown. Not part of a savestate.
#[derive(Clone)]
pub struct FrameBuffers {
    buffers: [Vec<u32>; 2],
    /// Index of the buffer currently being drawn into
    index: usize,
}

impl Default for FrameBuffers {
    fn default() -> Self {
        FrameBuffers {
            buffers: [
                vec![0x000000FF; SCREEN_WIDTH * SCREEN_HEIGHT],
                vec![0x000000FF; SCREEN_WIDTH * SCREEN_HEIGHT],
            ],
            index: 0,
        }
    }
}

/// The picture processing unit.
///
/// Holds VRAM, CGRAM and OAM along with every background register, and renders backgrounds one
/// line at a time into a double buffered framebuffer.
#[derive(Clone, Serialize, Deserialize)]
pub struct Ppu {
    vram: Vec<u16>,
    cgram: Vec<u16>,
    // RGBA version of every CGRAM entry, rewritten on every write to the entry
    palette_cache: Vec<u32>,
    oam: Vec<u8>,
    oam_addr: u16,
    oam_latch: u8,
    /// INIDISP, bit 7 forces blank
    pub inidisp: u8,
    /// BGMODE, bits 0-2 are the mode, bit 3 gives BG3 priority in mode 1, bits 4-7 are 16x16 tiles per BG
    pub bgmode: u8,
    /// BGnSC, bits 2-7 are the tile map base (1K word units), bits 0-1 the map size
    pub bg_sc: [u8; 4],
    /// Character data base of every BG in 4K word units
    pub bg_nba: [u8; 4],
    pub hofs: [u16; 4],
    pub vofs: [u16; 4],
    // Previous byte written to any scroll register
    scroll_latch: u8,
    // Previous byte written to a horizontal scroll register
    hofs_latch: u8,
    /// VMAIN
    pub vmain: u8,
    vram_addr: u16,
    vram_prefetch: u16,
    cgram_addr: u8,
    cgram_latch: Option<u8>,
    cgram_read_high: bool,
    /// TM, main screen layer enables, bit 0 is BG1
    pub tm: u8,
    #[serde(skip)]
    buffers: FrameBuffers,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    pub fn new() -> Ppu {
        Ppu {
            vram: vec![0; VRAM_WORDS],
            cgram: vec![0; 0x100],
            palette_cache: vec![bgr555_to_rgba(0); 0x100],
            oam: vec![0; OAM_SIZE],
            oam_addr: 0,
            oam_latch: 0,
            inidisp: 0x80,
            bgmode: 0,
            bg_sc: [0; 4],
            bg_nba: [0; 4],
            hofs: [0; 4],
            vofs: [0; 4],
            scroll_latch: 0,
            hofs_latch: 0,
            vmain: 0,
            vram_addr: 0,
            vram_prefetch: 0,
            cgram_addr: 0,
            cgram_latch: None,
            cgram_read_high: false,
            tm: 0,
            buffers: FrameBuffers::default(),
        }
    }

    /// Write to a PPU register (0x2100 - 0x2133).
    ///
    /// The mode 7 multiplier registers are handled by the [MathEngine][crate::core::MathEngine].
    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x2100 => self.inidisp = value,
            0x2102 => {
                self.oam_addr = (self.oam_addr & 0x200) | ((value as u16) << 1);
            }
            0x2103 => {
                self.oam_addr = (((value as u16) & 0x01) << 9) | (self.oam_addr & 0x1FE);
            }
            0x2104 => self.write_oam(value),
            0x2105 => {
                if value & 0x07 != self.bgmode & 0x07 {
                    debug!("BG mode set to {}", value & 0x07);
                }
                self.bgmode = value;
            }
            0x2107..=0x210A => self.bg_sc[(addr - 0x2107) as usize] = value,
            0x210B => {
                self.bg_nba[0] = value & 0x0F;
                self.bg_nba[1] = value >> 4;
            }
            0x210C => {
                self.bg_nba[2] = value & 0x0F;
                self.bg_nba[3] = value >> 4;
            }
            0x210D..=0x2114 => {
                let bg = ((addr - 0x210D) / 2) as usize;
                if (addr - 0x210D) % 2 == 0 {
                    self.write_hofs(bg, value);
                } else {
                    self.write_vofs(bg, value);
                }
            }
            0x2115 => self.vmain = value,
            0x2116 => {
                self.vram_addr = (self.vram_addr & 0xFF00) | value as u16;
                self.prefetch_vram();
            }
            0x2117 => {
                self.vram_addr = (self.vram_addr & 0x00FF) | ((value as u16) << 8);
                self.prefetch_vram();
            }
            0x2118 => {
                let a = self.remapped_vram_addr();
                self.vram[a] = (self.vram[a] & 0xFF00) | value as u16;
                if self.vmain & 0x80 == 0 {
                    self.increment_vram_addr();
                }
            }
            0x2119 => {
                let a = self.remapped_vram_addr();
                self.vram[a] = (self.vram[a] & 0x00FF) | ((value as u16) << 8);
                if self.vmain & 0x80 != 0 {
                    self.increment_vram_addr();
                }
            }
            0x2121 => {
                self.cgram_addr = value;
                self.cgram_latch = None;
                self.cgram_read_high = false;
            }
            0x2122 => match self.cgram_latch.take() {
                None => self.cgram_latch = Some(value),
                Some(low) => {
                    let color = (((value & 0x7F) as u16) << 8) | low as u16;
                    self.write_cgram(self.cgram_addr, color);
                    self.cgram_addr = self.cgram_addr.wrapping_add(1);
                }
            },
            0x212C => self.tm = value,
            // OBSEL, mosaic, mode 7, windows, sub screen and colour math
            0x2101 | 0x2106 | 0x211A..=0x2120 | 0x2123..=0x212B | 0x212D..=0x2133 => {
                debug!("Ignoring write {:02X} to PPU register {:04X}", value, addr)
            }
            _ => warn!("Write {:02X} to read only PPU register {:04X}", value, addr),
        }
    }

    /// Read from a PPU register (0x2137 - 0x213F).
    ///
    /// Reads may advance the VRAM, CGRAM and OAM addresses.
    pub fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x2138 => {
                let v = self.oam[self.oam_addr as usize];
                self.oam_addr = (self.oam_addr + 1) % OAM_SIZE as u16;
                v
            }
            0x2139 => {
                let v = self.vram_prefetch as u8;
                if self.vmain & 0x80 == 0 {
                    self.prefetch_vram();
                    self.increment_vram_addr();
                }
                v
            }
            0x213A => {
                let v = (self.vram_prefetch >> 8) as u8;
                if self.vmain & 0x80 != 0 {
                    self.prefetch_vram();
                    self.increment_vram_addr();
                }
                v
            }
            0x213B => {
                let color = self.cgram[self.cgram_addr as usize];
                if self.cgram_read_high {
                    self.cgram_read_high = false;
                    self.cgram_addr = self.cgram_addr.wrapping_add(1);
                    (color >> 8) as u8 & 0x7F
                } else {
                    self.cgram_read_high = true;
                    color as u8
                }
            }
            // Chip versions, NTSC
            0x213E => 0x01,
            0x213F => 0x03,
            // H/V counter latches are not emulated
            _ => 0,
        }
    }

    fn write_hofs(&mut self, bg: usize, value: u8) {
        self.hofs[bg] = (((value as u16) << 8)
            | (self.scroll_latch as u16 & !7)
            | (self.hofs_latch as u16 & 7))
            & 0x3FF;
        self.scroll_latch = value;
        self.hofs_latch = value;
    }

    fn write_vofs(&mut self, bg: usize, value: u8) {
        self.vofs[bg] = (((value as u16) << 8) | self.scroll_latch as u16) & 0x3FF;
        self.scroll_latch = value;
    }

    fn write_oam(&mut self, value: u8) {
        let a = self.oam_addr as usize;
        if a >= 0x200 {
            self.oam[a] = value;
        } else if a % 2 == 0 {
            self.oam_latch = value;
        } else {
            self.oam[a - 1] = self.oam_latch;
            self.oam[a] = value;
        }
        self.oam_addr = (self.oam_addr + 1) % OAM_SIZE as u16;
    }

    /// Write a colour to CGRAM, updating the palette cache.
    pub fn write_cgram(&mut self, index: u8, color: u16) {
        self.cgram[index as usize] = color & 0x7FFF;
        self.palette_cache[index as usize] = bgr555_to_rgba(color);
    }

    // The address translation selected by VMAIN bits 2-3
    fn remapped_vram_addr(&self) -> usize {
        let a = self.vram_addr;
        let remapped = match (self.vmain >> 2) & 0x03 {
            0 => a,
            1 => (a & 0xFF00) | ((a & 0x001F) << 3) | ((a >> 5) & 7),
            2 => (a & 0xFE00) | ((a & 0x003F) << 3) | ((a >> 6) & 7),
            _ => (a & 0xFC00) | ((a & 0x007F) << 3) | ((a >> 7) & 7),
        };
        remapped as usize & (VRAM_WORDS - 1)
    }

    fn increment_vram_addr(&mut self) {
        let step = match self.vmain & 0x03 {
            0 => 1,
            1 => 32,
            _ => 128,
        };
        self.vram_addr = self.vram_addr.wrapping_add(step);
    }

    fn prefetch_vram(&mut self) {
        self.vram_prefetch = self.vram[self.remapped_vram_addr()];
    }

    /// VRAM, as 16 bit words
    pub fn vram(&self) -> &[u16] {
        &self.vram
    }
    pub fn vram_mut(&mut self) -> &mut [u16] {
        &mut self.vram
    }
    /// The word address the next VRAM data access goes to, before remapping
    pub fn vram_addr(&self) -> u16 {
        self.vram_addr
    }
    /// CGRAM, as BGR555 words
    pub fn cgram(&self) -> &[u16] {
        &self.cgram
    }
    /// CGRAM converted to RGBA
    pub fn palette(&self) -> &[u32] {
        &self.palette_cache
    }
    pub fn oam(&self) -> &[u8] {
        &self.oam
    }

    /// The buffer currently being rendered into.
    pub fn back_buffer(&self) -> &[u32] {
        &self.buffers.buffers[self.buffers.index]
    }
    /// The buffer that was rendered into before the last [Ppu::swap_buffers].
    ///
    /// After a frame completes, the caller swaps the buffers and presents this one while the next
    /// frame is drawn into the other.
    pub fn front_buffer(&self) -> &[u32] {
        &self.buffers.buffers[self.buffers.index ^ 1]
    }
    pub fn swap_buffers(&mut self) {
        self.buffers.index ^= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_hex::assert_eq_hex;

    #[test]
    fn test_palette_write_updates_cache() {
        let mut ppu = Ppu::new();
        ppu.write(0x2121, 0x05);
        ppu.write(0x2122, 0x1F);
        // Cache isn't touched until the second write
        assert_eq_hex!(ppu.palette()[5], 0x000000FF);
        ppu.write(0x2122, 0x7C);
        assert_eq_hex!(ppu.cgram()[5], 0x7C1F);
        assert_eq_hex!(ppu.palette()[5], 0xFF00FFFF);
        // Second colour goes to the next entry
        ppu.write(0x2122, 0xE0);
        ppu.write(0x2122, 0x03);
        assert_eq_hex!(ppu.cgram()[6], 0x03E0);
    }

    #[test]
    fn test_palette_components() {
        let mut ppu = Ppu::new();
        for color in [0x0000u16, 0x1234, 0x7FFF, 0x4210] {
            ppu.write_cgram(0, color);
            let first = ppu.palette()[0];
            ppu.write_cgram(0, color);
            assert_eq!(first, ppu.palette()[0]);
            let [r, g, b, a] = first.to_be_bytes();
            assert_eq!(r, expand_color(color));
            assert_eq!(g, expand_color(color >> 5));
            assert_eq!(b, expand_color(color >> 10));
            assert_eq!(a, 0xFF);
        }
    }

    #[test]
    fn test_cgram_read() {
        let mut ppu = Ppu::new();
        ppu.write_cgram(3, 0x7ABC);
        ppu.write(0x2121, 0x03);
        assert_eq_hex!(ppu.read(0x213B), 0xBC);
        assert_eq_hex!(ppu.read(0x213B), 0x7A);
        assert_eq!(ppu.cgram_addr, 4);
    }

    #[test]
    fn test_scroll_latch() {
        let mut ppu = Ppu::new();
        ppu.write(0x210D, 0x00);
        ppu.write(0x210D, 0x01);
        assert_eq_hex!(ppu.hofs[0], 0x100);
        ppu.write(0x2110, 0x34);
        ppu.write(0x2110, 0x02);
        assert_eq_hex!(ppu.vofs[1], 0x234);
        // Bits 3-7 come from the previous scroll write, bits 0-2 from the previous horizontal one
        ppu.write(0x210F, 0xFF);
        assert_eq_hex!(ppu.hofs[1], 0x301);
        ppu.write(0x210F, 0x00);
        assert_eq_hex!(ppu.hofs[1], 0x0FF);
    }

    #[test]
    fn test_vram_increment_modes() {
        let mut ppu = Ppu::new();
        // Increment after the high byte, by one word
        ppu.write(0x2115, 0x80);
        ppu.write(0x2116, 0x00);
        ppu.write(0x2117, 0x10);
        ppu.write(0x2118, 0x34);
        assert_eq_hex!(ppu.vram_addr(), 0x1000);
        ppu.write(0x2119, 0x12);
        assert_eq_hex!(ppu.vram_addr(), 0x1001);
        assert_eq_hex!(ppu.vram()[0x1000], 0x1234);
        // Increment after the low byte, by 32 words
        ppu.write(0x2115, 0x01);
        ppu.write(0x2118, 0xAA);
        assert_eq_hex!(ppu.vram_addr(), 0x1021);
        ppu.write(0x2119, 0xBB);
        assert_eq_hex!(ppu.vram_addr(), 0x1021);
    }

    #[test]
    fn test_vram_read_prefetch() {
        let mut ppu = Ppu::new();
        ppu.vram_mut()[0x20] = 0xBEEF;
        ppu.vram_mut()[0x21] = 0xCAFE;
        ppu.write(0x2115, 0x80);
        ppu.write(0x2116, 0x20);
        ppu.write(0x2117, 0x00);
        // The latch is refilled before the address moves, so the first word is read twice
        let bytes: Vec<u8> = (0..6).map(|i| ppu.read(0x2139 + (i % 2))).collect();
        assert_eq!(bytes, vec![0xEF, 0xBE, 0xEF, 0xBE, 0xFE, 0xCA]);
    }

    #[test]
    fn test_vram_remap() {
        let mut ppu = Ppu::new();
        // 8 bit rotation, aaaaaaaaYYYxxxxx -> aaaaaaaaxxxxxYYY
        ppu.write(0x2115, 0x84);
        ppu.write(0x2116, 0x21);
        ppu.write(0x2117, 0x00);
        ppu.write(0x2118, 0x11);
        ppu.write(0x2119, 0x22);
        assert_eq_hex!(ppu.vram()[0x09], 0x2211);
    }

    #[test]
    fn test_oam_writes_are_paired() {
        let mut ppu = Ppu::new();
        ppu.write(0x2102, 0x01);
        ppu.write(0x2103, 0x00);
        ppu.write(0x2104, 0xAB);
        assert_eq!(ppu.oam()[2], 0x00);
        ppu.write(0x2104, 0xCD);
        assert_eq!(&ppu.oam()[2..4], &[0xAB, 0xCD]);
    }
}
