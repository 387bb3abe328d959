mod common;
use assert_hex::assert_eq_hex;
use yase::core::{ppu::SCREEN_WIDTH, Error};

const BLACK: u32 = 0x000000FF;
const RED: u32 = 0xFF0000FF;

// Set up BG1 in mode 0 with a single red tile in the top left corner, uploading the tile
// through DMA, then turn the screen on
const DRAW_TILE: &[u8] = &[
    0xA9, 0x80, 0x8D, 0x00, 0x21, // Force blank
    0xA9, 0x00, 0x8D, 0x05, 0x21, // Mode 0
    0xA9, 0x04, 0x8D, 0x07, 0x21, // BG1 map at word 0x0400
    0xA9, 0x01, 0x8D, 0x0B, 0x21, // BG1 tiles at word 0x1000
    0xA9, 0x01, 0x8D, 0x21, 0x21, // CGRAM address 1
    0xA9, 0x1F, 0x8D, 0x22, 0x21, // Red
    0xA9, 0x00, 0x8D, 0x22, 0x21, //
    0xA9, 0x80, 0x8D, 0x15, 0x21, // Increment after writing the high byte
    0xA9, 0x00, 0x8D, 0x16, 0x21, // VRAM address 0x0400
    0xA9, 0x04, 0x8D, 0x17, 0x21, //
    0xA9, 0x01, 0x8D, 0x18, 0x21, // Map entry 0 uses tile 1
    0xA9, 0x00, 0x8D, 0x19, 0x21, //
    0xA9, 0x08, 0x8D, 0x16, 0x21, // VRAM address 0x1008, tile 1
    0xA9, 0x10, 0x8D, 0x17, 0x21, //
    0xA9, 0x01, 0x8D, 0x00, 0x43, // DMA 0: to the B bus, two registers
    0xA9, 0x18, 0x8D, 0x01, 0x43, // VMDATAL
    0xA9, 0xA0, 0x8D, 0x03, 0x43, // From 00:A000
    0xA9, 0x10, 0x8D, 0x05, 0x43, // 16 bytes
    0xA9, 0x01, 0x8D, 0x0B, 0x42, // Start DMA 0
    0xA9, 0x01, 0x8D, 0x2C, 0x21, // BG1 on the main screen
    0xA9, 0x0F, 0x8D, 0x00, 0x21, // Full brightness
    0x80, 0xFE, // BRA -2
];
// Every row of the tile uses colour 1
const TILE: [u8; 16] = [
    0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF,
    0x00,
];

fn pixel(snes: &yase::core::Snes, x: usize, y: usize) -> u32 {
    snes.bus.ppu.front_buffer()[y * SCREEN_WIDTH + x]
}

#[test]
fn test_dma_upload() {
    let mut snes = snes_with_program!(DRAW_TILE, data: &TILE);
    snes.run_frame().unwrap();
    assert_eq!(snes.bus.ppu.vram()[0x0400], 0x0001);
    assert_eq!(snes.bus.ppu.vram()[0x1008..0x1010], [0x00FF; 8]);
    assert_eq!(snes.bus.ppu.vram()[0x1010], 0x0000);
    assert_eq_hex!(snes.bus.ppu.vram_addr(), 0x1010);
    // The channel's registers show the end of the transfer
    assert_eq_hex!(snes.bus.read16(0x4302), 0xA010);
    assert_eq_hex!(snes.bus.read16(0x4305), 0x0000);
}

#[test]
fn test_draw_tile() {
    let mut snes = snes_with_program!(DRAW_TILE, data: &TILE);
    advance_snes_frames!(snes, 2);
    assert_eq_hex!(snes.bus.ppu.palette()[1], RED);
    (0..8).for_each(|y| {
        (0..8).for_each(|x| assert_eq_hex!(pixel(&snes, x, y), RED));
    });
    assert_eq_hex!(pixel(&snes, 8, 0), BLACK);
    assert_eq_hex!(pixel(&snes, 0, 8), BLACK);
    assert_eq_hex!(pixel(&snes, 255, 223), BLACK);
    let expected = std::iter::once(format!("{:08X}", RED))
        .chain((1..32).map(|_| format!("{:08X}", BLACK)))
        .collect::<Vec<String>>()
        .join(" ");
    assert_eq!(get_row_str!(snes, 7), expected);
}

#[test]
fn test_layer_mask_hides_background() {
    let mut snes = snes_with_program!(DRAW_TILE, data: &TILE);
    snes.settings.layer_mask = 0xFE;
    advance_snes_frames!(snes, 2);
    assert_eq_hex!(pixel(&snes, 0, 0), BLACK);
}

#[test]
fn test_scrolling_moves_tile() {
    let mut snes = snes_with_program!(DRAW_TILE, data: &TILE);
    advance_snes_frames!(snes, 1);
    // Scroll 4 pixels right and 2 down through the write twice registers
    snes.bus.write8(0x210D, 0x04);
    snes.bus.write8(0x210D, 0x00);
    snes.bus.write8(0x210E, 0x02);
    snes.bus.write8(0x210E, 0x00);
    advance_snes_frames!(snes, 1);
    assert_eq_hex!(pixel(&snes, 0, 0), RED);
    assert_eq_hex!(pixel(&snes, 3, 5), RED);
    assert_eq_hex!(pixel(&snes, 4, 0), BLACK);
    assert_eq_hex!(pixel(&snes, 0, 6), BLACK);
    // The map wraps around at 256 pixels
    assert_eq_hex!(pixel(&snes, 252, 0), RED);
}

#[test]
fn test_forced_blank_is_black() {
    let mut snes = snes_with_program!(DRAW_TILE, data: &TILE);
    advance_snes_frames!(snes, 1);
    snes.bus.write8(0x2100, 0x80);
    advance_snes_frames!(snes, 1);
    assert_eq_hex!(pixel(&snes, 0, 0), BLACK);
}

#[test]
fn test_unimplemented_mode() {
    let mut snes = snes_with_program!(&[
        0xA9, 0x02, 0x8D, 0x05, 0x21, // Mode 2
        0xA9, 0x0F, 0x8D, 0x00, 0x21, // Full brightness
        0x80, 0xFE, // BRA -2
    ]);
    assert!(matches!(
        snes.run_frame(),
        Err(Error::UnimplementedBgMode(2))
    ));
}

#[test]
fn test_lines_continue_after_unimplemented_mode() {
    let mut snes = snes_with_program!(&[
        0xA9, 0x02, 0x8D, 0x05, 0x21, // Mode 2
        0xA9, 0x0F, 0x8D, 0x00, 0x21, // Full brightness
        0x80, 0xFE, // BRA -2
    ]);
    assert!(snes.run_frame().is_err());
    assert_eq!(snes.line, 0);
    // The failed line still ends, and switching to a supported mode finishes the frame
    snes.bus.write8(0x2105, 0x00);
    snes.run_frame().unwrap();
    assert_eq!(snes.line, 224);
    assert_eq_hex!(snes.bus.hvbjoy & 0x80, 0x80);
}

#[test]
fn test_palette_port() {
    let mut snes = snes_with_program!(&[0x80, 0xFE]);
    snes.bus.write8(0x2121, 0x10);
    snes.bus.write8(0x2122, 0xE0);
    snes.bus.write8(0x2122, 0x03);
    assert_eq_hex!(snes.bus.ppu.cgram()[0x10], 0x03E0);
    assert_eq_hex!(snes.bus.ppu.palette()[0x10], 0x00FF00FF);
    // Reading back goes low byte then high byte
    snes.bus.write8(0x2121, 0x10);
    assert_eq_hex!(snes.bus.read8(0x213B), 0xE0);
    assert_eq_hex!(snes.bus.read8(0x213B), 0x03);
}
