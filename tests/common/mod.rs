// Where programs built by the macros below are placed in the ROM
#[allow(dead_code)]
pub const PROGRAM_START: u16 = 0x8000;
#[allow(dead_code)]
pub const NMI_HANDLER: u16 = 0x9000;
#[allow(dead_code)]
pub const DATA_START: u16 = 0xA000;

// Create a SNES with a LoROM cartridge running a program from 0x8000
//
// An NMI handler can be given, which is placed at 0x9000 and pointed to by both NMI vectors.
// Extra data can be given, which is placed at 0xA000.
#[macro_export]
macro_rules! snes_with_program {
    ($program: expr) => {
        snes_with_program!($program, &[], &[])
    };
    ($program: expr, nmi: $nmi: expr) => {
        snes_with_program!($program, $nmi, &[])
    };
    ($program: expr, data: $data: expr) => {
        snes_with_program!($program, &[], $data)
    };
    ($program: expr, $nmi: expr, $data: expr) => {{
        use yase::core::{Cartridge, Snes};

        let mut cartridge = Cartridge::blank();
        let program: &[u8] = $program;
        let nmi: &[u8] = $nmi;
        let data: &[u8] = $data;
        let offset = |addr: u16| (addr - 0x8000) as usize;
        cartridge.rom[..program.len()].copy_from_slice(program);
        let nmi_start = offset(common::NMI_HANDLER);
        cartridge.rom[nmi_start..(nmi_start + nmi.len())].copy_from_slice(nmi);
        let data_start = offset(common::DATA_START);
        cartridge.rom[data_start..(data_start + data.len())].copy_from_slice(data);
        // Reset, native NMI and emulation NMI vectors
        [
            (0xFFFC, common::PROGRAM_START),
            (0xFFEA, common::NMI_HANDLER),
            (0xFFFA, common::NMI_HANDLER),
        ]
        .iter()
        .for_each(|&(vector, target)| {
            let o = offset(vector);
            cartridge.rom[o..(o + 2)].copy_from_slice(&target.to_le_bytes());
        });
        Snes::with_cartridge(cartridge)
    }};
}

// Execute a number of instructions, returning the total number of CPU cycles
#[macro_export]
macro_rules! step_snes {
    ($snes: ident, $instructions: expr) => {{
        let mut cycles: u64 = 0;
        for _ in 0..($instructions) {
            cycles += $snes.step().unwrap() as u64;
        }
        cycles
    }};
}

// Run a number of whole frames, swapping the frame buffers after each one
#[macro_export]
macro_rules! advance_snes_frames {
    ($snes: ident, $frames: expr) => {{
        for _ in 0..($frames) {
            $snes.run_frame().unwrap();
            $snes.bus.ppu.swap_buffers();
        }
    }};
}

#[macro_export]
macro_rules! set_button {
    ($snes: ident, $player_number: literal, $key: ident, $value: literal) => {{
        let mut controller = $snes.bus.controllers[$player_number];
        controller.$key = $value;
        $snes.set_controller($player_number, controller);
    }};
}
#[macro_export]
macro_rules! press_button {
    ($snes: ident, $player_number: literal, $key: ident) => {
        set_button!($snes, $player_number, $key, true);
    };
}
#[macro_export]
macro_rules! release_button {
    ($snes: ident, $player_number: literal, $key: ident) => {
        set_button!($snes, $player_number, $key, false);
    };
}

// Render a row of the front buffer as hex colours
#[macro_export]
macro_rules! get_row_str {
    ($snes: ident, $row: expr) => {{
        use yase::core::ppu::SCREEN_WIDTH;
        $snes.bus.ppu.front_buffer()[($row * SCREEN_WIDTH)..(($row + 1) * SCREEN_WIDTH)]
            .chunks(8)
            .map(|tile| format!("{:08X}", tile[0]))
            .collect::<Vec<String>>()
            .join(" ")
    }};
}

// Assemble pieces of a program placed at different addresses from 0x8000
#[allow(dead_code)]
pub fn program(parts: &[(u16, &[u8])]) -> Vec<u8> {
    let len = parts
        .iter()
        .map(|(addr, bytes)| (addr - PROGRAM_START) as usize + bytes.len())
        .max()
        .unwrap_or(0);
    let mut rom = vec![0xEA; len];
    parts.iter().for_each(|(addr, bytes)| {
        let start = (addr - PROGRAM_START) as usize;
        rom[start..(start + bytes.len())].copy_from_slice(bytes);
    });
    rom
}
