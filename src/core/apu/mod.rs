//! The audio subsystem: an SPC700 CPU with its own RAM, timers and communication ports.
//!
//! The audio CPU is not stepped alongside the main CPU. It is only caught up to the main CPU's
//! timeline when the main CPU touches one of the four communication ports, see [Apu::run_until].
//! The DSP is not emulated, its registers are plain storage.
mod spc700;
mod timer;
pub use timer::Timer;

use log::*;
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

use crate::core::Error;

/// The audio CPU clock, in hertz.
pub const SPC_CLOCK: u64 = 1_024_000;
/// The console's master clock, in hertz.
pub const MASTER_CLOCK: u64 = 21_477_272;
/// Where the audio CPU starts executing, the start of the boot ROM.
pub const SPC_RESET_VECTOR: u16 = 0xFFC0;

/// The 64 byte IPL boot ROM, mapped at `$FFC0-$FFFF` until disabled through the control register.
pub const BOOT_ROM: [u8; 64] = [
    0xCD, 0xEF, 0xBD, 0xE8, 0x00, 0xC6, 0x1D, 0xD0, 0xFC, 0x8F, 0xAA, 0xF4, 0x8F, 0xBB, 0xF5, 0x78,
    0xCC, 0xF4, 0xD0, 0xFB, 0x2F, 0x19, 0xEB, 0xF4, 0xD0, 0xFC, 0x7E, 0xF4, 0xD0, 0x0B, 0xE4, 0xF5,
    0xCB, 0xF4, 0xD7, 0x00, 0xFC, 0xD0, 0xF3, 0xAB, 0x01, 0x10, 0xEF, 0x7E, 0xF4, 0x10, 0xEB, 0xBA,
    0xF6, 0xDA, 0x00, 0xBA, 0xF4, 0xC4, 0xF4, 0xDD, 0x5D, 0xD0, 0xDB, 0x1F, 0x00, 0x00, 0xC0, 0xFF,
];

/// Translate a master clock timestamp into the audio CPU's timeline.
/// ```
/// use yase::core::apu::{master_to_spc_cycles, MASTER_CLOCK, SPC_CLOCK};
/// assert_eq!(master_to_spc_cycles(MASTER_CLOCK), SPC_CLOCK);
/// ```
pub fn master_to_spc_cycles(master: u64) -> u64 {
    (master as u128 * SPC_CLOCK as u128 / MASTER_CLOCK as u128) as u64
}

/// The audio CPU's status word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpcStatus {
    pub c: bool,
    pub z: bool,
    /// Interrupt enable, there are no interrupt sources so it does nothing
    pub i: bool,
    /// Half carry
    pub h: bool,
    /// Break
    pub b: bool,
    /// Direct page, the direct page is at `$0100` instead of `$0000` when set
    pub p: bool,
    pub v: bool,
    pub n: bool,
}

impl SpcStatus {
    pub fn to_byte(&self) -> u8 {
        [self.c, self.z, self.i, self.h, self.b, self.p, self.v, self.n]
            .iter()
            .enumerate()
            .fold(0, |b, (i, set)| if *set { b | (1 << i) } else { b })
    }
    pub fn from_byte(&mut self, byte: u8) {
        self.c = byte & 0x01 != 0;
        self.z = byte & 0x02 != 0;
        self.i = byte & 0x04 != 0;
        self.h = byte & 0x08 != 0;
        self.b = byte & 0x10 != 0;
        self.p = byte & 0x20 != 0;
        self.v = byte & 0x40 != 0;
        self.n = byte & 0x80 != 0;
    }
}

/// The audio processing unit.
///
/// Recreated from scratch on every console reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Apu {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub psw: SpcStatus,
    /// The audio CPU's own cycle counter
    pub cycles: u64,
    pub ram: Vec<u8>,
    pub timers: [Timer; 3],
    /// Written by the main CPU, read by the audio CPU
    pub input_ports: [u8; 4],
    /// Written by the audio CPU, read by the main CPU
    pub output_ports: [u8; 4],
    /// Whether `$FFC0-$FFFF` reads come from the boot ROM instead of RAM
    pub boot_rom_mapped: bool,
    dsp_index: u8,
    #[serde(with = "BigArray")]
    dsp_registers: [u8; 0x80],
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl Apu {
    pub fn new() -> Apu {
        Apu {
            a: 0,
            x: 0,
            y: 0,
            sp: 0,
            pc: SPC_RESET_VECTOR,
            psw: SpcStatus::default(),
            cycles: 0,
            ram: vec![0; 0x10000],
            timers: [Timer::new(128), Timer::new(128), Timer::new(16)],
            input_ports: [0; 4],
            output_ports: [0; 4],
            boot_rom_mapped: true,
            dsp_index: 0,
            dsp_registers: [0; 0x80],
        }
    }
    /// Execute audio CPU instructions until its cycle counter reaches `timestamp`.
    ///
    /// `timestamp` is in audio CPU cycles, see [master_to_spc_cycles].
    pub fn run_until(&mut self, timestamp: u64) -> Result<(), Error> {
        while self.cycles < timestamp {
            self.execute_opcode()?;
        }
        Ok(())
    }
    /// Read one of the output ports from the main CPU's side.
    pub fn read_port(&self, port: usize) -> u8 {
        self.output_ports[port & 3]
    }
    /// Write one of the input ports from the main CPU's side.
    pub fn write_port(&mut self, port: usize, value: u8) {
        self.input_ports[port & 3] = value;
    }
    /// The DSP register file, which is stored but not interpreted.
    pub fn dsp_registers(&self) -> &[u8] {
        &self.dsp_registers
    }

    /// Read a byte in the audio CPU's address space.
    pub fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0xF0 | 0xF1 => 0,
            0xF2 => self.dsp_index,
            0xF3 => self.dsp_registers[(self.dsp_index & 0x7F) as usize],
            0xF4..=0xF7 => self.input_ports[(addr - 0xF4) as usize],
            0xF8 | 0xF9 => self.ram[addr as usize],
            // Timer targets are write only
            0xFA..=0xFC => 0,
            0xFD..=0xFF => {
                let cycles = self.cycles;
                self.timers[(addr - 0xFD) as usize].read(cycles)
            }
            0xFFC0..=0xFFFF if self.boot_rom_mapped => BOOT_ROM[(addr & 0x3F) as usize],
            _ => self.ram[addr as usize],
        }
    }
    /// Read a byte without affecting the timers.
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0xF4..=0xF7 => self.input_ports[(addr - 0xF4) as usize],
            0xFD..=0xFF => self.timers[(addr - 0xFD) as usize].peek(),
            0xFFC0..=0xFFFF if self.boot_rom_mapped => BOOT_ROM[(addr & 0x3F) as usize],
            _ => self.ram[addr as usize],
        }
    }
    /// Write a byte in the audio CPU's address space.
    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0xF0 => {
                if value != 0x0A {
                    warn!("[SPC700] Ignoring write of {:02X} to TEST register", value);
                }
            }
            0xF1 => self.write_control(value),
            0xF2 => self.dsp_index = value,
            0xF3 => {
                // Registers 80-FF are read only mirrors
                if self.dsp_index < 0x80 {
                    self.dsp_registers[self.dsp_index as usize] = value;
                }
            }
            0xF4..=0xF7 => self.output_ports[(addr - 0xF4) as usize] = value,
            0xFA..=0xFC => {
                let cycles = self.cycles;
                self.timers[(addr - 0xFA) as usize].set_divider(cycles, value);
            }
            0xFD..=0xFF => {}
            // Writes to the boot ROM area always land in RAM
            _ => self.ram[addr as usize] = value,
        }
    }
    fn write_control(&mut self, value: u8) {
        self.boot_rom_mapped = value & 0x80 != 0;
        let cycles = self.cycles;
        self.timers.iter_mut().enumerate().for_each(|(i, timer)| {
            if value & (1 << i) == 0 {
                timer.disable();
            } else if !timer.enabled {
                timer.enable(cycles);
            }
        });
        if value & 0x10 != 0 {
            self.input_ports[0] = 0;
            self.input_ports[1] = 0;
        }
        if value & 0x20 != 0 {
            self.input_ports[2] = 0;
            self.input_ports[3] = 0;
        }
    }
}
