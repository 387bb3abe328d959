use std::{collections::VecDeque, fmt::Debug, path::Path};

use log::*;
use serde::{Deserialize, Serialize};

use crate::core::{
    apu::master_to_spc_cycles,
    opcodes::format_instruction,
    ppu::SCREEN_HEIGHT,
    scheduler::{HBLANK_LENGTH, HBLANK_TO_END_OF_LINE},
    Apu, Bus, Cartridge, Controller, Cpu, Error, EventKind, GameDb, Settings,
};

/// Master clock cycles per CPU cycle
pub const MASTER_CYCLES_PER_CPU_CYCLE: u64 = 6;
/// Scanlines in an NTSC frame, including V-Blank
pub const LINES_PER_FRAME: u16 = 262;
/// Address of the reset vector in bank 0
pub const RESET_VECTOR: u32 = 0xFFFC;

/// A snapshot of the CPU before an instruction.
/// Used for debug logging.
#[derive(Clone)]
pub struct CpuState {
    cpu: Cpu,
    bytes: [u8; 4],
}

impl CpuState {
    /// Snapshot the CPU along with the instruction it is about to execute.
    pub fn new(snes: &Snes) -> CpuState {
        let pc = snes.cpu.pc_address();
        let mut bytes = [0; 4];
        bytes.iter_mut().enumerate().for_each(|(i, b)| {
            *b = snes
                .bus
                .peek((pc & 0xFF0000) | (pc as u16).wrapping_add(i as u16) as u32)
        });
        CpuState {
            cpu: snes.cpu.clone(),
            bytes,
        }
    }
}

impl Debug for CpuState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} NEXT INST={} (BYTES={:02X?})",
            self.cpu,
            format_instruction(self.cpu.pc_address(), &self.bytes, &self.cpu.p),
            self.bytes
        )
    }
}

/// The SNES.
///
/// Owns the [Cpu] and the [Bus], which holds everything else, and keeps them in step through the
/// bus's scheduler.
#[derive(Serialize, Deserialize)]
pub struct Snes {
    pub cpu: Cpu,
    pub bus: Bus,
    pub settings: Settings,
    /// The current scanline, 0 to 261
    pub line: u16,
    /// Set when the frame's last visible line has been rendered
    pub frame_done: bool,
    /// The most recently executed instructions. Stored for debugging purposes.
    #[serde(skip)]
    pub history: VecDeque<CpuState>,
}

impl Default for Snes {
    fn default() -> Self {
        Self::new()
    }
}

impl Snes {
    /// A SNES with a blank cartridge inserted.
    ///
    /// Only useful for debugging, see [Snes::with_cartridge].
    pub fn new() -> Snes {
        Snes::with_cartridge(Cartridge::blank())
    }

    /// Power on a SNES with a cartridge inserted.
    ///
    /// The CPU starts at the cartridge's reset vector.
    pub fn with_cartridge(cartridge: Cartridge) -> Snes {
        let mut snes = Snes {
            cpu: Cpu::new(),
            bus: Bus::new(cartridge),
            settings: Settings::default(),
            line: 0,
            frame_done: false,
            history: VecDeque::new(),
        };
        snes.reset();
        info!("Initialized PC to {:02X}:{:04X}", snes.cpu.pb, snes.cpu.pc);
        snes
    }

    /// Load a ROM file and power on a SNES with it.
    ///
    /// * `db` The game database the ROM's hash is looked up in.
    /// * `save_path` Where the SRAM is persisted if the cartridge has a battery.
    pub fn load_rom(path: &Path, db: &GameDb, save_path: Option<&Path>) -> Result<Snes, Error> {
        info!("Loading ROM {}", path.display());
        let bytes = std::fs::read(path)?;
        let cartridge = Cartridge::from_bytes(&bytes, db, save_path)?;
        Ok(Snes::with_cartridge(cartridge))
    }

    /// Reset the console.
    ///
    /// The CPU goes back to the reset vector and the audio CPU is restarted. Memory, the PPU and
    /// the scheduler keep running.
    pub fn reset(&mut self) {
        let vector = self.bus.read16(RESET_VECTOR);
        self.cpu.reset(vector);
        self.bus.apu = Apu::new();
        self.bus.apu.cycles = master_to_spc_cycles(self.bus.scheduler.timestamp);
        self.history.clear();
    }

    /// Create a new SNES from a savestate.
    ///
    /// This is the opposite of [`Snes::to_savestate`].
    /// The cartridge has no save file attached, see [`Snes::load_savestate`].
    pub fn from_savestate(savestate: &[u8]) -> Result<Snes, postcard::Error> {
        let mut snes: Snes = postcard::from_bytes(savestate)?;
        snes.bus.rebuild_page_table();
        Ok(snes)
    }
    /// Get a serialized copy of this SNES as binary data.
    ///
    /// This is the opposite of [`Snes::from_savestate`].
    /// ```rust
    /// let snes = yase::core::Snes::new();
    /// let savestate: Vec<u8> = snes.to_savestate().unwrap();
    /// let copy = yase::core::Snes::from_savestate(&savestate).unwrap();
    /// assert_eq!(copy.cpu, snes.cpu);
    /// ```
    pub fn to_savestate(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }
    /// Replace this SNES's state with a savestate, keeping the settings and save file.
    pub fn load_savestate(&mut self, savestate: &[u8]) -> Result<(), postcard::Error> {
        let mut snes = Snes::from_savestate(savestate)?;
        snes.bus.cartridge.take_save_file(&mut self.bus.cartridge);
        snes.settings = self.settings;
        *self = snes;
        Ok(())
    }

    /// The battery backed SRAM of the cartridge, if it has any.
    pub fn savedata(&self) -> Option<&[u8]> {
        if self.bus.cartridge.has_battery {
            Some(&self.bus.cartridge.sram)
        } else {
            None
        }
    }
    /// Write the SRAM to the save file now instead of waiting for the cartridge to be dropped.
    pub fn flush_save(&self) -> Result<(), Error> {
        self.bus.cartridge.flush()
    }

    /// Set the state of one of the controllers.
    pub fn set_controller(&mut self, index: usize, state: Controller) {
        self.bus.controllers[index & 1] = state;
    }

    /// Read a byte for a debugger, without side effects.
    pub fn peek(&self, addr: u32) -> u8 {
        self.bus.peek(addr)
    }
    /// Write a byte for a debugger, without side effects.
    pub fn poke(&mut self, addr: u32, value: u8) {
        self.bus.poke(addr, value)
    }

    /// Execute a single instruction, then handle every event that has come due.
    ///
    /// Returns the number of CPU cycles the instruction took.
    pub fn step(&mut self) -> Result<u32, Error> {
        self.record_state();
        let cycles = match self.cpu.execute_instruction(&mut self.bus) {
            Ok(c) => c,
            Err(e) => return Err(self.log_error(e)),
        };
        let dma_cycles = self.bus.take_dma_cycles();
        self.bus
            .scheduler
            .add_cycles(cycles as u64 * MASTER_CYCLES_PER_CPU_CYCLE + dma_cycles);
        if let Some(e) = self.bus.take_fault() {
            return Err(self.log_error(e));
        }
        if let Err(e) = self.process_events() {
            return Err(self.log_error(e));
        }
        Ok(cycles)
    }

    /// Run until the last visible line of the frame has been rendered.
    ///
    /// Returns the number of CPU cycles elapsed. The frame is in the PPU's back buffer until
    /// [crate::core::Ppu::swap_buffers] is called.
    pub fn run_frame(&mut self) -> Result<u64, Error> {
        self.frame_done = false;
        let mut cycles = 0;
        while !self.frame_done {
            cycles += self.step()? as u64;
        }
        Ok(cycles)
    }

    fn record_state(&mut self) {
        if self.settings.history_len == 0 && !self.settings.trace_instructions {
            return;
        }
        let state = CpuState::new(self);
        if self.settings.trace_instructions {
            trace!("{:?}", state);
        }
        if self.settings.history_len > 0 {
            self.history.push_back(state);
            while self.history.len() > self.settings.history_len {
                self.history.pop_front();
            }
        }
    }

    fn log_error(&self, e: Error) -> Error {
        error!(
            "Encountered an error \"{}\" at {:02X}:{:04X}, printing last {} states\n{:#X?}",
            e,
            self.cpu.pb,
            self.cpu.pc,
            self.history.len(),
            self.history
        );
        e
    }

    fn process_events(&mut self) -> Result<(), Error> {
        while let Some(event) = self.bus.scheduler.pop_due() {
            match event.kind {
                EventKind::HBlank => self.on_hblank(event.timestamp)?,
                EventKind::EndOfLine => self.on_end_of_line(event.timestamp),
                EventKind::FireNmi => {
                    let before = self.cpu.cycles;
                    self.cpu.fire_nmi(&mut self.bus);
                    self.bus
                        .scheduler
                        .add_cycles((self.cpu.cycles - before) * MASTER_CYCLES_PER_CPU_CYCLE);
                }
                EventKind::Sentinel => {
                    return Err(Error::SentinelEventFired {
                        timestamp: event.timestamp,
                    })
                }
            }
        }
        Ok(())
    }

    fn on_hblank(&mut self, timestamp: u64) -> Result<(), Error> {
        // Keep the line going even if rendering fails
        self.bus.hvbjoy |= 0x40;
        self.bus
            .scheduler
            .push_event(EventKind::EndOfLine, timestamp + HBLANK_LENGTH);
        if (self.line as usize) < SCREEN_HEIGHT {
            self.bus
                .ppu
                .render_scanline(self.line as usize, self.settings.layer_mask)?;
        }
        Ok(())
    }

    fn on_end_of_line(&mut self, timestamp: u64) {
        self.bus.hvbjoy &= !0x40;
        self.line += 1;
        if self.line as usize == SCREEN_HEIGHT {
            self.frame_done = true;
            self.bus.rdnmi |= 0x80;
            self.bus.hvbjoy |= 0x80;
            self.bus.auto_read_joypads();
            if self.bus.nmitimen & 0x80 != 0 {
                self.bus.scheduler.push_event(EventKind::FireNmi, timestamp);
            }
        } else if self.line == LINES_PER_FRAME {
            self.line = 0;
            self.bus.rdnmi &= 0x7F;
            self.bus.hvbjoy &= 0x7F;
        }
        self.bus
            .scheduler
            .push_event(EventKind::HBlank, timestamp + HBLANK_TO_END_OF_LINE);
    }
}

impl Debug for Snes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snes")
            .field("cpu", &self.cpu)
            .field("bus", &self.bus)
            .field("line", &self.line)
            .finish()
    }
}
