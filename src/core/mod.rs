//! The actual emulation code, provided as a library.
//!
//! A library for emulating the Super Nintendo Entertainment System.
//! Contains the entire state of the machine, and updates it accordingly as the SNES is advanced.
//! Each frame is rendered into a double buffered RGBA framebuffer.
//! ```
//! use yase::core::{Snes, Controller};
//! // The actual state of the SNES, with a blank cartridge
//! let mut snes = Snes::new();
//! // Advance the SNES by 1 instruction
//! snes.step().unwrap();
//! // Press B on player 1's controller
//! snes.set_controller(0, Controller {
//!     b: true,
//!     ..Controller::default()
//! });
//! // Inspect memory without side effects
//! let byte = snes.peek(0x7E0000);
//! // Read the last finished frame
//! snes.bus.ppu.swap_buffers();
//! let pixel = snes.bus.ppu.front_buffer()[0];
//! println!("Top left pixel is {:08X}, WRAM starts with {:02X}", pixel, byte);
//! ```
mod snes;
pub use snes::{CpuState, Snes, LINES_PER_FRAME, MASTER_CYCLES_PER_CPU_CYCLE, RESET_VECTOR};
mod cpu;
pub use cpu::Cpu;
pub mod apu;
pub use apu::Apu;
mod bus;
pub use bus::{Bus, Page, PageTable, PAGE_COUNT, PAGE_SIZE, WRAM_SIZE};
mod status_register;
pub use status_register::StatusRegister;
mod cartridge;
pub use cartridge::*;
pub mod opcodes;
pub mod ppu;
pub use ppu::Ppu;
mod dma;
pub use dma::{AddressStep, DmaChannel, DMA_CYCLES_PER_BYTE, DMA_CYCLES_PER_CHANNEL};
mod math_engine;
pub use math_engine::MathEngine;
pub mod scheduler;
pub use scheduler::{Event, EventKind, Scheduler};
mod controller;
pub use controller::Controller;
mod settings;
pub use settings::Settings;
mod error;
pub use error::Error;
