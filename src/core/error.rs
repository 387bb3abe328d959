use std::fmt;

/// Everything that can stop the emulator.
///
/// Loading problems (`Io`, `SaveFileSize`, `RomTooSmall`) come out of [crate::core::Snes::load_rom].
/// The rest are emulation gaps: hardware behaviour that is not emulated. They are returned from
/// [crate::core::Snes::step] and the emulator should not be advanced any further afterwards.
#[derive(Debug)]
pub enum Error {
    /// Wrapper for I/O errors raised while reading ROMs or save files.
    Io(std::io::Error),
    /// A save file exists but does not match the cartridge's RAM size.
    SaveFileSize { expected: usize, actual: u64 },
    /// The ROM is too small to contain a cartridge header.
    RomTooSmall { actual: usize },
    /// The main CPU fetched an opcode it cannot execute.
    UnknownOpcode { opcode: u8, address: u32 },
    /// The audio CPU executed SLEEP or STOP and will never wake up.
    SpcHalted { opcode: u8, address: u16 },
    /// A read hit an address nothing is mapped to.
    UnmappedRead { address: u32 },
    /// A write hit an address nothing is mapped to.
    UnmappedWrite { address: u32, value: u8 },
    /// The PPU was asked to render a background mode that is not implemented.
    UnimplementedBgMode(u8),
    /// A DMA was started with a transfer unit/counter combination that is not supported.
    InvalidDma { channel: usize, unit: u8, counter: u32 },
    /// The scheduler's sentinel event was reached.
    SentinelEventFired { timestamp: u64 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "i/o error: {err}"),
            Self::SaveFileSize { expected, actual } => write!(
                f,
                "save file found, but it is {actual:#X} bytes instead of {expected:#X}"
            ),
            Self::RomTooSmall { actual } => {
                write!(f, "ROM is only {actual:#X} bytes, too small for a header")
            }
            Self::UnknownOpcode { opcode, address } => {
                write!(f, "unknown opcode {opcode:#04X} at {address:06X}")
            }
            Self::SpcHalted { opcode, address } => {
                write!(f, "[SPC700] halting instruction {opcode:#04X} at {address:04X}")
            }
            Self::UnmappedRead { address } => write!(f, "read from slow address {address:06X}"),
            Self::UnmappedWrite { address, value } => write!(
                f,
                "wrote to slow address {address:06X} (value: {value:02X})"
            ),
            Self::UnimplementedBgMode(mode) => write!(f, "BG mode {mode} is not implemented"),
            Self::InvalidDma {
                channel,
                unit,
                counter,
            } => write!(
                f,
                "DMA channel {channel}: unit select {unit} cannot transfer {counter:#X} bytes"
            ),
            Self::SentinelEventFired { timestamp } => {
                write!(f, "sentinel event fired at master cycle {timestamp}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
