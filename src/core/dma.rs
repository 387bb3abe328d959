use log::*;
use serde::{Deserialize, Serialize};

use crate::core::{Bus, Error};

/// Master cycles spent per byte transferred
pub const DMA_CYCLES_PER_BYTE: u64 = 8;
/// Master cycles of overhead for every channel that runs
pub const DMA_CYCLES_PER_CHANNEL: u64 = 8;

/// How the A bus address moves after every byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressStep {
    Increment,
    Decrement,
    Fixed,
}

/// A general purpose DMA channel.
///
/// Stores the 12 raw registers exposed at 0x43n0-0x43nB and decodes them on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmaChannel {
    pub regs: [u8; 12],
}

impl DmaChannel {
    /// `true` if the transfer goes from the B bus (I/O ports) to the A bus (memory).
    pub fn to_a_bus(&self) -> bool {
        self.regs[0] & 0x80 != 0
    }
    pub fn step(&self) -> AddressStep {
        match (self.regs[0] >> 3) & 0x03 {
            0 => AddressStep::Increment,
            2 => AddressStep::Decrement,
            _ => AddressStep::Fixed,
        }
    }
    /// The transfer unit select, bits 0-2 of the parameters
    pub fn unit(&self) -> u8 {
        self.regs[0] & 0x07
    }
    /// The B bus port offsets written by one transfer unit.
    ///
    /// The transfer repeats this pattern, so the byte counter has to be a multiple of its length.
    /// ```
    /// let mut c = yase::core::DmaChannel::default();
    /// c.regs[0] = 0x01;
    /// assert_eq!(c.pattern(), &[0, 1]);
    /// c.regs[0] = 0x03;
    /// assert_eq!(c.pattern(), &[0, 0, 1, 1]);
    /// ```
    pub fn pattern(&self) -> &'static [u8] {
        match self.unit() {
            0 => &[0],
            1 => &[0, 1],
            2 | 6 => &[0, 0],
            3 | 7 => &[0, 0, 1, 1],
            4 => &[0, 1, 2, 3],
            _ => &[0, 1, 0, 1],
        }
    }
    pub fn b_address(&self) -> u8 {
        self.regs[1]
    }
    pub fn a_address(&self) -> u32 {
        ((self.regs[4] as u32) << 16) | ((self.regs[3] as u32) << 8) | self.regs[2] as u32
    }
    fn set_a_offset(&mut self, offset: u16) {
        self.regs[2] = offset as u8;
        self.regs[3] = (offset >> 8) as u8;
    }
    /// The raw byte counter, 0 meaning 0x10000 bytes
    pub fn counter(&self) -> u16 {
        ((self.regs[6] as u16) << 8) | self.regs[5] as u16
    }
    fn set_counter(&mut self, counter: u16) {
        self.regs[5] = counter as u8;
        self.regs[6] = (counter >> 8) as u8;
    }
    /// Number of bytes the channel moves when started.
    pub fn transfer_len(&self) -> u32 {
        match self.counter() {
            0 => 0x10000,
            c => c as u32,
        }
    }
    /// Read a register at an offset in the channel's 16 byte block.
    pub fn read(&self, reg: usize) -> u8 {
        match reg {
            0x0..=0xB => self.regs[reg],
            0xF => self.regs[0xB],
            _ => 0xFF,
        }
    }
    /// Write a register at an offset in the channel's 16 byte block.
    pub fn write(&mut self, reg: usize, value: u8) {
        match reg {
            0x0..=0xB => self.regs[reg] = value,
            0xF => self.regs[0xB] = value,
            _ => {}
        }
    }
}

impl Bus {
    /// Run a general purpose DMA on a channel to completion.
    pub(crate) fn run_dma(&mut self, index: usize) {
        let mut channel = self.dma[index];
        let pattern = channel.pattern();
        let len = channel.transfer_len();
        if len % pattern.len() as u32 != 0 {
            error!(
                "DMA {} cannot move {:#X} bytes in units of {}",
                index,
                len,
                pattern.len()
            );
            self.fault(Error::InvalidDma {
                channel: index,
                unit: channel.unit(),
                counter: len,
            });
            return;
        }
        debug!(
            "DMA {}: {:#X} bytes {} {:06X} {} {:04X}",
            index,
            len,
            if channel.to_a_bus() { "to" } else { "from" },
            channel.a_address(),
            if channel.to_a_bus() { "from" } else { "to" },
            0x2100 + channel.b_address() as u16
        );
        let bank = channel.a_address() & 0xFF0000;
        let mut offset = channel.a_address() as u16;
        let mut counter = channel.counter();
        let mut i = 0;
        // A counter of 0 wraps to 0xFFFF on the first decrement and moves 0x10000 bytes
        loop {
            let b = 0x2100 | channel.b_address().wrapping_add(pattern[i % pattern.len()]) as u16;
            let a = bank | offset as u32;
            if channel.to_a_bus() {
                let v = self.read_b_bus(b);
                self.write8(a, v);
            } else {
                let v = self.read8(a);
                self.write_b_bus(b, v);
            }
            offset = match channel.step() {
                AddressStep::Increment => offset.wrapping_add(1),
                AddressStep::Decrement => offset.wrapping_sub(1),
                AddressStep::Fixed => offset,
            };
            i += 1;
            counter = counter.wrapping_sub(1);
            if counter == 0 {
                break;
            }
        }
        channel.set_a_offset(offset);
        channel.set_counter(0);
        self.dma[index] = channel;
        self.dma_cycles += DMA_CYCLES_PER_CHANNEL + DMA_CYCLES_PER_BYTE * len as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoding() {
        let c = DmaChannel {
            regs: [0x91, 0x18, 0x34, 0x12, 0x7E, 0x00, 0x08, 0, 0, 0, 0, 0],
        };
        assert!(c.to_a_bus());
        assert_eq!(c.step(), AddressStep::Decrement);
        assert_eq!(c.unit(), 1);
        assert_eq!(c.b_address(), 0x18);
        assert_eq!(c.a_address(), 0x7E1234);
        assert_eq!(c.transfer_len(), 0x800);
    }

    #[test]
    fn test_zero_counter_is_full_bank() {
        let c = DmaChannel::default();
        assert_eq!(c.counter(), 0);
        assert_eq!(c.transfer_len(), 0x10000);
    }

    #[test]
    fn test_fixed_step() {
        let mut c = DmaChannel::default();
        c.write(0, 0x08);
        assert_eq!(c.step(), AddressStep::Fixed);
        c.write(0, 0x18);
        assert_eq!(c.step(), AddressStep::Fixed);
    }

    #[test]
    fn test_register_mirror() {
        let mut c = DmaChannel::default();
        c.write(0xF, 0x42);
        assert_eq!(c.read(0xB), 0x42);
        assert_eq!(c.read(0xC), 0xFF);
    }
}
