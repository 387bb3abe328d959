use log::*;

use crate::core::{Bus, Error, EventKind};

// CPU version in the low bits of RDNMI
const CPU_VERSION: u8 = 0x02;

impl Bus {
    // Only banks 00-3F and 80-BF have I/O registers
    fn io_register(addr: u32) -> Option<u16> {
        if (addr >> 16) & 0x7F < 0x40 {
            Some(addr as u16)
        } else {
            None
        }
    }

    /// Read from an address that isn't in the page table.
    pub(super) fn read_io(&mut self, addr: u32) -> u8 {
        let Some(reg) = Bus::io_register(addr) else {
            return self.unmapped_read(addr);
        };
        match reg {
            // Mode 7 multiplication result
            0x2134..=0x2136 => self.math.read_m7_product((reg - 0x2134) as usize),
            0x2137..=0x213F => self.ppu.read(reg),
            0x2140..=0x217F => {
                self.catch_up_apu();
                self.apu.read_port((reg & 0x03) as usize)
            }
            0x2180 => {
                let v = self.wram[self.wram_addr as usize];
                self.increment_wram_addr();
                v
            }
            0x4016 | 0x4017 => {
                let i = (reg - 0x4016) as usize;
                let bit = (self.joypad_shift[i] >> 15) as u8;
                if !self.joypad_strobe {
                    // Ones are shifted in once all 16 bits are read
                    self.joypad_shift[i] = (self.joypad_shift[i] << 1) | 1;
                }
                bit | if i == 1 { 0x1C } else { 0 }
            }
            0x4210 => {
                let v = self.rdnmi | CPU_VERSION;
                self.rdnmi &= 0x7F;
                v
            }
            // IRQs are not emulated, so the IRQ flag is never set
            0x4211 => 0x00,
            0x4212 => self.hvbjoy,
            0x4213 => 0xFF,
            0x4214 => self.math.quotient as u8,
            0x4215 => (self.math.quotient >> 8) as u8,
            0x4216 => self.math.remainder_or_product as u8,
            0x4217 => (self.math.remainder_or_product >> 8) as u8,
            0x4218..=0x421B => {
                let pad = self.joypad_auto[((reg - 0x4218) / 2) as usize];
                if reg % 2 == 0 {
                    pad as u8
                } else {
                    (pad >> 8) as u8
                }
            }
            // Joypads 3 and 4
            0x421C..=0x421F => 0x00,
            0x4300..=0x437F => {
                self.dma[((reg >> 4) & 0x07) as usize].read((reg & 0x0F) as usize)
            }
            _ => self.unmapped_read(addr),
        }
    }

    /// Write to an address that isn't in the page table.
    pub(super) fn write_io(&mut self, addr: u32, value: u8) {
        let Some(reg) = Bus::io_register(addr) else {
            return self.unmapped_write(addr, value);
        };
        match reg {
            0x211B => self.math.write_m7_multiplicand(value),
            0x211C => self.math.write_m7_multiplier(value),
            0x2100..=0x213F => self.ppu.write(reg, value),
            0x2140..=0x217F => {
                self.catch_up_apu();
                self.apu.write_port((reg & 0x03) as usize, value);
            }
            0x2180 => {
                self.wram[self.wram_addr as usize] = value;
                self.increment_wram_addr();
            }
            0x2181 => self.wram_addr = (self.wram_addr & 0x1FF00) | value as u32,
            0x2182 => self.wram_addr = (self.wram_addr & 0x100FF) | ((value as u32) << 8),
            0x2183 => self.wram_addr = (self.wram_addr & 0x0FFFF) | (((value & 1) as u32) << 16),
            0x4016 => {
                self.joypad_strobe = value & 0x01 != 0;
                if self.joypad_strobe {
                    self.joypad_shift = [
                        self.controllers[0].to_bits(),
                        self.controllers[1].to_bits(),
                    ];
                }
            }
            0x4200 => self.write_nmitimen(value),
            0x4202 => self.math.write_multiplicand(value),
            0x4203 => self.math.write_multiplier(value),
            0x4204 => self.math.write_dividend_low(value),
            0x4205 => self.math.write_dividend_high(value),
            0x4206 => self.math.write_divisor(value),
            0x420B => (0..8)
                .filter(|i| value & (1 << i) != 0)
                .for_each(|i| self.run_dma(i)),
            0x420C => {
                if value != 0 {
                    warn!("HDMA is not supported, ignoring HDMAEN write {:02X}", value);
                }
            }
            // Programmable I/O port, IRQ timers and FastROM select
            0x4201 | 0x4207..=0x420A | 0x420D => {
                debug!("Ignoring write {:02X} to {:04X}", value, reg)
            }
            0x4300..=0x437F => {
                self.dma[((reg >> 4) & 0x07) as usize].write((reg & 0x0F) as usize, value)
            }
            _ => self.unmapped_write(addr, value),
        }
    }

    fn write_nmitimen(&mut self, value: u8) {
        if value & 0x30 != 0 {
            debug!("H/V IRQs are not emulated (NMITIMEN = {:02X})", value);
        }
        let rising = value & 0x80 != 0 && self.nmitimen & 0x80 == 0;
        self.nmitimen = value;
        // Enabling NMIs in the middle of V-Blank fires one straight away
        if rising && self.rdnmi & 0x80 != 0 {
            self.scheduler
                .push_event(EventKind::FireNmi, self.scheduler.timestamp);
        }
    }

    fn increment_wram_addr(&mut self) {
        self.wram_addr = (self.wram_addr + 1) & 0x1FFFF;
    }

    /// Read a B bus register (0x2100-0x21FF) for DMA.
    pub(crate) fn read_b_bus(&mut self, addr: u16) -> u8 {
        self.read_io(addr as u32)
    }

    /// Write a B bus register (0x2100-0x21FF) for DMA.
    pub(crate) fn write_b_bus(&mut self, addr: u16, value: u8) {
        self.write_io(addr as u32, value)
    }

    fn unmapped_read(&mut self, addr: u32) -> u8 {
        error!("Read from unmapped address {:06X}", addr);
        self.fault(Error::UnmappedRead { address: addr });
        0xFF
    }

    fn unmapped_write(&mut self, addr: u32, value: u8) {
        error!("Write {:02X} to unmapped address {:06X}", value, addr);
        self.fault(Error::UnmappedWrite {
            address: addr,
            value,
        });
    }
}
