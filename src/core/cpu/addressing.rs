use crate::core::{opcodes::AddressingMode, Bus, Cpu};

/// Where an instruction's operand lives once its addressing mode has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// The value itself, fetched from the instruction stream
    Immediate(u16),
    Accumulator,
    /// An address in bank 0 whose 16 bit accesses wrap within the bank
    Bank0(u16),
    /// A 24 bit address whose 16 bit accesses cross into the next bank
    Long(u32),
}

// Whether adding an index to an address lands on another page
fn crosses_page(base: u32, indexed: u32) -> bool {
    base & 0xFFFF00 != indexed & 0xFFFF00
}

impl Cpu {
    /// Read the next byte of the instruction stream.
    pub(super) fn fetch8(&mut self, bus: &mut Bus) -> u8 {
        let v = bus.read8(self.pc_address());
        self.pc = self.pc.wrapping_add(1);
        v
    }
    pub(super) fn fetch16(&mut self, bus: &mut Bus) -> u16 {
        u16::from_le_bytes([self.fetch8(bus), self.fetch8(bus)])
    }
    pub(super) fn fetch24(&mut self, bus: &mut Bus) -> u32 {
        let low = self.fetch16(bus) as u32;
        low | ((self.fetch8(bus) as u32) << 16)
    }

    /// Read a word from bank 0, wrapping within the bank.
    pub(super) fn read_bank0_16(&self, bus: &mut Bus, addr: u16) -> u16 {
        u16::from_le_bytes([
            bus.read8(addr as u32),
            bus.read8(addr.wrapping_add(1) as u32),
        ])
    }
    fn read_bank0_24(&self, bus: &mut Bus, addr: u16) -> u32 {
        let low = self.read_bank0_16(bus, addr) as u32;
        low | ((bus.read8(addr.wrapping_add(2) as u32) as u32) << 16)
    }

    /// Fetch a direct page offset and add D to it.
    pub(super) fn direct(&mut self, bus: &mut Bus) -> u16 {
        let offset = self.fetch8(bus);
        self.d.wrapping_add(offset as u16)
    }

    // The address of a direct page offset with an index added.
    // In emulation mode with a page aligned D the result wraps within the page.
    fn direct_indexed(&self, offset: u8, index: u16) -> u16 {
        if self.emulation && self.d & 0xFF == 0 {
            self.d | (offset as u16).wrapping_add(index) & 0xFF
        } else {
            self.d.wrapping_add(offset as u16).wrapping_add(index)
        }
    }

    // An address in the data bank with an index added, and whether that costs the extra cycle
    fn indexed(&self, base: u32, index: u16) -> (Operand, bool) {
        let addr = (base + index as u32) & 0xFFFFFF;
        (Operand::Long(addr), !self.p.x || crosses_page(base, addr))
    }

    /// Fetch the operand bytes of an instruction and resolve where its operand lives.
    ///
    /// The flag is set when the indexed modes spend an extra cycle, either from crossing a page
    /// or from 16 bit index registers. Only instructions that read their operand pay it.
    pub(super) fn resolve(&mut self, bus: &mut Bus, mode: AddressingMode) -> (Operand, bool) {
        use AddressingMode::*;
        let data_bank = (self.db as u32) << 16;
        let operand = match mode {
            Accumulator => Operand::Accumulator,
            ImmediateM => Operand::Immediate(if self.p.m {
                self.fetch8(bus) as u16
            } else {
                self.fetch16(bus)
            }),
            ImmediateX => Operand::Immediate(if self.p.x {
                self.fetch8(bus) as u16
            } else {
                self.fetch16(bus)
            }),
            Immediate8 => Operand::Immediate(self.fetch8(bus) as u16),
            Direct => {
                let offset = self.fetch8(bus);
                Operand::Bank0(self.d.wrapping_add(offset as u16))
            }
            DirectX => {
                let offset = self.fetch8(bus);
                Operand::Bank0(self.direct_indexed(offset, self.x))
            }
            DirectY => {
                let offset = self.fetch8(bus);
                Operand::Bank0(self.direct_indexed(offset, self.y))
            }
            DirectIndirect => {
                let ptr = self.direct(bus);
                Operand::Long(data_bank | self.read_bank0_16(bus, ptr) as u32)
            }
            DirectIndirectLong => {
                let ptr = self.direct(bus);
                Operand::Long(self.read_bank0_24(bus, ptr))
            }
            DirectXIndirect => {
                let offset = self.fetch8(bus);
                let ptr = self.direct_indexed(offset, self.x);
                Operand::Long(data_bank | self.read_bank0_16(bus, ptr) as u32)
            }
            DirectIndirectY => {
                let ptr = self.direct(bus);
                let base = data_bank | self.read_bank0_16(bus, ptr) as u32;
                return self.indexed(base, self.y);
            }
            DirectIndirectLongY => {
                let ptr = self.direct(bus);
                let base = self.read_bank0_24(bus, ptr);
                return (Operand::Long((base + self.y as u32) & 0xFFFFFF), false);
            }
            Absolute => Operand::Long(data_bank | self.fetch16(bus) as u32),
            AbsoluteX => {
                let base = data_bank | self.fetch16(bus) as u32;
                return self.indexed(base, self.x);
            }
            AbsoluteY => {
                let base = data_bank | self.fetch16(bus) as u32;
                return self.indexed(base, self.y);
            }
            AbsoluteLong => Operand::Long(self.fetch24(bus)),
            AbsoluteLongX => {
                let base = self.fetch24(bus);
                Operand::Long((base + self.x as u32) & 0xFFFFFF)
            }
            StackRelative => {
                let offset = self.fetch8(bus);
                Operand::Bank0(self.s.wrapping_add(offset as u16))
            }
            StackRelativeIndirectY => {
                let offset = self.fetch8(bus);
                let ptr = self.s.wrapping_add(offset as u16);
                let base = data_bank | self.read_bank0_16(bus, ptr) as u32;
                Operand::Long((base + self.y as u32) & 0xFFFFFF)
            }
            // Not data operands, the instructions using these fetch their own bytes
            Implied | Relative | RelativeLong | BlockMove | AbsoluteIndirect
            | AbsoluteIndirectLong | AbsoluteXIndirect => Operand::Immediate(0),
        };
        (operand, false)
    }

    /// Read an operand, 8 or 16 bits wide.
    pub(super) fn read_operand(&self, bus: &mut Bus, operand: Operand, wide: bool) -> u16 {
        match operand {
            Operand::Immediate(v) => v,
            Operand::Accumulator => {
                if wide {
                    self.a
                } else {
                    self.a & 0xFF
                }
            }
            Operand::Bank0(addr) => {
                if wide {
                    self.read_bank0_16(bus, addr)
                } else {
                    bus.read8(addr as u32) as u16
                }
            }
            Operand::Long(addr) => {
                if wide {
                    bus.read16(addr)
                } else {
                    bus.read8(addr) as u16
                }
            }
        }
    }

    /// Write an operand, 8 or 16 bits wide.
    pub(super) fn write_operand(&mut self, bus: &mut Bus, operand: Operand, value: u16, wide: bool) {
        let [low, high] = value.to_le_bytes();
        match operand {
            Operand::Immediate(_) => {}
            Operand::Accumulator => self.set_a(value),
            Operand::Bank0(addr) => {
                bus.write8(addr as u32, low);
                if wide {
                    bus.write8(addr.wrapping_add(1) as u32, high);
                }
            }
            Operand::Long(addr) => {
                bus.write8(addr, low);
                if wide {
                    bus.write8((addr + 1) & 0xFFFFFF, high);
                }
            }
        }
    }

    /// Push a byte onto the stack.
    pub(super) fn push8(&mut self, bus: &mut Bus, value: u8) {
        bus.write8(self.s as u32, value);
        self.s = self.s.wrapping_sub(1);
        if self.emulation {
            self.s = 0x0100 | (self.s & 0xFF);
        }
    }
    pub(super) fn push16(&mut self, bus: &mut Bus, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.push8(bus, high);
        self.push8(bus, low);
    }
    /// Pull a byte off the stack.
    pub(super) fn pull8(&mut self, bus: &mut Bus) -> u8 {
        self.s = self.s.wrapping_add(1);
        if self.emulation {
            self.s = 0x0100 | (self.s & 0xFF);
        }
        bus.read8(self.s as u32)
    }
    pub(super) fn pull16(&mut self, bus: &mut Bus) -> u16 {
        u16::from_le_bytes([self.pull8(bus), self.pull8(bus)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Cartridge;
    use assert_hex::assert_eq_hex;

    fn setup(program: &[u8]) -> (Cpu, Bus) {
        let mut bus = Bus::new(Cartridge::blank());
        program
            .iter()
            .enumerate()
            .for_each(|(i, b)| bus.wram[0x1000 + i] = *b);
        let mut cpu = Cpu::new();
        cpu.emulation = false;
        cpu.pc = 0x1000;
        (cpu, bus)
    }

    #[test]
    fn test_direct_wraps_in_bank_0() {
        let (mut cpu, mut bus) = setup(&[0x10]);
        cpu.d = 0xFFF8;
        cpu.db = 0x7E;
        assert_eq!(
            cpu.resolve(&mut bus, AddressingMode::Direct),
            (Operand::Bank0(0x0008), false)
        );
        assert_eq!(cpu.pc, 0x1001);
    }

    #[test]
    fn test_emulation_direct_page_wrap() {
        let (mut cpu, mut bus) = setup(&[0xF0]);
        cpu.emulation = true;
        cpu.d = 0x0100;
        cpu.x = 0x20;
        assert_eq!(
            cpu.resolve(&mut bus, AddressingMode::DirectX),
            (Operand::Bank0(0x0110), false)
        );
    }

    #[test]
    fn test_absolute_x_page_cross() {
        let (mut cpu, mut bus) = setup(&[0xF0, 0x12, 0x00, 0x13]);
        cpu.p.x = true;
        cpu.db = 0x7E;
        cpu.x = 0x20;
        assert_eq!(
            cpu.resolve(&mut bus, AddressingMode::AbsoluteX),
            (Operand::Long(0x7E1310), true)
        );
        cpu.x = 0x01;
        assert_eq!(
            cpu.resolve(&mut bus, AddressingMode::AbsoluteX),
            (Operand::Long(0x7E1301), false)
        );
    }

    #[test]
    fn test_indirect_long_y() {
        let (mut cpu, mut bus) = setup(&[0x40]);
        bus.wram[0x40..0x43].copy_from_slice(&[0xFF, 0xFF, 0x7E]);
        cpu.y = 0x0002;
        assert_eq!(
            cpu.resolve(&mut bus, AddressingMode::DirectIndirectLongY),
            (Operand::Long(0x7F0001), false)
        );
    }

    #[test]
    fn test_stack_in_emulation_mode() {
        let (mut cpu, mut bus) = setup(&[]);
        cpu.emulation = true;
        cpu.s = 0x0100;
        cpu.push16(&mut bus, 0xBEEF);
        assert_eq_hex!(cpu.s, 0x01FE);
        assert_eq_hex!(bus.wram[0x100], 0xBE);
        assert_eq_hex!(bus.wram[0x1FF], 0xEF);
        assert_eq_hex!(cpu.pull16(&mut bus), 0xBEEF);
        assert_eq_hex!(cpu.s, 0x0100);
    }
}
