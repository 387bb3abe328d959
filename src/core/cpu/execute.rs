use log::*;

use crate::core::{
    opcodes::{AddressingMode, Instruction, OPCODES},
    Bus, Cpu, Error,
};

/// Native mode exception vectors
pub const NATIVE_COP_VECTOR: u32 = 0xFFE4;
pub const NATIVE_BRK_VECTOR: u32 = 0xFFE6;
pub const NATIVE_NMI_VECTOR: u32 = 0xFFEA;
/// Emulation mode exception vectors
pub const EMULATION_COP_VECTOR: u32 = 0xFFF4;
pub const EMULATION_NMI_VECTOR: u32 = 0xFFFA;
pub const EMULATION_BRK_VECTOR: u32 = 0xFFFE;

impl Cpu {
    /// Fetch, decode and execute a single instruction.
    ///
    /// Returns the number of CPU cycles the instruction took.
    /// An opcode the CPU cannot execute is returned as [Error::UnknownOpcode] with the CPU left
    /// pointing at it.
    pub fn execute_instruction(&mut self, bus: &mut Bus) -> Result<u32, Error> {
        if self.waiting {
            // Idle until an NMI arrives
            self.cycles += 1;
            return Ok(1);
        }
        let start = self.cycles;
        let address = self.pc_address();
        let opcode = self.fetch8(bus);
        let op = OPCODES[opcode as usize];
        self.cycles += op.cycles as u64;
        if op.mode.uses_direct_page() && self.d & 0xFF != 0 {
            self.cycles += 1;
        }
        if op.instruction == Instruction::Stp {
            // Stops the clock until a reset, which would hang the emulator
            self.pc = address as u16;
            return Err(Error::UnknownOpcode { opcode, address });
        }
        self.execute(bus, op.instruction, op.mode);
        Ok((self.cycles - start) as u32)
    }

    // Read the operand at the accumulator width
    fn read_m(&mut self, bus: &mut Bus, mode: AddressingMode) -> u16 {
        let wide = !self.p.m;
        let (operand, penalty) = self.resolve(bus, mode);
        self.cycles += wide as u64 + penalty as u64;
        self.read_operand(bus, operand, wide)
    }
    // Read the operand at the index width
    fn read_x(&mut self, bus: &mut Bus, mode: AddressingMode) -> u16 {
        let wide = !self.p.x;
        let (operand, penalty) = self.resolve(bus, mode);
        self.cycles += wide as u64 + penalty as u64;
        self.read_operand(bus, operand, wide)
    }
    fn write_m(&mut self, bus: &mut Bus, mode: AddressingMode, value: u16) {
        let wide = !self.p.m;
        let (operand, _) = self.resolve(bus, mode);
        self.cycles += wide as u64;
        self.write_operand(bus, operand, value, wide);
    }
    fn write_x(&mut self, bus: &mut Bus, mode: AddressingMode, value: u16) {
        let wide = !self.p.x;
        let (operand, _) = self.resolve(bus, mode);
        self.cycles += wide as u64;
        self.write_operand(bus, operand, value, wide);
    }
    // Read, modify and write back the operand at the accumulator width
    fn modify_m(&mut self, bus: &mut Bus, mode: AddressingMode, f: fn(&mut Cpu, u16) -> u16) {
        let wide = !self.p.m;
        let (operand, _) = self.resolve(bus, mode);
        if mode != AddressingMode::Accumulator && wide {
            self.cycles += 2;
        }
        let value = self.read_operand(bus, operand, wide);
        let result = f(self, value);
        self.write_operand(bus, operand, result, wide);
    }

    fn branch(&mut self, bus: &mut Bus, condition: bool) {
        let offset = self.fetch8(bus) as i8;
        if condition {
            let target = self.pc.wrapping_add_signed(offset as i16);
            self.cycles += 1;
            if self.emulation && target & 0xFF00 != self.pc & 0xFF00 {
                self.cycles += 1;
            }
            self.pc = target;
        }
    }

    /// Push the return state and jump through an exception vector.
    fn interrupt(&mut self, bus: &mut Bus, native_vector: u32, emulation_vector: u32, brk: bool) {
        let vector = if self.emulation {
            self.push16(bus, self.pc);
            // Bit 4 tells BRK apart from an IRQ in emulation mode
            let p = self.p.to_byte();
            self.push8(bus, if brk { p | 0x10 } else { p & !0x10 });
            emulation_vector
        } else {
            self.push8(bus, self.pb);
            self.push16(bus, self.pc);
            self.push8(bus, self.p.to_byte());
            self.cycles += 1;
            native_vector
        };
        self.p.i = true;
        self.p.d = false;
        self.pb = 0;
        self.pc = bus.read16(vector);
    }

    /// Take a non maskable interrupt, waking the CPU from WAI.
    pub fn fire_nmi(&mut self, bus: &mut Bus) {
        debug!("NMI at {:02X}:{:04X}", self.pb, self.pc);
        self.waiting = false;
        self.cycles += 7;
        self.interrupt(bus, NATIVE_NMI_VECTOR, EMULATION_NMI_VECTOR, false);
    }

    fn transfer_index(&mut self, value: u16) -> u16 {
        let v = self.index(value);
        self.set_nz(v, !self.p.x);
        v
    }

    fn execute(
        &mut self,
        bus: &mut Bus,
        instruction: Instruction,
        mode: AddressingMode,
    ) {
        use Instruction::*;
        // Read the operand and pass it to an ALU function
        macro_rules! cpu_func {
            ($func: ident, $read: ident) => {{
                let v = self.$read(bus, mode);
                self.$func(v);
            }};
        }
        // Read the operand, pass it to an ALU function and write back the result
        macro_rules! cpu_write_func {
            ($func: ident) => {{
                self.modify_m(bus, mode, Cpu::$func);
            }};
        }
        macro_rules! store_func {
            ($value: expr, $write: ident) => {{
                let v = $value;
                self.$write(bus, mode, v);
            }};
        }
        macro_rules! flag_func {
            ($flag: ident, $val: expr) => {{
                self.p.$flag = $val;
            }};
        }
        macro_rules! branch_func {
            ($cond: expr) => {{
                let c = $cond;
                self.branch(bus, c);
            }};
        }
        match instruction {
            Lda => cpu_func!(lda, read_m),
            Ldx => cpu_func!(ldx, read_x),
            Ldy => cpu_func!(ldy, read_x),
            Adc => cpu_func!(adc, read_m),
            Sbc => cpu_func!(sbc, read_m),
            And => cpu_func!(and, read_m),
            Ora => cpu_func!(ora, read_m),
            Eor => cpu_func!(eor, read_m),
            Cmp => cpu_func!(cmp, read_m),
            Cpx => cpu_func!(cpx, read_x),
            Cpy => cpu_func!(cpy, read_x),
            Bit => {
                let v = self.read_m(bus, mode);
                self.bit(v, mode == AddressingMode::ImmediateM);
            }

            Sta => store_func!(self.a, write_m),
            Stz => store_func!(0, write_m),
            Stx => store_func!(self.x, write_x),
            Sty => store_func!(self.y, write_x),

            Asl => cpu_write_func!(asl),
            Lsr => cpu_write_func!(lsr),
            Rol => cpu_write_func!(rol),
            Ror => cpu_write_func!(ror),
            Tsb => cpu_write_func!(tsb),
            Trb => cpu_write_func!(trb),
            Inc => self.modify_m(bus, mode, |cpu, v| cpu.inc(v, !cpu.p.m)),
            Dec => self.modify_m(bus, mode, |cpu, v| cpu.dec(v, !cpu.p.m)),
            Inx => self.x = self.inc(self.x, !self.p.x),
            Iny => self.y = self.inc(self.y, !self.p.x),
            Dex => self.x = self.dec(self.x, !self.p.x),
            Dey => self.y = self.dec(self.y, !self.p.x),

            Bcc => branch_func!(!self.p.c),
            Bcs => branch_func!(self.p.c),
            Beq => branch_func!(self.p.z),
            Bne => branch_func!(!self.p.z),
            Bmi => branch_func!(self.p.n),
            Bpl => branch_func!(!self.p.n),
            Bvc => branch_func!(!self.p.v),
            Bvs => branch_func!(self.p.v),
            Bra => branch_func!(true),
            Brl => {
                let offset = self.fetch16(bus);
                self.pc = self.pc.wrapping_add(offset);
            }

            Clc => flag_func!(c, false),
            Cld => flag_func!(d, false),
            Cli => flag_func!(i, false),
            Clv => flag_func!(v, false),
            Sec => flag_func!(c, true),
            Sed => flag_func!(d, true),
            Sei => flag_func!(i, true),
            Rep => {
                let v = self.fetch8(bus);
                self.set_status(self.p.to_byte() & !v);
            }
            Sep => {
                let v = self.fetch8(bus);
                self.set_status(self.p.to_byte() | v);
            }
            Xce => self.exchange_carry_emulation(),

            Brk | Cop => {
                // Signature byte
                self.fetch8(bus);
                if instruction == Brk {
                    self.interrupt(bus, NATIVE_BRK_VECTOR, EMULATION_BRK_VECTOR, true);
                } else {
                    self.interrupt(bus, NATIVE_COP_VECTOR, EMULATION_COP_VECTOR, true);
                }
            }
            Rti => {
                let p = self.pull8(bus);
                self.set_status(p);
                self.pc = self.pull16(bus);
                if !self.emulation {
                    self.pb = self.pull8(bus);
                    self.cycles += 1;
                }
            }

            Jmp => match mode {
                AddressingMode::AbsoluteLong => {
                    let target = self.fetch24(bus);
                    self.pc = target as u16;
                    self.pb = (target >> 16) as u8;
                }
                AddressingMode::AbsoluteIndirect => {
                    let ptr = self.fetch16(bus);
                    self.pc = self.read_bank0_16(bus, ptr);
                }
                AddressingMode::AbsoluteXIndirect => {
                    let ptr = self.fetch16(bus).wrapping_add(self.x);
                    self.pc = bus.read16(((self.pb as u32) << 16) | ptr as u32);
                }
                _ => self.pc = self.fetch16(bus),
            },
            Jml => {
                let ptr = self.fetch16(bus);
                let low = self.read_bank0_16(bus, ptr);
                self.pb = bus.read8(ptr.wrapping_add(2) as u32);
                self.pc = low;
            }
            Jsr => {
                let target = self.fetch16(bus);
                self.push16(bus, self.pc.wrapping_sub(1));
                self.pc = if mode == AddressingMode::AbsoluteXIndirect {
                    let ptr = target.wrapping_add(self.x);
                    bus.read16(((self.pb as u32) << 16) | ptr as u32)
                } else {
                    target
                };
            }
            Jsl => {
                let target = self.fetch24(bus);
                self.push8(bus, self.pb);
                self.push16(bus, self.pc.wrapping_sub(1));
                self.pc = target as u16;
                self.pb = (target >> 16) as u8;
            }
            Rts => self.pc = self.pull16(bus).wrapping_add(1),
            Rtl => {
                self.pc = self.pull16(bus).wrapping_add(1);
                self.pb = self.pull8(bus);
            }

            Mvn | Mvp => {
                let dest = self.fetch8(bus);
                let src = self.fetch8(bus);
                let v = bus.read8(((src as u32) << 16) | self.x as u32);
                bus.write8(((dest as u32) << 16) | self.y as u32, v);
                self.db = dest;
                if instruction == Mvn {
                    self.x = self.index(self.x.wrapping_add(1));
                    self.y = self.index(self.y.wrapping_add(1));
                } else {
                    self.x = self.index(self.x.wrapping_sub(1));
                    self.y = self.index(self.y.wrapping_sub(1));
                }
                // The whole 16 bit accumulator counts the bytes left, minus one
                self.a = self.a.wrapping_sub(1);
                if self.a != 0xFFFF {
                    self.pc = self.pc.wrapping_sub(3);
                }
            }

            Pea => {
                let v = self.fetch16(bus);
                self.push16(bus, v);
            }
            Pei => {
                let ptr = self.direct(bus);
                let v = self.read_bank0_16(bus, ptr);
                self.push16(bus, v);
            }
            Per => {
                let offset = self.fetch16(bus);
                self.push16(bus, self.pc.wrapping_add(offset));
            }
            Pha => {
                if self.p.m {
                    self.push8(bus, self.a as u8);
                } else {
                    self.push16(bus, self.a);
                    self.cycles += 1;
                }
            }
            Phx | Phy => {
                let v = if instruction == Phx { self.x } else { self.y };
                if self.p.x {
                    self.push8(bus, v as u8);
                } else {
                    self.push16(bus, v);
                    self.cycles += 1;
                }
            }
            Phb => self.push8(bus, self.db),
            Phd => self.push16(bus, self.d),
            Phk => self.push8(bus, self.pb),
            Php => self.push8(bus, self.p.to_byte()),
            Pla => {
                let v = if self.p.m {
                    self.pull8(bus) as u16
                } else {
                    self.cycles += 1;
                    self.pull16(bus)
                };
                self.lda(v);
            }
            Plx | Ply => {
                let v = if self.p.x {
                    self.pull8(bus) as u16
                } else {
                    self.cycles += 1;
                    self.pull16(bus)
                };
                if instruction == Plx {
                    self.ldx(v);
                } else {
                    self.ldy(v);
                }
            }
            Plb => {
                self.db = self.pull8(bus);
                self.set_nz(self.db as u16, false);
            }
            Pld => {
                self.d = self.pull16(bus);
                self.set_nz(self.d, true);
            }
            Plp => {
                let p = self.pull8(bus);
                self.set_status(p);
            }

            Tax => self.x = self.transfer_index(self.a),
            Tay => self.y = self.transfer_index(self.a),
            Tsx => self.x = self.transfer_index(self.s),
            Txy => self.y = self.transfer_index(self.x),
            Tyx => self.x = self.transfer_index(self.y),
            Txa => self.lda(self.x),
            Tya => self.lda(self.y),
            Txs => {
                self.s = if self.emulation {
                    0x0100 | (self.x & 0xFF)
                } else {
                    self.x
                }
            }
            Tcs => {
                self.s = if self.emulation {
                    0x0100 | (self.a & 0xFF)
                } else {
                    self.a
                }
            }
            Tcd => {
                self.d = self.a;
                self.set_nz(self.d, true);
            }
            Tdc => {
                self.a = self.d;
                self.set_nz(self.a, true);
            }
            Tsc => {
                self.a = self.s;
                self.set_nz(self.a, true);
            }
            Xba => {
                self.a = self.a.swap_bytes();
                self.set_nz(self.a, false);
            }

            Nop => {}
            Wdm => {
                self.fetch8(bus);
            }
            Wai => self.waiting = true,
            Stp => {}
        }
    }
}
