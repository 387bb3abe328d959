use log::*;

use super::Apu;
use crate::core::Error;

/// Base cycle cost of every audio CPU opcode. Taken branches cost 2 more.
const CYCLES: [u8; 256] = [
    2, 8, 4, 5, 3, 4, 3, 6, 2, 6, 5, 4, 5, 4, 6, 8, // 0x
    2, 8, 4, 5, 4, 5, 5, 6, 5, 5, 6, 5, 2, 2, 4, 6, // 1x
    2, 8, 4, 5, 3, 4, 3, 6, 2, 6, 5, 4, 5, 4, 5, 4, // 2x
    2, 8, 4, 5, 4, 5, 5, 6, 5, 5, 6, 5, 2, 2, 3, 8, // 3x
    2, 8, 4, 5, 3, 4, 3, 6, 2, 6, 4, 4, 5, 4, 6, 6, // 4x
    2, 8, 4, 5, 4, 5, 5, 6, 5, 5, 4, 5, 2, 2, 4, 3, // 5x
    2, 8, 4, 5, 3, 4, 3, 6, 2, 6, 4, 4, 5, 4, 5, 5, // 6x
    2, 8, 4, 5, 4, 5, 5, 6, 5, 5, 5, 5, 2, 2, 3, 6, // 7x
    2, 8, 4, 5, 3, 4, 3, 6, 2, 6, 5, 4, 5, 2, 4, 5, // 8x
    2, 8, 4, 5, 4, 5, 5, 6, 5, 5, 5, 5, 2, 2, 12, 5, // 9x
    3, 8, 4, 5, 3, 4, 3, 6, 2, 6, 4, 4, 5, 2, 4, 4, // Ax
    2, 8, 4, 5, 4, 5, 5, 6, 5, 5, 5, 5, 2, 2, 3, 4, // Bx
    3, 8, 4, 5, 4, 5, 4, 7, 2, 5, 6, 4, 5, 2, 4, 9, // Cx
    2, 8, 4, 5, 5, 6, 6, 7, 4, 5, 5, 5, 2, 2, 6, 3, // Dx
    2, 8, 4, 5, 3, 4, 3, 6, 2, 4, 5, 3, 4, 3, 4, 3, // Ex
    2, 8, 4, 5, 4, 5, 5, 6, 3, 4, 5, 4, 2, 2, 5, 3, // Fx
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Direct,
    DirectX,
    DirectY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// `(X)`
    IndirectX,
    /// `[dp+X]`
    DirectIndirectX,
    /// `[dp]+Y`
    IndirectY,
}

// Columns 4-7 share the same addressing modes across the ALU, load and store rows
fn column_mode(odd_row: bool, column: u8) -> Mode {
    match (odd_row, column) {
        (false, 0x4) => Mode::Direct,
        (false, 0x5) => Mode::Absolute,
        (false, 0x6) => Mode::IndirectX,
        (false, _) => Mode::DirectIndirectX,
        (true, 0x4) => Mode::DirectX,
        (true, 0x5) => Mode::AbsoluteX,
        (true, 0x6) => Mode::AbsoluteY,
        (true, _) => Mode::IndirectY,
    }
}

impl Apu {
    /// Execute a single audio CPU instruction.
    pub fn execute_opcode(&mut self) -> Result<(), Error> {
        let pc = self.pc;
        let opcode = self.next_byte();
        self.cycles += CYCLES[opcode as usize] as u64;
        let row = opcode >> 4;
        let column = opcode & 0x0F;
        let odd_row = row & 1 == 1;

        match (row, column) {
            (_, 0x1) => {
                let target = self.read16(0xFFDE - 2 * row as u16);
                self.call(target);
            }
            // SET1/CLR1 dp.bit
            (_, 0x2) => {
                let addr = self.address(Mode::Direct);
                let value = self.read(addr);
                let bit = 1 << (row >> 1);
                let value = if odd_row { value & !bit } else { value | bit };
                self.write(addr, value);
            }
            // BBS/BBC dp.bit, rel
            (_, 0x3) => {
                let value = self.read_operand(Mode::Direct);
                let set = value & (1 << (row >> 1)) != 0;
                self.branch(set != odd_row);
            }
            (0x0..=0xB, 0x4..=0x9) => self.alu_group(row, column),
            (0x0..=0xB, 0xB | 0xC) => self.shift_group(row, column),

            (0x0, 0x0) => {}
            (0x2, 0x0) => self.psw.p = false,
            (0x4, 0x0) => self.psw.p = true,
            (0x6, 0x0) => self.psw.c = false,
            (0x8, 0x0) => self.psw.c = true,
            (0xA, 0x0) => self.psw.i = true,
            (0xC, 0x0) => self.psw.i = false,
            (0xE, 0x0) => {
                self.psw.v = false;
                self.psw.h = false;
            }
            (0x1, 0x0) => self.branch(!self.psw.n),
            (0x3, 0x0) => self.branch(self.psw.n),
            (0x5, 0x0) => self.branch(!self.psw.v),
            (0x7, 0x0) => self.branch(self.psw.v),
            (0x9, 0x0) => self.branch(!self.psw.c),
            (0xB, 0x0) => self.branch(self.psw.c),
            (0xD, 0x0) => self.branch(!self.psw.z),
            (0xF, 0x0) => self.branch(self.psw.z),

            // Stores
            (0xC | 0xD, 0x4..=0x7) => {
                let addr = self.address(column_mode(odd_row, column));
                self.write(addr, self.a);
            }
            (0xC, 0x9) => {
                let addr = self.address(Mode::Absolute);
                self.write(addr, self.x);
            }
            (0xD, 0x8) => {
                let addr = self.address(Mode::Direct);
                self.write(addr, self.x);
            }
            (0xD, 0x9) => {
                let addr = self.address(Mode::DirectY);
                self.write(addr, self.x);
            }
            (0xC, 0xB) => {
                let addr = self.address(Mode::Direct);
                self.write(addr, self.y);
            }
            (0xC, 0xC) => {
                let addr = self.address(Mode::Absolute);
                self.write(addr, self.y);
            }
            (0xD, 0xB) => {
                let addr = self.address(Mode::DirectX);
                self.write(addr, self.y);
            }
            (0x8, 0xF) => {
                let value = self.next_byte();
                let addr = self.address(Mode::Direct);
                self.write(addr, value);
            }
            (0xF, 0xA) => {
                let value = self.read_operand(Mode::Direct);
                let addr = self.address(Mode::Direct);
                self.write(addr, value);
            }
            (0xA, 0xF) => {
                let addr = self.address(Mode::IndirectX);
                self.write(addr, self.a);
                self.x = self.x.wrapping_add(1);
            }

            // Loads
            (0xE | 0xF, 0x4..=0x7) => {
                self.a = self.read_operand(column_mode(odd_row, column));
                self.set_nz(self.a);
            }
            (0xE, 0x8) => {
                self.a = self.next_byte();
                self.set_nz(self.a);
            }
            (0xB, 0xF) => {
                self.a = self.read_operand(Mode::IndirectX);
                self.x = self.x.wrapping_add(1);
                self.set_nz(self.a);
            }
            (0xC, 0xD) => {
                self.x = self.next_byte();
                self.set_nz(self.x);
            }
            (0xE, 0x9) => {
                self.x = self.read_operand(Mode::Absolute);
                self.set_nz(self.x);
            }
            (0xF, 0x8) => {
                self.x = self.read_operand(Mode::Direct);
                self.set_nz(self.x);
            }
            (0xF, 0x9) => {
                self.x = self.read_operand(Mode::DirectY);
                self.set_nz(self.x);
            }
            (0x8, 0xD) => {
                self.y = self.next_byte();
                self.set_nz(self.y);
            }
            (0xE, 0xB) => {
                self.y = self.read_operand(Mode::Direct);
                self.set_nz(self.y);
            }
            (0xE, 0xC) => {
                self.y = self.read_operand(Mode::Absolute);
                self.set_nz(self.y);
            }
            (0xF, 0xB) => {
                self.y = self.read_operand(Mode::DirectX);
                self.set_nz(self.y);
            }

            // Register transfers
            (0x5, 0xD) => {
                self.x = self.a;
                self.set_nz(self.x);
            }
            (0x7, 0xD) => {
                self.a = self.x;
                self.set_nz(self.a);
            }
            (0xD, 0xD) => {
                self.a = self.y;
                self.set_nz(self.a);
            }
            (0xF, 0xD) => {
                self.y = self.a;
                self.set_nz(self.y);
            }
            (0x9, 0xD) => {
                self.x = self.sp;
                self.set_nz(self.x);
            }
            (0xB, 0xD) => self.sp = self.x,

            (0x1, 0xD) => self.x = self.dec(self.x),
            (0x3, 0xD) => self.x = self.inc(self.x),
            (0xD, 0xC) => self.y = self.dec(self.y),
            (0xF, 0xC) => self.y = self.inc(self.y),

            // Index register compares
            (0xC, 0x8) => {
                let value = self.next_byte();
                self.compare(self.x, value);
            }
            (0x3, 0xE) => {
                let value = self.read_operand(Mode::Direct);
                self.compare(self.x, value);
            }
            (0x1, 0xE) => {
                let value = self.read_operand(Mode::Absolute);
                self.compare(self.x, value);
            }
            (0xA, 0xD) => {
                let value = self.next_byte();
                self.compare(self.y, value);
            }
            (0x7, 0xE) => {
                let value = self.read_operand(Mode::Direct);
                self.compare(self.y, value);
            }
            (0x5, 0xE) => {
                let value = self.read_operand(Mode::Absolute);
                self.compare(self.y, value);
            }

            // 16 bit operations on YA and the direct page
            (0x1, 0xA) | (0x3, 0xA) => {
                let offset = self.next_byte();
                let value = self.read_dp16(offset);
                let value = if row == 0x3 {
                    value.wrapping_add(1)
                } else {
                    value.wrapping_sub(1)
                };
                self.write_dp16(offset, value);
                self.set_nz16(value);
            }
            (0x5, 0xA) => {
                let offset = self.next_byte();
                let value = self.read_dp16(offset);
                let ya = self.ya();
                self.psw.c = ya >= value;
                self.set_nz16(ya.wrapping_sub(value));
            }
            (0x7, 0xA) => {
                let offset = self.next_byte();
                let value = self.read_dp16(offset);
                let ya = self.ya();
                let result = ya as u32 + value as u32;
                self.psw.c = result > 0xFFFF;
                self.psw.h = (ya & 0xFFF) + (value & 0xFFF) > 0xFFF;
                self.psw.v = !(ya ^ value) & (ya ^ result as u16) & 0x8000 != 0;
                self.set_ya(result as u16);
                self.set_nz16(result as u16);
            }
            (0x9, 0xA) => {
                let offset = self.next_byte();
                let value = self.read_dp16(offset);
                let ya = self.ya();
                let result = ya.wrapping_sub(value);
                self.psw.c = ya >= value;
                self.psw.h = (ya & 0xFFF) >= (value & 0xFFF);
                self.psw.v = (ya ^ value) & (ya ^ result) & 0x8000 != 0;
                self.set_ya(result);
                self.set_nz16(result);
            }
            (0xB, 0xA) => {
                let offset = self.next_byte();
                let value = self.read_dp16(offset);
                self.set_ya(value);
                self.set_nz16(value);
            }
            (0xD, 0xA) => {
                let offset = self.next_byte();
                self.write_dp16(offset, self.ya());
            }

            // Single bit operations on absolute addresses
            (0x0 | 0x2 | 0x4 | 0x6 | 0x8 | 0xA | 0xC | 0xE, 0xA) => self.bit_operation(row),

            (0x9, 0xE) => self.div(),
            (0xC, 0xF) => {
                let result = self.y as u16 * self.a as u16;
                self.set_ya(result);
                self.set_nz(self.y);
            }
            (0x9, 0xF) => {
                self.a = self.a.rotate_left(4);
                self.set_nz(self.a);
            }
            (0xD, 0xF) => {
                if self.psw.c || self.a > 0x99 {
                    self.a = self.a.wrapping_add(0x60);
                    self.psw.c = true;
                }
                if self.psw.h || (self.a & 0x0F) > 0x09 {
                    self.a = self.a.wrapping_add(0x06);
                }
                self.set_nz(self.a);
            }
            (0xB, 0xE) => {
                if !self.psw.c || self.a > 0x99 {
                    self.a = self.a.wrapping_sub(0x60);
                    self.psw.c = false;
                }
                if !self.psw.h || (self.a & 0x0F) > 0x09 {
                    self.a = self.a.wrapping_sub(0x06);
                }
                self.set_nz(self.a);
            }

            // Stack
            (0x0, 0xD) => self.push(self.psw.to_byte()),
            (0x2, 0xD) => self.push(self.a),
            (0x4, 0xD) => self.push(self.x),
            (0x6, 0xD) => self.push(self.y),
            (0x8, 0xE) => {
                let value = self.pop();
                self.psw.from_byte(value);
            }
            (0xA, 0xE) => self.a = self.pop(),
            (0xC, 0xE) => self.x = self.pop(),
            (0xE, 0xE) => self.y = self.pop(),

            (0x0, 0xE) | (0x4, 0xE) => {
                let addr = self.address(Mode::Absolute);
                let value = self.read(addr);
                self.set_nz(self.a.wrapping_sub(value));
                let value = if row == 0x0 {
                    value | self.a
                } else {
                    value & !self.a
                };
                self.write(addr, value);
            }
            (0x2, 0xE) | (0xD, 0xE) => {
                let mode = if row == 0x2 {
                    Mode::Direct
                } else {
                    Mode::DirectX
                };
                let value = self.read_operand(mode);
                self.branch(self.a != value);
            }
            (0x6, 0xE) => {
                let addr = self.address(Mode::Direct);
                let value = self.read(addr).wrapping_sub(1);
                self.write(addr, value);
                self.branch(value != 0);
            }
            (0xF, 0xE) => {
                self.y = self.y.wrapping_sub(1);
                self.branch(self.y != 0);
            }

            // Jumps and subroutines
            (0x2, 0xF) => self.branch(true),
            (0x5, 0xF) => self.pc = self.next_word(),
            (0x1, 0xF) => {
                let addr = self.address(Mode::AbsoluteX);
                self.pc = self.read16(addr);
            }
            (0x3, 0xF) => {
                let target = self.next_word();
                self.call(target);
            }
            (0x4, 0xF) => {
                let target = 0xFF00 | self.next_byte() as u16;
                self.call(target);
            }
            (0x6, 0xF) => self.pc = self.pop16(),
            (0x7, 0xF) => {
                let value = self.pop();
                self.psw.from_byte(value);
                self.pc = self.pop16();
            }
            (0x0, 0xF) => {
                self.push16(self.pc);
                self.push(self.psw.to_byte());
                self.psw.b = true;
                self.psw.i = false;
                self.pc = self.read16(0xFFDE);
            }
            (0xE, 0xD) => self.psw.c = !self.psw.c,
            _ => {
                // Only SLEEP and STOP are left
                error!("[SPC700] Halted at {:04X}", pc);
                return Err(Error::SpcHalted {
                    opcode,
                    address: pc,
                });
            }
        }
        Ok(())
    }

    // OR, AND, EOR, CMP, ADC and SBC, in rows 0-B columns 4-9
    fn alu_group(&mut self, row: u8, column: u8) {
        let operation = row >> 1;
        let odd_row = row & 1 == 1;
        match (odd_row, column) {
            (false, 0x8) => {
                let value = self.next_byte();
                if let Some(a) = self.alu(operation, self.a, value) {
                    self.a = a;
                }
            }
            // dp, dp
            (false, 0x9) => {
                let source = self.read_operand(Mode::Direct);
                let addr = self.address(Mode::Direct);
                let dest = self.read(addr);
                if let Some(result) = self.alu(operation, dest, source) {
                    self.write(addr, result);
                }
            }
            // dp, #imm
            (true, 0x8) => {
                let source = self.next_byte();
                let addr = self.address(Mode::Direct);
                let dest = self.read(addr);
                if let Some(result) = self.alu(operation, dest, source) {
                    self.write(addr, result);
                }
            }
            // (X), (Y)
            (true, 0x9) => {
                let source = self.read(self.direct_page() | self.y as u16);
                let addr = self.address(Mode::IndirectX);
                let dest = self.read(addr);
                if let Some(result) = self.alu(operation, dest, source) {
                    self.write(addr, result);
                }
            }
            _ => {
                let value = self.read_operand(column_mode(odd_row, column));
                if let Some(a) = self.alu(operation, self.a, value) {
                    self.a = a;
                }
            }
        }
    }
    // Returns the value to write back, CMP writes nothing
    fn alu(&mut self, operation: u8, a: u8, b: u8) -> Option<u8> {
        let result = match operation {
            0 => a | b,
            1 => a & b,
            2 => a ^ b,
            3 => {
                self.compare(a, b);
                return None;
            }
            4 => return Some(self.adc(a, b)),
            _ => return Some(self.adc(a, !b)),
        };
        self.set_nz(result);
        Some(result)
    }
    // ASL, ROL, LSR, ROR, DEC and INC, in rows 0-B columns B-C
    fn shift_group(&mut self, row: u8, column: u8) {
        let operation = row >> 1;
        let odd_row = row & 1 == 1;
        if odd_row && column == 0xC {
            self.a = self.shift(operation, self.a);
            return;
        }
        let mode = match (odd_row, column) {
            (false, 0xB) => Mode::Direct,
            (false, _) => Mode::Absolute,
            (true, _) => Mode::DirectX,
        };
        let addr = self.address(mode);
        let value = self.read(addr);
        let result = self.shift(operation, value);
        self.write(addr, result);
    }
    fn shift(&mut self, operation: u8, value: u8) -> u8 {
        let result = match operation {
            0 => {
                self.psw.c = value & 0x80 != 0;
                value << 1
            }
            1 => {
                let carry = self.psw.c as u8;
                self.psw.c = value & 0x80 != 0;
                (value << 1) | carry
            }
            2 => {
                self.psw.c = value & 0x01 != 0;
                value >> 1
            }
            3 => {
                let carry = (self.psw.c as u8) << 7;
                self.psw.c = value & 0x01 != 0;
                (value >> 1) | carry
            }
            4 => value.wrapping_sub(1),
            _ => value.wrapping_add(1),
        };
        self.set_nz(result);
        result
    }
    // OR1, AND1, EOR1, MOV1 and NOT1 on a bit addressed as abs.bit
    fn bit_operation(&mut self, row: u8) {
        let operand = self.next_word();
        let addr = operand & 0x1FFF;
        let mask = 1 << (operand >> 13);
        let value = self.read(addr);
        let bit = value & mask != 0;
        match row {
            0x0 => self.psw.c |= bit,
            0x2 => self.psw.c |= !bit,
            0x4 => self.psw.c &= bit,
            0x6 => self.psw.c &= !bit,
            0x8 => self.psw.c ^= bit,
            0xA => self.psw.c = bit,
            0xC => {
                let value = if self.psw.c {
                    value | mask
                } else {
                    value & !mask
                };
                self.write(addr, value);
            }
            _ => self.write(addr, value ^ mask),
        }
    }
    fn div(&mut self) {
        let ya = self.ya() as u32;
        let x = self.x as u32;
        self.psw.v = self.y as u32 >= x;
        self.psw.h = (self.y & 0x0F) >= (self.x & 0x0F);
        if (self.y as u32) < (x << 1) {
            self.a = (ya / x) as u8;
            self.y = (ya % x) as u8;
        } else {
            // The hardware's result once the quotient no longer fits in 9 bits
            self.a = (255 - (ya - (x << 9)) / (256 - x)) as u8;
            self.y = (x + (ya - (x << 9)) % (256 - x)) as u8;
        }
        self.set_nz(self.a);
    }
    fn adc(&mut self, a: u8, b: u8) -> u8 {
        let carry = self.psw.c as u16;
        let result = a as u16 + b as u16 + carry;
        self.psw.c = result > 0xFF;
        self.psw.h = (a & 0x0F) as u16 + (b & 0x0F) as u16 + carry > 0x0F;
        self.psw.v = !(a ^ b) & (a ^ result as u8) & 0x80 != 0;
        self.set_nz(result as u8);
        result as u8
    }
    fn compare(&mut self, a: u8, b: u8) {
        self.psw.c = a >= b;
        self.set_nz(a.wrapping_sub(b));
    }
    fn inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.set_nz(result);
        result
    }
    fn dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.set_nz(result);
        result
    }
    fn set_nz(&mut self, value: u8) {
        self.psw.z = value == 0;
        self.psw.n = value & 0x80 != 0;
    }
    fn set_nz16(&mut self, value: u16) {
        self.psw.z = value == 0;
        self.psw.n = value & 0x8000 != 0;
    }
    fn ya(&self) -> u16 {
        u16::from_le_bytes([self.a, self.y])
    }
    fn set_ya(&mut self, value: u16) {
        [self.a, self.y] = value.to_le_bytes();
    }
    fn branch(&mut self, condition: bool) {
        let offset = self.next_byte() as i8;
        if condition {
            self.pc = self.pc.wrapping_add_signed(offset as i16);
            self.cycles += 2;
        }
    }
    fn call(&mut self, target: u16) {
        self.push16(self.pc);
        self.pc = target;
    }
    fn push(&mut self, value: u8) {
        self.write(0x100 | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }
    fn push16(&mut self, value: u16) {
        self.push((value >> 8) as u8);
        self.push(value as u8);
    }
    fn pop(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.read(0x100 | self.sp as u16)
    }
    fn pop16(&mut self) -> u16 {
        let lo = self.pop();
        let hi = self.pop();
        u16::from_le_bytes([lo, hi])
    }
    fn direct_page(&self) -> u16 {
        if self.psw.p {
            0x100
        } else {
            0
        }
    }
    fn next_byte(&mut self) -> u8 {
        let value = self.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }
    fn next_word(&mut self) -> u16 {
        let lo = self.next_byte();
        let hi = self.next_byte();
        u16::from_le_bytes([lo, hi])
    }
    fn read16(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr);
        let hi = self.read(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }
    // Words in the direct page wrap within the page
    fn read_dp16(&mut self, offset: u8) -> u16 {
        let dp = self.direct_page();
        let lo = self.read(dp | offset as u16);
        let hi = self.read(dp | offset.wrapping_add(1) as u16);
        u16::from_le_bytes([lo, hi])
    }
    fn write_dp16(&mut self, offset: u8, value: u16) {
        let dp = self.direct_page();
        let [lo, hi] = value.to_le_bytes();
        self.write(dp | offset as u16, lo);
        self.write(dp | offset.wrapping_add(1) as u16, hi);
    }
    fn read_operand(&mut self, mode: Mode) -> u8 {
        let addr = self.address(mode);
        self.read(addr)
    }
    fn address(&mut self, mode: Mode) -> u16 {
        let dp = self.direct_page();
        match mode {
            Mode::Direct => dp | self.next_byte() as u16,
            Mode::DirectX => dp | self.next_byte().wrapping_add(self.x) as u16,
            Mode::DirectY => dp | self.next_byte().wrapping_add(self.y) as u16,
            Mode::Absolute => self.next_word(),
            Mode::AbsoluteX => self.next_word().wrapping_add(self.x as u16),
            Mode::AbsoluteY => self.next_word().wrapping_add(self.y as u16),
            Mode::IndirectX => dp | self.x as u16,
            Mode::DirectIndirectX => {
                let offset = self.next_byte().wrapping_add(self.x);
                self.read_dp16(offset)
            }
            Mode::IndirectY => {
                let offset = self.next_byte();
                self.read_dp16(offset).wrapping_add(self.y as u16)
            }
        }
    }
}
