mod addressing;
mod execute;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::core::StatusRegister;

/// Stack pointer after a reset
pub const RESET_STACK_POINTER: u16 = 0x01FC;

/// The 65816 CPU of the SNES.
///
/// Contains all registers and is responsible for changing the flags when values are set.
/// Registers are always stored 16 bits wide. When the accumulator is 8 bits wide only the low
/// byte of `a` is used and the high byte (B) is left untouched. When the index registers are
/// 8 bits wide their high bytes are always 0.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpu {
    /// Accumulator (C, with A as the low byte and B as the high byte)
    pub a: u16,
    /// X index register
    pub x: u16,
    /// Y index register
    pub y: u16,
    /// Stack pointer
    pub s: u16,
    /// Direct page register
    pub d: u16,
    /// Program counter
    pub pc: u16,
    /// Program bank
    pub pb: u8,
    /// Data bank
    pub db: u8,
    /// Status register
    pub p: StatusRegister,
    /// Emulation mode flag (E), swapped with carry by XCE
    pub emulation: bool,
    /// Total CPU cycles executed
    pub cycles: u64,
    /// Set by WAI until the next interrupt
    pub waiting: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Cpu {
        Cpu {
            a: 0,
            x: 0,
            y: 0,
            s: RESET_STACK_POINTER,
            d: 0,
            pc: 0,
            pb: 0,
            db: 0,
            p: StatusRegister::new(),
            emulation: true,
            cycles: 0,
            waiting: false,
        }
    }

    /// Put the CPU in its power on state, starting at `reset_vector`.
    /// ```
    /// let mut cpu = yase::core::Cpu::new();
    /// cpu.a = 0x1234;
    /// cpu.emulation = false;
    /// cpu.reset(0x8000);
    /// assert_eq!(cpu.a, 0);
    /// assert_eq!(cpu.pc, 0x8000);
    /// assert_eq!(cpu.p.to_byte(), 0x34);
    /// assert!(cpu.emulation);
    /// ```
    pub fn reset(&mut self, reset_vector: u16) {
        let cycles = self.cycles;
        *self = Cpu::new();
        self.pc = reset_vector;
        self.cycles = cycles;
    }

    /// The 24 bit address of the next instruction
    pub fn pc_address(&self) -> u32 {
        ((self.pb as u32) << 16) | self.pc as u32
    }

    /// Set the status register from a byte.
    ///
    /// Forces 8 bit registers in emulation mode and clears the high bytes of X and Y when they
    /// are 8 bits wide.
    /// ```
    /// let mut cpu = yase::core::Cpu::new();
    /// cpu.emulation = false;
    /// cpu.set_status(0x00);
    /// cpu.x = 0x1234;
    /// cpu.set_status(0x10);
    /// assert_eq!(cpu.x, 0x34);
    /// ```
    pub fn set_status(&mut self, value: u8) {
        self.p.from_byte(value);
        if self.emulation {
            self.p.m = true;
            self.p.x = true;
        }
        if self.p.x {
            self.x &= 0xFF;
            self.y &= 0xFF;
        }
    }

    /// Swap the carry and emulation flags (XCE).
    pub fn exchange_carry_emulation(&mut self) {
        std::mem::swap(&mut self.p.c, &mut self.emulation);
        if self.emulation {
            self.p.m = true;
            self.p.x = true;
            self.x &= 0xFF;
            self.y &= 0xFF;
            self.s = 0x0100 | (self.s & 0xFF);
        }
    }

    /// The accumulator, masked to its current width
    pub fn acc(&self) -> u16 {
        if self.p.m {
            self.a & 0xFF
        } else {
            self.a
        }
    }

    /// Set the accumulator at its current width, leaving B alone when 8 bits wide.
    pub fn set_a(&mut self, value: u16) {
        self.a = if self.p.m {
            (self.a & 0xFF00) | (value & 0xFF)
        } else {
            value
        }
    }

    // Mask an index register value to the current index width
    fn index(&self, value: u16) -> u16 {
        if self.p.x {
            value & 0xFF
        } else {
            value
        }
    }

    // Set N and Z from a value of a given width
    fn set_nz(&mut self, value: u16, wide: bool) {
        if wide {
            self.p.z = value == 0;
            self.p.n = value & 0x8000 != 0;
        } else {
            self.p.z = value & 0xFF == 0;
            self.p.n = value & 0x80 != 0;
        }
    }

    /// Load some value into A.
    /// ```
    /// let mut cpu = yase::core::Cpu::new();
    /// cpu.a = 0x1200;
    /// cpu.lda(0x80);
    /// assert_eq!(cpu.a, 0x1280);
    /// assert!(cpu.p.n);
    /// ```
    pub fn lda(&mut self, value: u16) {
        self.set_a(value);
        self.set_nz(value, !self.p.m);
    }
    /// Load some value into X.
    pub fn ldx(&mut self, value: u16) {
        self.x = self.index(value);
        self.set_nz(self.x, !self.p.x);
    }
    /// Load some value into Y.
    pub fn ldy(&mut self, value: u16) {
        self.y = self.index(value);
        self.set_nz(self.y, !self.p.x);
    }
    /// Perform an AND (`&`) operation between A and some value.
    /// ```
    /// let mut cpu = yase::core::Cpu::new();
    /// cpu.a = 0xAA;
    /// cpu.and(0x0F);
    /// assert_eq!(cpu.a, 0x0A);
    /// ```
    pub fn and(&mut self, value: u16) {
        self.lda(self.a & value);
    }
    /// Perform an OR (`|`) operation between A and some value.
    pub fn ora(&mut self, value: u16) {
        self.lda(self.a | value);
    }
    /// Perform an XOR (`^`) operation between A and some value.
    pub fn eor(&mut self, value: u16) {
        self.lda(self.a ^ value);
    }
    /// Add some value and the carry to A, in binary or decimal depending on the decimal flag.
    /// ```
    /// let mut cpu = yase::core::Cpu::new();
    /// cpu.a = 0x40;
    /// cpu.adc(0x41);
    /// assert_eq!(cpu.a, 0x81);
    /// assert!(cpu.p.v && cpu.p.n && !cpu.p.c);
    /// cpu.p.d = true;
    /// cpu.a = 0x19;
    /// cpu.adc(0x01);
    /// assert_eq!(cpu.a, 0x20);
    /// ```
    pub fn adc(&mut self, value: u16) {
        self.add_with_carry(value, false);
    }
    /// Subtract some value and the inverted carry from A.
    /// ```
    /// let mut cpu = yase::core::Cpu::new();
    /// cpu.p.c = true;
    /// cpu.a = 0x10;
    /// cpu.sbc(0x11);
    /// assert_eq!(cpu.a, 0xFF);
    /// assert!(!cpu.p.c);
    /// ```
    pub fn sbc(&mut self, value: u16) {
        self.add_with_carry(value, true);
    }

    fn add_with_carry(&mut self, value: u16, subtract: bool) {
        let wide = !self.p.m;
        let (mask, top) = if wide { (0xFFFF, 0x8000) } else { (0xFF, 0x80) };
        let a = (self.a & mask) as i32;
        let v = if subtract { !value & mask } else { value & mask } as i32;
        let mut carry = self.p.c as i32;
        let result = if self.p.d {
            // Add one digit at a time, adjusting each into 0-9
            let digits = if wide { 4 } else { 2 };
            let mut result = 0;
            for i in 0..digits {
                let shift = 4 * i;
                let digit_mask = 0xF << shift;
                result = (a & digit_mask)
                    + (v & digit_mask)
                    + (carry << shift)
                    + (result & ((1 << shift) - 1));
                if i == digits - 1 {
                    self.p.v = !(a ^ v) & (a ^ result) & top != 0;
                }
                if subtract {
                    if result < (0x10 << shift) {
                        result -= 0x6 << shift;
                    }
                } else if result >= (0xA << shift) {
                    result += 0x6 << shift;
                }
                carry = (result >= (0x10 << shift)) as i32;
            }
            result
        } else {
            let result = a + v + carry;
            self.p.v = !(a ^ v) & (a ^ result) & top != 0;
            carry = (result > mask as i32) as i32;
            result
        };
        self.p.c = carry != 0;
        self.set_a(result as u16);
        self.set_nz(result as u16, wide);
    }

    /// Compare a register with a value at a width, as CMP, CPX and CPY do.
    /// ```
    /// let mut cpu = yase::core::Cpu::new();
    /// cpu.compare(0x10, 0x10, false);
    /// assert!(cpu.p.z && cpu.p.c);
    /// cpu.compare(0x10, 0x20, false);
    /// assert!(!cpu.p.c && cpu.p.n);
    /// ```
    pub fn compare(&mut self, register: u16, value: u16, wide: bool) {
        let mask = if wide { 0xFFFF } else { 0xFF };
        let (r, v) = (register & mask, value & mask);
        self.p.c = r >= v;
        self.set_nz(r.wrapping_sub(v), wide);
    }
    pub fn cmp(&mut self, value: u16) {
        self.compare(self.a, value, !self.p.m);
    }
    pub fn cpx(&mut self, value: u16) {
        self.compare(self.x, value, !self.p.x);
    }
    pub fn cpy(&mut self, value: u16) {
        self.compare(self.y, value, !self.p.x);
    }
    /// Test bits of A against a value.
    ///
    /// The immediate form only changes Z, the others also copy the top two bits of the value into N and V.
    pub fn bit(&mut self, value: u16, immediate: bool) {
        let wide = !self.p.m;
        let top = if wide { 0x8000 } else { 0x80 };
        self.p.z = self.acc() & value & if wide { 0xFFFF } else { 0xFF } == 0;
        if !immediate {
            self.p.n = value & top != 0;
            self.p.v = value & (top >> 1) != 0;
        }
    }
    /// Shift left at the accumulator width, returning the result.
    /// ```
    /// let mut cpu = yase::core::Cpu::new();
    /// assert_eq!(cpu.asl(0x81), 0x02);
    /// assert!(cpu.p.c);
    /// ```
    pub fn asl(&mut self, value: u16) -> u16 {
        let wide = !self.p.m;
        let top = if wide { 0x8000 } else { 0x80 };
        self.p.c = value & top != 0;
        let result = value << 1;
        self.set_nz(result, wide);
        result
    }
    pub fn lsr(&mut self, value: u16) -> u16 {
        let wide = !self.p.m;
        self.p.c = value & 1 != 0;
        let result = (value & if wide { 0xFFFF } else { 0xFF }) >> 1;
        self.set_nz(result, wide);
        result
    }
    pub fn rol(&mut self, value: u16) -> u16 {
        let wide = !self.p.m;
        let top = if wide { 0x8000 } else { 0x80 };
        let result = (value << 1) | self.p.c as u16;
        self.p.c = value & top != 0;
        self.set_nz(result, wide);
        result
    }
    /// Rotate right through the carry at the accumulator width, returning the result.
    /// ```
    /// let mut cpu = yase::core::Cpu::new();
    /// cpu.p.c = true;
    /// assert_eq!(cpu.ror(0x02), 0x81);
    /// assert!(!cpu.p.c);
    /// ```
    pub fn ror(&mut self, value: u16) -> u16 {
        let wide = !self.p.m;
        let top = if wide { 0x8000 } else { 0x80 };
        let v = value & if wide { 0xFFFF } else { 0xFF };
        let result = (v >> 1) | if self.p.c { top } else { 0 };
        self.p.c = v & 1 != 0;
        self.set_nz(result, wide);
        result
    }
    /// Increment a value at a width.
    pub fn inc(&mut self, value: u16, wide: bool) -> u16 {
        let result = value.wrapping_add(1) & if wide { 0xFFFF } else { 0xFF };
        self.set_nz(result, wide);
        result
    }
    /// Decrement a value at a width.
    pub fn dec(&mut self, value: u16, wide: bool) -> u16 {
        let result = value.wrapping_sub(1) & if wide { 0xFFFF } else { 0xFF };
        self.set_nz(result, wide);
        result
    }
    /// Test and set bits, returning the new value of the memory.
    pub fn tsb(&mut self, value: u16) -> u16 {
        self.p.z = self.acc() & value == 0;
        value | self.acc()
    }
    /// Test and reset bits, returning the new value of the memory.
    pub fn trb(&mut self, value: u16) -> u16 {
        self.p.z = self.acc() & value == 0;
        value & !self.acc()
    }
}

impl Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "A={:04X} X={:04X} Y={:04X} S={:04X} D={:04X} DB={:02X} PC={:02X}:{:04X} P={:?} E={} CYC={}",
            self.a,
            self.x,
            self.y,
            self.s,
            self.d,
            self.db,
            self.pb,
            self.pc,
            self.p,
            self.emulation as u8,
            self.cycles
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_hex::assert_eq_hex;
    use test_case::test_case;

    fn native_cpu(m: bool, x: bool) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.emulation = false;
        cpu.p.m = m;
        cpu.p.x = x;
        cpu
    }

    #[test_case(0x00, true, false ; "zero")]
    #[test_case(0x7F, false, false ; "positive")]
    #[test_case(0x80, false, true ; "negative")]
    #[test_case(0x100, true, false ; "truncated to zero")]
    fn test_lda_flags_8bit(value: u16, z: bool, n: bool) {
        let mut cpu = native_cpu(true, true);
        cpu.lda(value);
        assert_eq!(cpu.p.z, z);
        assert_eq!(cpu.p.n, n);
    }

    #[test_case(0x0000, true, false ; "zero")]
    #[test_case(0x0080, false, false ; "bit 7 is not the sign")]
    #[test_case(0x8000, false, true ; "negative")]
    fn test_lda_flags_16bit(value: u16, z: bool, n: bool) {
        let mut cpu = native_cpu(false, true);
        cpu.lda(value);
        assert_eq_hex!(cpu.a, value);
        assert_eq!(cpu.p.z, z);
        assert_eq!(cpu.p.n, n);
    }

    #[test]
    fn test_8bit_accumulator_keeps_b() {
        let mut cpu = native_cpu(true, true);
        cpu.a = 0xAB00;
        cpu.lda(0x12);
        assert_eq_hex!(cpu.a, 0xAB12);
        cpu.p.c = false;
        cpu.adc(0xF0);
        assert_eq_hex!(cpu.a, 0xAB02);
        assert!(cpu.p.c);
    }

    #[test]
    fn test_adc_16bit() {
        let mut cpu = native_cpu(false, false);
        cpu.a = 0x7FFF;
        cpu.adc(0x0001);
        assert_eq_hex!(cpu.a, 0x8000);
        assert!(cpu.p.v);
        assert!(cpu.p.n);
        assert!(!cpu.p.c);
        cpu.adc(0x8000);
        assert_eq_hex!(cpu.a, 0x0000);
        assert!(cpu.p.c && cpu.p.z && cpu.p.v);
    }

    #[test_case(0x0999, 0x0001, false, 0x1000, false ; "carry across digits")]
    #[test_case(0x9999, 0x0001, false, 0x0000, true ; "carry out")]
    #[test_case(0x1234, 0x4321, true, 0x5556, false ; "carry in")]
    fn test_decimal_adc_16bit(a: u16, value: u16, carry: bool, result: u16, carry_out: bool) {
        let mut cpu = native_cpu(false, false);
        cpu.p.d = true;
        cpu.p.c = carry;
        cpu.a = a;
        cpu.adc(value);
        assert_eq_hex!(cpu.a, result);
        assert_eq!(cpu.p.c, carry_out);
    }

    #[test_case(0x50, 0x01, true, 0x49, true ; "borrow across digits")]
    #[test_case(0x00, 0x01, true, 0x99, false ; "borrow out")]
    #[test_case(0x46, 0x12, true, 0x34, true ; "no borrow")]
    fn test_decimal_sbc_8bit(a: u16, value: u16, carry: bool, result: u16, carry_out: bool) {
        let mut cpu = native_cpu(true, true);
        cpu.p.d = true;
        cpu.p.c = carry;
        cpu.a = a;
        cpu.sbc(value);
        assert_eq_hex!(cpu.a, result);
        assert_eq!(cpu.p.c, carry_out);
    }

    #[test]
    fn test_index_width() {
        let mut cpu = native_cpu(true, false);
        cpu.ldx(0x1234);
        assert_eq_hex!(cpu.x, 0x1234);
        cpu.set_status(0x30);
        assert_eq_hex!(cpu.x, 0x34);
        cpu.ldy(0xFF80);
        assert_eq_hex!(cpu.y, 0x80);
        assert!(cpu.p.n);
    }

    #[test]
    fn test_emulation_forces_8bit() {
        let mut cpu = Cpu::new();
        cpu.set_status(0x00);
        assert!(cpu.p.m && cpu.p.x);
        // CLC; XCE
        cpu.p.c = false;
        cpu.exchange_carry_emulation();
        assert!(!cpu.emulation);
        assert!(cpu.p.c);
        cpu.set_status(0x00);
        assert!(!cpu.p.m && !cpu.p.x);
        cpu.s = 0x1FFF;
        cpu.p.c = true;
        cpu.exchange_carry_emulation();
        assert_eq_hex!(cpu.s, 0x01FF);
        assert!(cpu.p.m && cpu.p.x);
    }

    #[test]
    fn test_bit() {
        let mut cpu = native_cpu(true, true);
        cpu.a = 0x01;
        cpu.bit(0xC0, false);
        assert!(cpu.p.z && cpu.p.n && cpu.p.v);
        cpu.p.n = false;
        cpu.bit(0x81, true);
        assert!(!cpu.p.z && !cpu.p.n);
    }

    #[test]
    fn test_tsb_trb() {
        let mut cpu = native_cpu(true, true);
        cpu.a = 0x0F;
        assert_eq_hex!(cpu.tsb(0xF0), 0xFF);
        assert!(cpu.p.z);
        assert_eq_hex!(cpu.trb(0xFF), 0xF0);
        assert!(!cpu.p.z);
    }
}
