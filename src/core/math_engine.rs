use serde::{Deserialize, Serialize};

/// The CPU's multiply/divide registers, plus the PPU's signed Mode 7 multiplier.
///
/// Results are available as soon as the write that starts an operation completes.
/// ```
/// let mut m = yase::core::MathEngine::default();
/// m.write_dividend_low(0x34);
/// m.write_dividend_high(0x12);
/// m.write_divisor(0);
/// assert_eq!(m.quotient, 0xFFFF);
/// assert_eq!(m.remainder_or_product, 0x1234);
/// ```
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MathEngine {
    pub multiplicand: u8,
    pub multiplier: u8,
    pub dividend: u16,
    pub divisor: u8,
    pub quotient: u16,
    /// RDMPY, holding either the product of the last multiplication or the remainder of the last division
    pub remainder_or_product: u16,
    // 1st write: low 8 bits of the multiplicand, 2nd write: high 8 bits
    m7_latch: bool,
    pub m7_multiplicand: u16,
    pub m7_multiplier: u8,
    pub m7_product: u32,
}

impl MathEngine {
    /// WRMPYA
    pub fn write_multiplicand(&mut self, value: u8) {
        self.multiplicand = value;
    }
    /// WRMPYB, starts an unsigned 8x8 multiplication
    pub fn write_multiplier(&mut self, value: u8) {
        self.multiplier = value;
        self.remainder_or_product = self.multiplicand as u16 * value as u16;
        // The quotient register is clobbered by the multiplier
        self.quotient = value as u16;
    }
    /// WRDIVL
    pub fn write_dividend_low(&mut self, value: u8) {
        self.dividend = (self.dividend & 0xFF00) | value as u16;
    }
    /// WRDIVH
    pub fn write_dividend_high(&mut self, value: u8) {
        self.dividend = (self.dividend & 0x00FF) | ((value as u16) << 8);
    }
    /// WRDIVB, starts an unsigned 16/8 division
    pub fn write_divisor(&mut self, value: u8) {
        self.divisor = value;
        if value == 0 {
            self.quotient = 0xFFFF;
            self.remainder_or_product = self.dividend;
        } else {
            self.quotient = self.dividend / value as u16;
            self.remainder_or_product = self.dividend % value as u16;
        }
    }
    /// M7A, written twice (low byte then high byte)
    pub fn write_m7_multiplicand(&mut self, value: u8) {
        self.m7_multiplicand = if self.m7_latch {
            (self.m7_multiplicand & 0x00FF) | ((value as u16) << 8)
        } else {
            (self.m7_multiplicand & 0xFF00) | value as u16
        };
        self.m7_latch = !self.m7_latch;
        self.update_m7_product();
    }
    /// M7B, starts a signed 16x8 multiplication
    pub fn write_m7_multiplier(&mut self, value: u8) {
        self.m7_multiplier = value;
        self.update_m7_product();
    }
    fn update_m7_product(&mut self) {
        let product = (self.m7_multiplicand as i16 as i32) * (self.m7_multiplier as i8 as i32);
        self.m7_product = (product as u32) & 0xFF_FFFF;
    }
    /// MPYL, MPYM and MPYH
    pub fn read_m7_product(&self, byte: usize) -> u8 {
        (self.m7_product >> (8 * byte)) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0x0000)]
    #[test_case(0x0001)]
    #[test_case(0x8000)]
    #[test_case(0xFFFF)]
    fn test_divide_by_zero(dividend: u16) {
        let mut m = MathEngine::default();
        m.write_dividend_low(dividend as u8);
        m.write_dividend_high((dividend >> 8) as u8);
        m.write_divisor(0);
        assert_eq!(m.quotient, 0xFFFF);
        assert_eq!(m.remainder_or_product, dividend);
    }

    #[test]
    fn test_multiply_and_divide() {
        let mut m = MathEngine::default();
        m.write_multiplicand(0xFF);
        m.write_multiplier(0xFF);
        assert_eq!(m.remainder_or_product, 0xFE01);
        m.write_dividend_low(0xE8);
        m.write_dividend_high(0x03);
        m.write_divisor(7);
        assert_eq!(m.quotient, 142);
        assert_eq!(m.remainder_or_product, 6);
    }

    #[test]
    fn test_mode7_signed_multiply() {
        let mut m = MathEngine::default();
        // -2 as a 16 bit value
        m.write_m7_multiplicand(0xFE);
        m.write_m7_multiplicand(0xFF);
        m.write_m7_multiplier(3);
        assert_eq!(m.m7_product, 0xFF_FFFA);
        assert_eq!(m.read_m7_product(0), 0xFA);
        assert_eq!(m.read_m7_product(2), 0xFF);
    }
}
