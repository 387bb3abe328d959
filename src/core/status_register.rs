use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// The processor status word of the 65816.
///
/// Unlike the 6502, bits 4 and 5 hold the register width flags instead of the break flag.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRegister {
    /// The carry flag
    pub c: bool,
    /// The zero flag
    pub z: bool,
    /// The interrupt disable flag
    pub i: bool,
    /// The decimal mode flag
    pub d: bool,
    /// The short index flag, X and Y are 8 bits wide when set
    pub x: bool,
    /// The short accumulator flag, A and memory accesses are 8 bits wide when set
    pub m: bool,
    /// The (signed) overflow flag
    pub v: bool,
    /// The negative (sign) flag
    pub n: bool,
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusRegister {
    /// Create a new StatusRegister with the power on value `0x34`.
    /// ```
    /// let s = yase::core::StatusRegister::new();
    /// assert_eq!(s.to_byte(), 0x34);
    /// ```
    pub fn new() -> StatusRegister {
        let mut s = StatusRegister {
            c: false,
            z: false,
            i: false,
            d: false,
            x: false,
            m: false,
            v: false,
            n: false,
        };
        s.from_byte(0x34);
        s
    }
    /// Get the status register as a single byte to be written to memory.
    /// ```
    /// let mut s = yase::core::StatusRegister::new();
    /// s.z = true;
    /// s.i = false;
    /// assert_eq!(s.to_byte(), 0b00110010);
    /// s.n = true;
    /// s.m = false;
    /// assert_eq!(s.to_byte(), 0b10010010);
    /// ```
    pub fn to_byte(&self) -> u8 {
        [self.c, self.z, self.i, self.d, self.x, self.m, self.v, self.n]
            .iter()
            .enumerate()
            .fold(0, |b, (i, set)| if *set { b | (1 << i) } else { b })
    }
    /// Set the status register from a given byte that contains one bit per flag.
    /// ```
    /// let mut s = yase::core::StatusRegister::new();
    /// s.from_byte(0b11001010);
    /// assert_eq!(s.n, true);
    /// assert_eq!(s.v, true);
    /// assert_eq!(s.x, false);
    /// assert_eq!(s.d, true);
    /// assert_eq!(s.z, true);
    /// ```
    pub fn from_byte(&mut self, byte: u8) {
        self.c = (byte & 0x01) != 0;
        self.z = (byte & 0x02) != 0;
        self.i = (byte & 0x04) != 0;
        self.d = (byte & 0x08) != 0;
        self.x = (byte & 0x10) != 0;
        self.m = (byte & 0x20) != 0;
        self.v = (byte & 0x40) != 0;
        self.n = (byte & 0x80) != 0;
    }
}

impl Debug for StatusRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        macro_rules! format_flag {
            ($flag: ident, $name: literal) => {
                if self.$flag {
                    $name
                } else {
                    "."
                }
            };
        }
        write!(
            f,
            "{}{}{}{}{}{}{}{}",
            format_flag!(n, "N"),
            format_flag!(v, "V"),
            format_flag!(m, "M"),
            format_flag!(x, "X"),
            format_flag!(d, "D"),
            format_flag!(i, "I"),
            format_flag!(z, "Z"),
            format_flag!(c, "C")
        )
    }
}
