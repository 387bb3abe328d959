//! The 65816 instruction set as data.
//!
//! Every opcode byte maps to an [Opcode]: the instruction, how its operand is addressed, and its
//! base cycle cost (8 bit registers, native mode, direct page aligned to a page, no page crossing).
//! The CPU adds the remaining cycles itself.
use std::fmt::{Display, Formatter};

use crate::core::StatusRegister;

/// A 65816 instruction, independent of its addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Bra,
    Brk,
    Brl,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cop,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jml,
    Jmp,
    Jsl,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Mvn,
    Mvp,
    Nop,
    Ora,
    Pea,
    Pei,
    Per,
    Pha,
    Phb,
    Phd,
    Phk,
    Php,
    Phx,
    Phy,
    Pla,
    Plb,
    Pld,
    Plp,
    Plx,
    Ply,
    Rep,
    Rol,
    Ror,
    Rti,
    Rtl,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sep,
    Sta,
    Stp,
    Stx,
    Sty,
    Stz,
    Tax,
    Tay,
    Tcd,
    Tcs,
    Tdc,
    Trb,
    Tsb,
    Tsc,
    Tsx,
    Txa,
    Txs,
    Txy,
    Tya,
    Tyx,
    Wai,
    Wdm,
    Xba,
    Xce,
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_uppercase())
    }
}

/// How an instruction finds its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    /// Immediate, as wide as the accumulator
    ImmediateM,
    /// Immediate, as wide as the index registers
    ImmediateX,
    /// Immediate, always 1 byte
    Immediate8,
    Relative,
    RelativeLong,
    Direct,
    DirectX,
    DirectY,
    /// `(dp)`
    DirectIndirect,
    /// `[dp]`
    DirectIndirectLong,
    /// `(dp,X)`
    DirectXIndirect,
    /// `(dp),Y`
    DirectIndirectY,
    /// `[dp],Y`
    DirectIndirectLongY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    AbsoluteLong,
    AbsoluteLongX,
    /// `(abs)`, only used by JMP
    AbsoluteIndirect,
    /// `[abs]`, only used by JML
    AbsoluteIndirectLong,
    /// `(abs,X)`, only used by JMP and JSR
    AbsoluteXIndirect,
    StackRelative,
    /// `(sr,S),Y`
    StackRelativeIndirectY,
    /// MVN and MVP, two bank bytes
    BlockMove,
}

impl AddressingMode {
    /// How many operand bytes follow the opcode.
    /// ```
    /// use yase::core::opcodes::AddressingMode;
    /// assert_eq!(AddressingMode::ImmediateM.operand_len(false, true), 1);
    /// assert_eq!(AddressingMode::ImmediateM.operand_len(true, true), 2);
    /// assert_eq!(AddressingMode::AbsoluteLongX.operand_len(false, false), 3);
    /// ```
    pub fn operand_len(&self, wide_m: bool, wide_x: bool) -> usize {
        use AddressingMode::*;
        match self {
            Implied | Accumulator => 0,
            ImmediateM => 1 + wide_m as usize,
            ImmediateX => 1 + wide_x as usize,
            Immediate8 | Relative | Direct | DirectX | DirectY | DirectIndirect
            | DirectIndirectLong | DirectXIndirect | DirectIndirectY | DirectIndirectLongY
            | StackRelative | StackRelativeIndirectY => 1,
            RelativeLong | Absolute | AbsoluteX | AbsoluteY | AbsoluteIndirect
            | AbsoluteIndirectLong | AbsoluteXIndirect | BlockMove => 2,
            AbsoluteLong | AbsoluteLongX => 3,
        }
    }
    /// Whether the mode reads through the direct page register, costing a cycle when it is not page aligned.
    pub fn uses_direct_page(&self) -> bool {
        use AddressingMode::*;
        matches!(
            self,
            Direct
                | DirectX
                | DirectY
                | DirectIndirect
                | DirectIndirectLong
                | DirectXIndirect
                | DirectIndirectY
                | DirectIndirectLongY
        )
    }
}

/// A single entry in [OPCODES].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub instruction: Instruction,
    pub mode: AddressingMode,
    pub cycles: u8,
}

macro_rules! op {
    ($instruction: ident, $mode: ident, $cycles: literal) => {
        Opcode {
            instruction: Instruction::$instruction,
            mode: AddressingMode::$mode,
            cycles: $cycles,
        }
    };
}

/// Every 65816 opcode, indexed by opcode byte.
pub const OPCODES: [Opcode; 256] = [
    op!(Brk, Immediate8, 7), // 00
    op!(Ora, DirectXIndirect, 6), // 01
    op!(Cop, Immediate8, 7), // 02
    op!(Ora, StackRelative, 4), // 03
    op!(Tsb, Direct, 5), // 04
    op!(Ora, Direct, 3), // 05
    op!(Asl, Direct, 5), // 06
    op!(Ora, DirectIndirectLong, 6), // 07
    op!(Php, Implied, 3), // 08
    op!(Ora, ImmediateM, 2), // 09
    op!(Asl, Accumulator, 2), // 0A
    op!(Phd, Implied, 4), // 0B
    op!(Tsb, Absolute, 6), // 0C
    op!(Ora, Absolute, 4), // 0D
    op!(Asl, Absolute, 6), // 0E
    op!(Ora, AbsoluteLong, 5), // 0F
    op!(Bpl, Relative, 2), // 10
    op!(Ora, DirectIndirectY, 5), // 11
    op!(Ora, DirectIndirect, 5), // 12
    op!(Ora, StackRelativeIndirectY, 7), // 13
    op!(Trb, Direct, 5), // 14
    op!(Ora, DirectX, 4), // 15
    op!(Asl, DirectX, 6), // 16
    op!(Ora, DirectIndirectLongY, 6), // 17
    op!(Clc, Implied, 2), // 18
    op!(Ora, AbsoluteY, 4), // 19
    op!(Inc, Accumulator, 2), // 1A
    op!(Tcs, Implied, 2), // 1B
    op!(Trb, Absolute, 6), // 1C
    op!(Ora, AbsoluteX, 4), // 1D
    op!(Asl, AbsoluteX, 7), // 1E
    op!(Ora, AbsoluteLongX, 5), // 1F
    op!(Jsr, Absolute, 6), // 20
    op!(And, DirectXIndirect, 6), // 21
    op!(Jsl, AbsoluteLong, 8), // 22
    op!(And, StackRelative, 4), // 23
    op!(Bit, Direct, 3), // 24
    op!(And, Direct, 3), // 25
    op!(Rol, Direct, 5), // 26
    op!(And, DirectIndirectLong, 6), // 27
    op!(Plp, Implied, 4), // 28
    op!(And, ImmediateM, 2), // 29
    op!(Rol, Accumulator, 2), // 2A
    op!(Pld, Implied, 5), // 2B
    op!(Bit, Absolute, 4), // 2C
    op!(And, Absolute, 4), // 2D
    op!(Rol, Absolute, 6), // 2E
    op!(And, AbsoluteLong, 5), // 2F
    op!(Bmi, Relative, 2), // 30
    op!(And, DirectIndirectY, 5), // 31
    op!(And, DirectIndirect, 5), // 32
    op!(And, StackRelativeIndirectY, 7), // 33
    op!(Bit, DirectX, 4), // 34
    op!(And, DirectX, 4), // 35
    op!(Rol, DirectX, 6), // 36
    op!(And, DirectIndirectLongY, 6), // 37
    op!(Sec, Implied, 2), // 38
    op!(And, AbsoluteY, 4), // 39
    op!(Dec, Accumulator, 2), // 3A
    op!(Tsc, Implied, 2), // 3B
    op!(Bit, AbsoluteX, 4), // 3C
    op!(And, AbsoluteX, 4), // 3D
    op!(Rol, AbsoluteX, 7), // 3E
    op!(And, AbsoluteLongX, 5), // 3F
    op!(Rti, Implied, 6), // 40
    op!(Eor, DirectXIndirect, 6), // 41
    op!(Wdm, Immediate8, 2), // 42
    op!(Eor, StackRelative, 4), // 43
    op!(Mvp, BlockMove, 7), // 44
    op!(Eor, Direct, 3), // 45
    op!(Lsr, Direct, 5), // 46
    op!(Eor, DirectIndirectLong, 6), // 47
    op!(Pha, Implied, 3), // 48
    op!(Eor, ImmediateM, 2), // 49
    op!(Lsr, Accumulator, 2), // 4A
    op!(Phk, Implied, 3), // 4B
    op!(Jmp, Absolute, 3), // 4C
    op!(Eor, Absolute, 4), // 4D
    op!(Lsr, Absolute, 6), // 4E
    op!(Eor, AbsoluteLong, 5), // 4F
    op!(Bvc, Relative, 2), // 50
    op!(Eor, DirectIndirectY, 5), // 51
    op!(Eor, DirectIndirect, 5), // 52
    op!(Eor, StackRelativeIndirectY, 7), // 53
    op!(Mvn, BlockMove, 7), // 54
    op!(Eor, DirectX, 4), // 55
    op!(Lsr, DirectX, 6), // 56
    op!(Eor, DirectIndirectLongY, 6), // 57
    op!(Cli, Implied, 2), // 58
    op!(Eor, AbsoluteY, 4), // 59
    op!(Phy, Implied, 3), // 5A
    op!(Tcd, Implied, 2), // 5B
    op!(Jmp, AbsoluteLong, 4), // 5C
    op!(Eor, AbsoluteX, 4), // 5D
    op!(Lsr, AbsoluteX, 7), // 5E
    op!(Eor, AbsoluteLongX, 5), // 5F
    op!(Rts, Implied, 6), // 60
    op!(Adc, DirectXIndirect, 6), // 61
    op!(Per, RelativeLong, 6), // 62
    op!(Adc, StackRelative, 4), // 63
    op!(Stz, Direct, 3), // 64
    op!(Adc, Direct, 3), // 65
    op!(Ror, Direct, 5), // 66
    op!(Adc, DirectIndirectLong, 6), // 67
    op!(Pla, Implied, 4), // 68
    op!(Adc, ImmediateM, 2), // 69
    op!(Ror, Accumulator, 2), // 6A
    op!(Rtl, Implied, 6), // 6B
    op!(Jmp, AbsoluteIndirect, 5), // 6C
    op!(Adc, Absolute, 4), // 6D
    op!(Ror, Absolute, 6), // 6E
    op!(Adc, AbsoluteLong, 5), // 6F
    op!(Bvs, Relative, 2), // 70
    op!(Adc, DirectIndirectY, 5), // 71
    op!(Adc, DirectIndirect, 5), // 72
    op!(Adc, StackRelativeIndirectY, 7), // 73
    op!(Stz, DirectX, 4), // 74
    op!(Adc, DirectX, 4), // 75
    op!(Ror, DirectX, 6), // 76
    op!(Adc, DirectIndirectLongY, 6), // 77
    op!(Sei, Implied, 2), // 78
    op!(Adc, AbsoluteY, 4), // 79
    op!(Ply, Implied, 4), // 7A
    op!(Tdc, Implied, 2), // 7B
    op!(Jmp, AbsoluteXIndirect, 6), // 7C
    op!(Adc, AbsoluteX, 4), // 7D
    op!(Ror, AbsoluteX, 7), // 7E
    op!(Adc, AbsoluteLongX, 5), // 7F
    op!(Bra, Relative, 2), // 80
    op!(Sta, DirectXIndirect, 6), // 81
    op!(Brl, RelativeLong, 4), // 82
    op!(Sta, StackRelative, 4), // 83
    op!(Sty, Direct, 3), // 84
    op!(Sta, Direct, 3), // 85
    op!(Stx, Direct, 3), // 86
    op!(Sta, DirectIndirectLong, 6), // 87
    op!(Dey, Implied, 2), // 88
    op!(Bit, ImmediateM, 2), // 89
    op!(Txa, Implied, 2), // 8A
    op!(Phb, Implied, 3), // 8B
    op!(Sty, Absolute, 4), // 8C
    op!(Sta, Absolute, 4), // 8D
    op!(Stx, Absolute, 4), // 8E
    op!(Sta, AbsoluteLong, 5), // 8F
    op!(Bcc, Relative, 2), // 90
    op!(Sta, DirectIndirectY, 6), // 91
    op!(Sta, DirectIndirect, 5), // 92
    op!(Sta, StackRelativeIndirectY, 7), // 93
    op!(Sty, DirectX, 4), // 94
    op!(Sta, DirectX, 4), // 95
    op!(Stx, DirectY, 4), // 96
    op!(Sta, DirectIndirectLongY, 6), // 97
    op!(Tya, Implied, 2), // 98
    op!(Sta, AbsoluteY, 5), // 99
    op!(Txs, Implied, 2), // 9A
    op!(Txy, Implied, 2), // 9B
    op!(Stz, Absolute, 4), // 9C
    op!(Sta, AbsoluteX, 5), // 9D
    op!(Stz, AbsoluteX, 5), // 9E
    op!(Sta, AbsoluteLongX, 5), // 9F
    op!(Ldy, ImmediateX, 2), // A0
    op!(Lda, DirectXIndirect, 6), // A1
    op!(Ldx, ImmediateX, 2), // A2
    op!(Lda, StackRelative, 4), // A3
    op!(Ldy, Direct, 3), // A4
    op!(Lda, Direct, 3), // A5
    op!(Ldx, Direct, 3), // A6
    op!(Lda, DirectIndirectLong, 6), // A7
    op!(Tay, Implied, 2), // A8
    op!(Lda, ImmediateM, 2), // A9
    op!(Tax, Implied, 2), // AA
    op!(Plb, Implied, 4), // AB
    op!(Ldy, Absolute, 4), // AC
    op!(Lda, Absolute, 4), // AD
    op!(Ldx, Absolute, 4), // AE
    op!(Lda, AbsoluteLong, 5), // AF
    op!(Bcs, Relative, 2), // B0
    op!(Lda, DirectIndirectY, 5), // B1
    op!(Lda, DirectIndirect, 5), // B2
    op!(Lda, StackRelativeIndirectY, 7), // B3
    op!(Ldy, DirectX, 4), // B4
    op!(Lda, DirectX, 4), // B5
    op!(Ldx, DirectY, 4), // B6
    op!(Lda, DirectIndirectLongY, 6), // B7
    op!(Clv, Implied, 2), // B8
    op!(Lda, AbsoluteY, 4), // B9
    op!(Tsx, Implied, 2), // BA
    op!(Tyx, Implied, 2), // BB
    op!(Ldy, AbsoluteX, 4), // BC
    op!(Lda, AbsoluteX, 4), // BD
    op!(Ldx, AbsoluteY, 4), // BE
    op!(Lda, AbsoluteLongX, 5), // BF
    op!(Cpy, ImmediateX, 2), // C0
    op!(Cmp, DirectXIndirect, 6), // C1
    op!(Rep, Immediate8, 3), // C2
    op!(Cmp, StackRelative, 4), // C3
    op!(Cpy, Direct, 3), // C4
    op!(Cmp, Direct, 3), // C5
    op!(Dec, Direct, 5), // C6
    op!(Cmp, DirectIndirectLong, 6), // C7
    op!(Iny, Implied, 2), // C8
    op!(Cmp, ImmediateM, 2), // C9
    op!(Dex, Implied, 2), // CA
    op!(Wai, Implied, 3), // CB
    op!(Cpy, Absolute, 4), // CC
    op!(Cmp, Absolute, 4), // CD
    op!(Dec, Absolute, 6), // CE
    op!(Cmp, AbsoluteLong, 5), // CF
    op!(Bne, Relative, 2), // D0
    op!(Cmp, DirectIndirectY, 5), // D1
    op!(Cmp, DirectIndirect, 5), // D2
    op!(Cmp, StackRelativeIndirectY, 7), // D3
    op!(Pei, DirectIndirect, 6), // D4
    op!(Cmp, DirectX, 4), // D5
    op!(Dec, DirectX, 6), // D6
    op!(Cmp, DirectIndirectLongY, 6), // D7
    op!(Cld, Implied, 2), // D8
    op!(Cmp, AbsoluteY, 4), // D9
    op!(Phx, Implied, 3), // DA
    op!(Stp, Implied, 3), // DB
    op!(Jml, AbsoluteIndirectLong, 6), // DC
    op!(Cmp, AbsoluteX, 4), // DD
    op!(Dec, AbsoluteX, 7), // DE
    op!(Cmp, AbsoluteLongX, 5), // DF
    op!(Cpx, ImmediateX, 2), // E0
    op!(Sbc, DirectXIndirect, 6), // E1
    op!(Sep, Immediate8, 3), // E2
    op!(Sbc, StackRelative, 4), // E3
    op!(Cpx, Direct, 3), // E4
    op!(Sbc, Direct, 3), // E5
    op!(Inc, Direct, 5), // E6
    op!(Sbc, DirectIndirectLong, 6), // E7
    op!(Inx, Implied, 2), // E8
    op!(Sbc, ImmediateM, 2), // E9
    op!(Nop, Implied, 2), // EA
    op!(Xba, Implied, 3), // EB
    op!(Cpx, Absolute, 4), // EC
    op!(Sbc, Absolute, 4), // ED
    op!(Inc, Absolute, 6), // EE
    op!(Sbc, AbsoluteLong, 5), // EF
    op!(Beq, Relative, 2), // F0
    op!(Sbc, DirectIndirectY, 5), // F1
    op!(Sbc, DirectIndirect, 5), // F2
    op!(Sbc, StackRelativeIndirectY, 7), // F3
    op!(Pea, Absolute, 5), // F4
    op!(Sbc, DirectX, 4), // F5
    op!(Inc, DirectX, 6), // F6
    op!(Sbc, DirectIndirectLongY, 6), // F7
    op!(Sed, Implied, 2), // F8
    op!(Sbc, AbsoluteY, 4), // F9
    op!(Plx, Implied, 4), // FA
    op!(Xce, Implied, 2), // FB
    op!(Jsr, AbsoluteXIndirect, 8), // FC
    op!(Sbc, AbsoluteX, 4), // FD
    op!(Inc, AbsoluteX, 7), // FE
    op!(Sbc, AbsoluteLongX, 5), // FF
];

/// Format an instruction in conventional assembly syntax.
///
/// `bytes` starts with the opcode and may be longer than the instruction. `address` is where
/// the instruction is located, used to print branch targets. `status` decides how wide
/// immediate operands are.
/// ```
/// use yase::core::{opcodes::format_instruction, StatusRegister};
/// let mut status = StatusRegister::new();
/// assert_eq!(format_instruction(0x8000, &[0xA9, 0x34, 0x12], &status), "LDA #$34");
/// status.m = false;
/// assert_eq!(format_instruction(0x8000, &[0xA9, 0x34, 0x12], &status), "LDA #$1234");
/// assert_eq!(format_instruction(0x8000, &[0xD0, 0xFE], &status), "BNE $8000");
/// ```
pub fn format_instruction(address: u32, bytes: &[u8], status: &StatusRegister) -> String {
    use AddressingMode::*;
    let byte = |i: usize| bytes.get(i).copied().unwrap_or(0);
    let opcode = OPCODES[byte(0) as usize];
    let name = opcode.instruction;
    let b1 = byte(1);
    let word = u16::from_le_bytes([byte(1), byte(2)]);
    let long = u32::from_le_bytes([byte(1), byte(2), byte(3), 0]);
    let len = 1 + opcode.mode.operand_len(!status.m, !status.x) as u32;
    let bank = address & 0xFF0000;
    match opcode.mode {
        Implied => format!("{}", name),
        Accumulator => format!("{} A", name),
        ImmediateM | ImmediateX if len == 3 => format!("{} #${:04X}", name, word),
        ImmediateM | ImmediateX | Immediate8 => format!("{} #${:02X}", name, b1),
        Relative => {
            let target = (address as u16)
                .wrapping_add(len as u16)
                .wrapping_add_signed(b1 as i8 as i16);
            format!("{} ${:04X}", name, target)
        }
        RelativeLong => {
            let target = (address as u16).wrapping_add(len as u16).wrapping_add(word);
            format!("{} ${:06X}", name, bank | target as u32)
        }
        Direct => format!("{} ${:02X}", name, b1),
        DirectX => format!("{} ${:02X},X", name, b1),
        DirectY => format!("{} ${:02X},Y", name, b1),
        DirectIndirect => format!("{} (${:02X})", name, b1),
        DirectIndirectLong => format!("{} [${:02X}]", name, b1),
        DirectXIndirect => format!("{} (${:02X},X)", name, b1),
        DirectIndirectY => format!("{} (${:02X}),Y", name, b1),
        DirectIndirectLongY => format!("{} [${:02X}],Y", name, b1),
        Absolute => format!("{} ${:04X}", name, word),
        AbsoluteX => format!("{} ${:04X},X", name, word),
        AbsoluteY => format!("{} ${:04X},Y", name, word),
        AbsoluteLong => format!("{} ${:06X}", name, long),
        AbsoluteLongX => format!("{} ${:06X},X", name, long),
        AbsoluteIndirect => format!("{} (${:04X})", name, word),
        AbsoluteIndirectLong => format!("{} [${:04X}]", name, word),
        AbsoluteXIndirect => format!("{} (${:04X},X)", name, word),
        StackRelative => format!("{} ${:02X},S", name, b1),
        StackRelativeIndirectY => format!("{} (${:02X},S),Y", name, b1),
        // Encoded destination first, written source first
        BlockMove => format!("{} ${:02X},${:02X}", name, byte(2), b1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_opcode() {
        assert_eq!(OPCODES[0xEA].instruction, Instruction::Nop);
        assert_eq!(OPCODES[0xEA].cycles, 2);
        assert_eq!(OPCODES[0xA9].mode, AddressingMode::ImmediateM);
        assert_eq!(OPCODES[0x89].instruction, Instruction::Bit);
        assert_eq!(OPCODES[0xFB].instruction, Instruction::Xce);
        assert_eq!(OPCODES[0x54].mode, AddressingMode::BlockMove);
    }

    #[test]
    fn test_format_modes() {
        let s = StatusRegister::new();
        insta::assert_snapshot!(format_instruction(0x008000, &[0x78], &s), @"SEI");
        insta::assert_snapshot!(format_instruction(0x008000, &[0x0A], &s), @"ASL A");
        insta::assert_snapshot!(format_instruction(0x008000, &[0xB7, 0x10], &s), @"LDA [$10],Y");
        insta::assert_snapshot!(format_instruction(0x008000, &[0x7C, 0x34, 0x12], &s), @"JMP ($1234,X)");
        insta::assert_snapshot!(format_instruction(0x008000, &[0x22, 0x56, 0x34, 0x12], &s), @"JSL $123456");
        insta::assert_snapshot!(format_instruction(0x008000, &[0x54, 0x7E, 0x01], &s), @"MVN $01,$7E");
        insta::assert_snapshot!(format_instruction(0x008000, &[0x93, 0x03], &s), @"STA ($03,S),Y");
        insta::assert_snapshot!(format_instruction(0x018000, &[0x82, 0x00, 0x10], &s), @"BRL $019003");
    }

    #[test]
    fn test_format_short_input() {
        // Missing operand bytes are treated as 0
        let s = StatusRegister::new();
        assert_eq!(format_instruction(0, &[0xAD], &s), "LDA $0000");
    }
}
