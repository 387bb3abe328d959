mod common;
use assert_hex::assert_eq_hex;
use common::program;
use test_case::test_case;
use yase::core::Error;

#[test]
fn test_nop() {
    let mut snes = snes_with_program!(&[0xEA]);
    assert_eq!(snes.step().unwrap(), 2);
    assert_eq_hex!(snes.cpu.pc, 0x8001);
    assert_eq!(snes.cpu.cycles, 2);
}

#[test]
fn test_native_mode_16_bit_store() {
    let mut snes = snes_with_program!(&[
        0x18, // CLC
        0xFB, // XCE
        0xC2, 0x30, // REP #$30
        0xA9, 0x34, 0x12, // LDA #$1234
        0x8D, 0x00, 0x10, // STA $1000
        0xA2, 0xCD, 0xAB, // LDX #$ABCD
    ]);
    step_snes!(snes, 4);
    assert!(!snes.cpu.emulation);
    assert!(!snes.cpu.p.m);
    assert_eq!(snes.step().unwrap(), 5);
    assert_eq_hex!(snes.bus.wram[0x1000], 0x34);
    assert_eq_hex!(snes.bus.wram[0x1001], 0x12);
    assert_eq!(snes.step().unwrap(), 3);
    insta::assert_snapshot!(
        format!("{:?}", snes.cpu),
        @"A=1234 X=ABCD Y=0000 S=01FC D=0000 DB=00 PC=00:800D P=N....I.C E=0 CYC=18"
    );
}

#[test]
fn test_decimal_adc() {
    let mut snes = snes_with_program!(&[
        0xF8, // SED
        0x18, // CLC
        0xA9, 0x19, // LDA #$19
        0x69, 0x28, // ADC #$28
        0x69, 0x55, // ADC #$55
    ]);
    step_snes!(snes, 4);
    assert_eq_hex!(snes.cpu.a & 0xFF, 0x47);
    assert!(!snes.cpu.p.c);
    step_snes!(snes, 1);
    assert_eq_hex!(snes.cpu.a & 0xFF, 0x02);
    assert!(snes.cpu.p.c);
}

#[test]
fn test_jsr_rts() {
    let rom = program(&[
        (0x8000, &[0x20, 0x10, 0x80]), // JSR $8010
        (0x8003, &[0xA2, 0x05]),       // LDX #$05
        (0x8010, &[0xA9, 0x42, 0x60]), // LDA #$42; RTS
    ]);
    let mut snes = snes_with_program!(&rom);
    assert_eq!(snes.step().unwrap(), 6);
    assert_eq_hex!(snes.cpu.pc, 0x8010);
    assert_eq_hex!(snes.cpu.s, 0x01FA);
    // The return address minus one, high byte first
    assert_eq_hex!(snes.bus.wram[0x01FC], 0x80);
    assert_eq_hex!(snes.bus.wram[0x01FB], 0x02);
    step_snes!(snes, 2);
    assert_eq_hex!(snes.cpu.pc, 0x8003);
    assert_eq_hex!(snes.cpu.s, 0x01FC);
    step_snes!(snes, 1);
    assert_eq_hex!(snes.cpu.a & 0xFF, 0x42);
    assert_eq_hex!(snes.cpu.x, 0x05);
}

#[test]
fn test_jsl_rtl() {
    let rom = program(&[
        (0x8000, &[0x22, 0x00, 0x81, 0x80]), // JSL $808100
        (0x8100, &[0xA9, 0x11, 0x6B]),       // LDA #$11; RTL
    ]);
    let mut snes = snes_with_program!(&rom);
    assert_eq!(snes.step().unwrap(), 8);
    assert_eq_hex!(snes.cpu.pb, 0x80);
    assert_eq_hex!(snes.cpu.pc, 0x8100);
    assert_eq_hex!(snes.bus.wram[0x01FC], 0x00);
    assert_eq_hex!(snes.bus.wram[0x01FB], 0x80);
    assert_eq_hex!(snes.bus.wram[0x01FA], 0x03);
    step_snes!(snes, 2);
    assert_eq_hex!(snes.cpu.pb, 0x00);
    assert_eq_hex!(snes.cpu.pc, 0x8004);
    assert_eq_hex!(snes.cpu.s, 0x01FC);
}

#[test]
fn test_block_move() {
    let mut snes = snes_with_program!(
        &[
            0x18, 0xFB, 0xC2, 0x30, // CLC; XCE; REP #$30
            0xA9, 0x03, 0x00, // LDA #$0003
            0xA2, 0x00, 0xA0, // LDX #$A000
            0xA0, 0x00, 0x02, // LDY #$0200
            0x54, 0x7E, 0x00, // MVN $00,$7E
            0xEA,
        ],
        data: &[1, 2, 3, 4, 5]
    );
    step_snes!(snes, 6);
    // One byte per step, staying on the instruction until the count runs out
    step_snes!(snes, 3);
    assert_eq_hex!(snes.cpu.pc, 0x800D);
    step_snes!(snes, 1);
    assert_eq_hex!(snes.cpu.pc, 0x8010);
    assert_eq!(snes.bus.wram[0x200..0x205], [1, 2, 3, 4, 0]);
    assert_eq_hex!(snes.cpu.a, 0xFFFF);
    assert_eq_hex!(snes.cpu.x, 0xA004);
    assert_eq_hex!(snes.cpu.y, 0x0204);
    assert_eq_hex!(snes.cpu.db, 0x7E);
}

#[test_case(0x8010, &[0x80, 0x00], 3 ; "taken branch")]
#[test_case(0x8010, &[0xB0, 0x10], 2 ; "branch not taken")]
#[test_case(0x80FD, &[0x80, 0x10], 4 ; "taken branch across a page")]
fn test_branch_cycles(addr: u16, branch: &[u8], cycles: u32) {
    let rom = program(&[
        (0x8000, &[0x4C, addr as u8, (addr >> 8) as u8]), // JMP addr
        (addr + 3, &[0xEA]),
        (addr, branch),
    ]);
    let mut snes = snes_with_program!(&rom);
    // Carry is clear after a reset
    step_snes!(snes, 1);
    assert_eq!(snes.step().unwrap(), cycles);
}

#[test]
fn test_stp_is_reported() {
    let mut snes = snes_with_program!(&[0xDB]);
    assert!(matches!(
        snes.step(),
        Err(Error::UnknownOpcode {
            opcode: 0xDB,
            address: 0x008000
        })
    ));
    assert_eq_hex!(snes.cpu.pc, 0x8000);
}

#[test]
fn test_unmapped_read_is_reported() {
    // LDA $5000
    let mut snes = snes_with_program!(&[0xAD, 0x00, 0x50]);
    assert!(matches!(
        snes.step(),
        Err(Error::UnmappedRead { address: 0x005000 })
    ));
}

#[test]
fn test_history_is_kept() {
    let mut snes = snes_with_program!(&[0xEA, 0xEA, 0xEA, 0xEA]);
    snes.settings.history_len = 2;
    step_snes!(snes, 4);
    assert_eq!(snes.history.len(), 2);
    insta::assert_snapshot!(
        format!("{:?}", snes.history[1]),
        @"A=0000 X=0000 Y=0000 S=01FC D=0000 DB=00 PC=00:8003 P=..MX.I.. E=1 CYC=6 NEXT INST=NOP (BYTES=[EA, 00, 00, 00])"
    );
}
