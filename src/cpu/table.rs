/*!
table.rs - 256-entry opcode table (mnemonic, addressing mode, base cycle cost).

Every opcode costs `1 + k * CPU_RDWR_CYC` cycles, with `k` given here;
branch-taken and cross-page penalties are added by the branch operator
itself, not by this table (see `cpu::execute::branch_if`).

Undocumented/illegal opcodes are tabulated with the cost and operand
length observed on WDC 65C02 silicon (which, unlike the NMOS 6502,
reliably treats every undefined encoding as some flavor of NOP rather than
jamming); the dispatcher logs a diagnostic and performs no other effect.
*/

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddrMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    IndirectX,
    IndirectY,
    IndirectZp,
    IndirectAbsolute,
    IndirectAbsoluteX,
    Relative,
}

#[derive(Copy, Clone, Debug)]
pub struct OpcodeInfo {
    pub mnemonic: &'static str,
    pub mode: AddrMode,
    pub k: u32,
    pub illegal: bool,
}

const fn op(mnemonic: &'static str, mode: AddrMode, k: u32) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic,
        mode,
        k,
        illegal: false,
    }
}

const fn illegal_nop(k: u32, mode: AddrMode) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic: "NOP*",
        mode,
        k,
        illegal: true,
    }
}

use AddrMode::*;

/// The 256-entry table. Documented opcode slots are overwritten in order;
/// everything else defaults to a single-byte illegal NOP (k=1).
pub static OPCODES: [OpcodeInfo; 256] = build_table();

const fn build_table() -> [OpcodeInfo; 256] {
    let mut t = [illegal_nop(1, Implied); 256];

    t[0x00] = op("BRK", Implied, 6);
    t[0x01] = op("ORA", IndirectX, 5);
    t[0x04] = op("TSB", ZeroPage, 4);
    t[0x05] = op("ORA", ZeroPage, 2);
    t[0x06] = op("ASL", ZeroPage, 4);
    t[0x08] = op("PHP", Implied, 2);
    t[0x09] = op("ORA", Immediate, 1);
    t[0x0A] = op("ASL", Accumulator, 1);
    t[0x0C] = op("TSB", Absolute, 5);
    t[0x0D] = op("ORA", Absolute, 3);
    t[0x0E] = op("ASL", Absolute, 5);
    t[0x10] = op("BPL", Relative, 1);
    t[0x11] = op("ORA", IndirectY, 4);
    t[0x12] = op("ORA", IndirectZp, 4);
    t[0x14] = op("TRB", ZeroPage, 4);
    t[0x15] = op("ORA", ZeroPageX, 3);
    t[0x16] = op("ASL", ZeroPageX, 5);
    t[0x18] = op("CLC", Implied, 1);
    t[0x19] = op("ORA", AbsoluteY, 3);
    t[0x1A] = op("INC", Accumulator, 1);
    t[0x1C] = op("TRB", Absolute, 5);
    t[0x1D] = op("ORA", AbsoluteX, 3);
    t[0x1E] = op("ASL", AbsoluteX, 6);

    t[0x20] = op("JSR", Absolute, 5);
    t[0x21] = op("AND", IndirectX, 5);
    t[0x24] = op("BIT", ZeroPage, 2);
    t[0x25] = op("AND", ZeroPage, 2);
    t[0x26] = op("ROL", ZeroPage, 4);
    t[0x28] = op("PLP", Implied, 3);
    t[0x29] = op("AND", Immediate, 1);
    t[0x2A] = op("ROL", Accumulator, 1);
    t[0x2C] = op("BIT", Absolute, 3);
    t[0x2D] = op("AND", Absolute, 3);
    t[0x2E] = op("ROL", Absolute, 5);
    t[0x30] = op("BMI", Relative, 1);
    t[0x31] = op("AND", IndirectY, 4);
    t[0x32] = op("AND", IndirectZp, 4);
    t[0x34] = op("BIT", ZeroPageX, 3);
    t[0x35] = op("AND", ZeroPageX, 3);
    t[0x36] = op("ROL", ZeroPageX, 5);
    t[0x38] = op("SEC", Implied, 1);
    t[0x39] = op("AND", AbsoluteY, 3);
    t[0x3A] = op("DEC", Accumulator, 1);
    t[0x3C] = op("BIT", AbsoluteX, 3);
    t[0x3D] = op("AND", AbsoluteX, 3);
    t[0x3E] = op("ROL", AbsoluteX, 6);

    t[0x40] = op("RTI", Implied, 5);
    t[0x41] = op("EOR", IndirectX, 5);
    t[0x45] = op("EOR", ZeroPage, 2);
    t[0x46] = op("LSR", ZeroPage, 4);
    t[0x48] = op("PHA", Implied, 2);
    t[0x49] = op("EOR", Immediate, 1);
    t[0x4A] = op("LSR", Accumulator, 1);
    t[0x4C] = op("JMP", Absolute, 2);
    t[0x4D] = op("EOR", Absolute, 3);
    t[0x4E] = op("LSR", Absolute, 5);
    t[0x50] = op("BVC", Relative, 1);
    t[0x51] = op("EOR", IndirectY, 4);
    t[0x52] = op("EOR", IndirectZp, 4);
    t[0x55] = op("EOR", ZeroPageX, 3);
    t[0x56] = op("LSR", ZeroPageX, 5);
    t[0x58] = op("CLI", Implied, 1);
    t[0x59] = op("EOR", AbsoluteY, 3);
    t[0x5A] = op("PHY", Implied, 2);
    t[0x5D] = op("EOR", AbsoluteX, 3);
    t[0x5E] = op("LSR", AbsoluteX, 6);

    t[0x60] = op("RTS", Implied, 5);
    t[0x61] = op("ADC", IndirectX, 5);
    t[0x64] = op("STZ", ZeroPage, 2);
    t[0x65] = op("ADC", ZeroPage, 2);
    t[0x66] = op("ROR", ZeroPage, 4);
    t[0x68] = op("PLA", Implied, 3);
    t[0x69] = op("ADC", Immediate, 1);
    t[0x6A] = op("ROR", Accumulator, 1);
    t[0x6C] = op("JMP", IndirectAbsolute, 4);
    t[0x6D] = op("ADC", Absolute, 3);
    t[0x6E] = op("ROR", Absolute, 5);
    t[0x70] = op("BVS", Relative, 1);
    t[0x71] = op("ADC", IndirectY, 4);
    t[0x72] = op("ADC", IndirectZp, 4);
    t[0x74] = op("STZ", ZeroPageX, 3);
    t[0x75] = op("ADC", ZeroPageX, 3);
    t[0x76] = op("ROR", ZeroPageX, 5);
    t[0x78] = op("SEI", Implied, 1);
    t[0x79] = op("ADC", AbsoluteY, 3);
    t[0x7A] = op("PLY", Implied, 3);
    t[0x7C] = op("JMP", IndirectAbsoluteX, 5);
    t[0x7D] = op("ADC", AbsoluteX, 3);
    t[0x7E] = op("ROR", AbsoluteX, 6);

    t[0x80] = op("BRA", Relative, 2);
    t[0x81] = op("STA", IndirectX, 5);
    t[0x84] = op("STY", ZeroPage, 2);
    t[0x85] = op("STA", ZeroPage, 2);
    t[0x86] = op("STX", ZeroPage, 2);
    t[0x88] = op("DEY", Implied, 1);
    t[0x89] = op("BIT", Immediate, 1);
    t[0x8A] = op("TXA", Implied, 1);
    t[0x8C] = op("STY", Absolute, 3);
    t[0x8D] = op("STA", Absolute, 3);
    t[0x8E] = op("STX", Absolute, 3);
    t[0x90] = op("BCC", Relative, 1);
    t[0x91] = op("STA", IndirectY, 5);
    t[0x92] = op("STA", IndirectZp, 4);
    t[0x94] = op("STY", ZeroPageX, 3);
    t[0x95] = op("STA", ZeroPageX, 3);
    t[0x96] = op("STX", ZeroPageY, 3);
    t[0x98] = op("TYA", Implied, 1);
    t[0x99] = op("STA", AbsoluteY, 4);
    t[0x9A] = op("TXS", Implied, 1);
    t[0x9C] = op("STZ", Absolute, 3);
    t[0x9D] = op("STA", AbsoluteX, 4);
    t[0x9E] = op("STZ", AbsoluteX, 4);

    t[0xA0] = op("LDY", Immediate, 1);
    t[0xA1] = op("LDA", IndirectX, 5);
    t[0xA2] = op("LDX", Immediate, 1);
    t[0xA4] = op("LDY", ZeroPage, 2);
    t[0xA5] = op("LDA", ZeroPage, 2);
    t[0xA6] = op("LDX", ZeroPage, 2);
    t[0xA8] = op("TAY", Implied, 1);
    t[0xA9] = op("LDA", Immediate, 1);
    t[0xAA] = op("TAX", Implied, 1);
    t[0xAC] = op("LDY", Absolute, 3);
    t[0xAD] = op("LDA", Absolute, 3);
    t[0xAE] = op("LDX", Absolute, 3);
    t[0xB0] = op("BCS", Relative, 1);
    t[0xB1] = op("LDA", IndirectY, 4);
    t[0xB2] = op("LDA", IndirectZp, 4);
    t[0xB4] = op("LDY", ZeroPageX, 3);
    t[0xB5] = op("LDA", ZeroPageX, 3);
    t[0xB6] = op("LDX", ZeroPageY, 3);
    t[0xB8] = op("CLV", Implied, 1);
    t[0xB9] = op("LDA", AbsoluteY, 3);
    t[0xBA] = op("TSX", Implied, 1);
    t[0xBC] = op("LDY", AbsoluteX, 3);
    t[0xBD] = op("LDA", AbsoluteX, 3);
    t[0xBE] = op("LDX", AbsoluteY, 3);

    t[0xC0] = op("CPY", Immediate, 1);
    t[0xC1] = op("CMP", IndirectX, 5);
    t[0xC4] = op("CPY", ZeroPage, 2);
    t[0xC5] = op("CMP", ZeroPage, 2);
    t[0xC6] = op("DEC", ZeroPage, 4);
    t[0xC8] = op("INY", Implied, 1);
    t[0xC9] = op("CMP", Immediate, 1);
    t[0xCA] = op("DEX", Implied, 1);
    t[0xCB] = op("WAI", Implied, 1);
    t[0xCC] = op("CPY", Absolute, 3);
    t[0xCD] = op("CMP", Absolute, 3);
    t[0xCE] = op("DEC", Absolute, 5);
    t[0xD0] = op("BNE", Relative, 1);
    t[0xD1] = op("CMP", IndirectY, 4);
    t[0xD2] = op("CMP", IndirectZp, 4);
    t[0xD5] = op("CMP", ZeroPageX, 3);
    t[0xD6] = op("DEC", ZeroPageX, 5);
    t[0xD8] = op("CLD", Implied, 1);
    t[0xD9] = op("CMP", AbsoluteY, 3);
    t[0xDA] = op("PHX", Implied, 2);
    t[0xDB] = op("STP", Implied, 1);
    t[0xDD] = op("CMP", AbsoluteX, 3);
    t[0xDE] = op("DEC", AbsoluteX, 6);

    t[0xE0] = op("CPX", Immediate, 1);
    t[0xE1] = op("SBC", IndirectX, 5);
    t[0xE4] = op("CPX", ZeroPage, 2);
    t[0xE5] = op("SBC", ZeroPage, 2);
    t[0xE6] = op("INC", ZeroPage, 4);
    t[0xE8] = op("INX", Implied, 1);
    t[0xE9] = op("SBC", Immediate, 1);
    t[0xEA] = op("NOP", Implied, 1);
    t[0xEC] = op("CPX", Absolute, 3);
    t[0xED] = op("SBC", Absolute, 3);
    t[0xEE] = op("INC", Absolute, 5);
    t[0xF0] = op("BEQ", Relative, 1);
    t[0xF1] = op("SBC", IndirectY, 4);
    t[0xF2] = op("SBC", IndirectZp, 4);
    t[0xF5] = op("SBC", ZeroPageX, 3);
    t[0xF6] = op("INC", ZeroPageX, 5);
    t[0xF8] = op("SED", Implied, 1);
    t[0xF9] = op("SBC", AbsoluteY, 3);
    t[0xFA] = op("PLX", Implied, 3);
    t[0xFD] = op("SBC", AbsoluteX, 3);
    t[0xFE] = op("INC", AbsoluteX, 6);

    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_opcodes_are_not_illegal() {
        for &opc in &[0x00u8, 0xA9, 0xEA, 0xCB, 0xDB, 0x80] {
            assert!(!OPCODES[opc as usize].illegal, "opcode {opc:#04x}");
        }
    }

    #[test]
    fn unassigned_slots_default_illegal_nop() {
        assert!(OPCODES[0x02].illegal);
        assert!(OPCODES[0xFF].illegal);
    }

    #[test]
    fn accumulator_mode_rmw_opcodes_cost_one_extra_cycle() {
        for &opc in &[0x0Au8, 0x1A, 0x2A, 0x3A, 0x4A, 0x6A] {
            let info = &OPCODES[opc as usize];
            assert_eq!(info.mode, Accumulator, "opcode {opc:#04x}");
            assert_eq!(info.k, 1, "opcode {opc:#04x}");
        }
    }
}
