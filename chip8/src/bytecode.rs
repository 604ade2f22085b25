//! Instruction decoding.
//!
//! Each instruction is two bytes, big-endian, with the opcode family in
//! the upper 4-bit nibble. Operands are extracted from the remaining
//! nibbles depending on the family.
use std::fmt::{self, Display, Formatter};

use crate::constants::Address;

/// Join two bytes of bytecode into an instruction word.
#[inline(always)]
pub fn word(a: u8, b: u8) -> u16 {
    ((a as u16) << 8) | b as u16
}

/// Extract the opcode family from an instruction word.
#[inline(always)]
pub fn op_code(word: u16) -> u8 {
    ((word & 0xF000) >> 12) as u8
}

/// Extract operand NNN from an instruction word.
#[inline(always)]
pub fn op_nnn(word: u16) -> Address {
    word & 0x0FFF
}

/// Extract operand NN from an instruction word.
#[inline(always)]
pub fn op_nn(word: u16) -> u8 {
    (word & 0x00FF) as u8
}

/// Extract operand VX from an instruction word.
#[inline(always)]
pub fn op_x(word: u16) -> u8 {
    ((word & 0x0F00) >> 8) as u8
}

/// Extract operand VY from an instruction word.
#[inline(always)]
pub fn op_y(word: u16) -> u8 {
    ((word & 0x00F0) >> 4) as u8
}

/// Extract operand N from an instruction word.
#[inline(always)]
pub fn op_n(word: u16) -> u8 {
    (word & 0x000F) as u8
}

/// Decoded instruction.
///
/// Register operands are register indices (0x0-0xF), not register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    /// 00E0 (CLS)
    Cls,
    /// 00EE (RET)
    Ret,
    /// 1nnn (JP addr)
    Jp(Address),
    /// 2nnn (CALL addr)
    Call(Address),
    /// 3xnn (SE Vx, byte)
    SeByte(u8, u8),
    /// 4xnn (SNE Vx, byte)
    SneByte(u8, u8),
    /// 5xy0 (SE Vx, Vy)
    SeReg(u8, u8),
    /// 6xnn (LD Vx, byte)
    LdByte(u8, u8),
    /// 7xnn (ADD Vx, byte)
    AddByte(u8, u8),
    /// 8xy0 (LD Vx, Vy)
    LdReg(u8, u8),
    /// 8xy1 (OR Vx, Vy)
    Or(u8, u8),
    /// 8xy2 (AND Vx, Vy)
    And(u8, u8),
    /// 8xy3 (XOR Vx, Vy)
    Xor(u8, u8),
    /// 8xy4 (ADD Vx, Vy)
    AddReg(u8, u8),
    /// 8xy5 (SUB Vx, Vy)
    Sub(u8, u8),
    /// 8xy6 (SHR Vx)
    Shr(u8),
    /// 8xy7 (SUBN Vx, Vy)
    Subn(u8, u8),
    /// 8xyE (SHL Vx)
    Shl(u8),
    /// 9xy0 (SNE Vx, Vy)
    SneReg(u8, u8),
    /// Annn (LD I, addr)
    LdI(Address),
    /// Bnnn (JP V0, addr)
    JpV0(Address),
    /// Cxnn (RND Vx, byte)
    Rnd(u8, u8),
    /// Dxyn (DRW Vx, Vy, nibble)
    Drw(u8, u8, u8),
    /// Ex9E (SKP Vx)
    Skp(u8),
    /// ExA1 (SKNP Vx)
    Sknp(u8),
    /// Fx07 (LD Vx, DT)
    LdRegDt(u8),
    /// Fx0A (LD Vx, K)
    LdKey(u8),
    /// Fx15 (LD DT, Vx)
    LdDtReg(u8),
    /// Fx18 (LD ST, Vx)
    LdSt(u8),
    /// Fx1E (ADD I, Vx)
    AddI(u8),
    /// Fx29 (LD F, Vx)
    LdF(u8),
    /// Fx33 (LD B, Vx)
    LdB(u8),
    /// Fx55 (LD [I], Vx)
    LdDerefIReg(u8),
    /// Fx65 (LD Vx, [I])
    LdRegDerefI(u8),
}

impl Instr {
    /// Decode a raw instruction word.
    ///
    /// Returns `None` when the word has no known opcode family or sub-opcode.
    pub fn decode(word: u16) -> Option<Self> {
        use Instr::*;

        let (x, y, n, nn, nnn) = (
            op_x(word),
            op_y(word),
            op_n(word),
            op_nn(word),
            op_nnn(word),
        );

        let instr = match op_code(word) {
            0x0 => match nnn {
                0x0E0 => Cls,
                0x0EE => Ret,
                _ => return None,
            },
            0x1 => Jp(nnn),
            0x2 => Call(nnn),
            0x3 => SeByte(x, nn),
            0x4 => SneByte(x, nn),
            // The low nibble is not checked, 5xyN always compares registers.
            0x5 => SeReg(x, y),
            0x6 => LdByte(x, nn),
            0x7 => AddByte(x, nn),
            0x8 => match n {
                0x0 => LdReg(x, y),
                0x1 => Or(x, y),
                0x2 => And(x, y),
                0x3 => Xor(x, y),
                0x4 => AddReg(x, y),
                0x5 => Sub(x, y),
                0x6 => Shr(x),
                0x7 => Subn(x, y),
                0xE => Shl(x),
                _ => return None,
            },
            0x9 => SneReg(x, y),
            0xA => LdI(nnn),
            0xB => JpV0(nnn),
            0xC => Rnd(x, nn),
            0xD => Drw(x, y, n),
            0xE => match nn {
                0x9E => Skp(x),
                0xA1 => Sknp(x),
                _ => return None,
            },
            0xF => match nn {
                0x07 => LdRegDt(x),
                0x0A => LdKey(x),
                0x15 => LdDtReg(x),
                0x18 => LdSt(x),
                0x1E => AddI(x),
                0x29 => LdF(x),
                0x33 => LdB(x),
                0x55 => LdDerefIReg(x),
                0x65 => LdRegDerefI(x),
                _ => return None,
            },
            _ => unreachable!("opcode family is a 4-bit nibble"),
        };

        Some(instr)
    }
}

impl Display for Instr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use Instr::*;

        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp(nnn) => write!(f, "JP {nnn:03X}"),
            Call(nnn) => write!(f, "CALL {nnn:03X}"),
            SeByte(x, nn) => write!(f, "SE V{x:X}, {nn:02X}"),
            SneByte(x, nn) => write!(f, "SNE V{x:X}, {nn:02X}"),
            SeReg(x, y) => write!(f, "SE V{x:X}, V{y:X}"),
            LdByte(x, nn) => write!(f, "LD V{x:X}, {nn:02X}"),
            AddByte(x, nn) => write!(f, "ADD V{x:X}, {nn:02X}"),
            LdReg(x, y) => write!(f, "LD V{x:X}, V{y:X}"),
            Or(x, y) => write!(f, "OR V{x:X}, V{y:X}"),
            And(x, y) => write!(f, "AND V{x:X}, V{y:X}"),
            Xor(x, y) => write!(f, "XOR V{x:X}, V{y:X}"),
            AddReg(x, y) => write!(f, "ADD V{x:X}, V{y:X}"),
            Sub(x, y) => write!(f, "SUB V{x:X}, V{y:X}"),
            Shr(x) => write!(f, "SHR V{x:X}"),
            Subn(x, y) => write!(f, "SUBN V{x:X}, V{y:X}"),
            Shl(x) => write!(f, "SHL V{x:X}"),
            SneReg(x, y) => write!(f, "SNE V{x:X}, V{y:X}"),
            LdI(nnn) => write!(f, "LD I, {nnn:03X}"),
            JpV0(nnn) => write!(f, "JP V0, {nnn:03X}"),
            Rnd(x, nn) => write!(f, "RND V{x:X}, {nn:02X}"),
            Drw(x, y, n) => write!(f, "DRW V{x:X}, V{y:X}, {n:X}"),
            Skp(x) => write!(f, "SKP V{x:X}"),
            Sknp(x) => write!(f, "SKNP V{x:X}"),
            LdRegDt(x) => write!(f, "LD V{x:X}, DT"),
            LdKey(x) => write!(f, "LD V{x:X}, K"),
            LdDtReg(x) => write!(f, "LD DT, V{x:X}"),
            LdSt(x) => write!(f, "LD ST, V{x:X}"),
            AddI(x) => write!(f, "ADD I, V{x:X}"),
            LdF(x) => write!(f, "LD F, V{x:X}"),
            LdB(x) => write!(f, "LD B, V{x:X}"),
            LdDerefIReg(x) => write!(f, "LD [I], V{x:X}"),
            LdRegDerefI(x) => write!(f, "LD V{x:X}, [I]"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_operand_extraction() {
        let w = word(0xD1, 0x2F);
        assert_eq!(w, 0xD12F);
        assert_eq!(op_code(w), 0xD);
        assert_eq!(op_x(w), 0x1);
        assert_eq!(op_y(w), 0x2);
        assert_eq!(op_n(w), 0xF);
        assert_eq!(op_nn(w), 0x2F);
        assert_eq!(op_nnn(w), 0x12F);
    }

    #[test]
    fn test_decode_families() {
        use Instr::*;

        let cases = [
            (0x00E0, Cls),
            (0x00EE, Ret),
            (0x1234, Jp(0x234)),
            (0x2456, Call(0x456)),
            (0x342A, SeByte(0x4, 0x2A)),
            (0x4A75, SneByte(0xA, 0x75)),
            (0x5AE0, SeReg(0xA, 0xE)),
            (0x63F5, LdByte(0x3, 0xF5)),
            (0x7B12, AddByte(0xB, 0x12)),
            (0x8590, LdReg(0x5, 0x9)),
            (0x8101, Or(0x1, 0x0)),
            (0x8642, And(0x6, 0x4)),
            (0x87F3, Xor(0x7, 0xF)),
            (0x8264, AddReg(0x2, 0x6)),
            (0x8C45, Sub(0xC, 0x4)),
            (0x8106, Shr(0x1)),
            (0x86D7, Subn(0x6, 0xD)),
            (0x8E0E, Shl(0xE)),
            (0x9990, SneReg(0x9, 0x9)),
            (0xA568, LdI(0x568)),
            (0xBABC, JpV0(0xABC)),
            (0xC5AF, Rnd(0x5, 0xAF)),
            (0xD7B0, Drw(0x7, 0xB, 0x0)),
            (0xE49E, Skp(0x4)),
            (0xECA1, Sknp(0xC)),
            (0xF907, LdRegDt(0x9)),
            (0xFD0A, LdKey(0xD)),
            (0xF315, LdDtReg(0x3)),
            (0xF718, LdSt(0x7)),
            (0xF91E, AddI(0x9)),
            (0xFF29, LdF(0xF)),
            (0xF533, LdB(0x5)),
            (0xF655, LdDerefIReg(0x6)),
            (0xF865, LdRegDerefI(0x8)),
        ];

        for (w, instr) in cases {
            assert_eq!(Instr::decode(w), Some(instr), "word {w:04X}");
        }
    }

    #[test]
    fn test_decode_unknown() {
        for w in [0x0000, 0x0123, 0x00E1, 0x8008, 0x800F, 0xE000, 0xE0A2, 0xF000, 0xF0FF] {
            assert_eq!(Instr::decode(w), None, "word {w:04X}");
        }
        // 5xy0 is a defined family regardless of the low nibble.
        assert_eq!(Instr::decode(0x5001), Some(Instr::SeReg(0, 0)));
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Instr::Drw(0x1, 0x2, 0x5).to_string(), "DRW V1, V2, 5");
        assert_eq!(Instr::LdI(0x2EA).to_string(), "LD I, 2EA");
        assert_eq!(Instr::LdRegDerefI(0xA).to_string(), "LD VA, [I]");
    }
}
