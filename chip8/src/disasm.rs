//! Disassembler.
use std::fmt::{self, Write as FmtWrite};

use crate::{
    bytecode::{word, Instr},
    constants::MEM_START,
};

pub struct Disassembler<'a> {
    bytecode: &'a [u8],
    cursor: usize,
}

impl<'a> Disassembler<'a> {
    pub fn new(bytecode: &'a [u8]) -> Self {
        Self {
            bytecode,
            cursor: 0,
        }
    }

    /// Disassemble the whole program into a listing, one instruction per line.
    ///
    /// Addresses are where the program is loaded in memory.
    pub fn listing(&mut self) -> Result<String, fmt::Error> {
        let mut s = String::new();
        self.cursor = 0;

        while self.cursor < self.bytecode.len() {
            self.disassemble(&mut s)?;
            self.cursor += 2;
        }
        self.cursor = 0;

        Ok(s)
    }

    /// Write the instruction under the cursor to the given writer.
    ///
    /// Writes nothing when the cursor is past the end of the program.
    pub fn disassemble<W: FmtWrite>(&self, w: &mut W) -> fmt::Result {
        let address = MEM_START + self.cursor;

        let Some(&a) = self.bytecode.get(self.cursor) else {
            return Ok(());
        };
        // A trailing odd byte is padded, like the zeroed memory following it.
        let b = self.bytecode.get(self.cursor + 1).copied().unwrap_or(0);
        let word = word(a, b);

        match Instr::decode(word) {
            Some(instr) => writeln!(w, "{address:04X}: {word:04X}  {instr}"),
            // Data such as sprites is often mixed in with the code.
            None => writeln!(w, "{address:04X}: {word:04X}  ???"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    #[rustfmt::skip]
    fn test_listing() {
        let rom = [
            0xA2, 0x06, // LD I, 206
            0xD0, 0x15, // DRW V0, V1, 5
            0x12, 0x04, // JP 204
            0xF0,       // sprite data, odd length
        ];
        let listing = Disassembler::new(&rom).listing().unwrap();
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(
            lines,
            [
                "0200: A206  LD I, 206",
                "0202: D015  DRW V0, V1, 5",
                "0204: 1204  JP 204",
                "0206: F000  ???",
            ]
        );
    }

    #[test]
    fn test_empty_program() {
        let mut disasm = Disassembler::new(&[]);
        assert_eq!(disasm.listing().unwrap(), "");

        let mut s = String::new();
        disasm.disassemble(&mut s).unwrap();
        assert!(s.is_empty());
    }
}
