//! Result and errors.
use std::fmt::{self, Display, Formatter};

use crate::constants::{Address, PROGRAM_SIZE_MAX};

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug)]
pub enum Chip8Error {
    /// Attempt to load a bytecode program that can't fit in memory.
    LargeProgram { size: usize },
    /// Program image could not be read.
    Io(std::io::Error),
    /// Instruction word has no known opcode family or sub-opcode.
    InvalidOpcode { address: Address, word: u16 },
    /// Subroutine call while all stack slots are in use.
    StackOverflow { address: Address, word: u16 },
    /// Return from subroutine while the stack is empty.
    StackUnderflow { address: Address, word: u16 },
    Fmt(fmt::Error),
}

impl Chip8Error {
    /// Whether this error stopped a running program, as opposed to
    /// preventing it from being loaded.
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            Self::InvalidOpcode { .. } | Self::StackOverflow { .. } | Self::StackUnderflow { .. }
        )
    }
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::LargeProgram { size } => write!(
                f,
                "program failed to load: {size} bytes does not fit in {PROGRAM_SIZE_MAX} bytes of memory"
            ),
            Self::Io(err) => write!(f, "program failed to load: {err}"),
            Self::InvalidOpcode { address, word } => write!(
                f,
                "invalid opcode at address {address:#05X} (word {word:04X})"
            ),
            Self::StackOverflow { address, word } => write!(
                f,
                "call stack overflow at address {address:#05X} (word {word:04X})"
            ),
            Self::StackUnderflow { address, word } => write!(
                f,
                "call stack underflow at address {address:#05X} (word {word:04X})"
            ),
            Self::Fmt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Chip8Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Fmt(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Chip8Error {
    fn from(err: std::io::Error) -> Self {
        Chip8Error::Io(err)
    }
}

impl From<fmt::Error> for Chip8Error {
    fn from(err: fmt::Error) -> Self {
        Chip8Error::Fmt(err)
    }
}
