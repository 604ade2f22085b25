mod bytecode;
mod clock;
pub mod constants;
mod cpu;
mod devices;
mod disasm;
mod display;
mod error;
mod run;
mod vm;

pub use self::{
    bytecode::Instr,
    clock::{Clock, Hz, ManualTime, RealTime, TimeSource},
    devices::{Display, Input, InvalidKeyCode, KeyCode, KeyEvent, Poll},
    display::Framebuffer,
    error::{Chip8Error, Chip8Result},
};

/// Version of this implementation, reported by front ends.
pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        cpu::Chip8Cpu,
        disasm::Disassembler,
        error::{Chip8Error, Chip8Result},
        run::{Runner, Status},
        vm::{Chip8Conf, Chip8Vm, Flow},
    };
}
