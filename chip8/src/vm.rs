//! Virtual machine.
use std::{fs, path::Path};

use log::{info, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    bytecode::Instr,
    clock::Hz,
    constants::*,
    cpu::Chip8Cpu,
    devices::KeyCode,
    display::Framebuffer,
    error::{Chip8Error, Chip8Result},
};

pub struct Chip8Vm {
    cpu: Chip8Cpu,
    rng: StdRng,
    conf: Chip8Conf,
}

/// Outcome of executing a single instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Ok,
    /// Program counter has jumped to a new address.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - 00EE (`RET`)
    /// - Bnnn (`JP V0, addr`)
    Jump,
    /// Display buffer was modified.
    Draw,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    KeyWait,
}

/// VM Configuration Parameters.
#[derive(Debug, Default, Clone)]
pub struct Chip8Conf {
    /// Instructions executed per second. `None` or zero selects
    /// [`DEFAULT_CLOCK_FREQUENCY`].
    pub clock_frequency: Option<Hz>,
    /// Seed for the random number instruction. Seeded from the
    /// operating system when `None`.
    pub rng_seed: Option<u64>,
}

impl Chip8Conf {
    /// Effective instruction rate.
    pub fn clock_frequency(&self) -> Hz {
        match self.clock_frequency {
            Some(Hz(0)) | None => Hz(DEFAULT_CLOCK_FREQUENCY),
            Some(freq) => freq,
        }
    }
}

impl Chip8Vm {
    pub fn new(conf: Chip8Conf) -> Self {
        let rng = match conf.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut cpu = Chip8Cpu::new();
        cpu.reset();

        Chip8Vm { cpu, rng, conf }
    }

    /// Configuration that was used to instantiate the VM.
    pub fn config(&self) -> &Chip8Conf {
        &self.conf
    }

    /// Reset the machine and load the program image at [`MEM_START`].
    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        if bytecode.len() > PROGRAM_SIZE_MAX {
            return Err(Chip8Error::LargeProgram {
                size: bytecode.len(),
            });
        }

        // Start with clean memory to avoid leaking previous program.
        self.cpu.reset();

        // Load program into virtual RAM
        self.cpu.ram[MEM_START..MEM_START + bytecode.len()].copy_from_slice(bytecode);

        info!("loaded program of {} bytes", bytecode.len());

        Ok(())
    }

    /// Read a program image from a file, and load it.
    pub fn load_file(&mut self, filepath: impl AsRef<Path>) -> Chip8Result<()> {
        let filepath = filepath.as_ref();
        info!("load rom: {}", filepath.display());

        let bytecode = fs::read(filepath)?;
        self.load_bytecode(&bytecode)
    }

    #[inline]
    pub fn cpu(&self) -> &Chip8Cpu {
        &self.cpu
    }

    #[inline]
    pub fn display(&self) -> &Framebuffer {
        &self.cpu.display
    }
}

/// Interpreter
impl Chip8Vm {
    /// Sets the keyboard key input state.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        self.cpu.set_key_state(key.as_u8(), pressed);
    }

    /// Count down the delay and sound timers by the given number of ticks.
    pub fn tick_timers(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.cpu.tick_timers();
        }
    }

    /// Fetch, decode and execute a single instruction.
    ///
    /// An instruction word that can't be decoded halts the machine. The
    /// program counter is left pointing at the offending instruction.
    pub fn step(&mut self) -> Chip8Result<Flow> {
        let address = self.cpu.pc as Address;
        let word = self.cpu.instr();

        let instr = Instr::decode(word).ok_or(Chip8Error::InvalidOpcode { address, word })?;
        trace!("{address:04X}: {word:04X}  {instr}");

        // Advance before executing, so jumps and calls land exactly on their
        // target and a call pushes the address of the following instruction.
        self.cpu.pc = (self.cpu.pc + 2) & MEM_MASK;

        self.exec(instr).map_err(|err| {
            self.cpu.pc = address as usize;
            err.at(address, word)
        })
    }

    /// Execute up to `step_count` instructions, stopping at the first error.
    pub fn run_steps(&mut self, step_count: usize) -> Chip8Result<Flow> {
        let mut control_flow = Flow::Ok;

        for _ in 0..step_count {
            control_flow = self.step()?;
        }

        Ok(control_flow)
    }

    /// Skip the next instruction when the condition holds.
    #[inline(always)]
    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.cpu.pc = (self.cpu.pc + 2) & MEM_MASK;
        }
    }

    fn exec(&mut self, instr: Instr) -> Result<Flow, Fault> {
        use Instr::*;

        let cpu = &mut self.cpu;
        let v = |r: u8| r as usize;
        let mut control_flow = Flow::Ok;

        match instr {
            // 00E0 (CLS)
            //
            // Clear display
            Cls => {
                cpu.display.clear();
                control_flow = Flow::Draw;
            }
            // 00EE (RET)
            //
            // Return from a subroutine.
            // Set the program counter to the value at the top of the stack.
            Ret => {
                let addr = cpu.pop().ok_or(Fault::StackUnderflow)?;
                cpu.pc = addr as usize;
                control_flow = Flow::Jump;
            }
            // 1NNN (JP addr)
            //
            // Jump to address.
            Jp(nnn) => {
                cpu.pc = nnn as usize;
                control_flow = Flow::Jump;
            }
            // 2NNN (CALL addr)
            //
            // Call subroutine at NNN.
            Call(nnn) => {
                if !cpu.push(cpu.pc as Address) {
                    return Err(Fault::StackOverflow);
                }
                cpu.pc = nnn as usize;
                control_flow = Flow::Jump;
            }
            // 3XNN (SE Vx, byte)
            //
            // Skip the next instruction if register VX equals value NN.
            SeByte(x, nn) => {
                let cond = cpu.registers[v(x)] == nn;
                self.skip_if(cond);
            }
            // 4XNN (SNE Vx, byte)
            //
            // Skip the next instruction if register VX does not equal value NN.
            SneByte(x, nn) => {
                let cond = cpu.registers[v(x)] != nn;
                self.skip_if(cond);
            }
            // 5XY0 (SE Vx, Vy)
            //
            // Skip the next instruction if register VX equals value VY.
            SeReg(x, y) => {
                let cond = cpu.registers[v(x)] == cpu.registers[v(y)];
                self.skip_if(cond);
            }
            // 6XNN (LD Vx, byte)
            //
            // Set register VX to value NN.
            LdByte(x, nn) => {
                cpu.registers[v(x)] = nn;
            }
            // 7xnn (ADD Vx, byte)
            //
            // Add value NN to register VX. Carry flag is not set.
            AddByte(x, nn) => {
                cpu.registers[v(x)] = cpu.registers[v(x)].wrapping_add(nn);
            }
            LdReg(..) | Or(..) | And(..) | Xor(..) | AddReg(..) | Sub(..) | Shr(..)
            | Subn(..) | Shl(..) => self.exec_math(instr),
            // 9xy0 (SNE Vx, Vy)
            //
            // Skip next instruction if Vx != Vy.
            SneReg(x, y) => {
                let cond = cpu.registers[v(x)] != cpu.registers[v(y)];
                self.skip_if(cond);
            }
            // Annn (LD I, addr)
            //
            // Set address register I to value NNN.
            LdI(nnn) => {
                cpu.address = nnn;
            }
            // Bnnn (JP V0, addr)
            //
            // Jump to address NNN plus the value of V0.
            JpV0(nnn) => {
                cpu.pc = (nnn as usize + cpu.registers[0] as usize) & MEM_MASK;
                control_flow = Flow::Jump;
            }
            // CXNN (RND Vx, byte)
            //
            // Generate random number.
            // Set register VX to the result of bitwise AND between a random number and NN.
            Rnd(x, nn) => {
                cpu.registers[v(x)] = nn & self.rng.gen::<u8>();
            }
            // Dxyn (DRW Vx, Vy, nibble)
            //
            // Draw sprite to the display buffer, at coordinate as per registers Vx and Vy.
            // Sprite is encoded as 8 pixels wide, N pixels high, stored in bits located in
            // memory pointed to by address register I.
            //
            // If the drawing operation erases existing pixels in the display buffer, register VF is set to
            // 1, and set to 0 if no display bits are unset. This is used for collision detection.
            Drw(x, y, n) => {
                let (x, y) = (cpu.registers[v(x)] as usize, cpu.registers[v(y)] as usize);
                let addr = cpu.address as usize;

                let mut rows = [0; 0x10];
                for (r, row) in rows.iter_mut().enumerate().take(n as usize) {
                    *row = cpu.read(addr + r);
                }

                let is_erased = cpu.display.draw_sprite(x, y, &rows[..n as usize]);
                cpu.registers[FLAG_REGISTER] = is_erased as u8;
                control_flow = Flow::Draw;
            }
            // Ex9E (SKP Vx)
            //
            // Skip the next instruction if the key with the value of Vx is pressed.
            Skp(x) => {
                let cond = cpu.key_state(cpu.registers[v(x)] & 0xF);
                self.skip_if(cond);
            }
            // ExA1 (SKNP Vx)
            //
            // Skip the next instruction if the key with the value of Vx is not pressed.
            Sknp(x) => {
                let cond = !cpu.key_state(cpu.registers[v(x)] & 0xF);
                self.skip_if(cond);
            }
            LdRegDt(..) | LdKey(..) | LdDtReg(..) | LdSt(..) | AddI(..) | LdF(..) | LdB(..)
            | LdDerefIReg(..) | LdRegDerefI(..) => control_flow = self.exec_misc(instr),
        }

        Ok(control_flow)
    }

    /// Execute an arithmetic instruction
    ///
    /// Operands are read before VF is written, so VF as an operand sees its
    /// old value and the flag always wins over the result.
    fn exec_math(&mut self, instr: Instr) {
        use Instr::*;

        let r = &mut self.cpu.registers;

        match instr {
            // 8XY0 (LD Vx, Vy)
            //
            // Store the value of register VY in register VX.
            LdReg(x, y) => r[x as usize] = r[y as usize],
            // 8XY1 (OR Vx, Vy)
            //
            // Performs bitwise OR on VX and VY, and stores the result in VX.
            Or(x, y) => r[x as usize] |= r[y as usize],
            // 8XY2 (AND Vx, Vy)
            //
            // Performs bitwise AND on VX and VY, and stores the result in VX.
            And(x, y) => r[x as usize] &= r[y as usize],
            // 8XY3 (XOR Vx, Vy)
            //
            // Performs bitwise XOR on VX and VY, and stores the result in VX.
            Xor(x, y) => r[x as usize] ^= r[y as usize],
            // 8XY4 (ADD Vx, Vy)
            //
            // ADDs VX to VY, and stores the result in VX.
            // Overflow is wrapped.
            // If overflow, set VF to 1, else 0.
            AddReg(x, y) => {
                let (result, carry) = r[x as usize].overflowing_add(r[y as usize]);
                r[x as usize] = result;
                r[FLAG_REGISTER] = carry as u8;
            }
            // 8XY5 (SUB Vx, Vy)
            //
            // Subtracts VY from VX, and stores the result in VX.
            // VF is set to 0 when there is a borrow, set to 1 when there isn't.
            Sub(x, y) => {
                let (result, borrow) = r[x as usize].overflowing_sub(r[y as usize]);
                r[x as usize] = result;
                r[FLAG_REGISTER] = !borrow as u8;
            }
            // 8XY6 (SHR Vx)
            //
            // VF is set to the least-significant bit of Vx, then VX is shifted right by 1.
            // VY is unused.
            Shr(x) => {
                let vx = r[x as usize];
                r[x as usize] = vx >> 1;
                r[FLAG_REGISTER] = vx & 1;
            }
            // 8XY7 (SUBN Vx, Vy)
            //
            // Subtracts VX from VY, and stores the result in VX.
            // VF is set to 0 when there is a borrow, set to 1 when there isn't.
            Subn(x, y) => {
                let (result, borrow) = r[y as usize].overflowing_sub(r[x as usize]);
                r[x as usize] = result;
                r[FLAG_REGISTER] = !borrow as u8;
            }
            // 8XYE (SHL Vx)
            //
            // VF is set to the most-significant bit of Vx, then VX is shifted left by 1.
            // VY is unused.
            Shl(x) => {
                let vx = r[x as usize];
                r[x as usize] = vx << 1;
                r[FLAG_REGISTER] = (vx >> 7) & 1;
            }
            _ => unreachable!("{instr} is not an arithmetic instruction"),
        }
    }

    /// Execute a miscellaneous instruction
    #[must_use]
    fn exec_misc(&mut self, instr: Instr) -> Flow {
        use Instr::*;

        let cpu = &mut self.cpu;
        let mut control_flow = Flow::Ok;

        match instr {
            // Fx07 (LD Vx, DT)
            //
            // Set Vx = delay timer value.
            LdRegDt(x) => {
                cpu.registers[x as usize] = cpu.delay_timer;
            }
            // Fx0A (LD Vx, K)
            //
            // Wait for a key press, store the value of the key in Vx.
            // All execution stops until a key is pressed, then the value of that key is stored in Vx.
            LdKey(x) => {
                if let Some(k) = cpu.first_key() {
                    cpu.registers[x as usize] = k;
                } else {
                    // rewind the program counter to stall the machine
                    cpu.pc = cpu.pc.wrapping_sub(2) & MEM_MASK;
                    control_flow = Flow::KeyWait;
                }
            }
            // Fx15 (LD DT, Vx)
            //
            // Set delay timer = Vx.
            LdDtReg(x) => {
                cpu.delay_timer = cpu.registers[x as usize];
            }
            // Fx18 (LD ST, Vx)
            //
            // Set sound timer = Vx.
            LdSt(x) => {
                cpu.sound_timer = cpu.registers[x as usize];
            }
            // Fx1E (ADD I, Vx)
            //
            // Add Vx to I
            AddI(x) => {
                cpu.address = cpu.address.wrapping_add(cpu.registers[x as usize] as u16);
            }
            // Fx29 (LD F, Vx)
            //
            // Set I = location of sprite for digit Vx.
            LdF(x) => {
                let vx = cpu.registers[x as usize] as u16;
                cpu.address = FONTSET_START + vx * FONTSET_HEIGHT as u16;
            }
            // Fx33 (LD B, Vx)
            //
            // Store the binary-coded decimal representation of Vx
            // in the memory locations I, I+1, and I+2.
            #[rustfmt::skip]
            LdB(x) => {
                let addr = cpu.address as usize;
                let vx = cpu.registers[x as usize];
                cpu.write(addr,     vx / 100);
                cpu.write(addr + 1, vx / 10  % 10);
                cpu.write(addr + 2, vx       % 10);
            }
            // Fx55 (LD [I], Vx)
            //
            // Store registers V0 through Vx in memory starting at location I.
            LdDerefIReg(x) => {
                let addr = cpu.address as usize;
                for i in 0..=x as usize {
                    let value = cpu.registers[i];
                    cpu.write(addr + i, value);
                }
            }
            // Fx65 (LD Vx, [I])
            //
            // Read registers V0 through Vx from memory starting at location I.
            LdRegDerefI(x) => {
                let addr = cpu.address as usize;
                for i in 0..=x as usize {
                    cpu.registers[i] = cpu.read(addr + i);
                }
            }
            _ => unreachable!("{instr} is not a miscellaneous instruction"),
        }

        control_flow
    }
}

/// Faults raised while executing a decoded instruction, before the
/// instruction's location is attached.
#[derive(Debug, Clone, Copy)]
enum Fault {
    StackOverflow,
    StackUnderflow,
}

impl Fault {
    fn at(self, address: Address, word: u16) -> Chip8Error {
        match self {
            Self::StackOverflow => Chip8Error::StackOverflow { address, word },
            Self::StackUnderflow => Chip8Error::StackUnderflow { address, word },
        }
    }
}

/// Troubleshooting
impl Chip8Vm {
    /// Returns the contents of the program area as a human readable string.
    pub fn dump_ram(&self, count: usize) -> Chip8Result<String> {
        use std::fmt::Write;

        let mut buf = String::new();
        let end = (MEM_START + count).min(MEM_SIZE);

        for i in (MEM_START..end).step_by(2) {
            writeln!(buf, "{:04X}: {:04X}", i, self.cpu.instr_at(i))?;
        }

        Ok(buf)
    }

    pub fn dump_display(&self) -> Chip8Result<String> {
        Ok(self.cpu.display.dump()?)
    }

    pub fn dump_keys(&self) -> Chip8Result<String> {
        use std::fmt::Write;

        let mut buf = String::new();

        if self.cpu.any_key() {
            write!(buf, "keys: ")?;
            for i in 0..KEY_COUNT {
                if self.cpu.key_state(i) {
                    write!(buf, "k{i:x}")?;
                }
            }
        }

        Ok(buf)
    }
}
