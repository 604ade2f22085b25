//! CPU and memory state.
use crate::{bytecode::word, constants::*, display::Framebuffer};

/// Core state for a chip8 interpreter.
pub struct Chip8Cpu {
    // ------------------------------------------------------------------------
    // Registers
    /// Program counter pointing to the current position in the bytecode.
    pub(crate) pc: usize,
    /// Stack pointer, the number of return addresses on the stack.
    pub(crate) sp: usize,
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag or borrow switch depending on opcode.
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// Pointer register used for temporarily storing an address. Since addresses are 12 bits, only the
    /// lowest (rightmost) bits are used.
    pub(crate) address: Address,
    /// (DT) Delay timer that counts down to 0.
    pub(crate) delay_timer: u8,
    /// (ST) Sound timer that counts down to 0.
    pub(crate) sound_timer: u8,
    /// Keyboard input state. Pressed is a 1 bit, released is a 0 bit.
    pub(crate) key_state: u16,

    // ------------------------------------------------------------------------
    // Memory
    /// Main memory storage space.
    pub(crate) ram: Box<[u8; MEM_SIZE]>,
    /// Stack of return pointers used for jumping when a routine call finishes.
    pub(crate) stack: [Address; STACK_SIZE],
    /// Screen buffer that is drawn too.
    pub(crate) display: Framebuffer,
}

impl Default for Chip8Cpu {
    fn default() -> Self {
        Self {
            pc: MEM_START,
            sp: 0,
            registers: [0; REGISTER_COUNT],
            address: 0,
            delay_timer: 0,
            sound_timer: 0,
            key_state: 0,

            ram: Box::new([0; MEM_SIZE]),
            stack: [0; STACK_SIZE],
            display: Framebuffer::new(),
        }
    }
}

impl Chip8Cpu {
    pub fn new() -> Self {
        Default::default()
    }

    /// Return every register, buffer and input flag to its power-on state,
    /// with the builtin font seeded into low memory.
    pub(crate) fn reset(&mut self) {
        self.pc = MEM_START;
        self.sp = 0;
        self.registers.fill(0);
        self.address = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.key_state = 0;

        self.ram.fill(0);
        self.ram[FONTSET_START as usize..FONTSET_START as usize + FONTSET_DATA_LENGTH]
            .copy_from_slice(&FONTSET);
        self.stack.fill(0);
        self.display.clear();
    }

    #[inline]
    pub fn pc(&self) -> usize {
        self.pc
    }

    #[inline]
    pub fn sp(&self) -> usize {
        self.sp
    }

    #[inline]
    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.registers
    }

    #[inline]
    pub fn address(&self) -> Address {
        self.address
    }

    #[inline]
    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    #[inline]
    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    #[inline]
    pub fn ram(&self) -> &[u8; MEM_SIZE] {
        &self.ram
    }

    #[inline]
    pub fn display(&self) -> &Framebuffer {
        &self.display
    }

    /// Read a byte of memory, wrapping the address to the memory size.
    #[inline(always)]
    pub fn read(&self, addr: usize) -> u8 {
        self.ram[addr & MEM_MASK]
    }

    /// Write a byte of memory, wrapping the address to the memory size.
    #[inline(always)]
    pub fn write(&mut self, addr: usize, value: u8) {
        self.ram[addr & MEM_MASK] = value;
    }

    /// Extract the instruction word at the current program counter.
    #[inline(always)]
    pub fn instr(&self) -> u16 {
        self.instr_at(self.pc)
    }

    /// Extract the instruction word stored at the given address.
    #[inline(always)]
    pub fn instr_at(&self, addr: usize) -> u16 {
        word(self.read(addr), self.read(addr + 1))
    }

    /// Push a return address onto the call stack.
    ///
    /// Returns `false` without modifying the stack when it is full.
    #[must_use]
    pub(crate) fn push(&mut self, addr: Address) -> bool {
        if self.sp >= STACK_SIZE {
            return false;
        }
        self.stack[self.sp] = addr;
        self.sp += 1;
        true
    }

    /// Pop the most recent return address off the call stack.
    #[must_use]
    pub(crate) fn pop(&mut self) -> Option<Address> {
        let sp = self.sp.checked_sub(1)?;
        self.sp = sp;
        Some(self.stack[sp])
    }

    pub fn set_key_state(&mut self, key_id: u8, state: bool) {
        if key_id < KEY_COUNT {
            if state {
                self.key_state |= 1 << key_id;
            } else {
                self.key_state &= !(1 << key_id);
            }
        }
    }

    pub fn key_state(&self, key_id: u8) -> bool {
        if key_id < KEY_COUNT {
            self.key_state & (1 << key_id) > 0
        } else {
            false
        }
    }

    /// Check whether any key is pressed down.
    #[inline(always)]
    pub fn any_key(&self) -> bool {
        self.key_state > 0
    }

    /// Retrieve the value of the lowest key that is pressed down.
    #[inline]
    pub fn first_key(&self) -> Option<u8> {
        if self.any_key() {
            Some(self.key_state.trailing_zeros() as u8)
        } else {
            None
        }
    }

    /// Count down both timers, stopping at zero.
    #[inline]
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut cpu = Chip8Cpu::default();

        cpu.set_key_state(0, true);
        assert_eq!(cpu.key_state, 0b00000000_00000001);
        assert!(cpu.key_state(0));
        assert!(!cpu.key_state(1));
        assert!(!cpu.key_state(7));

        cpu.set_key_state(7, true);
        assert_eq!(cpu.key_state, 0b00000000_10000001);
        assert!(cpu.key_state(0));
        assert!(!cpu.key_state(1));
        assert!(cpu.key_state(7));

        cpu.set_key_state(0, false);
        assert_eq!(cpu.key_state, 0b00000000_10000000);
        assert!(!cpu.key_state(0));
        assert!(!cpu.key_state(1));
        assert!(cpu.key_state(7));

        cpu.set_key_state(15, true);
        assert_eq!(cpu.key_state, 0b10000000_10000000);
        assert!(!cpu.key_state(0));
        assert!(!cpu.key_state(1));
        assert!(cpu.key_state(7));
        assert!(cpu.key_state(15));

        // out of range keys are ignored
        cpu.set_key_state(16, true);
        assert_eq!(cpu.key_state, 0b10000000_10000000);
        assert!(!cpu.key_state(16));
    }

    #[test]
    fn test_first_key_is_lowest() {
        let mut cpu = Chip8Cpu::default();
        assert_eq!(cpu.first_key(), None);

        cpu.set_key_state(0xC, true);
        cpu.set_key_state(0x3, true);
        assert_eq!(cpu.first_key(), Some(0x3));

        cpu.set_key_state(0x3, false);
        assert_eq!(cpu.first_key(), Some(0xC));
        cpu.set_key_state(0xC, false);
        assert!(!cpu.any_key());
    }

    #[test]
    fn test_stack_limits() {
        let mut cpu = Chip8Cpu::default();
        assert_eq!(cpu.pop(), None);

        for i in 0..STACK_SIZE {
            assert!(cpu.push(0x200 + i as u16 * 2));
        }
        assert_eq!(cpu.sp, STACK_SIZE);
        assert!(!cpu.push(0xFFF));
        assert_eq!(cpu.sp, STACK_SIZE);

        assert_eq!(cpu.pop(), Some(0x200 + (STACK_SIZE as u16 - 1) * 2));
        assert_eq!(cpu.sp, STACK_SIZE - 1);
    }

    #[test]
    fn test_timers_floor_at_zero() {
        let mut cpu = Chip8Cpu::default();
        cpu.delay_timer = 1;
        cpu.sound_timer = 3;
        cpu.tick_timers();
        cpu.tick_timers();
        assert_eq!(cpu.delay_timer, 0);
        assert_eq!(cpu.sound_timer, 1);
    }

    #[test]
    fn test_reset_seeds_font() {
        let mut cpu = Chip8Cpu::default();
        cpu.ram[0x300] = 0xAB;
        cpu.registers[3] = 9;
        cpu.reset();

        assert_eq!(&cpu.ram[..FONTSET_DATA_LENGTH], &FONTSET[..]);
        assert_eq!(cpu.ram[0x300], 0);
        assert_eq!(cpu.registers[3], 0);
        assert_eq!(cpu.pc, MEM_START);
    }

    #[test]
    fn test_memory_wraps() {
        let mut cpu = Chip8Cpu::default();
        cpu.write(MEM_SIZE + 1, 0x42);
        assert_eq!(cpu.ram[1], 0x42);
        assert_eq!(cpu.read(1), 0x42);
    }
}
