//! Run loop composing the interpreter, clock and IO devices.
use std::fmt;

use log::{debug, error, info};

use crate::{
    clock::{Clock, RealTime, TimeSource},
    devices::{Display, Input},
    error::Chip8Error,
    vm::Chip8Vm,
};

/// Reason a session ended.
#[derive(Debug)]
pub enum Status {
    /// The input device signalled quit.
    Quit,
    /// The interpreter halted on an instruction it could not execute.
    Halted(Chip8Error),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quit => write!(f, "terminated by user request"),
            Self::Halted(err) => write!(f, "{err}"),
        }
    }
}

/// Drives one program execution.
///
/// Each iteration polls input into the keypad, executes one instruction,
/// paces the cycle and counts down the timers, then hands the display
/// buffer to the display device.
pub struct Runner<T = RealTime> {
    vm: Chip8Vm,
    clock: Clock<T>,
    cycles: u64,
}

impl Runner<RealTime> {
    pub fn new(vm: Chip8Vm) -> Self {
        Self::with_time_source(vm, RealTime::default())
    }
}

impl<T: TimeSource> Runner<T> {
    pub fn with_time_source(vm: Chip8Vm, time: T) -> Self {
        let freq = vm.config().clock_frequency();
        info!("clock frequency: {} Hz", freq.0);

        Self {
            vm,
            clock: Clock::with_time_source(freq, time),
            cycles: 0,
        }
    }

    #[inline]
    pub fn vm(&self) -> &Chip8Vm {
        &self.vm
    }

    #[inline]
    pub fn vm_mut(&mut self) -> &mut Chip8Vm {
        &mut self.vm
    }

    #[inline]
    pub fn clock(&self) -> &Clock<T> {
        &self.clock
    }

    /// Number of instructions executed so far.
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Restart time keeping, so time spent before the first cycle is not
    /// counted towards the timers.
    pub fn reset_clock(&mut self) {
        self.clock.reset();
    }

    /// Run a single iteration of the loop.
    ///
    /// Returns `Some` when the session has ended.
    pub fn run_once<I, D>(&mut self, input: &mut I, display: &mut D) -> Option<Status>
    where
        I: Input + ?Sized,
        D: Display + ?Sized,
    {
        let poll = input.poll();
        for event in poll.events {
            self.vm.set_key(event.key, event.pressed);
        }
        if poll.quit {
            info!("quit requested after {} cycles", self.cycles);
            self.log_final_state();
            return Some(Status::Quit);
        }

        if let Err(err) = self.vm.step() {
            error!("{err}");
            self.log_final_state();
            return Some(Status::Halted(err));
        }
        self.cycles += 1;

        let ticks = self.clock.end_cycle();
        self.vm.tick_timers(ticks);

        display.draw(self.vm.display());

        None
    }

    /// Run until the input device quits or the interpreter halts.
    pub fn run<I, D>(&mut self, input: &mut I, display: &mut D) -> Status
    where
        I: Input + ?Sized,
        D: Display + ?Sized,
    {
        self.reset_clock();

        loop {
            if let Some(status) = self.run_once(input, display) {
                return status;
            }
        }
    }

    fn log_final_state(&self) {
        if log::max_level() < log::Level::Debug {
            return;
        }
        if let Ok(dump) = self.vm.dump_display() {
            debug!("final display:\n{dump}");
        }
        match self.vm.dump_keys() {
            Ok(keys) if !keys.is_empty() => debug!("{keys}"),
            _ => {}
        }
    }
}
