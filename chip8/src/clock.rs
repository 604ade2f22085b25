//! CPU Clock.
use std::time::{Duration, Instant};

use crate::constants::*;

/// CPU clock frequency, in hertz (per second)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Hz(pub u64);

impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(NANOS_IN_SECOND / freq.0)
        }
    }
}

/// Monotonic time, and a way to let it pass.
///
/// The clock is generic over its time source so tests can simulate
/// elapsed time without sleeping.
pub trait TimeSource {
    /// Time elapsed since an arbitrary, fixed starting point.
    fn now(&self) -> Duration;

    /// Block until the given duration has passed.
    fn sleep(&mut self, duration: Duration);
}

/// Wall clock time of the host.
pub struct RealTime(Instant);

impl Default for RealTime {
    fn default() -> Self {
        Self(Instant::now())
    }
}

impl TimeSource for RealTime {
    fn now(&self) -> Duration {
        self.0.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        // Thread sleep does not have enough resolution for cycles of a few
        // milliseconds, and would cause the CPU to run slow.
        spin_sleep::sleep(duration);
    }
}

/// Simulated time that only moves when slept on, or advanced explicitly.
#[derive(Debug, Default, Clone)]
pub struct ManualTime {
    now: Duration,
}

impl ManualTime {
    pub fn new() -> Self {
        Default::default()
    }

    /// Let time pass without a sleep, as if an instruction took this long to execute.
    pub fn advance(&mut self, duration: Duration) {
        self.now += duration;
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.now += duration;
    }
}

/// Scheduler that paces instruction cycles and counts the fixed rate timer ticks.
///
/// Every instruction cycle sleeps for its full time budget. All real time
/// passed since the previous cycle ended is added to an accumulator, which
/// covers the instruction itself and whatever the caller did in between,
/// like drawing. Each whole tick period in the accumulator is one timer tick.
/// When a cycle is slower than a tick, the clock catches up by reporting
/// several ticks at once instead of drifting.
pub struct Clock<T = RealTime> {
    time: T,
    /// Time budget of a single instruction cycle.
    interval: Duration,
    /// Time up to which real time has been accounted for.
    last: Duration,
    /// Nanoseconds elapsed since the last timer tick.
    elapsed: u64,
}

impl Clock<RealTime> {
    /// Creates a new clock running on the host's wall clock.
    pub fn new(freq: Hz) -> Self {
        Self::with_time_source(freq, RealTime::default())
    }
}

impl<T: TimeSource> Clock<T> {
    pub fn with_time_source(freq: Hz, time: T) -> Self {
        let last = time.now();
        Self {
            time,
            interval: freq.into(),
            last,
            elapsed: 0,
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[inline]
    pub fn time_source(&self) -> &T {
        &self.time
    }

    #[inline]
    pub fn time_source_mut(&mut self) -> &mut T {
        &mut self.time
    }

    /// Set the clock state back to zero.
    pub fn reset(&mut self) {
        self.last = self.time.now();
        self.elapsed = 0;
    }

    /// Block for the cycle's time budget, then account for the time passed
    /// since the previous call.
    ///
    /// Returns the number of timer ticks that are due.
    pub fn end_cycle(&mut self) -> u32 {
        self.time.sleep(self.interval);

        let now = self.time.now();
        self.elapsed += now.saturating_sub(self.last).as_nanos() as u64;
        self.last = now;

        let mut ticks = 0;
        while self.elapsed > CLOCK_CYCLE_TIME {
            self.elapsed -= CLOCK_CYCLE_TIME;
            ticks += 1;
        }
        ticks
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clock_hz() {
        let interval: Duration = Hz(60).into();
        assert_eq!(interval.as_millis(), 16);

        let interval: Duration = Hz(500).into();
        assert_eq!(interval, Duration::from_millis(2));
    }

    #[test]
    fn test_sixty_ticks_per_second() {
        let mut clock = Clock::with_time_source(Hz(500), ManualTime::new());

        let mut ticks = 0;
        for _ in 0..500 {
            ticks += clock.end_cycle();
        }

        assert_eq!(clock.time_source().now(), Duration::from_secs(1));
        assert_eq!(ticks, 60);
    }

    #[test]
    fn test_tick_rate_independent_of_cycle_rate() {
        for freq in [60, 120, 700, 1000] {
            let mut clock = Clock::with_time_source(Hz(freq), ManualTime::new());
            let ticks: u32 = (0..freq)
                .map(|_| clock.end_cycle())
                .sum();
            assert!((59..=60).contains(&ticks), "{freq} Hz gave {ticks} ticks");
        }
    }

    #[test]
    fn test_slow_cycle_catches_up() {
        let mut clock = Clock::with_time_source(Hz(500), ManualTime::new());

        // Instruction stalled for a tenth of a second.
        clock.time_source_mut().advance(Duration::from_millis(100));
        let ticks = clock.end_cycle();

        // 102ms covers six whole ticks of 16.6ms
        assert_eq!(ticks, 6);
    }

    #[test]
    fn test_reset_discards_accumulated_time() {
        let mut clock = Clock::with_time_source(Hz(100), ManualTime::new());
        clock.time_source_mut().advance(Duration::from_millis(5));
        clock.end_cycle();
        clock.reset();
        assert_eq!(clock.elapsed, 0);
        assert_eq!(clock.last, clock.time_source().now());
    }

    #[test]
    fn test_time_between_cycles_is_counted() {
        let mut clock = Clock::with_time_source(Hz(500), ManualTime::new());

        let mut ticks = 0;
        for _ in 0..100 {
            ticks += clock.end_cycle();
            // caller spends 10ms presenting a frame
            clock.time_source_mut().advance(Duration::from_millis(10));
        }
        ticks += clock.end_cycle();

        // 101 sleeps of 2ms plus 100 frames of 10ms
        assert_eq!(clock.time_source().now(), Duration::from_millis(1202));
        assert_eq!(ticks, 72);
    }
}
