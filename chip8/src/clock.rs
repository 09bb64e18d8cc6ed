//! CPU Clock.
use std::{
    thread,
    time::{Duration, Instant},
};

/// Timer to synchronize thread with the software clock of the virtual CPU.
///
/// It is designed to work with the yielding cooperative pattern
/// of the interpreter loop. When the VM yields control back to the
/// caller, time elapses until it is resumed. Once the interpreter
/// is resumed, the elapsed time is taken into account when determining
/// the next cycle.
/// Upper bound of cycles reported by a single [`Clock::tick`].
///
/// Enough to run an 8-bit timer down from its maximum.
const MAX_CATCH_UP: u32 = u8::MAX as u32;

pub(crate) struct Clock {
    start: Instant,
    interval: Duration,
}

impl Clock {
    /// Creates a new clock with the current time as internal state.
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            start: Instant::now(),
            interval,
        }
    }

    /// Set the clock state back to zero.
    pub(crate) fn reset(&mut self) {
        self.start = Instant::now()
    }

    /// A clock with a zero interval never blocks.
    #[inline]
    pub(crate) fn is_unbounded(&self) -> bool {
        self.interval.is_zero()
    }

    /// Number of whole cycles elapsed since the last tick.
    ///
    /// The start of the current cycle moves forward by exactly that many
    /// intervals, so the fraction of a cycle left over carries into the
    /// next call. An unbounded clock counts one cycle per call.
    ///
    /// Does not block.
    pub(crate) fn tick(&mut self) -> u32 {
        if self.is_unbounded() {
            return 1;
        }

        let cycles = self.start.elapsed().as_nanos() / self.interval.as_nanos();

        if cycles > MAX_CATCH_UP as u128 {
            // Paused for a long time. Drop the backlog instead of
            // replaying it.
            self.reset();
            return MAX_CATCH_UP;
        }

        let cycles = cycles as u32;
        self.start += self.interval * cycles;
        cycles
    }

    /// Block the current thread until the next clock cycle.
    pub(crate) fn wait(&mut self) {
        if self.is_unbounded() {
            return;
        }

        loop {
            if self.start.elapsed() < self.interval {
                // Sleep does not have enough resolution, and causes
                // the clock to run at 30 FPS.
                //
                // Spinning a loop causes high CPU usage and fan madness.
                //
                // Yielding in a loop is the best alternative.
                thread::yield_now();
            } else {
                // Reset back to zero, rather than trying to catch up.
                //
                // If the VM was paused for debugging, and a large
                // amount of time has elapsed until it is resumed,
                // it should simply continue at the next cycle running
                // at its usual speed.
                self.reset();
                return;
            }
        }
    }
}
