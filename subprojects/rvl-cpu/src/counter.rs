//! Time-base counter access.
//!
//! This module provides functions for reading the processor's 64-bit
//! time base and converting between ticks and wall-clock units.
//!
//! ## References
//! - IBM PowerPC 750CL user's manual, §2.1.1 (Time Base facility)

#[cfg(not(target_arch = "powerpc"))]
use core::sync::atomic::{AtomicU64, Ordering};

/// Time-base increment frequency, in Hz.
///
/// The time base advances at one quarter of the 243 MHz bus clock.
pub const TIMER_CLOCK_HZ: u64 = 60_750_000;

/// Gets the current value of the time base.
///
/// The time base is split across the `TBU`/`TBL` register pair; the upper
/// word is read twice and the sample is retaken if the lower word carried
/// between the reads.
///
/// Returns the current 64-bit tick count.
#[cfg(target_arch = "powerpc")]
#[inline]
pub fn system_tick() -> u64 {
    use core::arch::asm;

    loop {
        let upper: u32;
        let lower: u32;
        let check: u32;
        unsafe {
            asm!(
                "mftbu {0}",            // Time base upper
                "mftb {1}",             // Time base lower
                "mftbu {2}",            // Upper again, to detect a carry
                out(reg) upper,
                out(reg) lower,
                out(reg) check,
                options(nomem, nostack),
            );
        }
        if upper == check {
            return ((upper as u64) << 32) | lower as u64;
        }
    }
}

/// Tick source for targets without a Broadway time base.
///
/// PC-emulation builds have no `TBU`/`TBL` pair to read, so the counter
/// is a process-global value that advances on every read. Strictly
/// monotonic, which is the only property boot-time consumers rely on.
#[cfg(not(target_arch = "powerpc"))]
static EMULATED_TICK: AtomicU64 = AtomicU64::new(0);

/// Gets the current value of the emulated time base.
///
/// See [`EMULATED_TICK`]; strictly increasing across calls.
#[cfg(not(target_arch = "powerpc"))]
#[inline]
pub fn system_tick() -> u64 {
    EMULATED_TICK.fetch_add(1, Ordering::Relaxed) + 1
}

/// Converts from time-base ticks to nanoseconds.
///
/// Uses the exact 4000/243 ratio of the 60.75 MHz timer clock.
#[inline]
pub fn ticks_to_ns(ticks: u64) -> u64 {
    (ticks * 4000) / 243
}

/// Converts time from nanoseconds to time-base ticks.
#[inline]
pub fn ns_to_ticks(ns: u64) -> u64 {
    (ns * 243) / 4000
}

/// Converts from time-base ticks to milliseconds.
#[inline]
pub fn ticks_to_ms(ticks: u64) -> u64 {
    (ticks * 1000) / TIMER_CLOCK_HZ
}

/// Converts time from whole seconds to time-base ticks.
#[inline]
pub fn secs_to_ticks(secs: u64) -> u64 {
    secs * TIMER_CLOCK_HZ
}
