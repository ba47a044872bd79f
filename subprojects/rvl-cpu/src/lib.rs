//! Broadway processor support.

#![no_std]

pub mod counter;

pub use counter::{TIMER_CLOCK_HZ, system_tick};
