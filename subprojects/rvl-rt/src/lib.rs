//! # Runtime bring-up
//!
//! This crate provides the one-time bring-up of the processor-adjacent
//! subsystems for Revolution-class targets, plus the boot-time facts
//! published once bring-up completes: console classification, stack
//! extents, boot-loader flag and the start-time reference.
//!
//! [`init`] runs on the sole startup thread before any application
//! logic; the subsystem initializers themselves live behind the
//! [`Platform`] port.

#![no_std]

pub mod boot;
pub mod console;
pub mod env;

pub use boot::{
    BootError, BootSequencer, BootStep, EmulatedPlatform, InitError, Platform, StepError, init,
    shutdown,
};
pub use console::ConsoleKind;
pub use env::{
    BOOT_MAGIC, BootBlock, BootBlockError, BootParams, console_kind, in_ipl, is_initialized,
    physical_mem_size, stack_addr, stack_end, start_time,
};
