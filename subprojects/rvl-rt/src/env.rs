//! Boot-time environment state.
//!
//! The loader hands over a boot block at the base of main memory; the
//! linker provides the stack extents. [`BootParams::parse`] validates
//! that handoff up front, and once bring-up succeeds the resulting
//! facts are published as an immutable process-wide snapshot, queried
//! through the accessor functions below.

mod block;

use rvl_arena::Region;
use spin::Once;

pub use self::block::{BOOT_BLOCK_SIZE, BOOT_MAGIC, BootBlock};
use crate::console::ConsoleKind;

/// Validated loader handoff.
#[derive(Clone, Copy, Debug)]
pub struct BootParams {
    console: ConsoleKind,
    arena_lo: usize,
    arena_hi: usize,
    physical_mem_size: u32,
    stack: Region,
    in_ipl: bool,
}

impl BootParams {
    /// Validates the loader handoff.
    ///
    /// `stack` is the linker-provided extent of the primary execution
    /// stack; `in_ipl` is set when still executing under the initial
    /// program loader rather than a loaded application image.
    pub fn parse(block: &BootBlock, stack: Region, in_ipl: bool) -> Result<Self, BootBlockError> {
        if block.magic != BOOT_MAGIC {
            return Err(BootBlockError::BadMagic { found: block.magic });
        }

        let console = ConsoleKind::from_raw(block.console_code).ok_or(
            BootBlockError::UnknownConsoleCode {
                code: block.console_code,
            },
        )?;

        if block.arena_lo > block.arena_hi {
            return Err(BootBlockError::InvertedArena {
                lo: block.arena_lo,
                hi: block.arena_hi,
            });
        }

        Ok(Self {
            console,
            arena_lo: block.arena_lo as usize,
            arena_hi: block.arena_hi as usize,
            physical_mem_size: block.physical_mem_size,
            stack,
            in_ipl,
        })
    }

    /// Console classification from the handoff.
    #[inline]
    pub fn console(&self) -> ConsoleKind {
        self.console
    }

    /// Initial low fence of the arena.
    #[inline]
    pub fn arena_lo(&self) -> usize {
        self.arena_lo
    }

    /// Initial high fence of the arena.
    #[inline]
    pub fn arena_hi(&self) -> usize {
        self.arena_hi
    }

    /// Physical memory size in bytes.
    #[inline]
    pub fn physical_mem_size(&self) -> u32 {
        self.physical_mem_size
    }

    /// Reserved stack extent.
    #[inline]
    pub fn stack(&self) -> Region {
        self.stack
    }

    /// True when executing under the initial program loader.
    #[inline]
    pub fn in_ipl(&self) -> bool {
        self.in_ipl
    }
}

/// The loader handoff could not be validated.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BootBlockError {
    /// The magic word is wrong; the block was never written.
    #[error("boot block magic mismatch (found {found:#010x})")]
    BadMagic { found: u32 },

    /// The console code is outside the closed classification set.
    #[error("unrecognized console code {code:#010x}")]
    UnknownConsoleCode { code: u32 },

    /// The initial fences are inverted.
    #[error("boot block arena fences inverted (lo {lo:#x} > hi {hi:#x})")]
    InvertedArena { lo: u32, hi: u32 },
}

/// Facts published once bring-up completes.
#[derive(Debug)]
struct EnvState {
    console: ConsoleKind,
    stack: Region,
    in_ipl: bool,
    physical_mem_size: u32,
    start_time: u64,
}

/// Process-wide snapshot, written exactly once on successful bring-up.
static ENV: Once<EnvState> = Once::new();

pub(crate) fn publish(params: &BootParams, start_time: u64) {
    ENV.call_once(|| EnvState {
        console: params.console,
        stack: params.stack,
        in_ipl: params.in_ipl,
        physical_mem_size: params.physical_mem_size,
        start_time,
    });
}

/// True once bring-up has completed and the snapshot is published.
#[inline]
pub fn is_initialized() -> bool {
    ENV.is_completed()
}

/// Console classification, or `None` before bring-up completes.
pub fn console_kind() -> Option<ConsoleKind> {
    ENV.get().map(|env| env.console)
}

/// Time-base value captured when bring-up completed, or `None` before.
pub fn start_time() -> Option<u64> {
    ENV.get().map(|env| env.start_time)
}

/// Lowest address of the reserved stack, or `None` before bring-up.
pub fn stack_addr() -> Option<usize> {
    ENV.get().map(|env| env.stack.start())
}

/// One past the highest address of the reserved stack, or `None`
/// before bring-up.
pub fn stack_end() -> Option<usize> {
    ENV.get().map(|env| env.stack.end())
}

/// Whether the process is running under the initial program loader, or
/// `None` before bring-up.
pub fn in_ipl() -> Option<bool> {
    ENV.get().map(|env| env.in_ipl)
}

/// Physical memory size in bytes, or `None` before bring-up.
pub fn physical_mem_size() -> Option<u32> {
    ENV.get().map(|env| env.physical_mem_size)
}
