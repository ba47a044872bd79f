//! Console hardware classification.
//!
//! The classification code distinguishes retail hardware revisions,
//! development boards and emulation targets. It is fixed at detection
//! time, read out of the loader handoff, and never set by application
//! code.

/// Code-space flag carried by every development-class code.
const DEV_FLAG: u32 = 0x1000_0000;

/// Code-space flag carried by the test-kit code.
const TDEV_FLAG: u32 = 0x2000_0000;

/// Closed classification of the hardware or emulation target.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConsoleKind {
    /// Retail hardware, initial revision.
    Retail = 0x0000_0000,
    /// Retail hardware, revision 1.
    Retail1 = 0x0000_0001,
    /// Retail hardware, revision 2.
    Retail2 = 0x0000_0002,
    /// Retail hardware, revision 3.
    Retail3 = 0x0000_0003,
    /// Retail hardware, revision 4.
    Retail4 = 0x0000_0004,
    /// Software emulator.
    Emulator = 0x1000_0000,
    /// PC-hosted emulation target.
    PcEmulator = 0x1000_0001,
    /// "Arthur" development board.
    Arthur = 0x1000_0002,
    /// "Minnow" development board.
    Minnow = 0x1000_0003,
    /// Development hardware, revision 1.
    DevHw1 = 0x1000_0004,
    /// Development hardware, revision 2.
    DevHw2 = 0x1000_0005,
    /// Development hardware, revision 3.
    DevHw3 = 0x1000_0006,
    /// Development hardware, revision 4.
    DevHw4 = 0x1000_0007,
    /// Test devkit.
    TestDevKit = 0x2000_0000,
}

impl ConsoleKind {
    /// Every member of the classification set.
    pub const ALL: [ConsoleKind; 14] = [
        ConsoleKind::Retail,
        ConsoleKind::Retail1,
        ConsoleKind::Retail2,
        ConsoleKind::Retail3,
        ConsoleKind::Retail4,
        ConsoleKind::Emulator,
        ConsoleKind::PcEmulator,
        ConsoleKind::Arthur,
        ConsoleKind::Minnow,
        ConsoleKind::DevHw1,
        ConsoleKind::DevHw2,
        ConsoleKind::DevHw3,
        ConsoleKind::DevHw4,
        ConsoleKind::TestDevKit,
    ];

    /// Classifies a raw code, or `None` for anything outside the set.
    pub const fn from_raw(code: u32) -> Option<Self> {
        match code {
            0x0000_0000 => Some(ConsoleKind::Retail),
            0x0000_0001 => Some(ConsoleKind::Retail1),
            0x0000_0002 => Some(ConsoleKind::Retail2),
            0x0000_0003 => Some(ConsoleKind::Retail3),
            0x0000_0004 => Some(ConsoleKind::Retail4),
            0x1000_0000 => Some(ConsoleKind::Emulator),
            0x1000_0001 => Some(ConsoleKind::PcEmulator),
            0x1000_0002 => Some(ConsoleKind::Arthur),
            0x1000_0003 => Some(ConsoleKind::Minnow),
            0x1000_0004 => Some(ConsoleKind::DevHw1),
            0x1000_0005 => Some(ConsoleKind::DevHw2),
            0x1000_0006 => Some(ConsoleKind::DevHw3),
            0x1000_0007 => Some(ConsoleKind::DevHw4),
            0x2000_0000 => Some(ConsoleKind::TestDevKit),
            _ => None,
        }
    }

    /// Raw classification code.
    #[inline]
    pub const fn to_raw(self) -> u32 {
        self as u32
    }

    /// True for retail hardware of any revision.
    #[inline]
    pub const fn is_retail(self) -> bool {
        self.to_raw() & (DEV_FLAG | TDEV_FLAG) == 0
    }

    /// True for physical development boards (not emulation).
    #[inline]
    pub const fn is_dev_hardware(self) -> bool {
        matches!(
            self,
            ConsoleKind::Arthur
                | ConsoleKind::Minnow
                | ConsoleKind::DevHw1
                | ConsoleKind::DevHw2
                | ConsoleKind::DevHw3
                | ConsoleKind::DevHw4
        )
    }

    /// True for software or PC emulation targets.
    #[inline]
    pub const fn is_emulator(self) -> bool {
        matches!(self, ConsoleKind::Emulator | ConsoleKind::PcEmulator)
    }

    /// True for the test devkit.
    #[inline]
    pub const fn is_test_kit(self) -> bool {
        matches!(self, ConsoleKind::TestDevKit)
    }
}
