//! Process-wide arena store.
//!
//! The platform bootstrap seeds the store once, before the bring-up
//! sequence runs; from then on any subsystem may claim a range by
//! moving a fence. Every accessor locks internally, so fence mutation
//! is a critical section without the callers having to arrange one.

use spin::{Mutex, Once};

use crate::{Arena, FenceError};

/// Global arena, seeded once by the platform bootstrap.
static ARENA: Once<Mutex<Arena>> = Once::new();

/// Seeds the process-wide store.
///
/// Only the first call takes effect; the fences of a seeded store are
/// only ever moved through the setters below.
pub fn init(arena: Arena) {
    ARENA.call_once(|| Mutex::new(arena));
}

/// True once the store has been seeded.
#[inline]
pub fn is_initialized() -> bool {
    ARENA.get().is_some()
}

fn store() -> &'static Mutex<Arena> {
    ARENA.get().expect("arena store not initialized")
}

/// Current low fence.
///
/// # Panics
///
/// Panics if the store has not been seeded.
pub fn lo() -> usize {
    store().lock().lo()
}

/// Current high fence.
///
/// # Panics
///
/// Panics if the store has not been seeded.
pub fn hi() -> usize {
    store().lock().hi()
}

/// Relocates the low fence, unconditionally. See [`Arena::set_lo`].
pub fn set_lo(addr: usize) {
    store().lock().set_lo(addr);
}

/// Relocates the high fence, unconditionally. See [`Arena::set_hi`].
pub fn set_hi(addr: usize) {
    store().lock().set_hi(addr);
}

/// Relocates the low fence with validation. See [`Arena::try_set_lo`].
pub fn try_set_lo(addr: usize) -> Result<(), FenceError> {
    store().lock().try_set_lo(addr)
}

/// Relocates the high fence with validation. See [`Arena::try_set_hi`].
pub fn try_set_hi(addr: usize) -> Result<(), FenceError> {
    store().lock().try_set_hi(addr)
}
