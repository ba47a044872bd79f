//! Subsystem bring-up sequencing.
//!
//! Bring-up is a fixed dependency order over the processor-adjacent
//! subsystems, run exactly once on the sole startup thread. The order
//! is data ([`BootStep::SEQUENCE`]) driving a dispatch over the
//! [`Platform`] port, so the sequencing is exercisable without live
//! hardware behind it. Each step manipulates processor or device state
//! directly and is synchronous by construction; there is nothing to
//! suspend on during bring-up.
//!
//! Failure at any step is fatal. Partially initialized hardware is
//! undefined state, so the sequencer stops at the failing step, reports
//! it, and leaves the runtime un-booted for the embedder to halt on.

use core::fmt;

use rvl_arena::{Arena, Region};
use spin::Mutex;

use crate::env::{self, BootBlock, BootBlockError, BootParams};

/// One named step of the bring-up sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootStep {
    /// Floating-point and processor execution state.
    Fpu,
    /// Instruction/data cache coherency.
    Cache,
    /// Execution-context record used for context switches and
    /// exception handling.
    Context,
    /// Interrupt vector installation.
    Interrupts,
    /// Trap/system-call dispatch.
    Syscall,
    /// Dynamic module linkage bookkeeping.
    Modules,
    /// Audio transfer engine start.
    Audio,
    /// Memory protection over the final layout.
    MemProtect,
}

impl BootStep {
    /// The fixed bring-up order.
    ///
    /// Each step's postcondition is the next step's precondition:
    /// caches must be coherent before code is installed, a context
    /// record must exist before interrupt handlers can save into one,
    /// interrupts must be structurally ready before the trap path is
    /// wired, the arena must be available before module bookkeeping
    /// reserves from it, and memory protection runs last so it is
    /// computed over the final layout.
    pub const SEQUENCE: [BootStep; 8] = [
        BootStep::Fpu,
        BootStep::Cache,
        BootStep::Context,
        BootStep::Interrupts,
        BootStep::Syscall,
        BootStep::Modules,
        BootStep::Audio,
        BootStep::MemProtect,
    ];

    /// Human-readable step name, used when reporting a failed step.
    pub const fn name(self) -> &'static str {
        match self {
            BootStep::Fpu => "floating-point state",
            BootStep::Cache => "cache",
            BootStep::Context => "execution context",
            BootStep::Interrupts => "interrupts",
            BootStep::Syscall => "system-call dispatch",
            BootStep::Modules => "module loader",
            BootStep::Audio => "audio system",
            BootStep::MemProtect => "memory protection",
        }
    }
}

impl fmt::Display for BootStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure reported by a subsystem initializer.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct StepError {
    /// Subsystem-reported description of the failure.
    pub reason: &'static str,
}

impl StepError {
    /// Creates a step failure with the given description.
    pub const fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Port to the hardware-facing subsystem initializers.
///
/// The collaborators behind these hooks (cache controller, interrupt
/// controller, audio engine, …) live outside this crate; the sequencer
/// only fixes *when* each one runs.
pub trait Platform {
    /// Establishes the floating-point and processor execution mode the
    /// rest of bring-up assumes.
    fn init_fpu(&mut self) -> Result<(), StepError>;

    /// Brings the instruction and data caches to a known, coherent
    /// state.
    fn init_cache(&mut self) -> Result<(), StepError>;

    /// Establishes the execution-context record used for context
    /// switches and exception handling.
    fn init_context(&mut self) -> Result<(), StepError>;

    /// Installs interrupt vector handling.
    fn init_interrupts(&mut self) -> Result<(), StepError>;

    /// Wires the trap/system-call dispatch path.
    fn install_syscalls(&mut self) -> Result<(), StepError>;

    /// Prepares dynamic-linkage bookkeeping for loadable modules; may
    /// reserve arena space for module metadata.
    fn init_modules(&mut self) -> Result<(), StepError>;

    /// Starts the audio transfer engine.
    fn start_audio(&mut self) -> Result<(), StepError>;

    /// Stops the audio transfer engine; the pair to
    /// [`Platform::start_audio`], used during controlled shutdown or
    /// restart.
    fn stop_audio(&mut self);

    /// Applies memory protection over the final memory layout.
    fn protect_memory(&mut self) -> Result<(), StepError>;
}

/// [`Platform`] for PC-emulation targets: every subsystem hook succeeds
/// without touching hardware.
#[derive(Debug, Default)]
pub struct EmulatedPlatform;

impl Platform for EmulatedPlatform {
    fn init_fpu(&mut self) -> Result<(), StepError> {
        Ok(())
    }

    fn init_cache(&mut self) -> Result<(), StepError> {
        Ok(())
    }

    fn init_context(&mut self) -> Result<(), StepError> {
        Ok(())
    }

    fn init_interrupts(&mut self) -> Result<(), StepError> {
        Ok(())
    }

    fn install_syscalls(&mut self) -> Result<(), StepError> {
        Ok(())
    }

    fn init_modules(&mut self) -> Result<(), StepError> {
        Ok(())
    }

    fn start_audio(&mut self) -> Result<(), StepError> {
        Ok(())
    }

    fn stop_audio(&mut self) {}

    fn protect_memory(&mut self) -> Result<(), StepError> {
        Ok(())
    }
}

/// Bring-up failed at the named step.
///
/// Steps after the failing one never ran.
#[derive(Debug, thiserror::Error)]
#[error("{step} initialization failed")]
pub struct BootError {
    /// The step that could not complete.
    pub step: BootStep,
    /// What the subsystem reported.
    #[source]
    pub source: StepError,
}

/// Linear bring-up state machine: `Cold` until every step of
/// [`BootStep::SEQUENCE`] has completed, then terminally `Booted`.
#[derive(Debug)]
pub struct BootSequencer {
    state: State,
}

#[derive(Debug)]
enum State {
    Cold,
    Booted { start_time: u64 },
}

impl BootSequencer {
    /// Creates a cold sequencer.
    pub const fn new() -> Self {
        Self { state: State::Cold }
    }

    /// True once bring-up has completed.
    #[inline]
    pub fn is_booted(&self) -> bool {
        matches!(self.state, State::Booted { .. })
    }

    /// Time-base value captured when bring-up completed, or `None`
    /// while cold.
    pub fn start_time(&self) -> Option<u64> {
        match self.state {
            State::Booted { start_time } => Some(start_time),
            State::Cold => None,
        }
    }

    /// Runs the bring-up sequence and returns the start-time reference.
    ///
    /// Calling on an already-booted sequencer is a no-op returning the
    /// recorded start time. A failed step leaves the sequencer cold;
    /// nothing after the failing step runs.
    ///
    /// With `in_ipl` set the audio step is skipped: interrupt-driven
    /// transfer DMA is not safe before an application image owns the
    /// machine.
    pub fn boot<P: Platform>(&mut self, platform: &mut P, in_ipl: bool) -> Result<u64, BootError> {
        if let State::Booted { start_time } = self.state {
            return Ok(start_time);
        }

        for step in BootStep::SEQUENCE {
            if step == BootStep::Audio && in_ipl {
                log::debug!("boot: {step} skipped under the boot loader");
                continue;
            }
            run_step(platform, step).map_err(|source| BootError { step, source })?;
            log::debug!("boot: {step} ready");
        }

        let start_time = rvl_cpu::system_tick();
        self.state = State::Booted { start_time };
        Ok(start_time)
    }

    /// Stops the audio engine on the way into a controlled shutdown or
    /// restart.
    ///
    /// No-op while cold. The booted state itself is terminal; a
    /// restart goes back through the loader, not through this
    /// sequencer.
    pub fn shutdown<P: Platform>(&mut self, platform: &mut P) {
        if self.is_booted() {
            platform.stop_audio();
        }
    }
}

impl Default for BootSequencer {
    fn default() -> Self {
        Self::new()
    }
}

fn run_step<P: Platform>(platform: &mut P, step: BootStep) -> Result<(), StepError> {
    match step {
        BootStep::Fpu => platform.init_fpu(),
        BootStep::Cache => platform.init_cache(),
        BootStep::Context => platform.init_context(),
        BootStep::Interrupts => platform.init_interrupts(),
        BootStep::Syscall => platform.install_syscalls(),
        BootStep::Modules => platform.init_modules(),
        BootStep::Audio => platform.start_audio(),
        BootStep::MemProtect => platform.protect_memory(),
    }
}

/// Process-wide sequencer behind [`init`] and [`shutdown`].
static SEQUENCER: Mutex<BootSequencer> = Mutex::new(BootSequencer::new());

/// Error returned by [`init`].
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The loader handoff could not be validated.
    #[error("invalid boot block")]
    BootBlock(#[from] BootBlockError),

    /// The initial fences do not form a region.
    #[error("invalid arena bounds")]
    Arena(#[from] rvl_arena::LayoutError),

    /// A bring-up step failed.
    #[error("bring-up failed")]
    Boot(#[from] BootError),
}

/// Runs the one-time runtime bring-up.
///
/// Validates the loader handoff, seeds the process-wide arena store
/// from the initial fences, runs the bring-up sequence over `platform`
/// and publishes the boot-time environment (console kind, stack
/// extents, boot-loader flag, start time).
///
/// Calling again after a successful bring-up re-validates the handoff
/// and then does nothing; the published facts are unchanged. A failed
/// bring-up leaves the runtime un-initialized; such failures are not
/// transient and the embedder is expected to report and halt.
pub fn init<P: Platform>(
    block: &BootBlock,
    stack: Region,
    in_ipl: bool,
    platform: &mut P,
) -> Result<(), InitError> {
    let params = BootParams::parse(block, stack, in_ipl)?;

    // The arena must be live before the sequencer runs: module
    // bookkeeping and anything after it may reserve ranges during
    // their own init.
    let arena = Arena::new(params.arena_lo(), params.arena_hi())?.with_stack_guard(stack);
    rvl_arena::global::init(arena);

    let mut sequencer = SEQUENCER.lock();
    let first_boot = !sequencer.is_booted();
    let start_time = sequencer.boot(platform, in_ipl)?;
    env::publish(&params, start_time);

    if first_boot {
        log::info!(
            "boot complete: {:?} console, arena {:#x}..{:#x}",
            params.console(),
            rvl_arena::global::lo(),
            rvl_arena::global::hi(),
        );
    }
    Ok(())
}

/// Stops the audio engine ahead of a controlled shutdown or restart.
///
/// No-op unless [`init`] has completed.
pub fn shutdown<P: Platform>(platform: &mut P) {
    SEQUENCER.lock().shutdown(platform);
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use rvl_arena::Region;

    use super::*;
    use crate::console::ConsoleKind;
    use crate::env::BOOT_MAGIC;

    /// Test double for the subsystem port: records the order hooks run
    /// in and can be told to fail at a given step.
    #[derive(Default)]
    struct Recorder {
        steps: Vec<BootStep>,
        stops: usize,
        fail_at: Option<BootStep>,
    }

    impl Recorder {
        fn run(&mut self, step: BootStep) -> Result<(), StepError> {
            if self.fail_at == Some(step) {
                return Err(StepError::new("forced failure"));
            }
            self.steps.push(step);
            Ok(())
        }
    }

    impl Platform for Recorder {
        fn init_fpu(&mut self) -> Result<(), StepError> {
            self.run(BootStep::Fpu)
        }

        fn init_cache(&mut self) -> Result<(), StepError> {
            self.run(BootStep::Cache)
        }

        fn init_context(&mut self) -> Result<(), StepError> {
            self.run(BootStep::Context)
        }

        fn init_interrupts(&mut self) -> Result<(), StepError> {
            self.run(BootStep::Interrupts)
        }

        fn install_syscalls(&mut self) -> Result<(), StepError> {
            self.run(BootStep::Syscall)
        }

        fn init_modules(&mut self) -> Result<(), StepError> {
            self.run(BootStep::Modules)
        }

        fn start_audio(&mut self) -> Result<(), StepError> {
            self.run(BootStep::Audio)
        }

        fn stop_audio(&mut self) {
            self.stops += 1;
        }

        fn protect_memory(&mut self) -> Result<(), StepError> {
            self.run(BootStep::MemProtect)
        }
    }

    #[test]
    fn runs_every_step_in_order() {
        let mut platform = Recorder::default();
        let mut sequencer = BootSequencer::new();

        sequencer.boot(&mut platform, false).unwrap();

        assert_eq!(platform.steps, BootStep::SEQUENCE);
        assert!(sequencer.is_booted());
        assert!(sequencer.start_time().is_some());
    }

    #[test]
    fn second_boot_is_a_no_op() {
        let mut platform = Recorder::default();
        let mut sequencer = BootSequencer::new();

        let first = sequencer.boot(&mut platform, false).unwrap();
        let second = sequencer.boot(&mut platform, false).unwrap();

        // Same observable results, and no hook ran twice.
        assert_eq!(first, second);
        assert_eq!(sequencer.start_time(), Some(first));
        assert_eq!(platform.steps.len(), BootStep::SEQUENCE.len());
    }

    #[test]
    fn failure_stops_the_sequence() {
        let mut platform = Recorder {
            fail_at: Some(BootStep::Interrupts),
            ..Recorder::default()
        };
        let mut sequencer = BootSequencer::new();

        let err = sequencer.boot(&mut platform, false).unwrap_err();

        assert_eq!(err.step, BootStep::Interrupts);
        assert_eq!(err.source, StepError::new("forced failure"));
        // Steps after the failing one never ran.
        assert_eq!(
            platform.steps,
            [BootStep::Fpu, BootStep::Cache, BootStep::Context]
        );
        assert!(!sequencer.is_booted());
        assert_eq!(sequencer.start_time(), None);
    }

    #[test]
    fn boot_error_names_the_failed_step() {
        let err = BootError {
            step: BootStep::Interrupts,
            source: StepError::new("vector table unwritable"),
        };
        let rendered = std::format!("{err}");
        assert!(rendered.contains("interrupts"), "{rendered}");
    }

    #[test]
    fn audio_is_skipped_under_the_boot_loader() {
        let mut platform = Recorder::default();
        let mut sequencer = BootSequencer::new();

        sequencer.boot(&mut platform, true).unwrap();

        let expected: Vec<BootStep> = BootStep::SEQUENCE
            .into_iter()
            .filter(|step| *step != BootStep::Audio)
            .collect();
        assert_eq!(platform.steps, expected);
        assert!(sequencer.is_booted());
    }

    #[test]
    fn shutdown_stops_audio_only_once_booted() {
        let mut platform = Recorder::default();
        let mut sequencer = BootSequencer::new();

        sequencer.shutdown(&mut platform);
        assert_eq!(platform.stops, 0);

        sequencer.boot(&mut platform, false).unwrap();
        sequencer.shutdown(&mut platform);
        assert_eq!(platform.stops, 1);
    }

    // Everything against the process-wide surface lives in one test:
    // the sequencer, arena store and environment snapshot are global.
    #[test]
    fn global_init_publishes_the_environment() {
        let block = BootBlock {
            magic: BOOT_MAGIC,
            version: 1,
            physical_mem_size: 0x0180_0000,
            console_code: ConsoleKind::PcEmulator.to_raw(),
            arena_lo: 0x8000_4000,
            arena_hi: 0x8170_0000,
        };
        let stack = Region::new(0x8170_0000, 0x8180_0000);

        assert!(!env::is_initialized());

        let mut platform = EmulatedPlatform;
        init(&block, stack, false, &mut platform).unwrap();

        assert!(env::is_initialized());
        assert_eq!(env::console_kind(), Some(ConsoleKind::PcEmulator));
        assert_eq!(env::stack_addr(), Some(0x8170_0000));
        assert_eq!(env::stack_end(), Some(0x8180_0000));
        assert_eq!(env::in_ipl(), Some(false));
        assert_eq!(env::physical_mem_size(), Some(0x0180_0000));
        let start_time = env::start_time().unwrap();

        assert_eq!(rvl_arena::global::lo(), 0x8000_4000);
        assert_eq!(rvl_arena::global::hi(), 0x8170_0000);

        // Idempotent: facts are unchanged by a second bring-up.
        init(&block, stack, false, &mut platform).unwrap();
        assert_eq!(env::start_time(), Some(start_time));
        assert_eq!(env::console_kind(), Some(ConsoleKind::PcEmulator));

        // The seeded store rejects a fence inside the stack guard.
        assert!(rvl_arena::global::try_set_hi(0x8171_0000).is_err());

        shutdown(&mut platform);
    }

    #[test]
    fn init_rejects_a_bad_handoff_before_running_steps() {
        let block = BootBlock {
            magic: 0,
            version: 1,
            physical_mem_size: 0x0180_0000,
            console_code: ConsoleKind::Retail.to_raw(),
            arena_lo: 0x8000_4000,
            arena_hi: 0x8170_0000,
        };
        let stack = Region::new(0x8170_0000, 0x8180_0000);

        let mut platform = Recorder::default();
        let err = init(&block, stack, false, &mut platform).unwrap_err();

        assert!(matches!(err, InitError::BootBlock(_)));
        assert!(platform.steps.is_empty());
    }
}
