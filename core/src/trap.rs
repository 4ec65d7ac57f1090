//! Exception policy: diagnose, then resume or stop the machine.
//!
//! Every exception vector funnels into [`handle_trap`]. It never reports an
//! error upwards. The interrupted code either continues or the CPU is parked
//! for good.

use core::sync::atomic::{AtomicU32, Ordering};

use cascade_abi::arch::x86::trap::{exception_mnemonic, is_critical_exception};
use cascade_lib::{klog_error, klog_warn};

use crate::console::Console;

/// More than this many exceptions in flight at once halts the machine.
pub const FAULT_STORM_THRESHOLD: u32 = 5;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

const STORM_MESSAGE: &str = "PANIC: too many exceptions, system halted.\n";
const CRITICAL_MESSAGE: &str = "PANIC: critical exception, system halted.\n";

/// Number of exception dispatches currently in progress.
///
/// Incremented on entry and given back when a dispatch resumes, so it only
/// grows while exceptions nest inside one another.
pub struct FaultCounter {
    count: AtomicU32,
}

impl FaultCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Count a new dispatch and return the updated value.
    pub fn enter(&self) -> u32 {
        self.count.fetch_add(1, Ordering::SeqCst).wrapping_add(1)
    }

    /// Give back one dispatch; saturates at zero.
    pub fn leave(&self) {
        let _ = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                count.checked_sub(1)
            });
    }

    pub fn get(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

impl Default for FaultCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// The counter passed [`FAULT_STORM_THRESHOLD`].
    FaultStorm,
    /// Double fault, general protection or page fault.
    CriticalException,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapOutcome {
    Resume,
    Halt(HaltReason),
}

fn write_hex_byte(console: &dyn Console, value: u8) {
    console.write_char(HEX_DIGITS[(value >> 4) as usize] as char);
    console.write_char(HEX_DIGITS[(value & 0xF) as usize] as char);
}

/// Apply the exception policy to one dispatch.
///
/// Prints `Exception caught (<mnemonic>) err=<HH>` with the low byte of the
/// error code, unless the storm threshold was already passed.
pub fn handle_trap(
    counter: &FaultCounter,
    console: &dyn Console,
    vector: u32,
    error_code: u32,
) -> TrapOutcome {
    let depth = counter.enter();
    if depth > FAULT_STORM_THRESHOLD {
        console.write_str(STORM_MESSAGE);
        klog_error!("trap: {} nested exceptions, halting", depth);
        return TrapOutcome::Halt(HaltReason::FaultStorm);
    }

    let mnemonic = exception_mnemonic(vector);
    console.write_str("Exception caught (");
    console.write_str(mnemonic);
    console.write_str(") err=");
    write_hex_byte(console, error_code as u8);
    console.write_char('\n');
    klog_warn!(
        "trap: vector {} ({}) err=0x{:08x} depth={}",
        vector,
        mnemonic,
        error_code,
        depth
    );

    if is_critical_exception(vector) {
        console.write_str(CRITICAL_MESSAGE);
        klog_error!("trap: {} is not recoverable, halting", mnemonic);
        return TrapOutcome::Halt(HaltReason::CriticalException);
    }

    counter.leave();
    TrapOutcome::Resume
}

#[cfg(target_arch = "x86")]
static FAULT_COUNTER: FaultCounter = FaultCounter::new();

/// Target of the shared trap entry, with the two words the stub pushed.
#[cfg(target_arch = "x86")]
pub(crate) extern "C" fn trap_entry(vector: u32, error_code: u32) {
    let outcome = handle_trap(
        &FAULT_COUNTER,
        crate::console::console(),
        vector,
        error_code,
    );
    if let TrapOutcome::Halt(_) = outcome {
        cascade_lib::cpu::halt_loop();
    }
}
