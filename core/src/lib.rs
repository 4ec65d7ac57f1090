//! Interrupt core for 32-bit x86: the descriptor table, the entry stubs, the
//! exception and hardware-line dispatchers, the 8259 pair and the device
//! hook drivers plug into.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod console;
pub mod hook;
pub mod idt;
pub mod irq;
pub mod pic;
#[cfg(target_arch = "x86")]
pub mod stubs;
pub mod trap;

pub use console::{Console, ConsoleError, console, register_console};
pub use hook::{HookError, HookSlot, IrqHook, register_irq_hook};
pub use irq::{dispatch_irq, irq_count};
pub use pic::PicError;
pub use trap::{FaultCounter, HaltReason, TrapOutcome, handle_trap};

/// Install an empty table, the exception gates and the hardware-line gates,
/// leaving every line masked. Interrupts stay disabled.
#[cfg(target_arch = "x86")]
pub fn init<P: cascade_lib::PortIo>(ports: &mut P) {
    idt::install();
    stubs::install_trap_gates();
    stubs::install_irq_gates(ports);
}
