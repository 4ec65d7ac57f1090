//! 32-bit x86 architecture definitions.
//!
//! Raw integer constants are wrapped in newtypes to prevent misuse:
//! - `SegmentSelector(u16)` for GDT selectors
//! - `Port(u16)` for I/O port addresses
//! - `GateFlags` bitflags for IDT gate attributes

pub mod gdt;
pub mod idt;
pub mod ports;
pub mod trap;

pub use gdt::SegmentSelector;
pub use idt::{GateDescriptor, GateFlags, IdtPointer};
pub use ports::Port;
pub use trap::{IrqFrame, PushadRegisters, TrapFrame};
