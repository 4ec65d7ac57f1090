//! Cascade hardware ABI types
//!
//! Fixed layouts and constants shared by the interrupt core and the drivers:
//! gate descriptors, the IDTR operand, segment selectors, port numbers and
//! the stack frames built by the entry stubs.
//!
//! Layout-sensitive types are `#[repr(C)]` and carry explicit byte
//! serializers so their image can be checked without running on hardware.

#![no_std]
#![forbid(unsafe_code)]

pub mod arch;

pub use arch::x86::{GateDescriptor, GateFlags, IdtPointer, Port, SegmentSelector};
