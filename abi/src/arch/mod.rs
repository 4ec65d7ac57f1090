//! Architecture-specific definitions.
//!
//! The layouts are plain data, so they are compiled on every host; only the
//! code that executes them is restricted to `target_arch = "x86"`.

pub mod x86;

pub use x86::*;

/// Base vector for hardware IRQs (IRQ0 maps to this vector).
pub use x86::trap::IRQ_BASE_VECTOR;
