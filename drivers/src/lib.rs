#![no_std]
#![forbid(unsafe_op_in_unsafe_fn)]

pub mod keyboard;
pub mod vga;

pub use keyboard::{keyboard_init, on_irq, pop_char};
pub use vga::{VGA_CONSOLE, vga_init};
