//! Byte-wide x86 port access.
//!
//! Code that programs a device goes through the [`PortIo`] trait, so the same
//! routine can drive the hardware ([`HardwarePorts`]) or a recorder in tests.

use core::arch::asm;

use cascade_abi::arch::x86::Port;

/// Byte-wide port access used by device programming routines.
pub trait PortIo {
    fn write_u8(&mut self, port: Port, value: u8);
    fn read_u8(&mut self, port: Port) -> u8;
}

/// [`PortIo`] backed by real IN/OUT instructions.
#[derive(Debug)]
pub struct HardwarePorts {
    _private: (),
}

impl HardwarePorts {
    /// # Safety
    /// The caller must run at ring 0 and own every port the returned handle
    /// is used with; port I/O can have arbitrary side effects on hardware.
    #[inline]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl PortIo for HardwarePorts {
    #[inline]
    fn write_u8(&mut self, port: Port, value: u8) {
        // SAFETY: construction of `HardwarePorts` asserted ring 0 port ownership.
        unsafe {
            asm!(
                "out dx, al",
                in("dx") port.number(),
                in("al") value,
                options(nomem, nostack, preserves_flags)
            );
        }
    }

    #[inline]
    fn read_u8(&mut self, port: Port) -> u8 {
        let value: u8;
        // SAFETY: construction of `HardwarePorts` asserted ring 0 port ownership.
        unsafe {
            asm!(
                "in al, dx",
                out("al") value,
                in("dx") port.number(),
                options(nomem, nostack, preserves_flags)
            );
        }
        value
    }
}
