//! x86 I/O port addresses and the command bytes written to them.
//!
//! Port numbers are wrapped in a newtype so that a stray `u16` cannot be
//! passed where a port is expected.

/// x86 I/O port address.
///
/// # Example
///
/// ```ignore
/// use cascade_abi::arch::x86::Port;
/// use cascade_lib::{HardwarePorts, PortIo};
///
/// let mut ports = unsafe { HardwarePorts::new() };
/// ports.write_u8(Port::PIC1_DATA, 0xFF);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Port(pub u16);

impl Port {
    // =========================================================================
    // Serial (8250/16550 UART)
    // =========================================================================

    /// COM1 serial port base address.
    pub const COM1: Self = Self(0x3F8);

    // =========================================================================
    // PS/2 Controller (8042)
    // =========================================================================

    /// PS/2 data port - read keyboard scancodes.
    pub const PS2_DATA: Self = Self(0x60);

    /// PS/2 status port (read).
    pub const PS2_STATUS: Self = Self(0x64);

    // =========================================================================
    // Legacy PIC (8259)
    // =========================================================================

    /// Master PIC command port.
    pub const PIC1_COMMAND: Self = Self(0x20);

    /// Master PIC data port.
    pub const PIC1_DATA: Self = Self(0x21);

    /// Slave PIC command port.
    pub const PIC2_COMMAND: Self = Self(0xA0);

    /// Slave PIC data port.
    pub const PIC2_DATA: Self = Self(0xA1);

    // =========================================================================
    // Methods
    // =========================================================================

    /// Get the raw port number for IN/OUT instructions.
    #[inline]
    pub const fn number(self) -> u16 {
        self.0
    }
}

// =============================================================================
// PIC Initialization Command Words
// =============================================================================

/// ICW1: begin initialization, edge triggered, cascade mode, ICW4 follows.
pub const PIC_ICW1_INIT: u8 = 0x11;

/// ICW2 for the master: first vector of lines 0-7.
pub const PIC1_VECTOR_BASE: u8 = 0x20;

/// ICW2 for the slave: first vector of lines 8-15.
pub const PIC2_VECTOR_BASE: u8 = 0x28;

/// ICW3 for the master: bit mask of the line the slave hangs off (line 2).
pub const PIC1_ICW3_SLAVE_ON_LINE2: u8 = 0x04;

/// ICW3 for the slave: its cascade identity.
pub const PIC2_ICW3_CASCADE_ID: u8 = 0x02;

/// ICW4: 8086/88 mode.
pub const PIC_ICW4_8086: u8 = 0x01;

/// OCW1 value that masks all eight lines of one controller.
pub const PIC_MASK_ALL: u8 = 0xFF;

/// Non-specific End of Interrupt command.
pub const PIC_EOI: u8 = 0x20;

/// Master line the slave controller is wired to.
pub const PIC_CASCADE_LINE: u8 = 2;

/// Number of lines on one controller.
pub const PIC_LINES_PER_CHIP: u8 = 8;

// =============================================================================
// PS/2 Status Bits
// =============================================================================

/// Output buffer full: a byte is waiting on the data port.
pub const PS2_STATUS_OUTPUT_FULL: u8 = 0x01;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pic_ports_are_the_legacy_pair() {
        assert_eq!(Port::PIC1_COMMAND.number(), 0x20);
        assert_eq!(Port::PIC1_DATA.number(), 0x21);
        assert_eq!(Port::PIC2_COMMAND.number(), 0xA0);
        assert_eq!(Port::PIC2_DATA.number(), 0xA1);
    }

    #[test]
    fn slave_base_follows_master_lines() {
        assert_eq!(PIC2_VECTOR_BASE, PIC1_VECTOR_BASE + PIC_LINES_PER_CHIP);
        assert_eq!(PIC1_ICW3_SLAVE_ON_LINE2, 1 << PIC_CASCADE_LINE);
    }
}
