//! Legacy 8259 pair: remap, masking and end-of-interrupt.
//!
//! Every routine takes the port accessor explicitly so the exact byte stream
//! sent to the controllers can be checked on the host.

use core::fmt;

use cascade_abi::arch::x86::ports::{
    PIC_CASCADE_LINE, PIC_EOI, PIC_ICW1_INIT, PIC_ICW4_8086, PIC_LINES_PER_CHIP, PIC_MASK_ALL,
    PIC1_ICW3_SLAVE_ON_LINE2, PIC1_VECTOR_BASE, PIC2_ICW3_CASCADE_ID, PIC2_VECTOR_BASE,
};
use cascade_abi::arch::x86::trap::IRQ_LINES;
use cascade_abi::arch::x86::Port;
use cascade_lib::{PortIo, klog_debug};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PicError {
    /// Line number outside 0..16.
    InvalidLine(u8),
}

impl fmt::Display for PicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PicError::InvalidLine(line) => write!(f, "no PIC line {line}"),
        }
    }
}

/// Reinitialize both controllers with lines at 0x20..0x30 and every line
/// masked. The order of these writes is fixed by the hardware.
pub fn remap<P: PortIo>(ports: &mut P) {
    ports.write_u8(Port::PIC1_COMMAND, PIC_ICW1_INIT);
    ports.write_u8(Port::PIC2_COMMAND, PIC_ICW1_INIT);

    ports.write_u8(Port::PIC1_DATA, PIC1_VECTOR_BASE);
    ports.write_u8(Port::PIC2_DATA, PIC2_VECTOR_BASE);

    ports.write_u8(Port::PIC1_DATA, PIC1_ICW3_SLAVE_ON_LINE2);
    ports.write_u8(Port::PIC2_DATA, PIC2_ICW3_CASCADE_ID);

    ports.write_u8(Port::PIC1_DATA, PIC_ICW4_8086);
    ports.write_u8(Port::PIC2_DATA, PIC_ICW4_8086);

    ports.write_u8(Port::PIC1_DATA, PIC_MASK_ALL);
    ports.write_u8(Port::PIC2_DATA, PIC_MASK_ALL);

    klog_debug!(
        "pic: remapped master=0x{:02x} slave=0x{:02x}, all lines masked",
        PIC1_VECTOR_BASE,
        PIC2_VECTOR_BASE
    );
}

/// Acknowledge `line`. Slave lines acknowledge the slave first.
#[inline]
pub fn send_eoi<P: PortIo>(ports: &mut P, line: u8) {
    if line >= PIC_LINES_PER_CHIP {
        ports.write_u8(Port::PIC2_COMMAND, PIC_EOI);
    }
    ports.write_u8(Port::PIC1_COMMAND, PIC_EOI);
}

fn mask_port(line: u8) -> Result<(Port, u8), PicError> {
    if line as usize >= IRQ_LINES {
        return Err(PicError::InvalidLine(line));
    }
    if line < PIC_LINES_PER_CHIP {
        Ok((Port::PIC1_DATA, 1 << line))
    } else {
        Ok((Port::PIC2_DATA, 1 << (line - PIC_LINES_PER_CHIP)))
    }
}

fn clear_mask_bit<P: PortIo>(ports: &mut P, port: Port, bit: u8) {
    let mask = ports.read_u8(port);
    ports.write_u8(port, mask & !bit);
}

/// Let `line` through. A slave line also opens the cascade line on the
/// master, otherwise the slave can never be heard.
pub fn unmask_line<P: PortIo>(ports: &mut P, line: u8) -> Result<(), PicError> {
    let (port, bit) = mask_port(line)?;
    clear_mask_bit(ports, port, bit);
    if line >= PIC_LINES_PER_CHIP {
        clear_mask_bit(ports, Port::PIC1_DATA, 1 << PIC_CASCADE_LINE);
    }
    klog_debug!("pic: line {} unmasked", line);
    Ok(())
}

pub fn mask_line<P: PortIo>(ports: &mut P, line: u8) -> Result<(), PicError> {
    let (port, bit) = mask_port(line)?;
    let mask = ports.read_u8(port);
    ports.write_u8(port, mask | bit);
    Ok(())
}

pub fn is_masked<P: PortIo>(ports: &mut P, line: u8) -> Result<bool, PicError> {
    let (port, bit) = mask_port(line)?;
    Ok(ports.read_u8(port) & bit != 0)
}
