//! Host-side stand-ins for hardware, shared by the crates' unit tests.
//!
//! Enabled by the `testing` feature; never linked into the kernel image.

use cascade_abi::arch::x86::Port;

use crate::io::PortIo;

const LOG_CAPACITY: usize = 128;
const INPUT_SLOTS: usize = 8;

/// Direction of a recorded port access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Write(Port, u8),
    Read(Port),
}

/// [`PortIo`] that records every access in order and answers reads from a
/// small table of scripted values (unscripted ports read as zero).
#[derive(Debug)]
pub struct RecordingPorts {
    log: [Option<Access>; LOG_CAPACITY],
    len: usize,
    inputs: [Option<(Port, u8)>; INPUT_SLOTS],
}

impl RecordingPorts {
    pub const fn new() -> Self {
        Self {
            log: [None; LOG_CAPACITY],
            len: 0,
            inputs: [None; INPUT_SLOTS],
        }
    }

    /// Make subsequent reads of `port` return `value`.
    pub fn set_input(&mut self, port: Port, value: u8) {
        if let Some(slot) = self
            .inputs
            .iter_mut()
            .find(|slot| matches!(slot, Some((p, _)) if *p == port) || slot.is_none())
        {
            *slot = Some((port, value));
        }
    }

    pub fn accesses(&self) -> impl Iterator<Item = Access> + '_ {
        self.log[..self.len].iter().flatten().copied()
    }

    /// Writes only, as `(port, value)` pairs in program order.
    pub fn writes(&self) -> impl Iterator<Item = (Port, u8)> + '_ {
        self.accesses().filter_map(|access| match access {
            Access::Write(port, value) => Some((port, value)),
            Access::Read(_) => None,
        })
    }

    /// Last value written to `port`, if any.
    pub fn last_write(&self, port: Port) -> Option<u8> {
        self.writes()
            .filter(|(p, _)| *p == port)
            .map(|(_, value)| value)
            .last()
    }

    pub fn clear_log(&mut self) {
        self.log = [None; LOG_CAPACITY];
        self.len = 0;
    }

    fn record(&mut self, access: Access) {
        if self.len < LOG_CAPACITY {
            self.log[self.len] = Some(access);
            self.len += 1;
        }
    }
}

impl Default for RecordingPorts {
    fn default() -> Self {
        Self::new()
    }
}

impl PortIo for RecordingPorts {
    fn write_u8(&mut self, port: Port, value: u8) {
        self.record(Access::Write(port, value));
    }

    fn read_u8(&mut self, port: Port) -> u8 {
        self.record(Access::Read(port));
        self.inputs
            .iter()
            .flatten()
            .find(|(p, _)| *p == port)
            .map(|(_, value)| *value)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_program_order() {
        let mut ports = RecordingPorts::new();
        ports.write_u8(Port::PIC1_COMMAND, 0x11);
        ports.write_u8(Port::PIC2_COMMAND, 0x11);
        let _ = ports.read_u8(Port::PIC1_DATA);

        let mut accesses = ports.accesses();
        assert_eq!(accesses.next(), Some(Access::Write(Port::PIC1_COMMAND, 0x11)));
        assert_eq!(accesses.next(), Some(Access::Write(Port::PIC2_COMMAND, 0x11)));
        assert_eq!(accesses.next(), Some(Access::Read(Port::PIC1_DATA)));
        assert_eq!(accesses.next(), None);
    }

    #[test]
    fn scripted_reads_and_last_write() {
        let mut ports = RecordingPorts::new();
        ports.set_input(Port::PS2_STATUS, 0x01);
        ports.set_input(Port::PS2_STATUS, 0x00);
        assert_eq!(ports.read_u8(Port::PS2_STATUS), 0x00);
        assert_eq!(ports.read_u8(Port::PS2_DATA), 0x00);

        ports.write_u8(Port::PIC1_DATA, 0xFF);
        ports.write_u8(Port::PIC1_DATA, 0xFD);
        assert_eq!(ports.last_write(Port::PIC1_DATA), Some(0xFD));
        assert_eq!(ports.last_write(Port::PIC2_DATA), None);
    }
}
