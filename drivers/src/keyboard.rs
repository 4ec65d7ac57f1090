//! PS/2 keyboard on hardware line 1.
//!
//! The device hook pulls one scancode per signal, drops key releases and
//! queues the decoded byte. The idle loop drains the queue with [`pop_char`].

use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use cascade_abi::arch::x86::Port;
use cascade_abi::arch::x86::ports::PS2_STATUS_OUTPUT_FULL;
use cascade_core::{PicError, pic};
use cascade_lib::{HardwarePorts, PortIo, klog_info, klog_trace};

/// Hardware line the keyboard controller signals on.
pub const KEYBOARD_LINE: u8 = 1;

pub const KEY_UP: u8 = 1;
pub const KEY_DOWN: u8 = 2;
pub const KEY_LEFT: u8 = 3;
pub const KEY_RIGHT: u8 = 4;

const FIFO_SLOTS: usize = 64;

const SCANCODE_ASCII: [u8; 0x80] = [
    0x00, 0x1B, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x30, 0x2D, 0x3D, 0x08, 0x09,
    0x71, 0x77, 0x65, 0x72, 0x74, 0x79, 0x75, 0x69, 0x6F, 0x70, 0x5B, 0x5D, 0x0A, 0x00, 0x61, 0x73,
    0x64, 0x66, 0x67, 0x68, 0x6A, 0x6B, 0x6C, 0x3B, 0x27, 0x60, 0x00, 0x5C, 0x7A, 0x78, 0x63, 0x76,
    0x62, 0x6E, 0x6D, 0x2C, 0x2E, 0x2F, 0x00, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

#[inline(always)]
fn is_break_code(scancode: u8) -> bool {
    scancode & 0x80 != 0
}

/// Byte queued for a make code, or `None` for keys that produce nothing.
pub fn translate_scancode(scancode: u8) -> Option<u8> {
    if is_break_code(scancode) {
        return None;
    }
    let byte = match scancode {
        0x48 => KEY_UP,
        0x50 => KEY_DOWN,
        0x4B => KEY_LEFT,
        0x4D => KEY_RIGHT,
        _ => SCANCODE_ASCII[scancode as usize],
    };
    (byte != 0).then_some(byte)
}

/// Single-producer single-consumer byte queue. One slot stays empty to tell
/// full from empty; pushes onto a full queue are dropped.
pub struct ScancodeFifo {
    slots: [AtomicU8; FIFO_SLOTS],
    head: AtomicUsize,
    tail: AtomicUsize,
}

impl ScancodeFifo {
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicU8::new(0) }; FIFO_SLOTS],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Returns `false` when the byte was dropped.
    pub fn push(&self, byte: u8) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % FIFO_SLOTS;
        if next == self.tail.load(Ordering::Acquire) {
            return false;
        }
        self.slots[head].store(byte, Ordering::Relaxed);
        self.head.store(next, Ordering::Release);
        true
    }

    pub fn pop(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }
        let byte = self.slots[tail].load(Ordering::Relaxed);
        self.tail.store((tail + 1) % FIFO_SLOTS, Ordering::Release);
        Some(byte)
    }

    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Acquire) == self.head.load(Ordering::Acquire)
    }
}

impl Default for ScancodeFifo {
    fn default() -> Self {
        Self::new()
    }
}

static KEY_FIFO: ScancodeFifo = ScancodeFifo::new();

/// Hook body, with the ports and queue supplied by the caller.
pub fn handle_line<P: PortIo>(line: u8, ports: &mut P, fifo: &ScancodeFifo) {
    if line != KEYBOARD_LINE {
        return;
    }
    if ports.read_u8(Port::PS2_STATUS) & PS2_STATUS_OUTPUT_FULL == 0 {
        return;
    }
    let scancode = ports.read_u8(Port::PS2_DATA);
    if let Some(byte) = translate_scancode(scancode)
        && !fifo.push(byte)
    {
        klog_trace!("keyboard: queue full, dropped scancode 0x{:02x}", scancode);
    }
}

/// Device hook to register with the interrupt core.
pub fn on_irq(line: u8) {
    // SAFETY: called from the hardware dispatcher at ring 0; the PS/2
    // controller ports belong to this driver.
    let mut ports = unsafe { HardwarePorts::new() };
    handle_line(line, &mut ports, &KEY_FIFO);
}

/// Next decoded key, if any.
pub fn pop_char() -> Option<u8> {
    KEY_FIFO.pop()
}

/// Open the keyboard line on the master controller.
pub fn keyboard_init<P: PortIo>(ports: &mut P) -> Result<(), PicError> {
    pic::unmask_line(ports, KEYBOARD_LINE)?;
    klog_info!("keyboard: line {} unmasked", KEYBOARD_LINE);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_lib::testing::{Access, RecordingPorts};

    fn ready(scancode: u8) -> RecordingPorts {
        let mut ports = RecordingPorts::new();
        ports.set_input(Port::PS2_STATUS, PS2_STATUS_OUTPUT_FULL);
        ports.set_input(Port::PS2_DATA, scancode);
        ports
    }

    #[test]
    fn letters_digits_and_controls_decode() {
        assert_eq!(translate_scancode(0x1E), Some(b'a'));
        assert_eq!(translate_scancode(0x10), Some(b'q'));
        assert_eq!(translate_scancode(0x02), Some(b'1'));
        assert_eq!(translate_scancode(0x39), Some(b' '));
        assert_eq!(translate_scancode(0x1C), Some(b'\n'));
        assert_eq!(translate_scancode(0x0E), Some(0x08));
        assert_eq!(translate_scancode(0x01), Some(0x1B));
        assert_eq!(translate_scancode(0x2B), Some(b'\\'));
    }

    #[test]
    fn arrows_map_to_direction_codes() {
        assert_eq!(translate_scancode(0x48), Some(KEY_UP));
        assert_eq!(translate_scancode(0x50), Some(KEY_DOWN));
        assert_eq!(translate_scancode(0x4B), Some(KEY_LEFT));
        assert_eq!(translate_scancode(0x4D), Some(KEY_RIGHT));
    }

    #[test]
    fn releases_and_unmapped_keys_yield_nothing() {
        assert_eq!(translate_scancode(0x9E), None);
        assert_eq!(translate_scancode(0xC8), None);
        assert_eq!(translate_scancode(0x2A), None);
        assert_eq!(translate_scancode(0x3B), None);
    }

    #[test]
    fn hook_queues_a_pressed_key() {
        let fifo = ScancodeFifo::new();
        let mut ports = ready(0x23);

        handle_line(KEYBOARD_LINE, &mut ports, &fifo);

        assert_eq!(fifo.pop(), Some(b'h'));
        assert_eq!(fifo.pop(), None);
    }

    #[test]
    fn hook_skips_data_when_the_output_buffer_is_empty() {
        let fifo = ScancodeFifo::new();
        let mut ports = RecordingPorts::new();
        ports.set_input(Port::PS2_DATA, 0x23);

        handle_line(KEYBOARD_LINE, &mut ports, &fifo);

        assert!(fifo.is_empty());
        assert!(ports.accesses().eq([Access::Read(Port::PS2_STATUS)]));
    }

    #[test]
    fn hook_ignores_other_lines() {
        let fifo = ScancodeFifo::new();
        let mut ports = ready(0x23);

        handle_line(0, &mut ports, &fifo);
        handle_line(12, &mut ports, &fifo);

        assert!(fifo.is_empty());
        assert_eq!(ports.accesses().count(), 0);
    }

    #[test]
    fn full_queue_drops_new_keys() {
        let fifo = ScancodeFifo::new();
        for i in 0..FIFO_SLOTS - 1 {
            assert!(fifo.push(i as u8));
        }
        assert!(!fifo.push(0xAA));

        for i in 0..FIFO_SLOTS - 1 {
            assert_eq!(fifo.pop(), Some(i as u8));
        }
        assert_eq!(fifo.pop(), None);
    }

    #[test]
    fn queue_wraps_around() {
        let fifo = ScancodeFifo::new();
        for round in 0..3 * FIFO_SLOTS {
            assert!(fifo.push(round as u8));
            assert_eq!(fifo.pop(), Some(round as u8));
        }
        assert!(fifo.is_empty());
    }

    #[test]
    fn init_unmasks_only_line_one() {
        let mut ports = RecordingPorts::new();
        ports.set_input(Port::PIC1_DATA, 0xFF);

        assert_eq!(keyboard_init(&mut ports), Ok(()));

        assert_eq!(ports.last_write(Port::PIC1_DATA), Some(0xFD));
        assert_eq!(ports.last_write(Port::PIC2_DATA), None);
    }
}
