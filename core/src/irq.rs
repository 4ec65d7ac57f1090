//! Hardware line dispatch.

use core::sync::atomic::{AtomicU64, Ordering};

use cascade_abi::arch::x86::trap::IRQ_LINES;
use cascade_lib::PortIo;

use crate::hook::HookSlot;
use crate::pic;

static IRQ_COUNTS: [AtomicU64; IRQ_LINES] = [const { AtomicU64::new(0) }; IRQ_LINES];

/// Run the hook for `line`, then acknowledge the controllers.
///
/// The acknowledgment always comes after the hook returns, so the hook can
/// read its device before another signal on the same line is let through.
pub fn dispatch_irq<P: PortIo>(line: u8, hook: &HookSlot, ports: &mut P) {
    if let Some(count) = IRQ_COUNTS.get(line as usize) {
        count.fetch_add(1, Ordering::Relaxed);
    }
    hook.invoke(line);
    pic::send_eoi(ports, line);
}

/// Signals delivered on `line` since boot. Zero for lines that don't exist.
pub fn irq_count(line: u8) -> u64 {
    IRQ_COUNTS
        .get(line as usize)
        .map_or(0, |count| count.load(Ordering::Relaxed))
}

/// Target of the shared hardware entry, with the line the stub pushed.
#[cfg(target_arch = "x86")]
pub(crate) extern "C" fn irq_entry(line: u32) {
    // SAFETY: running at ring 0 inside the dispatcher, which owns the PIC
    // command ports for the duration of the acknowledgment.
    let mut ports = unsafe { cascade_lib::HardwarePorts::new() };
    dispatch_irq(line as u8, &crate::hook::IRQ_HOOK, &mut ports);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_abi::arch::x86::Port;
    use cascade_abi::arch::x86::ports::PIC_EOI;
    use cascade_lib::testing::RecordingPorts;
    use spin::Mutex;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Hook(u8),
        Write(Port, u8),
    }

    static EVENTS: Mutex<Vec<Event>> = Mutex::new(Vec::new());

    struct SharedLogPorts;

    impl PortIo for SharedLogPorts {
        fn write_u8(&mut self, port: Port, value: u8) {
            EVENTS.lock().push(Event::Write(port, value));
        }

        fn read_u8(&mut self, _port: Port) -> u8 {
            0
        }
    }

    fn logging_hook(line: u8) {
        EVENTS.lock().push(Event::Hook(line));
    }

    #[test]
    fn hook_runs_before_the_acknowledgment() {
        let slot = HookSlot::new();
        slot.register(logging_hook).unwrap();

        dispatch_irq(1, &slot, &mut SharedLogPorts);
        dispatch_irq(9, &slot, &mut SharedLogPorts);

        let events = EVENTS.lock().clone();
        assert_eq!(
            events,
            [
                Event::Hook(1),
                Event::Write(Port::PIC1_COMMAND, PIC_EOI),
                Event::Hook(9),
                Event::Write(Port::PIC2_COMMAND, PIC_EOI),
                Event::Write(Port::PIC1_COMMAND, PIC_EOI),
            ]
        );
    }

    #[test]
    fn unhooked_lines_are_still_acknowledged() {
        let slot = HookSlot::new();
        let mut ports = RecordingPorts::new();

        dispatch_irq(14, &slot, &mut ports);

        assert!(
            ports
                .writes()
                .eq([(Port::PIC2_COMMAND, PIC_EOI), (Port::PIC1_COMMAND, PIC_EOI)])
        );
    }

    #[test]
    fn dispatch_counts_per_line() {
        let slot = HookSlot::new();
        let mut ports = RecordingPorts::new();
        let before = irq_count(5);

        dispatch_irq(5, &slot, &mut ports);
        dispatch_irq(5, &slot, &mut ports);

        assert_eq!(irq_count(5), before + 2);
        assert_eq!(irq_count(16), 0);
    }
}
