//! The 256-gate descriptor table and its activation.
//!
//! There is exactly one table. [`install`] zeroes it and points IDTR at it;
//! gates are written afterwards with [`set_gate`] or [`with_table`]. Any vector
//! nobody installed stays non-present, and raising it takes the CPU down.

use cascade_abi::arch::x86::idt::IDT_ENTRIES;
use cascade_abi::arch::x86::{GateDescriptor, GateFlags, IdtPointer, SegmentSelector};
use cascade_lib::klog_debug;
use spin::Mutex;

#[repr(C, align(8))]
pub struct DescriptorTable {
    gates: [GateDescriptor; IDT_ENTRIES],
}

impl DescriptorTable {
    pub const fn new() -> Self {
        Self {
            gates: [GateDescriptor::MISSING; IDT_ENTRIES],
        }
    }

    pub fn reset(&mut self) {
        self.gates = [GateDescriptor::MISSING; IDT_ENTRIES];
    }

    /// Write one gate. `vector` is a `u8`, so every value is in range.
    pub fn set_gate(
        &mut self,
        vector: u8,
        handler: u32,
        selector: SegmentSelector,
        flags: GateFlags,
    ) {
        self.gates[vector as usize] = GateDescriptor::new(handler, selector, flags);
    }

    /// Point consecutive vectors starting at `first` at `handlers`, as
    /// kernel-code, ring-0 interrupt gates. Vectors past 255 are ignored.
    pub fn set_gates(&mut self, first: u8, handlers: &[u32]) {
        for (vector, &handler) in (first..=u8::MAX).zip(handlers) {
            self.set_gate(
                vector,
                handler,
                SegmentSelector::KERNEL_CODE,
                GateFlags::KERNEL_INTERRUPT,
            );
        }
    }

    #[inline]
    pub fn gate(&self, vector: u8) -> GateDescriptor {
        self.gates[vector as usize]
    }

    pub fn present_count(&self) -> usize {
        self.gates.iter().filter(|gate| gate.is_present()).count()
    }

    /// IDTR image describing this table at its current address.
    pub fn pointer(&self) -> IdtPointer {
        IdtPointer::new(self.gates.as_ptr() as usize as u32)
    }
}

impl Default for DescriptorTable {
    fn default() -> Self {
        Self::new()
    }
}

static IDT: Mutex<DescriptorTable> = Mutex::new(DescriptorTable::new());

/// Zero the table and make the CPU consult it.
///
/// Calling this again is allowed but wipes every gate installed so far.
pub fn install() {
    let mut table = IDT.lock();
    table.reset();
    let idtr = table.pointer();
    activate(&idtr);
    klog_debug!(
        "idt: loaded base=0x{:08x} limit=0x{:04x}",
        idtr.base(),
        idtr.limit()
    );
}

#[cfg(target_arch = "x86")]
fn activate(idtr: &IdtPointer) {
    // SAFETY: the table is a static, so its base stays valid for the rest of
    // uptime, and every gate is non-present until explicitly set.
    unsafe { cascade_lib::cpu::load_idt(idtr) }
}

#[cfg(not(target_arch = "x86"))]
fn activate(_idtr: &IdtPointer) {}

pub fn set_gate(vector: u8, handler: u32, selector: SegmentSelector, flags: GateFlags) {
    IDT.lock().set_gate(vector, handler, selector, flags);
}

/// Run `f` with the live table locked.
pub fn with_table<R>(f: impl FnOnce(&mut DescriptorTable) -> R) -> R {
    f(&mut IDT.lock())
}

pub fn gate(vector: u8) -> GateDescriptor {
    IDT.lock().gate(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_abi::arch::x86::trap::{EXCEPTION_VECTORS, IRQ_BASE_VECTOR, IRQ_LINES};

    fn fake_handlers<const N: usize>(base: u32) -> [u32; N] {
        core::array::from_fn(|i| base + (i as u32) * 0x10)
    }

    #[test]
    fn fresh_table_has_no_present_gates() {
        let table = DescriptorTable::new();
        assert_eq!(table.present_count(), 0);
        assert_eq!(table.gate(255), GateDescriptor::MISSING);
    }

    #[test]
    fn exception_gates_point_at_their_handlers() {
        let mut table = DescriptorTable::new();
        let handlers: [u32; EXCEPTION_VECTORS] = fake_handlers(0x0010_0000);
        table.set_gates(0, &handlers);

        for vector in 0..EXCEPTION_VECTORS as u8 {
            let gate = table.gate(vector);
            assert_eq!(gate.handler(), handlers[vector as usize]);
            assert_eq!(gate.selector(), SegmentSelector::KERNEL_CODE);
            assert_eq!(gate.to_bytes()[5], 0x8E);
        }
        assert!(!table.gate(EXCEPTION_VECTORS as u8).is_present());
        assert_eq!(table.present_count(), EXCEPTION_VECTORS);
    }

    #[test]
    fn hardware_gates_land_at_0x20() {
        let mut table = DescriptorTable::new();
        let handlers: [u32; IRQ_LINES] = fake_handlers(0x0020_0000);
        table.set_gates(IRQ_BASE_VECTOR, &handlers);

        assert!(!table.gate(0x1F).is_present());
        assert_eq!(table.gate(0x20).handler(), 0x0020_0000);
        assert_eq!(table.gate(0x2F).handler(), 0x0020_00F0);
        assert!(!table.gate(0x30).is_present());
    }

    #[test]
    fn set_gates_stops_at_the_last_vector() {
        let mut table = DescriptorTable::new();
        let handlers: [u32; 4] = fake_handlers(0x1000);
        table.set_gates(254, &handlers);
        assert_eq!(table.gate(254).handler(), 0x1000);
        assert_eq!(table.gate(255).handler(), 0x1010);
        assert_eq!(table.present_count(), 2);
    }

    #[test]
    fn reset_clears_installed_gates() {
        let mut table = DescriptorTable::new();
        table.set_gate(
            3,
            0xDEAD_BEEF,
            SegmentSelector::KERNEL_CODE,
            GateFlags::KERNEL_INTERRUPT,
        );
        assert!(table.gate(3).is_present());
        table.reset();
        assert_eq!(table.present_count(), 0);
    }

    #[test]
    fn install_rezeroes_the_global_table() {
        set_gate(
            0x80,
            0x1234,
            SegmentSelector::KERNEL_CODE,
            GateFlags::KERNEL_INTERRUPT,
        );
        assert!(gate(0x80).is_present());
        install();
        assert!(!gate(0x80).is_present());
        assert_eq!(IDT.lock().pointer().limit(), 2047);
    }
}
