//! Interrupt Descriptor Table layouts for 32-bit protected mode.
//!
//! A gate is exactly eight bytes:
//!
//! ```text
//!  0       2          4      5       6          8
//!  +-------+----------+------+-------+----------+
//!  | off lo| selector | zero | flags | off hi   |
//!  +-------+----------+------+-------+----------+
//! ```
//!
//! Serialization goes through [`GateDescriptor::to_bytes`] so the byte image
//! never depends on how the compiler lays out the struct.

use bitflags::bitflags;

use super::gdt::SegmentSelector;

/// Number of gates in the table.
pub const IDT_ENTRIES: usize = 256;

/// Size of one gate in bytes.
pub const GATE_DESCRIPTOR_SIZE: usize = 8;

/// Value loaded into the IDTR limit field: table size in bytes minus one.
pub const IDT_LIMIT: u16 = (IDT_ENTRIES * GATE_DESCRIPTOR_SIZE - 1) as u16;

/// Size of the packed IDTR operand.
pub const IDT_POINTER_SIZE: usize = 6;

bitflags! {
    /// Type/attribute byte of a gate.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct GateFlags: u8 {
        /// Gate is valid.
        const PRESENT = 1 << 7;
        /// Descriptor privilege level 3 (bits 5-6). Ring 0 is the absence of these bits.
        const DPL_RING3 = 3 << 5;
        /// 32-bit interrupt gate: IF is cleared on entry.
        const INTERRUPT_GATE_32 = 0x0E;

        /// Present, ring 0, 32-bit interrupt gate (0x8E).
        const KERNEL_INTERRUPT = Self::PRESENT.bits() | Self::INTERRUPT_GATE_32.bits();
    }
}

/// One 8-byte IDT gate.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GateDescriptor {
    offset_low: u16,
    selector: u16,
    zero: u8,
    flags: u8,
    offset_high: u16,
}

const _: () = assert!(core::mem::size_of::<GateDescriptor>() == GATE_DESCRIPTOR_SIZE);

impl GateDescriptor {
    /// A non-present, all-zero gate.
    pub const MISSING: Self = Self {
        offset_low: 0,
        selector: 0,
        zero: 0,
        flags: 0,
        offset_high: 0,
    };

    pub const fn new(handler: u32, selector: SegmentSelector, flags: GateFlags) -> Self {
        Self {
            offset_low: (handler & 0xFFFF) as u16,
            selector: selector.bits(),
            zero: 0,
            flags: flags.bits(),
            offset_high: (handler >> 16) as u16,
        }
    }

    /// Handler address reassembled from both halves.
    #[inline]
    pub const fn handler(&self) -> u32 {
        ((self.offset_high as u32) << 16) | self.offset_low as u32
    }

    #[inline]
    pub const fn selector(&self) -> SegmentSelector {
        SegmentSelector(self.selector)
    }

    #[inline]
    pub const fn flags(&self) -> GateFlags {
        GateFlags::from_bits_retain(self.flags)
    }

    #[inline]
    pub const fn is_present(&self) -> bool {
        self.flags & GateFlags::PRESENT.bits() != 0
    }

    /// Little-endian byte image exactly as the CPU reads it.
    pub const fn to_bytes(&self) -> [u8; GATE_DESCRIPTOR_SIZE] {
        let lo = self.offset_low.to_le_bytes();
        let sel = self.selector.to_le_bytes();
        let hi = self.offset_high.to_le_bytes();
        [lo[0], lo[1], sel[0], sel[1], self.zero, self.flags, hi[0], hi[1]]
    }

    pub const fn from_bytes(bytes: [u8; GATE_DESCRIPTOR_SIZE]) -> Self {
        Self {
            offset_low: u16::from_le_bytes([bytes[0], bytes[1]]),
            selector: u16::from_le_bytes([bytes[2], bytes[3]]),
            zero: bytes[4],
            flags: bytes[5],
            offset_high: u16::from_le_bytes([bytes[6], bytes[7]]),
        }
    }
}

/// Operand of `lidt`: table limit followed by the linear base address.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdtPointer {
    limit: u16,
    base: u32,
}

const _: () = assert!(core::mem::size_of::<IdtPointer>() == IDT_POINTER_SIZE);

impl IdtPointer {
    /// Pointer covering a full 256-gate table at `base`.
    pub const fn new(base: u32) -> Self {
        Self {
            limit: IDT_LIMIT,
            base,
        }
    }

    #[inline]
    pub const fn limit(&self) -> u16 {
        self.limit
    }

    #[inline]
    pub const fn base(&self) -> u32 {
        self.base
    }

    pub const fn to_bytes(&self) -> [u8; IDT_POINTER_SIZE] {
        let limit = self.limit.to_le_bytes();
        let base = self.base.to_le_bytes();
        [limit[0], limit[1], base[0], base[1], base[2], base[3]]
    }
}
