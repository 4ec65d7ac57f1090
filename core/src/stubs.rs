//! Entry stubs for the 32 exception vectors and the 16 hardware lines.
//!
//! Every stub is generated by one macro and does the same thing: mask
//! interrupts, make the stack look identical for every vector, and jump to a
//! shared entry. The shared entries save the general registers, hand the
//! pushed words to the Rust dispatchers and `iretd` back.
//!
//! Trap stack on entry to `trap_common`, lowest address first:
//!
//! ```text
//!   vector | error code | eip | cs | eflags
//! ```
//!
//! Exceptions that come without a CPU error code get a zero pushed in its
//! place, so the error code is always at the same offset.
//!
//! The interrupted stack has no alignment guarantee. Both shared entries keep
//! the post-`pushad` ESP in EBP, round ESP down to 16 bytes so the Rust call
//! sees an aligned stack, and restore ESP from EBP before `popad`.

use core::arch::naked_asm;

use cascade_abi::arch::x86::trap::{
    EXCEPTION_VECTORS, IRQ_BASE_VECTOR, IRQ_FRAME_LINE_OFFSET, IRQ_LINES, IRQ_STUB_PUSHED_BYTES,
    TRAP_FRAME_ERROR_CODE_OFFSET, TRAP_FRAME_VECTOR_OFFSET, TRAP_STUB_PUSHED_BYTES,
    pushes_error_code,
};
use cascade_lib::{PortIo, klog_info};

use crate::idt::{self, DescriptorTable};
use crate::{irq, pic, trap};

pub type EntryStub = unsafe extern "C" fn();

/// ESP alignment at every call into Rust.
const CALL_STACK_ALIGN: usize = 16;
/// Padding below the aligned ESP so the pushed arguments end on a boundary.
const TRAP_CALL_PAD: usize = CALL_STACK_ALIGN - 2 * size_of::<u32>();
const IRQ_CALL_PAD: usize = CALL_STACK_ALIGN - size_of::<u32>();

#[unsafe(naked)]
unsafe extern "C" fn trap_common() {
    naked_asm!(
        "pushad",
        "cld",
        "mov eax, [esp + {vector}]",
        "mov edx, [esp + {error_code}]",
        "mov ebp, esp",
        "and esp, {align_mask}",
        "sub esp, {pad}",
        "push edx",
        "push eax",
        "call {entry}",
        "mov esp, ebp",
        "popad",
        "add esp, {pushed}",
        "iretd",
        vector = const TRAP_FRAME_VECTOR_OFFSET,
        error_code = const TRAP_FRAME_ERROR_CODE_OFFSET,
        pushed = const TRAP_STUB_PUSHED_BYTES,
        align_mask = const -(CALL_STACK_ALIGN as i32),
        pad = const TRAP_CALL_PAD,
        entry = sym trap::trap_entry,
    );
}

#[unsafe(naked)]
unsafe extern "C" fn irq_common() {
    naked_asm!(
        "pushad",
        "cld",
        "mov eax, [esp + {line}]",
        "mov ebp, esp",
        "and esp, {align_mask}",
        "sub esp, {pad}",
        "push eax",
        "call {entry}",
        "mov esp, ebp",
        "popad",
        "add esp, {pushed}",
        "iretd",
        line = const IRQ_FRAME_LINE_OFFSET,
        pushed = const IRQ_STUB_PUSHED_BYTES,
        align_mask = const -(CALL_STACK_ALIGN as i32),
        pad = const IRQ_CALL_PAD,
        entry = sym irq::irq_entry,
    );
}

macro_rules! trap_stubs {
    (@stub $vector:literal, no_code) => {
        paste::paste! {
            const _: () = assert!(!pushes_error_code($vector));

            #[unsafe(naked)]
            unsafe extern "C" fn [<trap_stub_ $vector>]() {
                naked_asm!(
                    "cli",
                    "push 0",
                    "push {vector}",
                    "jmp {common}",
                    vector = const $vector,
                    common = sym trap_common,
                );
            }
        }
    };
    (@stub $vector:literal, cpu_code) => {
        paste::paste! {
            const _: () = assert!(pushes_error_code($vector));

            #[unsafe(naked)]
            unsafe extern "C" fn [<trap_stub_ $vector>]() {
                naked_asm!(
                    "cli",
                    "push {vector}",
                    "jmp {common}",
                    vector = const $vector,
                    common = sym trap_common,
                );
            }
        }
    };
    ($($vector:literal => $kind:ident),* $(,)?) => {
        paste::paste! {
            $(trap_stubs!(@stub $vector, $kind);)*

            /// Exception stubs indexed by vector.
            pub static TRAP_STUBS: [EntryStub; EXCEPTION_VECTORS] = [$([<trap_stub_ $vector>]),*];
        }
    };
}

macro_rules! irq_stubs {
    ($($line:literal),* $(,)?) => {
        paste::paste! {
            $(
                #[unsafe(naked)]
                unsafe extern "C" fn [<irq_stub_ $line>]() {
                    naked_asm!(
                        "cli",
                        "push {line}",
                        "jmp {common}",
                        line = const $line,
                        common = sym irq_common,
                    );
                }
            )*

            /// Hardware line stubs indexed by line number.
            pub static IRQ_STUBS: [EntryStub; IRQ_LINES] = [$([<irq_stub_ $line>]),*];
        }
    };
}

trap_stubs! {
    0 => no_code, 1 => no_code, 2 => no_code, 3 => no_code,
    4 => no_code, 5 => no_code, 6 => no_code, 7 => no_code,
    8 => cpu_code, 9 => no_code, 10 => cpu_code, 11 => cpu_code,
    12 => cpu_code, 13 => cpu_code, 14 => cpu_code, 15 => no_code,
    16 => no_code, 17 => cpu_code, 18 => no_code, 19 => no_code,
    20 => no_code, 21 => no_code, 22 => no_code, 23 => no_code,
    24 => no_code, 25 => no_code, 26 => no_code, 27 => no_code,
    28 => no_code, 29 => no_code, 30 => no_code, 31 => no_code,
}

irq_stubs!(0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15);

fn stub_addresses<const N: usize>(stubs: &[EntryStub; N]) -> [u32; N] {
    core::array::from_fn(|i| stubs[i] as usize as u32)
}

fn write_trap_gates(table: &mut DescriptorTable) {
    table.set_gates(0, &stub_addresses(&TRAP_STUBS));
}

fn write_irq_gates(table: &mut DescriptorTable) {
    table.set_gates(IRQ_BASE_VECTOR, &stub_addresses(&IRQ_STUBS));
}

/// Point vectors 0..32 at the exception stubs.
pub fn install_trap_gates() {
    idt::with_table(write_trap_gates);
    klog_info!("idt: {} exception gates installed", EXCEPTION_VECTORS);
}

/// Remap the controllers and point vectors 0x20..0x30 at the line stubs.
/// Every line is left masked.
pub fn install_irq_gates<P: PortIo>(ports: &mut P) {
    pic::remap(ports);
    idt::with_table(write_irq_gates);
    klog_info!(
        "idt: {} hardware gates installed at 0x{:02x}",
        IRQ_LINES,
        IRQ_BASE_VECTOR
    );
}
