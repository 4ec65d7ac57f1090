//! Exception vectors, hardware line vectors and the stack frames the entry
//! stubs build for the dispatchers.

use core::mem::{offset_of, size_of};

/// Number of CPU exception vectors.
pub const EXCEPTION_VECTORS: usize = 32;

pub const EXCEPTION_DIVIDE_ERROR: u8 = 0;
pub const EXCEPTION_DEBUG: u8 = 1;
pub const EXCEPTION_NMI: u8 = 2;
pub const EXCEPTION_BREAKPOINT: u8 = 3;
pub const EXCEPTION_OVERFLOW: u8 = 4;
pub const EXCEPTION_BOUND_RANGE: u8 = 5;
pub const EXCEPTION_INVALID_OPCODE: u8 = 6;
pub const EXCEPTION_DEVICE_NOT_AVAIL: u8 = 7;
pub const EXCEPTION_DOUBLE_FAULT: u8 = 8;
pub const EXCEPTION_INVALID_TSS: u8 = 10;
pub const EXCEPTION_SEGMENT_NOT_PRES: u8 = 11;
pub const EXCEPTION_STACK_FAULT: u8 = 12;
pub const EXCEPTION_GENERAL_PROTECTION: u8 = 13;
pub const EXCEPTION_PAGE_FAULT: u8 = 14;
pub const EXCEPTION_FPU_ERROR: u8 = 16;
pub const EXCEPTION_ALIGNMENT_CHECK: u8 = 17;
pub const EXCEPTION_MACHINE_CHECK: u8 = 18;
pub const EXCEPTION_SIMD_FP_EXCEPTION: u8 = 19;

/// Vector of hardware line 0 after the PIC remap.
pub const IRQ_BASE_VECTOR: u8 = 0x20;

/// Number of legacy hardware lines (two cascaded 8259s).
pub const IRQ_LINES: usize = 16;

/// Short mnemonics printed by the trap diagnostics. Reserved slots print
/// their own number.
pub const EXCEPTION_MNEMONICS: [&str; EXCEPTION_VECTORS] = [
    "DE", "DB", "NMI", "BP", "OF", "BR", "UD", "NM", //
    "DF", "CSO", "TS", "NP", "SS", "GP", "PF", "15", //
    "MF", "AC", "MC", "XF", "20", "21", "22", "23", //
    "24", "25", "26", "27", "28", "29", "30", "31",
];

/// Printed for a vector outside the exception range.
pub const UNKNOWN_MNEMONIC: &str = "??";

pub fn exception_mnemonic(vector: u32) -> &'static str {
    EXCEPTION_MNEMONICS
        .get(vector as usize)
        .copied()
        .unwrap_or(UNKNOWN_MNEMONIC)
}

/// Whether the CPU pushes an error code before entering the handler for
/// `vector`. Fixed by the architecture.
pub const fn pushes_error_code(vector: u8) -> bool {
    matches!(
        vector,
        EXCEPTION_DOUBLE_FAULT
            | EXCEPTION_INVALID_TSS
            | EXCEPTION_SEGMENT_NOT_PRES
            | EXCEPTION_STACK_FAULT
            | EXCEPTION_GENERAL_PROTECTION
            | EXCEPTION_PAGE_FAULT
            | EXCEPTION_ALIGNMENT_CHECK
    )
}

/// Exceptions the kernel never resumes from at ring 0.
pub const fn is_critical_exception(vector: u32) -> bool {
    vector == EXCEPTION_DOUBLE_FAULT as u32
        || vector == EXCEPTION_GENERAL_PROTECTION as u32
        || vector == EXCEPTION_PAGE_FAULT as u32
}

/// Register block saved by `pushad`, lowest address first.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PushadRegisters {
    pub edi: u32,
    pub esi: u32,
    pub ebp: u32,
    /// Value of ESP before `pushad`; ignored by `popad`.
    pub esp: u32,
    pub ebx: u32,
    pub edx: u32,
    pub ecx: u32,
    pub eax: u32,
}

/// Stack image seen by the shared trap entry after `pushad`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrapFrame {
    pub regs: PushadRegisters,
    pub vector: u32,
    pub error_code: u32,
    pub eip: u32,
    pub cs: u32,
    pub eflags: u32,
}

/// Stack image seen by the shared hardware entry after `pushad`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IrqFrame {
    pub regs: PushadRegisters,
    pub line: u32,
    pub eip: u32,
    pub cs: u32,
    pub eflags: u32,
}

/// Offset of the vector number from ESP inside the trap entry.
pub const TRAP_FRAME_VECTOR_OFFSET: usize = offset_of!(TrapFrame, vector);
/// Offset of the error code from ESP inside the trap entry.
pub const TRAP_FRAME_ERROR_CODE_OFFSET: usize = offset_of!(TrapFrame, error_code);
/// Bytes pushed by a trap stub (error code and vector).
pub const TRAP_STUB_PUSHED_BYTES: usize = 2 * size_of::<u32>();

/// Offset of the line number from ESP inside the hardware entry.
pub const IRQ_FRAME_LINE_OFFSET: usize = offset_of!(IrqFrame, line);
/// Bytes pushed by a hardware stub (line number).
pub const IRQ_STUB_PUSHED_BYTES: usize = size_of::<u32>();

const _: () = assert!(size_of::<PushadRegisters>() == 32);
const _: () = assert!(TRAP_FRAME_VECTOR_OFFSET == 32);
const _: () = assert!(TRAP_FRAME_ERROR_CODE_OFFSET == 36);
const _: () = assert!(IRQ_FRAME_LINE_OFFSET == 32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_vectors_match_the_architecture() {
        let with_code: [u8; 7] = [8, 10, 11, 12, 13, 14, 17];
        for vector in 0..EXCEPTION_VECTORS as u8 {
            assert_eq!(
                pushes_error_code(vector),
                with_code.contains(&vector),
                "vector {vector}"
            );
        }
    }

    #[test]
    fn critical_set_is_df_gp_pf() {
        let critical: [u32; 3] = [8, 13, 14];
        for vector in 0..64u32 {
            assert_eq!(is_critical_exception(vector), critical.contains(&vector));
        }
    }

    #[test]
    fn mnemonics_cover_the_table_and_fall_back() {
        assert_eq!(exception_mnemonic(0), "DE");
        assert_eq!(exception_mnemonic(13), "GP");
        assert_eq!(exception_mnemonic(14), "PF");
        assert_eq!(exception_mnemonic(31), "31");
        assert_eq!(exception_mnemonic(32), UNKNOWN_MNEMONIC);
        assert_eq!(exception_mnemonic(u32::MAX), UNKNOWN_MNEMONIC);
    }

    #[test]
    fn frames_end_with_the_cpu_return_context() {
        assert_eq!(offset_of!(TrapFrame, eip), 40);
        assert_eq!(size_of::<TrapFrame>(), 52);
        assert_eq!(offset_of!(IrqFrame, eip), 36);
        assert_eq!(size_of::<IrqFrame>(), 48);
    }
}
