#![no_std]

pub mod cpu {
    use core::arch::asm;

    #[cfg(target_arch = "x86")]
    use cascade_abi::arch::x86::IdtPointer;

    /// Interrupt-enable bit of EFLAGS.
    pub const EFLAGS_IF: usize = 1 << 9;

    #[inline(always)]
    pub fn hlt() {
        unsafe {
            asm!("hlt", options(nomem, nostack, preserves_flags));
        }
    }

    #[inline(always)]
    pub fn enable_interrupts() {
        unsafe {
            asm!("sti", options(nomem, nostack));
        }
    }

    #[inline(always)]
    pub fn disable_interrupts() {
        unsafe {
            asm!("cli", options(nomem, nostack));
        }
    }

    /// Enable interrupts and halt in one step. `sti` holds off delivery for
    /// one instruction, so a wakeup cannot slip in before the `hlt`.
    #[inline(always)]
    pub fn enable_interrupts_and_halt() {
        unsafe {
            asm!("sti", "hlt", options(nomem, nostack));
        }
    }

    #[inline(always)]
    pub fn interrupts_enabled() -> bool {
        let flags: usize;
        unsafe {
            asm!("pushf", "pop {}", out(reg) flags, options(nomem, preserves_flags));
        }
        flags & EFLAGS_IF != 0
    }

    /// Stop this CPU for good: nothing but an NMI wakes it.
    #[inline(always)]
    pub fn halt_loop() -> ! {
        disable_interrupts();
        loop {
            hlt();
        }
    }

    /// Load IDTR from `idtr`.
    ///
    /// # Safety
    /// `idtr` must describe a table that stays valid and correctly populated
    /// for as long as interrupts can be delivered through it.
    #[cfg(target_arch = "x86")]
    #[inline(always)]
    pub unsafe fn load_idt(idtr: &IdtPointer) {
        unsafe {
            asm!("lidt [{}]", in(reg) idtr, options(readonly, nostack, preserves_flags));
        }
    }
}

pub mod init_flag;
pub mod io;
pub mod klog;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use init_flag::InitFlag;
pub use io::{HardwarePorts, PortIo};
pub use klog::{KlogLevel, klog_attach_serial, klog_get_level, klog_init, klog_set_level};
