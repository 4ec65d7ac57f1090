//! Multiboot entry.
//!
//! The loader drops us in 32-bit protected mode with paging off and an
//! unknown GDT. `_start` installs a flat three-entry GDT so the selectors the
//! interrupt gates use are the ones we expect, sets up a stack and calls
//! [`kernel_main`](crate::kernel_main).

use core::arch::global_asm;

use cascade_abi::arch::x86::SegmentSelector;

const MULTIBOOT_MAGIC: u32 = 0x1BAD_B002;
/// Page-align modules, provide the memory map.
const MULTIBOOT_FLAGS: u32 = 0x0000_0003;
const MULTIBOOT_CHECKSUM: u32 = 0u32.wrapping_sub(MULTIBOOT_MAGIC.wrapping_add(MULTIBOOT_FLAGS));

const BOOT_STACK_SIZE: usize = 16 * 1024;

global_asm!(
    ".section .multiboot, \"a\"",
    ".balign 4",
    ".long {magic}",
    ".long {flags}",
    ".long {checksum}",
    "",
    ".section .rodata",
    ".balign 8",
    "boot_gdt:",
    "    .quad 0",
    "    .quad 0x00CF9A000000FFFF",
    "    .quad 0x00CF92000000FFFF",
    "boot_gdt_end:",
    "boot_gdt_descriptor:",
    "    .word boot_gdt_end - boot_gdt - 1",
    "    .long boot_gdt",
    "",
    ".section .bss",
    ".balign 16",
    "boot_stack_bottom:",
    "    .skip {stack_size}",
    "boot_stack_top:",
    "",
    ".section .text",
    ".global _start",
    ".type _start, @function",
    "_start:",
    "    cli",
    "    movl $boot_stack_top, %esp",
    "    lgdt boot_gdt_descriptor",
    "    ljmp ${code}, $.Lreload_segments",
    ".Lreload_segments:",
    "    movw ${data}, %ax",
    "    movw %ax, %ds",
    "    movw %ax, %es",
    "    movw %ax, %fs",
    "    movw %ax, %gs",
    "    movw %ax, %ss",
    "    call {entry}",
    ".Lhang:",
    "    cli",
    "    hlt",
    "    jmp .Lhang",
    magic = const MULTIBOOT_MAGIC,
    flags = const MULTIBOOT_FLAGS,
    checksum = const MULTIBOOT_CHECKSUM,
    stack_size = const BOOT_STACK_SIZE,
    code = const SegmentSelector::KERNEL_CODE.bits(),
    data = const SegmentSelector::KERNEL_DATA.bits(),
    entry = sym crate::kernel_main,
    options(att_syntax),
);
