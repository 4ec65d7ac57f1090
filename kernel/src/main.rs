#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]
#![forbid(unsafe_op_in_unsafe_fn)]

#[cfg(all(target_os = "none", target_arch = "x86"))]
mod boot;

#[cfg(all(target_os = "none", target_arch = "x86"))]
use kernel_image::kernel_main;

#[cfg(all(target_os = "none", target_arch = "x86"))]
mod kernel_image {
    use core::panic::PanicInfo;

    use cascade_core::{console, register_console, register_irq_hook};
    use cascade_drivers::keyboard::{self, KEY_DOWN, KEY_LEFT, KEY_RIGHT, KEY_UP};
    use cascade_drivers::vga::{
        Colour, ColourCode, VGA_WIDTH, vga_clear, vga_put_at, vga_set_colour,
    };
    use cascade_drivers::{VGA_CONSOLE, vga_init};
    use cascade_lib::{HardwarePorts, cpu, klog_error, klog_info, klog_init, klog_warn};

    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        klog_error!("kernel panic: {}", info);
        cpu::halt_loop();
    }

    const ESCAPE: u8 = 0x1B;
    const BANNER: ColourCode = ColourCode::new(Colour::LightGreen, Colour::Black);

    /// Marker in the top-right cell while hardware interrupts are live.
    fn draw_status() {
        vga_put_at(VGA_WIDTH - 1, 0, b'*', BANNER);
    }

    fn echo(key: u8) {
        let out = console();
        match key {
            ESCAPE => {
                vga_clear();
                draw_status();
            }
            KEY_UP => out.write_str("<up>"),
            KEY_DOWN => out.write_str("<down>"),
            KEY_LEFT => out.write_str("<left>"),
            KEY_RIGHT => out.write_str("<right>"),
            b'\n' => out.write_char('\n'),
            0x20..=0x7E => out.write_char(key as char),
            _ => {}
        }
    }

    pub(crate) extern "C" fn kernel_main() -> ! {
        klog_init();
        #[cfg(feature = "serial-log")]
        cascade_lib::klog_attach_serial();
        klog_info!("cascade: booting");

        vga_init();
        if let Err(err) = register_console(&VGA_CONSOLE) {
            klog_warn!("cascade: {}", err);
        }

        // SAFETY: ring 0 on the only CPU with interrupts off; the kernel
        // owns the PIC and PS/2 ports from here on.
        let mut ports = unsafe { HardwarePorts::new() };
        cascade_core::init(&mut ports);

        if let Err(err) = register_irq_hook(keyboard::on_irq) {
            klog_error!("cascade: {}", err);
        }
        if let Err(err) = keyboard::keyboard_init(&mut ports) {
            klog_error!("cascade: keyboard: {}", err);
        }

        vga_set_colour(BANNER);
        console().write_str("cascade: interrupts online, type away (esc clears)\n");
        vga_set_colour(ColourCode::DEFAULT);
        cpu::enable_interrupts();
        draw_status();
        klog_info!(
            "cascade: interrupts enabled (IF={})",
            cpu::interrupts_enabled()
        );

        loop {
            cpu::disable_interrupts();
            match keyboard::pop_char() {
                Some(key) => {
                    cpu::enable_interrupts();
                    echo(key);
                }
                None => cpu::enable_interrupts_and_halt(),
            }
        }
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}
