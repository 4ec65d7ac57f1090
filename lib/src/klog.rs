//! Leveled kernel log on the first serial port.
//!
//! Nothing reaches the UART until [`klog_attach_serial`] has programmed it,
//! so the logging macros are safe to call from host-side unit tests and from
//! code that runs before the port exists.

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicU8, Ordering};

use cascade_abi::arch::x86::Port;
use spin::{Mutex, Once};
use uart_16550::SerialPort;

use crate::init_flag::InitFlag;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum KlogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl KlogLevel {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => KlogLevel::Error,
            1 => KlogLevel::Warn,
            2 => KlogLevel::Info,
            3 => KlogLevel::Debug,
            _ => KlogLevel::Trace,
        }
    }

    const fn tag(self) -> &'static str {
        match self {
            KlogLevel::Error => "E",
            KlogLevel::Warn => "W",
            KlogLevel::Info => "I",
            KlogLevel::Debug => "D",
            KlogLevel::Trace => "T",
        }
    }
}

static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(KlogLevel::Info as u8);
static SERIAL_READY: InitFlag = InitFlag::new();
static SERIAL: Once<Mutex<SerialPort>> = Once::new();

#[inline(always)]
fn is_enabled(level: KlogLevel) -> bool {
    level as u8 <= CURRENT_LEVEL.load(Ordering::Relaxed)
}

pub fn is_enabled_level(level: KlogLevel) -> bool {
    is_enabled(level)
}

pub fn log_args(level: KlogLevel, args: fmt::Arguments<'_>) {
    if !is_enabled(level) || !SERIAL_READY.is_set_relaxed() {
        return;
    }
    let Some(serial) = SERIAL.get() else {
        return;
    };
    // A handler interrupting a line in progress on this CPU would spin
    // forever on the lock; its line is dropped instead.
    let Some(mut port) = serial.try_lock() else {
        return;
    };
    let _ = write!(port, "[{}] ", level.tag());
    let _ = port.write_fmt(args);
    let _ = port.write_str("\n");
}

pub fn klog_init() {
    CURRENT_LEVEL.store(KlogLevel::Info as u8, Ordering::Relaxed);
}

/// Program COM1 and start emitting log lines. Idempotent.
pub fn klog_attach_serial() {
    SERIAL.call_once(|| {
        // SAFETY: COM1 is owned by the kernel log and programmed exactly once.
        let mut port = unsafe { SerialPort::new(Port::COM1.number()) };
        port.init();
        Mutex::new(port)
    });
    SERIAL_READY.mark_set();
}

pub fn klog_is_attached() -> bool {
    SERIAL_READY.is_set()
}

pub fn klog_set_level(level: KlogLevel) {
    CURRENT_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn klog_get_level() -> KlogLevel {
    KlogLevel::from_raw(CURRENT_LEVEL.load(Ordering::Relaxed))
}

#[macro_export]
macro_rules! klog_error {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Error, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_warn {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Warn, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_info {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Info, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_debug {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Debug, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_trace {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Trace, ::core::format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_round_trips_and_filters() {
        klog_set_level(KlogLevel::Warn);
        assert_eq!(klog_get_level(), KlogLevel::Warn);
        assert!(is_enabled_level(KlogLevel::Error));
        assert!(!is_enabled_level(KlogLevel::Info));
        klog_init();
        assert_eq!(klog_get_level(), KlogLevel::Info);
    }

    #[test]
    fn unattached_log_is_silent() {
        assert!(!klog_is_attached());
        crate::klog_error!("trap {} before serial", 13);
        crate::klog_trace!("dropped");
    }
}
