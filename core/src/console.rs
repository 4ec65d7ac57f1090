//! Diagnostic text output.
//!
//! The trap dispatcher does not own a display. Whatever device can show
//! text registers itself here once during boot; until then diagnostics go
//! nowhere.

use core::fmt;

use cascade_lib::InitFlag;
use spin::Once;

/// Minimal text sink. Called from interrupt context, so implementations
/// must not block.
pub trait Console: Sync {
    fn write_str(&self, s: &str);

    fn write_char(&self, c: char) {
        let mut buf = [0u8; 4];
        self.write_str(c.encode_utf8(&mut buf));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    AlreadyRegistered,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::AlreadyRegistered => f.write_str("console already registered"),
        }
    }
}

/// Discards everything.
pub struct NullConsole;

impl Console for NullConsole {
    fn write_str(&self, _s: &str) {}
}

static NULL_CONSOLE: NullConsole = NullConsole;
static CONSOLE_CLAIMED: InitFlag = InitFlag::new();
static CONSOLE: Once<&'static dyn Console> = Once::new();

pub fn register_console(console: &'static dyn Console) -> Result<(), ConsoleError> {
    if !CONSOLE_CLAIMED.init_once() {
        return Err(ConsoleError::AlreadyRegistered);
    }
    CONSOLE.call_once(|| console);
    Ok(())
}

/// The registered console, or a sink that drops output.
pub fn console() -> &'static dyn Console {
    match CONSOLE.get() {
        Some(console) => *console,
        None => &NULL_CONSOLE,
    }
}
