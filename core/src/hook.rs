//! The device hook: one callback that receives every hardware line.
//!
//! Drivers do not get a per-line registry. The single registered hook
//! branches on the line number itself; until something registers, lines are
//! acknowledged and otherwise ignored.

use core::fmt;

use cascade_lib::{InitFlag, klog_info};
use spin::Once;

/// Called with the line number (0..16) once per delivered signal, before the
/// controller is acknowledged. Runs with interrupts disabled and must not
/// block.
pub type IrqHook = fn(line: u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookError {
    AlreadyRegistered,
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookError::AlreadyRegistered => f.write_str("device hook already registered"),
        }
    }
}

/// Write-once callback slot.
pub struct HookSlot {
    claimed: InitFlag,
    hook: Once<IrqHook>,
}

impl HookSlot {
    pub const fn new() -> Self {
        Self {
            claimed: InitFlag::new(),
            hook: Once::new(),
        }
    }

    pub fn register(&self, hook: IrqHook) -> Result<(), HookError> {
        if !self.claimed.init_once() {
            return Err(HookError::AlreadyRegistered);
        }
        self.hook.call_once(|| hook);
        Ok(())
    }

    pub fn is_registered(&self) -> bool {
        self.hook.is_completed()
    }

    /// Run the hook for `line`; a no-op while the slot is empty.
    #[inline]
    pub fn invoke(&self, line: u8) {
        if let Some(hook) = self.hook.get() {
            hook(line);
        }
    }
}

impl Default for HookSlot {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) static IRQ_HOOK: HookSlot = HookSlot::new();

/// Install the system-wide device hook. Only the first call succeeds.
pub fn register_irq_hook(hook: IrqHook) -> Result<(), HookError> {
    IRQ_HOOK.register(hook)?;
    klog_info!("irq: device hook registered");
    Ok(())
}
