//! One-shot initialization flag.
//!
//! Subsystems that must be brought up in a fixed order (serial before the
//! first log line, console before the first trap message) keep one of these
//! statics instead of a bare `AtomicBool` with hand-written accessors.
//!
//! # Memory Ordering
//!
//! - `init_once()` uses `SeqCst` swap so exactly one caller wins
//! - `mark_set()` uses `Release` to publish initialization side-effects
//! - `is_set()` uses `Acquire` to observe them
//! - `is_set_relaxed()` is for guards that only need a fast early exit

use core::sync::atomic::{AtomicBool, Ordering};

#[repr(transparent)]
pub struct InitFlag {
    flag: AtomicBool,
}

impl InitFlag {
    #[inline]
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Returns `true` for the single caller that flipped the flag.
    #[inline]
    pub fn init_once(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_set_relaxed(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Mark a staged initialization as complete.
    #[inline]
    pub fn mark_set(&self) {
        self.flag.store(true, Ordering::Release);
    }
}

impl Default for InitFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_first_init_wins() {
        let flag = InitFlag::new();
        assert!(!flag.is_set());
        assert!(flag.init_once());
        assert!(!flag.init_once());
        assert!(flag.is_set());
    }

    #[test]
    fn staged_set_blocks_a_later_init() {
        let flag = InitFlag::new();
        assert!(!flag.is_set_relaxed());
        flag.mark_set();
        assert!(flag.is_set_relaxed());
        assert!(flag.is_set());
        assert!(!flag.init_once());
    }
}
