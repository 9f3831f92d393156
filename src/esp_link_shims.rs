//! `critical-section` implementation for the ESP-IDF std runtime.
//!
//! The link mailbox sits behind a `CriticalSectionRawMutex`; on this
//! target it is backed by one process-wide mutex, re-entrant per thread.

#[cfg(target_os = "espidf")]
use core::cell::{Cell, RefCell};
#[cfg(target_os = "espidf")]
use std::sync::{Mutex, MutexGuard, PoisonError};

#[cfg(target_os = "espidf")]
static SECTION: Mutex<()> = Mutex::new(());

#[cfg(target_os = "espidf")]
thread_local! {
    static DEPTH: Cell<u8> = const { Cell::new(0) };
    static GUARD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            let lock = SECTION.lock().unwrap_or_else(PoisonError::into_inner);
            GUARD.with(|g| *g.borrow_mut() = Some(lock));
        }
        let d = d.saturating_add(1);
        depth.set(d);
        d
    })
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            return;
        }
        depth.set(d - 1);
        if d == 1 {
            GUARD.with(|g| *g.borrow_mut() = None);
        }
    });
}
