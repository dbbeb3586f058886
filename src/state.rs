//! Shared reading passed from the baro task to the display task.
//!
//! `Reading` is `Copy` so it can be read and written whole.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;

// ── Data types ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Reading {
    /// Smoothed temperature, °F.
    pub temperature: i32,
    /// Ground elevation, ft.
    pub elevation: i32,
    /// Height above the ground reference, ft.
    pub agl: i32,
}

// ── Shared cell ───────────────────────────────────────────────────────────────

/// Single-writer / single-reader reading, owned by the process root and lent
/// to both tasks.
///
/// The scheduler never runs two tasks at once, so the no-op mutex is enough;
/// it only makes the single-context assumption explicit in the type.
pub struct SharedReading {
    inner: Mutex<NoopRawMutex, Cell<Reading>>,
}

impl SharedReading {
    pub const fn new(initial: Reading) -> Self {
        Self {
            inner: Mutex::new(Cell::new(initial)),
        }
    }

    pub fn get(&self) -> Reading {
        self.inner.lock(|cell| cell.get())
    }

    pub fn set(&self, reading: Reading) {
        self.inner.lock(|cell| cell.set(reading));
    }

    /// Read-modify-write in one step.
    pub fn update(&self, f: impl FnOnce(&mut Reading)) {
        self.inner.lock(|cell| {
            let mut reading = cell.get();
            f(&mut reading);
            cell.set(reading);
        });
    }
}

impl Default for SharedReading {
    fn default() -> Self {
        Self::new(Reading::default())
    }
}
