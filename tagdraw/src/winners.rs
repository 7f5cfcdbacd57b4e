//! Process-wide winner set.
//!
//! `Empty -> Drawn -> Empty -> Drawn ...`. Reads of an empty set return no winners rather than an
//! error, clearing is idempotent, and the draw-if-empty path runs under the same lock as clear so
//! the two never interleave.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::info;

use crate::comment::EligibleEntry;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum WinnerSet {
    #[default]
    Empty,
    /// Ranked winners, first prize first. Never empty.
    Drawn(Vec<EligibleEntry>),
}

impl WinnerSet {
    /// A draw that produced nobody leaves the set empty.
    pub fn from_draw(winners: Vec<EligibleEntry>) -> Self {
        if winners.is_empty() {
            WinnerSet::Empty
        } else {
            WinnerSet::Drawn(winners)
        }
    }

    pub fn is_drawn(&self) -> bool {
        matches!(self, WinnerSet::Drawn(_))
    }

    pub fn winners(&self) -> &[EligibleEntry] {
        match self {
            WinnerSet::Empty => &[],
            WinnerSet::Drawn(w) => w,
        }
    }
}

/// Holder for the current draw. Handlers receive it by injection so the backing can change
/// without touching selection logic.
pub trait WinnerStore: Send + Sync {
    fn get(&self) -> WinnerSet;
    fn set(&self, set: WinnerSet);
    fn clear(&self);
    /// Returns the cached set, or runs `draw` and caches its result when the set is empty.
    fn get_or_draw(&self, draw: &mut dyn FnMut() -> Vec<EligibleEntry>) -> WinnerSet;
}

#[derive(Default)]
pub struct MemoryWinnerStore {
    inner: Mutex<WinnerSet>,
}

impl MemoryWinnerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, WinnerSet> {
        // Every write replaces the whole value, so a poisoned guard still holds a complete set.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WinnerStore for MemoryWinnerStore {
    fn get(&self) -> WinnerSet {
        self.lock().clone()
    }

    fn set(&self, set: WinnerSet) {
        info!("winner set replaced ({} winners)", set.winners().len());
        *self.lock() = set;
    }

    fn clear(&self) {
        let mut guard = self.lock();
        if guard.is_drawn() {
            info!("winner set cleared");
        }
        *guard = WinnerSet::Empty;
    }

    fn get_or_draw(&self, draw: &mut dyn FnMut() -> Vec<EligibleEntry>) -> WinnerSet {
        let mut guard = self.lock();
        if !guard.is_drawn() {
            *guard = WinnerSet::from_draw(draw());
            if guard.is_drawn() {
                info!("drew {} winners", guard.winners().len());
            }
        }
        guard.clone()
    }
}
