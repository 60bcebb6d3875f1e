//! Process-wide monotonic id generator for [`LockId`](super::types::LockId)
//! and other objects that need a unique identifier.

use crate::core::types::LockId;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mints strictly increasing `LockId`s. Safe to call from any thread
/// concurrently; ids are never released or reused.
pub struct IdGen {
    next: AtomicUsize,
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGen {
    pub const fn new() -> Self {
        IdGen {
            next: AtomicUsize::new(1),
        }
    }

    /// Returns a value strictly greater than every value previously
    /// returned by this generator. Panics on overflow rather than silently
    /// wrapping and handing out a colliding id.
    pub fn next(&self) -> LockId {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        if id == usize::MAX {
            panic!("IdGen counter overflowed");
        }
        LockId(id)
    }
}

/// The process-wide lock id generator.
pub static LOCK_IDS: IdGen = IdGen::new();

/// Mint a new globally unique [`LockId`].
pub fn new_lock_id() -> LockId {
    LOCK_IDS.next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_strictly_increase() {
        let gen = IdGen::new();
        let a = gen.next();
        let b = gen.next();
        assert!(b.0 > a.0);
    }

    #[test]
    fn concurrent_ids_are_unique() {
        use std::collections::HashSet;
        use std::sync::Arc;
        use std::thread;

        let gen = Arc::new(IdGen::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gen = Arc::clone(&gen);
                thread::spawn(move || (0..200).map(|_| gen.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "duplicate id minted: {id:?}");
            }
        }
    }
}
