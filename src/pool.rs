//! A recycling arena for short-lived records.
//!
//! A sweep allocates many small records (edges, output points, tree nodes)
//! and throws all of them away at once. A [`Pool`] keeps those records in a
//! single `Vec`, hands out typed [`Handle`]s, and on [`Pool::reclaim_all`]
//! marks every slot as free again without giving the memory back. The next
//! sweep then reuses the same slots in order.
//!
//! Reclaiming is O(active) because each reclaimed record is [reset](Recycle::reset)
//! to a blank state; [`Pool::release`] actually frees the storage.

use std::marker::PhantomData;

/// A typed index into a [`Pool`].
pub trait Handle: Copy {
    /// Builds a handle from a raw slot number.
    fn from_slot(slot: usize) -> Self;

    /// The raw slot number of this handle.
    fn slot(self) -> usize;
}

impl Handle for usize {
    fn from_slot(slot: usize) -> Self {
        slot
    }

    fn slot(self) -> usize {
        self
    }
}

/// A record that can live in a [`Pool`].
pub trait Recycle: Default {
    /// Returns the record to a blank state when its pool is reclaimed.
    ///
    /// The default replaces the record wholesale; records that own buffers
    /// can override this to clear them and keep their capacity.
    fn reset(&mut self) {
        *self = Self::default();
    }

    /// Called when a previously used slot is handed out again.
    fn recycled(&mut self) {}
}

/// An arena of `T` addressed by handles of type `H`.
pub struct Pool<H, T> {
    items: Vec<T>,
    active: usize,
    created: usize,
    generation: u64,
    _handle: PhantomData<fn() -> H>,
}

impl<H, T> Default for Pool<H, T> {
    fn default() -> Self {
        Pool {
            items: Vec::new(),
            active: 0,
            created: 0,
            generation: 0,
            _handle: PhantomData,
        }
    }
}

impl<H, T: Clone> Clone for Pool<H, T> {
    fn clone(&self) -> Self {
        Pool {
            items: self.items.clone(),
            active: self.active,
            created: self.created,
            generation: self.generation,
            _handle: PhantomData,
        }
    }
}

impl<H: Handle + std::fmt::Debug, T: std::fmt::Debug> std::fmt::Debug for Pool<H, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_map();
        for (i, item) in self.items[..self.active].iter().enumerate() {
            list.entry(&H::from_slot(i), item);
        }
        list.finish()
    }
}

impl<H: Handle, T: Recycle> Pool<H, T> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a blank record, reusing a reclaimed slot if there is one.
    pub fn claim(&mut self) -> H {
        let slot = self.active;
        if let Some(item) = self.items.get_mut(slot) {
            item.recycled();
        } else {
            self.items.push(T::default());
            self.created += 1;
        }
        self.active += 1;
        H::from_slot(slot)
    }

    /// Hands out a record initialized by `init`.
    pub fn claim_with(&mut self, init: impl FnOnce(&mut T)) -> H {
        let h = self.claim();
        init(&mut self.items[h.slot()]);
        h
    }

    /// Marks every record as free. Storage is kept for reuse.
    ///
    /// All outstanding handles become stale.
    pub fn reclaim_all(&mut self) {
        for item in &mut self.items[..self.active] {
            item.reset();
        }
        self.active = 0;
        self.generation += 1;
    }

    /// Drops all storage, active or not.
    pub fn release(&mut self) {
        self.items = Vec::new();
        self.active = 0;
        self.generation += 1;
    }

    /// The number of records currently handed out.
    pub fn len(&self) -> usize {
        self.active
    }

    /// Whether no records are currently handed out.
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// The number of records held, active or not.
    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    /// The number of records ever allocated by this pool.
    ///
    /// Recycled slots don't count, so this stops growing once a workload
    /// reaches its steady state.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Incremented every time the pool is reclaimed or released.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Iterates over all active handles, in the order they were claimed.
    pub fn handles(&self) -> impl DoubleEndedIterator<Item = H> {
        (0..self.active).map(H::from_slot)
    }

    /// Iterates over all active records and their handles.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (H, &T)> + '_ {
        self.items[..self.active]
            .iter()
            .enumerate()
            .map(|(i, t)| (H::from_slot(i), t))
    }

    /// Returns the record for `h`, or `None` if the slot isn't active.
    pub fn get(&self, h: H) -> Option<&T> {
        self.items[..self.active].get(h.slot())
    }
}

impl<H: Handle, T> std::ops::Index<H> for Pool<H, T> {
    type Output = T;

    fn index(&self, index: H) -> &T {
        debug_assert!(index.slot() < self.active, "stale pool handle");
        &self.items[index.slot()]
    }
}

impl<H: Handle, T> std::ops::IndexMut<H> for Pool<H, T> {
    fn index_mut(&mut self, index: H) -> &mut T {
        debug_assert!(index.slot() < self.active, "stale pool handle");
        &mut self.items[index.slot()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Rec {
        value: i32,
        buf: Vec<u8>,
        reuses: u32,
    }

    impl Recycle for Rec {
        fn reset(&mut self) {
            self.value = 0;
            self.buf.clear();
        }

        fn recycled(&mut self) {
            self.reuses += 1;
        }
    }

    #[test]
    fn claim_and_reclaim() {
        let mut pool = Pool::<usize, Rec>::new();
        let a = pool.claim_with(|r| r.value = 3);
        let b = pool.claim();
        assert_eq!((a, b), (0, 1));
        assert_eq!(pool[a].value, 3);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.created(), 2);

        pool.reclaim_all();
        assert!(pool.is_empty());
        assert_eq!(pool.capacity(), 2);
        assert_eq!(pool.generation(), 1);
        assert_eq!(pool.get(a), None);

        let c = pool.claim();
        assert_eq!(c, 0);
        assert_eq!(pool[c].value, 0);
        assert_eq!(pool[c].reuses, 1);
        assert_eq!(pool.created(), 2);
    }

    #[test]
    fn reset_keeps_capacity() {
        let mut pool = Pool::<usize, Rec>::new();
        let a = pool.claim();
        pool[a].buf.extend_from_slice(&[1, 2, 3, 4]);
        pool.reclaim_all();
        let a = pool.claim();
        assert!(pool[a].buf.is_empty());
        assert!(pool[a].buf.capacity() >= 4);
    }

    #[test]
    fn steady_state_allocates_nothing() {
        let mut pool = Pool::<usize, Rec>::new();
        for round in 0..10 {
            for _ in 0..(if round % 2 == 0 { 50 } else { 20 }) {
                pool.claim();
            }
            pool.reclaim_all();
        }
        assert_eq!(pool.created(), 50);
        assert_eq!(pool.generation(), 10);
    }

    #[test]
    fn release_frees_storage() {
        let mut pool = Pool::<usize, Rec>::new();
        pool.claim();
        pool.claim();
        pool.release();
        assert_eq!(pool.capacity(), 0);
        assert_eq!(pool.len(), 0);
        pool.claim();
        assert_eq!(pool.created(), 3);
    }

    #[test]
    fn iteration_order() {
        let mut pool = Pool::<usize, Rec>::new();
        for v in 0..4 {
            pool.claim_with(|r| r.value = v * 10);
        }
        let values: Vec<_> = pool.iter().map(|(h, r)| (h, r.value)).collect();
        assert_eq!(values, vec![(0, 0), (1, 10), (2, 20), (3, 30)]);
        assert_eq!(pool.handles().rev().next(), Some(3));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "stale pool handle")]
    fn stale_handle_panics() {
        let mut pool = Pool::<usize, Rec>::new();
        let a = pool.claim();
        pool.reclaim_all();
        let _ = &pool[a];
    }
}
