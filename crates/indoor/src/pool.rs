//! Free-list pools for polygons and portals.
//!
//! Compilation creates and destroys polygons and portals constantly while
//! cells are split. A [`Pool`] keeps every value in one slot map, so a freed
//! slot is handed straight back out by the next allocation instead of going
//! through the global allocator. Pools belong to a single compilation;
//! [`Pool::rewind`] frees everything at once and dropping the pool releases
//! the storage.

use std::ops::{Index, IndexMut};

use slotmap::{Key, SlotMap};

use crate::keys::{PolygonKey, PortalKey};
use crate::{Polygon, Portal};

/// Pool of polygons owned by map planes.
pub type PolygonPool = Pool<PolygonKey, Polygon>;

/// Pool of portals shared between cells.
pub type PortalPool = Pool<PortalKey, Portal>;

/// Allocation counters for a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Values currently allocated.
    pub live: usize,
    /// Largest number of simultaneously live values.
    pub high_water: usize,
    /// Allocations in total.
    pub allocations: usize,
    /// Allocations served from a previously freed slot.
    pub reused: usize,
}

/// Arena with a free list, keyed by `K`.
#[derive(Debug)]
pub struct Pool<K: Key, T> {
    slots: SlotMap<K, T>,
    high_water: usize,
    allocations: usize,
    reused: usize,
}

impl<K: Key, T> Default for Pool<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, T> Pool<K, T> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            high_water: 0,
            allocations: 0,
            reused: 0,
        }
    }

    /// Stores `value`, reusing a freed slot when one is available.
    pub fn alloc(&mut self, value: T) -> K {
        // Freed slots are recycled before the map grows.
        if self.slots.len() < self.high_water {
            self.reused += 1;
        }
        self.allocations += 1;

        let key = self.slots.insert(value);
        self.high_water = self.high_water.max(self.slots.len());
        key
    }

    /// Frees the slot behind `key`, returning its value.
    pub fn free(&mut self, key: K) -> Option<T> {
        self.slots.remove(key)
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<&T> {
        self.slots.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.slots.get_mut(key)
    }

    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.slots.contains_key(key)
    }

    /// Number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Frees every outstanding value. Slots stay allocated for reuse.
    pub fn rewind(&mut self) {
        self.slots.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.slots.iter()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            live: self.slots.len(),
            high_water: self.high_water,
            allocations: self.allocations,
            reused: self.reused,
        }
    }
}

impl<K: Key, T> Index<K> for Pool<K, T> {
    type Output = T;

    fn index(&self, key: K) -> &T {
        &self.slots[key]
    }
}

impl<K: Key, T> IndexMut<K> for Pool<K, T> {
    fn index_mut(&mut self, key: K) -> &mut T {
        &mut self.slots[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_triangle(offset: f64) -> Polygon {
        Polygon::from_coords(&[
            [offset, 0.0, 0.0],
            [offset + 1.0, 0.0, 0.0],
            [offset, 1.0, 0.0],
        ])
    }

    #[test]
    fn alloc_and_free() {
        let mut pool = PolygonPool::new();
        let a = pool.alloc(make_triangle(0.0));
        let b = pool.alloc(make_triangle(1.0));

        assert_eq!(pool.len(), 2);
        assert_eq!(pool[b], make_triangle(1.0));

        assert_eq!(pool.free(a), Some(make_triangle(0.0)));
        assert!(!pool.contains(a));
        assert!(pool.free(a).is_none());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut pool = PolygonPool::new();
        let a = pool.alloc(make_triangle(0.0));
        pool.alloc(make_triangle(1.0));
        pool.free(a);

        let c = pool.alloc(make_triangle(2.0));
        let stats = pool.stats();
        assert_eq!(stats.allocations, 3);
        assert_eq!(stats.reused, 1);
        assert_eq!(stats.high_water, 2);

        // The stale key does not alias the new value.
        assert!(pool.get(a).is_none());
        assert_eq!(pool[c], make_triangle(2.0));
    }

    #[test]
    fn rewind_frees_everything() {
        let mut pool = PolygonPool::new();
        for i in 0..5 {
            pool.alloc(make_triangle(i as f64));
        }
        pool.rewind();
        assert!(pool.is_empty());

        pool.alloc(make_triangle(9.0));
        assert_eq!(pool.stats().reused, 1);
    }
}
