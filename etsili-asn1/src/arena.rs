//! Fixed-block item arena
//!
//! The decoder churns through large numbers of small, identically-sized
//! descriptors (decoded items, search results). Rather than hitting the
//! allocator for each one, items live in blobs of `items_per_blob` slots
//! that are bump-allocated and recycled wholesale once every slot in a blob
//! has been released.
//!
//! Slots are addressed by [`SlotRef`] (blob index + slot index) instead of
//! pointers, so links between items stay valid however the pool grows.

/// Number of fully-idle blobs kept around for reuse before surplus blob
/// storage is returned to the allocator.
const MAX_IDLE_BLOBS: usize = 20;

/// Stable handle for one slot in an [`ItemPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    blob: u32,
    slot: u32,
}

struct Blob<T> {
    slots: Box<[T]>,
    next_avail: u32,
    released: u32,
}

impl<T: Default> Blob<T> {
    fn new(items_per_blob: u32) -> Self {
        let slots = (0..items_per_blob).map(|_| T::default()).collect();
        Blob {
            slots,
            next_avail: 0,
            released: 0,
        }
    }

    fn reset(&mut self) {
        self.next_avail = 0;
        self.released = 0;
    }
}

/// Slab pool of fixed-size items.
///
/// `acquire` bumps a cursor through the current blob. When the blob is
/// exhausted: if the caller has already released every slot in it, the blob
/// is reset in place; otherwise an idle blob is reused, or a fresh one
/// allocated. `release` only counts; once a non-current blob is fully
/// released it joins the idle list, capped at [`MAX_IDLE_BLOBS`].
pub struct ItemPool<T> {
    items_per_blob: u32,
    blobs: Vec<Option<Blob<T>>>,
    current: u32,
    idle: Vec<u32>,
    tombstones: Vec<u32>,
}

impl<T: Default> ItemPool<T> {
    pub fn new(items_per_blob: u32) -> Self {
        assert!(items_per_blob > 0);
        ItemPool {
            items_per_blob,
            blobs: vec![Some(Blob::new(items_per_blob))],
            current: 0,
            idle: Vec::new(),
            tombstones: Vec::new(),
        }
    }

    fn current_blob(&mut self) -> &mut Blob<T> {
        self.blobs[self.current as usize]
            .as_mut()
            .expect("current blob is always live")
    }

    /// Hand out the next free slot, rolling over to a fresh blob when the
    /// current one is full.
    pub fn acquire(&mut self) -> SlotRef {
        if self.current_blob().next_avail >= self.items_per_blob {
            let cur = self.current_blob();
            if cur.released == cur.next_avail {
                // Caller releases as fast as it allocates; reuse in place.
                cur.reset();
            } else if let Some(idx) = self.idle.pop() {
                self.blobs[idx as usize]
                    .as_mut()
                    .expect("idle blobs are live")
                    .reset();
                self.current = idx;
            } else {
                let blob = Blob::new(self.items_per_blob);
                if let Some(idx) = self.tombstones.pop() {
                    self.blobs[idx as usize] = Some(blob);
                    self.current = idx;
                } else {
                    self.blobs.push(Some(blob));
                    self.current = (self.blobs.len() - 1) as u32;
                }
            }
        }

        let blob_idx = self.current;
        let cur = self.current_blob();
        let slot = cur.next_avail;
        cur.next_avail += 1;
        cur.slots[slot as usize] = T::default();
        SlotRef {
            blob: blob_idx,
            slot,
        }
    }

    /// Return a slot. The slot's contents are not touched; only once every
    /// slot of the owning blob has come back is the blob recycled.
    pub fn release(&mut self, r: SlotRef) {
        let items_per_blob = self.items_per_blob;
        let is_current = r.blob == self.current;
        let Some(blob) = self.blobs[r.blob as usize].as_mut() else {
            return;
        };

        blob.released += 1;
        if blob.released > items_per_blob {
            return;
        }

        if !is_current && blob.released == items_per_blob {
            self.idle.push(r.blob);
            while self.idle.len() > MAX_IDLE_BLOBS {
                let drop_idx = self.idle.pop().expect("idle list is non-empty");
                self.blobs[drop_idx as usize] = None;
                self.tombstones.push(drop_idx);
            }
        }
    }

    pub fn get(&self, r: SlotRef) -> &T {
        &self.blobs[r.blob as usize]
            .as_ref()
            .expect("slot refers to a dropped blob")
            .slots[r.slot as usize]
    }

    pub fn get_mut(&mut self, r: SlotRef) -> &mut T {
        &mut self.blobs[r.blob as usize]
            .as_mut()
            .expect("slot refers to a dropped blob")
            .slots[r.slot as usize]
    }

    /// Number of blobs with live storage (current + idle + partially
    /// released).
    pub fn live_blobs(&self) -> usize {
        self.blobs.iter().filter(|b| b.is_some()).count()
    }

    /// Slots handed out across all live blobs since their last recycle.
    pub fn allocated_slots(&self) -> usize {
        self.blobs
            .iter()
            .flatten()
            .map(|b| b.next_avail as usize)
            .sum()
    }

    pub fn idle_blobs(&self) -> usize {
        self.idle.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release_roundtrip() {
        let mut pool: ItemPool<u64> = ItemPool::new(4);
        let a = pool.acquire();
        *pool.get_mut(a) = 42;
        assert_eq!(*pool.get(a), 42);
        pool.release(a);
    }

    #[test]
    fn test_blob_reused_in_place() {
        let mut pool: ItemPool<u64> = ItemPool::new(4);
        for _ in 0..3 {
            let refs: Vec<_> = (0..4).map(|_| pool.acquire()).collect();
            for r in refs {
                pool.release(r);
            }
        }
        // Released as fast as acquired, so the original blob keeps serving.
        assert_eq!(pool.live_blobs(), 1);
    }

    #[test]
    fn test_idle_list_capped() {
        let mut pool: ItemPool<u64> = ItemPool::new(2);
        // Hold everything live so each full blob forces a fresh allocation.
        let held: Vec<_> = (0..100).map(|_| pool.acquire()).collect();
        assert_eq!(pool.live_blobs(), 50);
        for r in held {
            pool.release(r);
        }
        // All blobs except the current one became idle; surplus dropped.
        assert_eq!(pool.idle_blobs(), MAX_IDLE_BLOBS);
        assert_eq!(pool.live_blobs(), MAX_IDLE_BLOBS + 1);
    }

    #[test]
    fn test_churn_bound() {
        // N acquire/release cycles of bursts <= items_per_blob keep the
        // blob population bounded.
        let mut pool: ItemPool<u32> = ItemPool::new(8);
        for _ in 0..1000 {
            let burst: Vec<_> = (0..8).map(|_| pool.acquire()).collect();
            for r in burst {
                pool.release(r);
            }
        }
        assert!(pool.live_blobs() <= 1 + MAX_IDLE_BLOBS);
    }
}
