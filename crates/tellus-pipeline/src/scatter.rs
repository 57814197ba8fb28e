//! Fixed-size scatter-write regions for the attribute and index stages.

use std::cell::UnsafeCell;

/// A fixed-size buffer that parallel workers scatter values into.
///
/// Two write patterns are permitted, both upheld by the pipeline:
/// - **Disjoint ranges**: each worker writes only slots it claimed (the
///   index-flatten stage, ranges handed out by
///   [`WriteCursors`](crate::WriteCursors)).
/// - **Same-value collisions**: multiple workers may write the *same*
///   slot concurrently only when writing values identical by construction
///   (the attribute-scatter stage, where every triangle referencing a
///   deduplicated vertex carries that vertex's attributes). The race is
///   benign: whichever write lands, the slot holds the same bytes.
pub struct ScatterBuffer<T: Copy> {
    slots: Box<[UnsafeCell<T>]>,
}

// SAFETY: writes go through `write`, whose contract limits concurrent
// access to the disjoint-range and identical-value patterns above; reads
// only happen after the writing stage's barrier.
unsafe impl<T: Copy + Send> Sync for ScatterBuffer<T> {}

impl<T: Copy> ScatterBuffer<T> {
    /// Allocate `len` slots, all holding `fill`.
    pub fn new(len: usize, fill: T) -> Self {
        Self {
            slots: (0..len).map(|_| UnsafeCell::new(fill)).collect(),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the buffer has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Write `value` into `index`.
    ///
    /// Panics if `index` is out of bounds (a stale-cursor bug, better
    /// caught than written past the buffer).
    ///
    /// # Safety
    ///
    /// Concurrent callers must either target disjoint indices or write
    /// bit-identical values to the same index.
    pub unsafe fn write(&self, index: usize, value: T) {
        assert!(
            index < self.slots.len(),
            "scatter write at {index} past buffer of {}",
            self.slots.len()
        );
        unsafe {
            *self.slots[index].get() = value;
        }
    }

    /// Copy the buffer out.
    ///
    /// Must only be called after the barrier of the stage that wrote it.
    pub fn snapshot(&self) -> Vec<T> {
        // SAFETY: no writer is live after the stage barrier.
        self.slots.iter().map(|slot| unsafe { *slot.get() }).collect()
    }
}
