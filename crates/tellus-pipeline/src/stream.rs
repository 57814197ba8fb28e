//! Per-partition append-only output streams.

use std::cell::UnsafeCell;

/// A set of append-only streams, one per partition (one partition per
/// source triangle), written without locks during a parallel stage and
/// replayed sequentially afterwards.
///
/// Access discipline, enforced by the pipeline's stage sequencing:
/// - During a writing stage, each partition is written by exactly its
///   owning task, through [`partition_mut`](Self::partition_mut).
/// - Reads ([`partition`](Self::partition)) happen only after that
///   stage's barrier; the [`StageHandle`](crate::StageHandle) acquire/
///   release pairing makes the writes visible.
pub struct StreamSet<T> {
    partitions: Box<[UnsafeCell<Vec<T>>]>,
}

// SAFETY: partitions are only mutated through `partition_mut`, whose
// contract restricts each partition to a single writer with no concurrent
// readers. With that upheld, sharing the set across threads is sound.
unsafe impl<T: Send> Sync for StreamSet<T> {}

impl<T> StreamSet<T> {
    /// Create a set with `partition_count` empty streams.
    pub fn new(partition_count: usize) -> Self {
        Self {
            partitions: (0..partition_count)
                .map(|_| UnsafeCell::new(Vec::new()))
                .collect(),
        }
    }

    /// Number of partitions.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Mutable access to one partition's stream.
    ///
    /// # Safety
    ///
    /// The caller must be the sole accessor of `partition` for the
    /// duration of the borrow: no other writer, and no reader until the
    /// owning stage's barrier has completed.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn partition_mut(&self, partition: usize) -> &mut Vec<T> {
        unsafe { &mut *self.partitions[partition].get() }
    }

    /// Read one partition's stream.
    ///
    /// Must only be called after the barrier of the stage that wrote the
    /// partition; there is no writer to race with from then on.
    pub fn partition(&self, partition: usize) -> &[T] {
        // SAFETY: per the access discipline above, no writer is live once
        // readers run.
        unsafe { &*self.partitions[partition].get() }
    }

    /// Number of items appended to one partition.
    pub fn partition_len(&self, partition: usize) -> usize {
        self.partition(partition).len()
    }

    /// Total items across all partitions.
    pub fn total_len(&self) -> usize {
        (0..self.partition_count())
            .map(|p| self.partition_len(p))
            .sum()
    }
}
