//! Atomic write cursors for the index-flatten stage.

use std::sync::atomic::{AtomicI64, Ordering};

/// Sentinel distinguishing "never armed" from "legitimately at zero".
/// Claiming from an unarmed cursor is a use-after-reset bug and panics.
const UNARMED: i64 = -3;

/// Per-region atomic write cursors.
///
/// Each region is one partition's slice of the flattened output index
/// buffer. A cursor starts at the sentinel and is unusable until
/// [`arm`](Self::arm) stores the region's base offset; the pipeline arms
/// a fresh set inside every pass transition, so stale state from a prior
/// pass can never leak into the next one. [`claim`](Self::claim) is the
/// only true atomic increment in the pipeline.
pub struct WriteCursors {
    cursors: Box<[AtomicI64]>,
}

impl WriteCursors {
    /// Create `region_count` cursors, all at the unarmed sentinel.
    pub fn new_unarmed(region_count: usize) -> Self {
        Self {
            cursors: (0..region_count).map(|_| AtomicI64::new(UNARMED)).collect(),
        }
    }

    /// Number of regions.
    pub fn region_count(&self) -> usize {
        self.cursors.len()
    }

    /// Arm every cursor with its region's base offset.
    ///
    /// Panics if the offset count does not match the region count.
    pub fn arm(&self, offsets: &[usize]) {
        assert_eq!(
            offsets.len(),
            self.cursors.len(),
            "offset count must match region count"
        );
        for (cursor, &offset) in self.cursors.iter().zip(offsets) {
            cursor.store(offset as i64, Ordering::Release);
        }
    }

    /// Claim `slots` contiguous output slots in `region`, returning the
    /// first claimed index.
    ///
    /// Panics if the cursor was never armed.
    pub fn claim(&self, region: usize, slots: usize) -> usize {
        let previous = self.cursors[region].fetch_add(slots as i64, Ordering::Relaxed);
        assert!(
            previous >= 0,
            "write cursor for region {region} claimed before being armed"
        );
        previous as usize
    }

    /// Current cursor position for a region (post-stage diagnostics).
    pub fn position(&self, region: usize) -> i64 {
        self.cursors[region].load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::WorkerPool;
    use std::sync::Arc;

    /// Armed cursors hand out contiguous, disjoint ranges.
    #[test]
    fn test_claims_are_contiguous() {
        let cursors = WriteCursors::new_unarmed(2);
        cursors.arm(&[0, 30]);

        assert_eq!(cursors.claim(0, 3), 0);
        assert_eq!(cursors.claim(0, 3), 3);
        assert_eq!(cursors.claim(1, 6), 30);
        assert_eq!(cursors.position(0), 6);
        assert_eq!(cursors.position(1), 36);
    }

    /// Claiming from an unarmed cursor is a fatal precondition violation.
    #[test]
    #[should_panic(expected = "before being armed")]
    fn test_unarmed_claim_panics() {
        let cursors = WriteCursors::new_unarmed(1);
        cursors.claim(0, 3);
    }

    /// Concurrent claims on one region never hand out overlapping ranges.
    #[test]
    fn test_concurrent_claims_are_disjoint() {
        let pool = WorkerPool::new(4);
        let cursors = Arc::new(WriteCursors::new_unarmed(1));
        cursors.arm(&[0]);

        let claimed = Arc::new(std::sync::Mutex::new(Vec::new()));
        let cursors_clone = Arc::clone(&cursors);
        let claimed_clone = Arc::clone(&claimed);

        let handle = pool.fork(64, move |_| {
            let base = cursors_clone.claim(0, 3);
            claimed_clone.lock().unwrap().push(base);
        });
        handle.wait();

        let mut bases = claimed.lock().unwrap().clone();
        bases.sort_unstable();
        let expected: Vec<usize> = (0..64).map(|i| i * 3).collect();
        assert_eq!(bases, expected);
    }
}
