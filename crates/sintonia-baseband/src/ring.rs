//! Intermediate IQ ring buffer.
//!
//! A flat arena with `avail`/`used` cursors: producers append at `avail`,
//! the digital-sideband consumer drains from `used`. When an append would
//! run past the end, the undrained tail `[used..avail)` is compacted to the
//! front first; if the append still does not fit the frame is refused and
//! the caller decides (the pipeline logs and drops; this is a live radio).
//!
//! Invariant at every call boundary: `used <= avail <= capacity`, and no
//! sample is ever delivered twice.

use sintonia_dsp::IqSample;
use thiserror::Error;

/// An append did not fit even after compaction.
#[derive(Debug, Clone, Copy, Error)]
#[error("IQ ring overflow: {incoming} samples incoming, {free} free after compaction")]
pub struct RingOverflow {
    /// Samples the producer tried to append.
    pub incoming: usize,
    /// Free space that was available after compaction.
    pub free: usize,
}

/// Arena-backed IQ ring with explicit producer/consumer cursors.
#[derive(Debug)]
pub struct IqRing {
    buf: Vec<IqSample>,
    avail: usize,
    used: usize,
    skip: usize,
}

impl IqRing {
    /// Create a ring with the given capacity in samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![IqSample::default(); capacity],
            avail: 0,
            used: 0,
            skip: 0,
        }
    }

    /// Samples appended but not yet drained.
    pub fn pending(&self) -> usize {
        self.avail - self.used
    }

    /// Arrange room for `incoming` samples, compacting the undrained tail
    /// to the front if needed. Returns an error if the ring cannot hold
    /// the append even when fully compacted; the ring is left consistent.
    pub fn reserve(&mut self, incoming: usize) -> Result<(), RingOverflow> {
        if self.avail + incoming > self.buf.len() {
            if self.avail > self.used {
                self.buf.copy_within(self.used..self.avail, 0);
                self.avail -= self.used;
                self.used = 0;
            } else {
                self.avail = 0;
                self.used = 0;
            }
        }
        if self.avail + incoming > self.buf.len() {
            return Err(RingOverflow {
                incoming,
                free: self.buf.len() - self.avail,
            });
        }
        Ok(())
    }

    /// Append samples. Call [`IqRing::reserve`] first; appending past the
    /// reserved room is a logic error.
    pub fn extend(&mut self, samples: &[IqSample]) {
        debug_assert!(self.avail + samples.len() <= self.buf.len());
        self.buf[self.avail..self.avail + samples.len()].copy_from_slice(samples);
        self.avail += samples.len();
    }

    /// Schedule `n` pending samples to be discarded ahead of the next
    /// drain (consumer realignment).
    pub fn add_skip(&mut self, n: usize) {
        self.skip += n;
    }

    /// Drain in consumer-sized chunks: while at least `min` samples are
    /// pending, hand the pending slice to `f` and advance by the count it
    /// returns. A return of 0 stops the loop. Scheduled skips are consumed
    /// first.
    pub fn drain_until(&mut self, min: usize, mut f: impl FnMut(&[IqSample]) -> usize) {
        loop {
            if self.skip > 0 {
                let pending = self.avail - self.used;
                if self.skip > pending {
                    self.skip -= pending;
                    self.used = self.avail;
                } else {
                    self.used += self.skip;
                    self.skip = 0;
                }
            }
            if self.avail - self.used < min {
                return;
            }
            let consumed = f(&self.buf[self.used..self.avail]);
            if consumed == 0 {
                return;
            }
            debug_assert!(consumed <= self.avail - self.used);
            self.used += consumed.min(self.avail - self.used);
        }
    }

    /// Drop all content and scheduled skips.
    pub fn reset(&mut self) {
        self.avail = 0;
        self.used = 0;
        self.skip = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn samples(n: usize, base: i16) -> Vec<IqSample> {
        (0..n)
            .map(|i| IqSample::new(base.wrapping_add(i as i16), 0))
            .collect()
    }

    #[test]
    fn drains_in_order_without_duplication() {
        let mut ring = IqRing::new(64);
        ring.reserve(48).unwrap();
        ring.extend(&samples(48, 0));
        let mut seen = Vec::new();
        ring.drain_until(16, |chunk| {
            seen.extend_from_slice(&chunk[..16]);
            16
        });
        assert_eq!(seen, samples(48, 0));
        assert_eq!(ring.pending(), 0);
    }

    #[test]
    fn compaction_preserves_pending_tail() {
        let mut ring = IqRing::new(32);
        ring.reserve(32).unwrap();
        ring.extend(&samples(32, 0));
        // Drain 24, leaving 8 pending at the back.
        ring.drain_until(24, |_| 24);
        assert_eq!(ring.pending(), 8);
        // The next reserve forces compaction; the tail must survive.
        ring.reserve(24).unwrap();
        ring.extend(&samples(24, 100));
        let mut seen = Vec::new();
        ring.drain_until(32, |chunk| {
            seen.extend_from_slice(chunk);
            chunk.len()
        });
        let mut expected = samples(32, 0)[24..].to_vec();
        expected.extend(samples(24, 100));
        assert_eq!(seen, expected);
    }

    #[test]
    fn overflow_is_reported_and_ring_stays_live() {
        let mut ring = IqRing::new(16);
        ring.reserve(16).unwrap();
        ring.extend(&samples(16, 0));
        let err = ring.reserve(8).unwrap_err();
        assert_eq!(err.incoming, 8);
        assert_eq!(err.free, 0);
        // Drain and continue as normal.
        ring.drain_until(16, |_| 16);
        ring.reserve(8).unwrap();
        ring.extend(&samples(8, 50));
        assert_eq!(ring.pending(), 8);
    }

    #[test]
    fn skip_spans_drain_boundaries() {
        let mut ring = IqRing::new(64);
        ring.add_skip(10);
        ring.reserve(6).unwrap();
        ring.extend(&samples(6, 0));
        // Only 6 pending: skip eats them all and carries 4 over.
        ring.drain_until(1, |_| unreachable!("nothing should be delivered"));
        assert_eq!(ring.pending(), 0);
        ring.reserve(8).unwrap();
        ring.extend(&samples(8, 20));
        let mut seen = Vec::new();
        ring.drain_until(4, |chunk| {
            seen.extend_from_slice(chunk);
            chunk.len()
        });
        // 4 more skipped, the last 4 delivered.
        assert_eq!(seen, samples(8, 20)[4..].to_vec());
    }

    proptest! {
        #[test]
        fn cursor_invariant_holds(ops in prop::collection::vec((0usize..40, 0usize..40), 1..60)) {
            let mut ring = IqRing::new(128);
            for (push, take) in ops {
                if ring.reserve(push).is_ok() {
                    ring.extend(&samples(push, 7));
                }
                ring.drain_until(1, |chunk| take.min(chunk.len()));
                prop_assert!(ring.used <= ring.avail);
                prop_assert!(ring.avail <= ring.buf.len());
            }
        }
    }
}
