//! Trace buffering: the sliding B-scan window and the single-slot frame
//! handoff
//!
//! The window is written by exactly one pump thread and snapshot-read by any
//! number of consumers; readers get copies, never live references, so an
//! insert can never be observed half-done. The frame slot is a bounded queue
//! of capacity 1 with drop-oldest semantics so the pump never waits on a
//! slow renderer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::queue::ArrayQueue;
use parking_lot::RwLock;

use crate::protocol::Trace;

/// Which edge of the window holds the newest trace under
/// [`InsertPolicy::AlwaysScroll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewestEdge {
    /// Newest trace at index 0, image scrolls right
    Left,
    /// Newest trace at the last index, image scrolls left
    Right,
}

/// Insertion discipline for the sliding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPolicy {
    /// Fill unused slots in arrival order; once full, evict the oldest.
    /// Newest trace ends up at the right edge.
    FillThenScroll,
    /// Shift on every insert with the newest trace pinned to the chosen
    /// edge, discarding at the opposite edge once full.
    AlwaysScroll(NewestEdge),
}

#[derive(Debug)]
struct WindowInner {
    traces: VecDeque<Trace>,
    capacity: usize,
}

/// Fixed-capacity sliding window of the most recent traces.
///
/// Single writer, many snapshot readers. Operations never fail: capacity and
/// ordering are internally consistent by construction.
#[derive(Debug)]
pub struct SlidingWindow {
    inner: RwLock<WindowInner>,
    policy: InsertPolicy,
    inserted: AtomicU64,
    evicted: AtomicU64,
}

impl SlidingWindow {
    pub fn new(capacity: usize, policy: InsertPolicy) -> Self {
        assert!(capacity > 0, "window capacity must be non-zero");
        Self {
            inner: RwLock::new(WindowInner {
                traces: VecDeque::with_capacity(capacity),
                capacity,
            }),
            policy,
            inserted: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        }
    }

    /// Insert one trace, evicting at the opposite edge once at capacity.
    /// Atomic with respect to readers.
    pub fn insert(&self, trace: Trace) {
        let mut inner = self.inner.write();
        let full = inner.traces.len() >= inner.capacity;
        match self.policy {
            InsertPolicy::FillThenScroll | InsertPolicy::AlwaysScroll(NewestEdge::Right) => {
                inner.traces.push_back(trace);
                if full {
                    inner.traces.pop_front();
                }
            }
            InsertPolicy::AlwaysScroll(NewestEdge::Left) => {
                inner.traces.push_front(trace);
                if full {
                    inner.traces.pop_back();
                }
            }
        }
        drop(inner);

        self.inserted.fetch_add(1, Ordering::Relaxed);
        if full {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Copy of the current contents in window order. Safe to call from any
    /// thread at any time.
    pub fn snapshot(&self) -> Vec<Trace> {
        self.inner.read().traces.iter().cloned().collect()
    }

    /// Change capacity, e.g. on a consumer window resize. Shrinking drops
    /// traces from the old end; growing keeps contents and leaves the new
    /// slots unused.
    pub fn resize(&self, new_capacity: usize) {
        assert!(new_capacity > 0, "window capacity must be non-zero");
        let mut inner = self.inner.write();
        while inner.traces.len() > new_capacity {
            match self.policy {
                InsertPolicy::FillThenScroll | InsertPolicy::AlwaysScroll(NewestEdge::Right) => {
                    inner.traces.pop_front();
                }
                InsertPolicy::AlwaysScroll(NewestEdge::Left) => {
                    inner.traces.pop_back();
                }
            }
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        inner.capacity = new_capacity;
    }

    pub fn len(&self) -> usize {
        self.inner.read().traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().traces.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().capacity
    }

    pub fn policy(&self) -> InsertPolicy {
        self.policy
    }

    pub fn stats(&self) -> WindowStats {
        WindowStats {
            len: self.len(),
            capacity: self.capacity(),
            inserted: self.inserted.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }
}

/// Window occupancy counters
#[derive(Debug, Clone)]
pub struct WindowStats {
    pub len: usize,
    pub capacity: usize,
    pub inserted: u64,
    pub evicted: u64,
}

/// Thread-safe handle to a sliding window
pub type SharedWindow = Arc<SlidingWindow>;

/// Create a new shared sliding window
pub fn create_shared_window(capacity: usize, policy: InsertPolicy) -> SharedWindow {
    Arc::new(SlidingWindow::new(capacity, policy))
}

/// One renderable B-scan frame published by the pump.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Window snapshot at publish time, in window order
    pub columns: Vec<Trace>,
    /// Monotonically increasing publish counter (1-based)
    pub sequence: u64,
}

/// Single-slot frame handoff with drop-oldest backpressure.
///
/// Publishing replaces an unconsumed frame instead of blocking, so the pump
/// is never throttled by a slow consumer; the consumer always drains the
/// freshest complete frame.
#[derive(Debug)]
pub struct FrameSlot {
    slot: ArrayQueue<Frame>,
    published: AtomicU64,
    dropped: AtomicU64,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self {
            slot: ArrayQueue::new(1),
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Publish a frame, discarding the previous one if it was not consumed.
    pub fn publish(&self, frame: Frame) {
        if self.slot.force_push(frame).is_some() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Drain the slot. Returns `None` when no new frame arrived since the
    /// last take.
    pub fn take(&self) -> Option<Frame> {
        self.slot.pop()
    }

    /// Total frames published
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Frames replaced before any consumer drained them
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn trace(tag: i16) -> Trace {
        Trace::new(vec![tag; 8])
    }

    fn tags(window: &SlidingWindow) -> Vec<i16> {
        window.snapshot().iter().map(|t| t.samples[0]).collect()
    }

    #[test]
    fn test_fill_then_scroll_eviction_order() {
        let window = SlidingWindow::new(3, InsertPolicy::FillThenScroll);
        for tag in [1, 2, 3, 4] {
            window.insert(trace(tag));
        }
        // Oldest evicted, arrival order preserved, newest at the right edge.
        assert_eq!(tags(&window), vec![2, 3, 4]);

        let stats = window.stats();
        assert_eq!(stats.inserted, 4);
        assert_eq!(stats.evicted, 1);
    }

    #[test]
    fn test_always_scroll_newest_left() {
        let window = SlidingWindow::new(4, InsertPolicy::AlwaysScroll(NewestEdge::Left));
        window.insert(trace(1));
        window.insert(trace(2));
        assert_eq!(tags(&window), vec![2, 1]);

        for tag in [3, 4, 5] {
            window.insert(trace(tag));
        }
        assert_eq!(tags(&window), vec![5, 4, 3, 2]);
    }

    #[test]
    fn test_always_scroll_newest_right() {
        let window = SlidingWindow::new(2, InsertPolicy::AlwaysScroll(NewestEdge::Right));
        for tag in [1, 2, 3] {
            window.insert(trace(tag));
        }
        assert_eq!(tags(&window), vec![2, 3]);
    }

    #[test]
    fn test_resize_shrink_drops_oldest() {
        let window = SlidingWindow::new(5, InsertPolicy::FillThenScroll);
        for tag in 1..=5 {
            window.insert(trace(tag));
        }
        window.resize(3);
        assert_eq!(tags(&window), vec![3, 4, 5]);
        assert_eq!(window.capacity(), 3);

        // Growing keeps contents and restores headroom.
        window.resize(4);
        window.insert(trace(6));
        assert_eq!(tags(&window), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let window = SlidingWindow::new(2, InsertPolicy::FillThenScroll);
        window.insert(trace(1));
        let snap = window.snapshot();
        window.insert(trace(2));
        window.insert(trace(3));
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].samples[0], 1);
    }

    #[test]
    fn test_concurrent_readers_see_whole_traces() {
        let window = create_shared_window(16, InsertPolicy::FillThenScroll);

        let writer = {
            let window = window.clone();
            thread::spawn(move || {
                for tag in 0..500i16 {
                    window.insert(trace(tag));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let window = window.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        for t in window.snapshot() {
                            // Every column is uniform; a torn insert would
                            // break this.
                            assert!(t.samples.iter().all(|&s| s == t.samples[0]));
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
    }

    #[test]
    fn test_frame_slot_drop_oldest() {
        let slot = FrameSlot::new();
        assert!(slot.take().is_none());

        slot.publish(Frame { columns: vec![trace(1)], sequence: 1 });
        slot.publish(Frame { columns: vec![trace(2)], sequence: 2 });

        // Second publish displaced the first.
        let frame = slot.take().unwrap();
        assert_eq!(frame.sequence, 2);
        assert_eq!(slot.published(), 2);
        assert_eq!(slot.dropped(), 1);
        assert!(slot.take().is_none());
    }
}
