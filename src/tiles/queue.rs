//! Tile download scheduling
//!
//! The scheduler owns the bookkeeping that decides which tile is fetched next:
//! a priority queue ordered by distance from the viewport center (nearest
//! first, insertion order on ties), the set of downloads in flight, and the
//! set of tiles that failed and must never be requested again. Admission is a
//! counting check against the concurrency limit, re-run whenever a slot frees.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::geo::TileCoord;
use crate::prelude::{HashMap, HashSet};

/// A queued tile request
#[derive(Debug, Clone, Copy)]
struct QueuedFetch {
    coord: TileCoord,
    /// L1 distance in tiles from the tile under the viewport center
    distance: u32,
    /// Sequence number for tie-breaking (lower = earlier)
    sequence: u64,
}

impl PartialEq for QueuedFetch {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedFetch {}

impl PartialOrd for QueuedFetch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedFetch {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the greatest element: nearer tiles and earlier
        // sequence numbers must compare greater.
        other
            .distance
            .cmp(&self.distance)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Debug)]
pub struct FetchScheduler {
    queue: BinaryHeap<QueuedFetch>,
    queued: HashSet<TileCoord>,
    in_flight: HashSet<TileCoord>,
    failed: HashSet<TileCoord>,
    max_concurrent: usize,
    sequence: u64,
}

impl FetchScheduler {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            queue: BinaryHeap::new(),
            queued: HashSet::default(),
            in_flight: HashSet::default(),
            failed: HashSet::default(),
            max_concurrent: max_concurrent.max(1),
            sequence: 0,
        }
    }

    /// Queue `coord` unless it is already queued, in flight, or has failed.
    pub fn enqueue(&mut self, coord: TileCoord, distance: u32) -> bool {
        debug_assert!(coord.is_valid(), "tile {coord} is out of range");
        if self.queued.contains(&coord)
            || self.in_flight.contains(&coord)
            || self.failed.contains(&coord)
        {
            return false;
        }

        self.queued.insert(coord);
        self.queue.push(QueuedFetch {
            coord,
            distance,
            sequence: self.sequence,
        });
        self.sequence += 1;
        true
    }

    /// Take the nearest queued tile if a concurrency slot is free; it is
    /// counted as in flight until [`complete`](Self::complete),
    /// [`fail`](Self::fail) or [`release`](Self::release).
    pub fn admit(&mut self) -> Option<TileCoord> {
        if !self.has_capacity() {
            return None;
        }
        let next = self.queue.pop()?;
        self.queued.remove(&next.coord);
        self.in_flight.insert(next.coord);
        Some(next.coord)
    }

    /// A download finished successfully
    pub fn complete(&mut self, coord: &TileCoord) -> bool {
        self.in_flight.remove(coord)
    }

    /// A download failed; the tile is never queued again
    pub fn fail(&mut self, coord: TileCoord) {
        self.in_flight.remove(&coord);
        self.failed.insert(coord);
    }

    /// Give back an admitted slot without a download (e.g. the tile turned up in cache)
    pub fn release(&mut self, coord: &TileCoord) {
        self.in_flight.remove(coord);
    }

    /// Discard every request that has not started yet
    pub fn drop_queued(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        self.queued.clear();
        dropped
    }

    /// Re-rank queued requests by distance from a new center. Requests missing
    /// from `distances` are kept but move behind every ranked request.
    pub fn reprioritize(&mut self, distances: &HashMap<TileCoord, u32>) {
        let entries = std::mem::take(&mut self.queue).into_vec();
        self.queue = entries
            .into_iter()
            .map(|entry| QueuedFetch {
                distance: distances.get(&entry.coord).copied().unwrap_or(u32::MAX),
                ..entry
            })
            .collect();
    }

    /// Forget everything, including failures
    pub fn clear(&mut self) {
        self.drop_queued();
        self.in_flight.clear();
        self.failed.clear();
    }

    pub fn has_capacity(&self) -> bool {
        self.in_flight.len() < self.max_concurrent
    }

    pub fn is_in_flight(&self, coord: &TileCoord) -> bool {
        self.in_flight.contains(coord)
    }

    pub fn is_failed(&self, coord: &TileCoord) -> bool {
        self.failed.contains(coord)
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn failed_len(&self) -> usize {
        self.failed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(x: u32) -> TileCoord {
        TileCoord::new(x, 0, 8)
    }

    #[test]
    fn test_nearest_first_with_stable_ties() {
        let mut scheduler = FetchScheduler::new(10);
        scheduler.enqueue(coord(1), 3);
        scheduler.enqueue(coord(2), 0);
        scheduler.enqueue(coord(3), 1);
        scheduler.enqueue(coord(4), 1);

        let order: Vec<_> = std::iter::from_fn(|| scheduler.admit()).collect();
        assert_eq!(order, vec![coord(2), coord(3), coord(4), coord(1)]);
    }

    #[test]
    fn test_duplicate_requests_are_rejected() {
        let mut scheduler = FetchScheduler::new(1);
        assert!(scheduler.enqueue(coord(1), 0));
        assert!(!scheduler.enqueue(coord(1), 0));

        scheduler.admit();
        assert!(scheduler.is_in_flight(&coord(1)));
        assert!(!scheduler.enqueue(coord(1), 0));
    }

    #[test]
    fn test_concurrency_limit() {
        let mut scheduler = FetchScheduler::new(12);
        for x in 0..30 {
            scheduler.enqueue(coord(x), x);
        }
        let admitted: Vec<_> = std::iter::from_fn(|| scheduler.admit()).collect();
        assert_eq!(admitted.len(), 12);
        assert_eq!(scheduler.in_flight_len(), 12);
        assert_eq!(scheduler.queued_len(), 18);

        scheduler.complete(&admitted[0]);
        assert_eq!(scheduler.admit(), Some(coord(12)));
        assert_eq!(scheduler.admit(), None);
    }

    #[test]
    fn test_failed_tiles_are_never_requeued() {
        let mut scheduler = FetchScheduler::new(2);
        scheduler.enqueue(coord(7), 0);
        let admitted = scheduler.admit().unwrap();
        scheduler.fail(admitted);

        assert!(scheduler.is_failed(&coord(7)));
        assert!(!scheduler.enqueue(coord(7), 0));
        assert_eq!(scheduler.in_flight_len(), 0);
    }

    #[test]
    fn test_drop_queued_keeps_in_flight() {
        let mut scheduler = FetchScheduler::new(1);
        scheduler.enqueue(coord(1), 0);
        scheduler.enqueue(coord(2), 1);
        scheduler.enqueue(coord(3), 2);
        scheduler.admit();

        assert_eq!(scheduler.drop_queued(), 2);
        assert_eq!(scheduler.queued_len(), 0);
        assert!(scheduler.is_in_flight(&coord(1)));
        // Dropped requests can be queued again later
        assert!(scheduler.enqueue(coord(2), 0));
    }

    #[test]
    fn test_reprioritize_moves_unranked_to_back() {
        let mut scheduler = FetchScheduler::new(10);
        scheduler.enqueue(coord(1), 0);
        scheduler.enqueue(coord(2), 1);
        scheduler.enqueue(coord(3), 2);

        let mut distances = HashMap::default();
        distances.insert(coord(3), 0);
        distances.insert(coord(2), 4);
        scheduler.reprioritize(&distances);

        let order: Vec<_> = std::iter::from_fn(|| scheduler.admit()).collect();
        assert_eq!(order, vec![coord(3), coord(2), coord(1)]);
    }

    #[test]
    fn test_release_frees_slot() {
        let mut scheduler = FetchScheduler::new(1);
        scheduler.enqueue(coord(1), 0);
        scheduler.enqueue(coord(2), 0);
        let first = scheduler.admit().unwrap();
        assert!(!scheduler.has_capacity());
        scheduler.release(&first);
        assert_eq!(scheduler.admit(), Some(coord(2)));
    }
}
