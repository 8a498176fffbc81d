//! Transposition table: a flat, directly indexed cache of search results.

use chess_core::Move;

/// How a stored score relates to the true value of the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// The score is exact: it fell strictly inside the search window.
    Exact,
    /// The search failed high; the true value is at least the score.
    AtLeast,
    /// The search failed low; the true value is at most the score.
    AtMost,
}

impl Bound {
    /// Classifies `score` against the window the node was searched with.
    #[inline]
    pub fn classify(score: i32, alpha: i32, beta: i32) -> Self {
        if score <= alpha {
            Bound::AtMost
        } else if score >= beta {
            Bound::AtLeast
        } else {
            Bound::Exact
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    pub key: u64,
    pub depth: i32,
    pub score: i32,
    pub bound: Bound,
    pub best_move: Option<Move>,
}

/// Fixed-size table indexed by `key % len`, one entry per slot.
///
/// Collisions are never chained: a probe only hits when the stored key equals
/// the query key.
pub struct TranspositionTable {
    slots: Vec<Option<TtEntry>>,
}

impl TranspositionTable {
    /// Creates a table using at most `mb` mebibytes, with at least one slot.
    pub fn with_megabytes(mb: usize) -> Self {
        let slot_size = std::mem::size_of::<Option<TtEntry>>();
        let len = (mb.saturating_mul(1 << 20) / slot_size).max(1);
        TranspositionTable {
            slots: vec![None; len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key % self.slots.len() as u64) as usize
    }

    /// Returns the entry for `key`, or `None` if its slot is empty or holds a
    /// different key.
    #[inline]
    pub fn probe(&self, key: u64) -> Option<TtEntry> {
        self.slots[self.index(key)].filter(|entry| entry.key == key)
    }

    /// Stores a result, replacing the slot's entry if the slot is empty, holds
    /// the same key, or holds a search no deeper than this one.
    pub fn store(&mut self, key: u64, depth: i32, score: i32, bound: Bound, best_move: Option<Move>) {
        let idx = self.index(key);
        let replace = match &self.slots[idx] {
            None => true,
            Some(existing) => existing.key == key || depth >= existing.depth,
        };
        if replace {
            self.slots[idx] = Some(TtEntry {
                key,
                depth,
                score,
                bound,
                best_move,
            });
        }
    }

    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    /// Occupancy in permille, sampled over the first thousand slots.
    pub fn hashfull(&self) -> u32 {
        let sample = self.slots.len().min(1000);
        let used = self.slots[..sample].iter().filter(|s| s.is_some()).count();
        (used * 1000 / sample) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{MoveFlag, Piece, Square};

    fn some_move() -> Move {
        Move::new(Square::E1, Square::F1, Piece::WhiteKing, None, MoveFlag::Normal)
    }

    #[test]
    fn sizing() {
        let tt = TranspositionTable::with_megabytes(1);
        let slot = std::mem::size_of::<Option<TtEntry>>();
        assert_eq!(tt.len(), (1 << 20) / slot);
        assert_eq!(TranspositionTable::with_megabytes(0).len(), 1);
    }

    #[test]
    fn probe_requires_exact_key() {
        let mut tt = TranspositionTable::with_megabytes(1);
        let len = tt.len() as u64;
        tt.store(7, 3, 42, Bound::Exact, Some(some_move()));

        let hit = tt.probe(7).unwrap();
        assert_eq!(hit.score, 42);
        assert_eq!(hit.best_move, Some(some_move()));

        // Same slot, different key.
        assert_eq!(tt.probe(7 + len), None);
        assert_eq!(tt.probe(8), None);
    }

    #[test]
    fn depth_preferred_replacement() {
        let mut tt = TranspositionTable::with_megabytes(1);
        let len = tt.len() as u64;
        let (a, b) = (11, 11 + len);

        tt.store(a, 5, 1, Bound::Exact, None);
        // Shallower search for another key does not evict.
        tt.store(b, 4, 2, Bound::Exact, None);
        assert_eq!(tt.probe(a).map(|e| e.score), Some(1));
        assert_eq!(tt.probe(b), None);

        // Same key always overwrites, even when shallower.
        tt.store(a, 1, 3, Bound::AtMost, None);
        assert_eq!(tt.probe(a).map(|e| (e.depth, e.score)), Some((1, 3)));

        // Equal or deeper search for another key evicts.
        tt.store(b, 1, 4, Bound::AtLeast, None);
        assert_eq!(tt.probe(a), None);
        assert_eq!(tt.probe(b).map(|e| e.bound), Some(Bound::AtLeast));
    }

    #[test]
    fn clear_and_hashfull() {
        let mut tt = TranspositionTable::with_megabytes(1);
        assert_eq!(tt.hashfull(), 0);
        for key in 0..100 {
            tt.store(key, 1, 0, Bound::Exact, None);
        }
        assert_eq!(tt.hashfull(), 100);
        tt.clear();
        assert_eq!(tt.hashfull(), 0);
        assert_eq!(tt.probe(5), None);
    }

    #[test]
    fn bound_classification() {
        assert_eq!(Bound::classify(10, 10, 20), Bound::AtMost);
        assert_eq!(Bound::classify(5, 10, 20), Bound::AtMost);
        assert_eq!(Bound::classify(20, 10, 20), Bound::AtLeast);
        assert_eq!(Bound::classify(15, 10, 20), Bound::Exact);
    }
}
