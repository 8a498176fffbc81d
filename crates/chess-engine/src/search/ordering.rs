//! Move ordering for the alpha-beta search.
//!
//! Moves are scored once and then handed out best-first by selection, so a
//! node that cuts off early never pays for sorting the whole list.

use chess_core::{Move, PieceType};

use crate::eval::piece_value;
use crate::movegen::MoveList;

const HINT_SCORE: i32 = 10_000_000;
const CAPTURE_BASE: i32 = 1_000_000;
const PROMOTION_BASE: i32 = 900_000;
const KILLER_SCORES: [i32; 2] = [800_000, 700_000];

/// Two quiet moves per ply that recently caused a beta cutoff.
pub type Killers = [Option<Move>; 2];

/// Extra ordering weight for the piece a pawn promotes to.
pub fn promotion_bonus(piece_type: PieceType) -> i32 {
    match piece_type {
        PieceType::Knight => 200,
        PieceType::Bishop => 220,
        PieceType::Rook => 400,
        PieceType::Queen => 800,
        PieceType::Pawn | PieceType::King => 0,
    }
}

/// Ordering score: hint move, then captures by MVV/LVA, promotions, killers,
/// and everything else at zero.
pub fn score_move(m: Move, hint: Option<Move>, killers: &Killers) -> i32 {
    if hint == Some(m) {
        return HINT_SCORE;
    }
    if let Some(victim) = m.captured() {
        let victim = piece_value(victim.piece_type());
        let attacker = piece_value(m.moved().piece_type());
        return CAPTURE_BASE + 10_000 * victim + (1_000 - attacker);
    }
    if let Some(promoted) = m.flag().promotion_type() {
        return PROMOTION_BASE + promotion_bonus(promoted);
    }
    killers
        .iter()
        .zip(KILLER_SCORES)
        .find_map(|(killer, score)| (*killer == Some(m)).then_some(score))
        .unwrap_or(0)
}

/// Iterator over a move list in descending score order.
///
/// Equal scores come out in generation order, which keeps the search
/// deterministic.
pub struct OrderedMoves {
    moves: MoveList,
    scores: [i32; MoveList::MAX_MOVES],
    next: usize,
}

impl OrderedMoves {
    pub fn new(moves: MoveList, hint: Option<Move>, killers: &Killers) -> Self {
        let mut scores = [0; MoveList::MAX_MOVES];
        for (slot, &m) in scores.iter_mut().zip(moves.iter()) {
            *slot = score_move(m, hint, killers);
        }
        OrderedMoves {
            moves,
            scores,
            next: 0,
        }
    }
}

impl Iterator for OrderedMoves {
    type Item = Move;

    fn next(&mut self) -> Option<Move> {
        let len = self.moves.len();
        if self.next >= len {
            return None;
        }
        let mut best = self.next;
        for i in self.next + 1..len {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }
        // Rotate rather than swap so equal scores keep their relative order.
        let chosen = self.moves[best];
        self.moves.as_mut_slice()[self.next..=best].rotate_right(1);
        self.scores[self.next..=best].rotate_right(1);
        self.next += 1;
        Some(chosen)
    }
}
