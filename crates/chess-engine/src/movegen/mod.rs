//! Pseudo-legal move generation.
//!
//! The generator follows piece movement rules and castling conditions but does
//! not check whether the mover's king is left in check. Callers make the move,
//! test [`Position::is_in_check`] for the mover, and undo it if so.

pub mod attacks;
mod magics;
pub mod perft;

use crate::{Bitboard, Position};
use chess_core::{Color, Move, MoveFlag, Piece, PieceType, Square};

pub use attacks::{
    bishop_attacks, bishop_rays, king_attacks, knight_attacks, pawn_attacks, queen_attacks,
    rook_attacks, rook_rays,
};
pub use magics::{init as init_attack_tables, BISHOP_TABLE_SIZE, ROOK_TABLE_SIZE};

/// A list of moves with a fixed maximum capacity.
///
/// No reachable position has more than 218 moves, so a fixed array avoids
/// heap allocation in the search.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; Self::MAX_MOVES],
    len: usize,
}

impl MoveList {
    pub const MAX_MOVES: usize = 256;

    #[inline]
    pub const fn new() -> Self {
        MoveList {
            moves: [Move::NULL; Self::MAX_MOVES],
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, m: Move) {
        debug_assert!(self.len < Self::MAX_MOVES);
        self.moves[self.len] = m;
        self.len += 1;
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Move] {
        &mut self.moves[..self.len]
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.as_slice().iter()
    }

    #[inline]
    pub fn contains(&self, m: Move) -> bool {
        self.as_slice().contains(&m)
    }

    /// Keeps only the moves for which `f` returns true, preserving order.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&Move) -> bool,
    {
        let mut write = 0;
        for read in 0..self.len {
            if f(&self.moves[read]) {
                self.moves[write] = self.moves[read];
                write += 1;
            }
        }
        self.len = write;
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;

    #[inline]
    fn index(&self, index: usize) -> &Move {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Generates every pseudo-legal move for the side to move.
pub fn generate_moves(position: &Position) -> MoveList {
    let mut moves = MoveList::new();
    let us = position.side_to_move();

    generate_pawn_moves(position, us, &mut moves);
    for piece_type in [
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ] {
        generate_piece_moves(position, Piece::new(piece_type, us), &mut moves);
    }
    generate_castling_moves(position, us, &mut moves);

    moves
}

/// Generates the moves that do not leave the mover in check.
pub fn generate_legal_moves(position: &mut Position) -> MoveList {
    let us = position.side_to_move();
    let mut moves = generate_moves(position);
    moves.retain(|m| {
        position.make_move(*m);
        let legal = !position.is_in_check(us);
        position.undo_move();
        legal
    });
    moves
}

/// Finds the legal move written in coordinate notation (e.g. "e2e4", "a7a8q").
pub fn find_move(position: &mut Position, text: &str) -> Option<Move> {
    generate_legal_moves(position)
        .iter()
        .copied()
        .find(|m| m.to_uci() == text)
}

fn push_targets(
    position: &Position,
    targets: Bitboard,
    delta: i8,
    piece: Piece,
    flag: MoveFlag,
    moves: &mut MoveList,
) {
    for to in targets {
        let from = to.offset(-delta);
        moves.push(Move::new(from, to, piece, position.piece_at(to), flag));
    }
}

fn push_promotions(
    position: &Position,
    targets: Bitboard,
    delta: i8,
    pawn: Piece,
    moves: &mut MoveList,
) {
    for to in targets {
        let from = to.offset(-delta);
        let captured = position.piece_at(to);
        for flag in MoveFlag::PROMOTIONS {
            moves.push(Move::new(from, to, pawn, captured, flag));
        }
    }
}

/// Pawn moves computed a whole bitboard at a time.
fn generate_pawn_moves(position: &Position, us: Color, moves: &mut MoveList) {
    let board = position.board();
    let pawn = Piece::new(PieceType::Pawn, us);
    let pawns = board.pieces(pawn);
    if pawns.is_empty() {
        return;
    }
    let empty = !board.occupancy();
    let enemies = board.color(us.opposite());
    let push = us.push_offset();

    let (single, double_from_rank, promo_rank, left, right) = match us {
        Color::White => (
            pawns.north() & empty,
            Bitboard::RANK_3,
            Bitboard::RANK_8,
            pawns.north_west(),
            pawns.north_east(),
        ),
        Color::Black => (
            pawns.south() & empty,
            Bitboard::RANK_6,
            Bitboard::RANK_1,
            pawns.south_west(),
            pawns.south_east(),
        ),
    };
    let double = match us {
        Color::White => (single & double_from_rank).north() & empty,
        Color::Black => (single & double_from_rank).south() & empty,
    };

    push_targets(position, single & !promo_rank, push, pawn, MoveFlag::Normal, moves);
    push_promotions(position, single & promo_rank, push, pawn, moves);
    push_targets(position, double, 2 * push, pawn, MoveFlag::DoublePush, moves);

    for (targets, delta) in [(left & enemies, push - 1), (right & enemies, push + 1)] {
        push_targets(position, targets & !promo_rank, delta, pawn, MoveFlag::Normal, moves);
        push_promotions(position, targets & promo_rank, delta, pawn, moves);
    }

    if let Some(ep) = position.en_passant() {
        // Our pawns that attack the target are those a pawn of the other color
        // on the target would attack.
        let victim = Piece::new(PieceType::Pawn, us.opposite());
        for from in pawn_attacks(ep, us.opposite()) & pawns {
            moves.push(Move::new(from, ep, pawn, Some(victim), MoveFlag::EnPassant));
        }
    }
}

fn generate_piece_moves(position: &Position, piece: Piece, moves: &mut MoveList) {
    let board = position.board();
    let own = board.color(piece.color());
    let occupied = board.occupancy();

    for from in board.pieces(piece) {
        let attacks = match piece.piece_type() {
            PieceType::Knight => knight_attacks(from),
            PieceType::Bishop => bishop_attacks(from, occupied),
            PieceType::Rook => rook_attacks(from, occupied),
            PieceType::Queen => queen_attacks(from, occupied),
            PieceType::King => king_attacks(from),
            PieceType::Pawn => Bitboard::EMPTY,
        };
        for to in attacks & !own {
            moves.push(Move::new(from, to, piece, board.piece_at(to), MoveFlag::Normal));
        }
    }
}

fn generate_castling_moves(position: &Position, us: Color, moves: &mut MoveList) {
    let king = Piece::new(PieceType::King, us);
    let home = match us {
        Color::White => Square::E1,
        Color::Black => Square::E8,
    };
    if position.can_castle_kingside() {
        moves.push(Move::new(home, home.offset(2), king, None, MoveFlag::Castling));
    }
    if position.can_castle_queenside() {
        moves.push(Move::new(home, home.offset(-2), king, None, MoveFlag::Castling));
    }
}
