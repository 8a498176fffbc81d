//! Static evaluation.
//!
//! Scores are in centipawns from the point of view of the side to move.
//! Piece-square tables are laid out with a1 first; Black reads them through
//! the mirrored square (`63 - sq`).

use chess_core::{Color, Piece, PieceType, Square};

use crate::game_info::CastlingRights;
use crate::movegen::{bishop_attacks, knight_attacks, queen_attacks, rook_attacks};
use crate::Position;

/// Largest non-mate score the evaluator returns.
pub const MAX_CP: i32 = 10_000;

/// Material by piece type: pawn, knight, bishop, rook, queen, king.
pub const MATERIAL: [i32; 6] = [100, 300, 320, 500, 900, 0];

/// Number of knights, bishops, rooks and queens at which the game counts as
/// a full middlegame.
const MAX_PHASE: f32 = 14.0;

const KINGSIDE_CASTLING_BONUS: i32 = 8;
const QUEENSIDE_CASTLING_BONUS: i32 = 6;

/// Mobility weight per reachable square, indexed like [`MATERIAL`].
const MOBILITY: [i32; 6] = [0, 4, 3, 2, 2, 0];

const BLOCKED_BISHOP_PENALTY: i32 = 25;

/// Material value of a piece type.
#[inline]
pub fn piece_value(piece_type: PieceType) -> i32 {
    MATERIAL[piece_type.index()]
}

#[rustfmt::skip]
const PAWN_MG: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10,-15,-15, 10, 10,  5,
     5,  0,-10,  0,  0,-10,  0,  5,
     0,  0, 10, 30, 30, 10,  0,  0,
     5,  5, 10, 30, 30, 10,  5,  5,
    10, 10, 20, 30, 30, 20, 10, 10,
    50, 50, 55, 55, 55, 55, 50, 50,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const PAWN_EG: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 15, 15, 10, 10,  5,
    10, 15, 20, 25, 25, 20, 15, 10,
    20, 30, 35, 40, 40, 35, 30, 20,
    30, 45, 55, 60, 60, 55, 45, 30,
    50, 60, 75, 90, 90, 75, 60, 50,
    75, 80, 90,120,120, 90, 80, 75,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0,  0, 15, 15,  0,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP: [i32; 64] = [
    -30,-20,-10,  0,  0,-10,-20,-30,
    -20,-10,  0,  5,  5,  0,-10,-20,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5, 10, 25, 25, 10,  5,-10,
    -10,  5, 10, 25, 25, 10,  5,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -20,-10,  0,  5,  5,  0,-10,-20,
    -30,-20,-10,  0,  0,-10,-20,-30,
];

#[rustfmt::skip]
const ROOK: [i32; 64] = [
     0,  0,  5, 10, 10,  5,  0,  0,
     0,  0,  5, 10, 10,  5,  0,  0,
     0,  0,  5, 10, 10,  5,  0,  0,
     0,  0,  5, 10, 10,  5,  0,  0,
     0,  0,  5, 10, 10,  5,  0,  0,
     0,  0,  5, 10, 10,  5,  0,  0,
     5,  5, 10, 15, 15, 10,  5,  5,
     0,  0,  5, 10, 10,  5,  0,  0,
];

#[rustfmt::skip]
const QUEEN: [i32; 64] = [
    -20,-10,-10,  0,  0,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,-10,  5,  5,-10,  0,-10,
     -5,  0,  5, 10, 10,  5,  0, -5,
      0,  0,  5, 10, 10,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10,  0, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_MG: [i32; 64] = [
    -20,  10,   0, -20, -20,   0,  10, -20,
    -30, -40, -40, -60, -60, -40, -40, -30,
    -50, -60, -75, -90, -90, -75, -60, -50,
    -50, -60, -90, -90, -90, -90, -60, -50,
    -60, -75, -90,-120,-120, -90, -75, -60,
    -70, -75,-100,-150,-150,-100, -75, -70,
    -70, -75,-100,-150,-150,-100, -75, -70,
    -80,-100,-120,-150,-150,-120,-100, -80,
];

#[rustfmt::skip]
const KING_EG: [i32; 64] = [
    -50, -30, -20, -10, -10, -20, -30, -50,
    -30, -10,   0,  10,  10,   0, -10, -30,
    -20,   0,  20,  30,  30,  20,   0, -20,
    -10,   0,  20,  50,  50,  20,   0, -10,
    -10,   0,  20,  50,  50,  20,   0, -10,
      0,  10,  20,  20,  20,  20,  10,   0,
      0,   0,  10,  10,  10,  10,   0,   0,
    -10,  -5,   0,   0,   0,   0,  -5, -10,
];

/// Game phase in `[0, 1]`: 0 with all pieces on the board, 1 when only kings
/// and pawns remain.
pub fn endgame_weight(position: &Position) -> f32 {
    let board = position.board();
    let phase: u32 = [
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
    ]
    .into_iter()
    .flat_map(|pt| Color::ALL.map(|c| board.pieces(Piece::new(pt, c)).count()))
    .sum();
    1.0 - (phase as f32 / MAX_PHASE).min(1.0)
}

#[inline]
fn blend(eg: f32, mg_table: &[i32; 64], eg_table: &[i32; 64], idx: usize) -> i32 {
    (eg * eg_table[idx] as f32 + (1.0 - eg) * mg_table[idx] as f32) as i32
}

/// Piece-square bonus for `piece` on `sq`, from that piece's own side.
fn square_bonus(piece: Piece, sq: Square, eg: f32) -> i32 {
    let idx = match piece.color() {
        Color::White => sq.index() as usize,
        Color::Black => sq.mirror().index() as usize,
    };
    match piece.piece_type() {
        PieceType::Pawn => blend(eg, &PAWN_MG, &PAWN_EG, idx),
        PieceType::Knight => KNIGHT[idx],
        PieceType::Bishop => BISHOP[idx],
        PieceType::Rook => ROOK[idx],
        PieceType::Queen => QUEEN[idx],
        PieceType::King => blend(eg, &KING_MG, &KING_EG, idx),
    }
}

fn mobility(position: &Position, piece: Piece, sq: Square) -> i32 {
    let board = position.board();
    let occupied = board.occupancy();
    let attacks = match piece.piece_type() {
        PieceType::Knight => knight_attacks(sq),
        PieceType::Bishop => bishop_attacks(sq, occupied),
        PieceType::Rook => rook_attacks(sq, occupied),
        PieceType::Queen => queen_attacks(sq, occupied),
        PieceType::Pawn | PieceType::King => return 0,
    };
    let reachable = attacks & !board.color(piece.color());
    reachable.count() as i32 * MOBILITY[piece.piece_type().index()]
}

fn castling_bonus(position: &Position, color: Color) -> i32 {
    let rights = position.castling();
    let mut bonus = 0;
    if rights.has(CastlingRights::kingside_flag(color)) {
        bonus += KINGSIDE_CASTLING_BONUS;
    }
    if rights.has(CastlingRights::queenside_flag(color)) {
        bonus += QUEENSIDE_CASTLING_BONUS;
    }
    bonus
}

/// Penalty for a bishop still at home behind the pawn that blocks its long
/// diagonal (c1/d2 and f1/e2, mirrored for Black).
fn blocked_bishops(position: &Position, color: Color) -> i32 {
    let (bishop, pawn) = (
        Piece::new(PieceType::Bishop, color),
        Piece::new(PieceType::Pawn, color),
    );
    let pairs = match color {
        Color::White => [(Square::C1, Square::D2), (Square::F1, Square::E2)],
        Color::Black => [(Square::C8, Square::D7), (Square::F8, Square::E7)],
    };
    pairs
        .iter()
        .filter(|(b, p)| position.piece_at(*b) == Some(bishop) && position.piece_at(*p) == Some(pawn))
        .count() as i32
        * BLOCKED_BISHOP_PENALTY
}

/// Blocked-bishop term from White's side; only applies before the endgame.
fn bishop_blocking(position: &Position, eg: f32) -> i32 {
    if eg >= 0.5 {
        return 0;
    }
    blocked_bishops(position, Color::White) - blocked_bishops(position, Color::Black)
}

/// Evaluates the position for the side to move.
pub fn evaluate(position: &Position) -> i32 {
    let eg = endgame_weight(position);
    let mut score = 0;

    for (piece, sq) in Piece::ALL
        .into_iter()
        .flat_map(|piece| position.pieces(piece).into_iter().map(move |sq| (piece, sq)))
    {
        let value = piece_value(piece.piece_type())
            + square_bonus(piece, sq, eg)
            + mobility(position, piece, sq);
        score += piece.color().sign() * value;
    }

    score += castling_bonus(position, Color::White) - castling_bonus(position, Color::Black);

    score -= bishop_blocking(position, eg);

    score = score.clamp(-MAX_CP, MAX_CP);
    match position.side_to_move() {
        Color::White => score,
        Color::Black => -score,
    }
}
