//! Position state with reversible make/undo.

use std::fmt;

use chess_core::{Color, Fen, FenError, Move, MoveFlag, Piece, PieceType, Square};
use thiserror::Error;

use crate::board::Board;
use crate::game_info::{CastlingRights, GameInfo, PackedGameInfo};
use crate::movegen::attacks::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks,
};
use crate::zobrist::ZOBRIST;
use crate::Bitboard;

/// Plies of history reserved up front. Searches never go deeper.
pub const HISTORY_CAPACITY: usize = 256;

/// Errors from building a position out of FEN text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PositionError {
    #[error(transparent)]
    Fen(#[from] FenError),

    #[error("no {0} king on the board")]
    MissingKing(Color),

    #[error("more than one {0} king on the board")]
    TooManyKings(Color),

    #[error("en passant square {0} does not follow a double pawn push")]
    InvalidEnPassant(Square),

    #[error("half-move clock {0} is out of range")]
    HalfmoveClockOutOfRange(u32),
}

/// Rights lost when a rook leaves, or something is captured on, a corner.
const CORNER_RIGHTS: [(Square, u8); 4] = [
    (Square::A1, CastlingRights::WHITE_QUEENSIDE),
    (Square::H1, CastlingRights::WHITE_KINGSIDE),
    (Square::A8, CastlingRights::BLACK_QUEENSIDE),
    (Square::H8, CastlingRights::BLACK_KINGSIDE),
];

fn corner_rights(sq: Square) -> u8 {
    CORNER_RIGHTS
        .iter()
        .find(|(corner, _)| *corner == sq)
        .map_or(0, |(_, flag)| *flag)
}

/// Rook origin and destination for a castling king landing on `king_to`.
#[inline]
fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    if king_to == Square::G1 || king_to == Square::G8 {
        (king_to.offset(1), king_to.offset(-1))
    } else {
        (king_to.offset(-2), king_to.offset(1))
    }
}

/// Square of the pawn taken by an en passant capture landing on `to`.
#[inline]
fn en_passant_victim(to: Square, mover: Color) -> Square {
    to.offset(-mover.push_offset())
}

/// The en passant target must be empty on the mover's sixth rank, with the
/// enemy pawn in front of it and its start square vacated.
fn en_passant_is_plausible(fen: &Fen, ep: Square) -> bool {
    let mover = fen.side_to_move;
    let expected_rank = match mover {
        Color::White => 5,
        Color::Black => 2,
    };
    if ep.rank().index() != expected_rank {
        return false;
    }
    let piece_on = |sq: Square| fen.board[sq.index() as usize];
    let victim = en_passant_victim(ep, mover);
    let origin = ep.offset(mover.push_offset());
    piece_on(ep).is_none()
        && piece_on(origin).is_none()
        && piece_on(victim) == Some(Piece::new(PieceType::Pawn, mover.opposite()))
}

/// A chess position that is mutated in place by [`Position::make_move`] and
/// restored exactly by [`Position::undo_move`].
#[derive(Clone)]
pub struct Position {
    board: Board,
    info: GameInfo,
    /// Zobrist terms for `info`, kept separate from the board's piece key.
    info_key: u64,
    move_stack: Vec<Move>,
    undo_stack: Vec<PackedGameInfo>,
    /// Fullmove number and side to move at the bottom of the history.
    root_fullmove: u32,
    root_side: Color,
}

impl Position {
    /// A position with no pieces, White to move and no rights.
    pub fn empty() -> Self {
        let info = GameInfo::default();
        Position {
            board: Board::empty(),
            info,
            info_key: Self::key_of(&info),
            move_stack: Vec::with_capacity(HISTORY_CAPACITY),
            undo_stack: Vec::with_capacity(HISTORY_CAPACITY),
            root_fullmove: 1,
            root_side: Color::White,
        }
    }

    pub fn startpos() -> Self {
        Self::from_parsed(&Fen::default())
    }

    /// Parses FEN text and checks that each side has exactly one king, that
    /// an en passant square sits behind a pawn that just made a double push,
    /// and that the half-move clock fits the packed history.
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let parsed = Fen::parse(fen)?;
        for color in Color::ALL {
            let kings = parsed
                .board
                .iter()
                .filter(|p| **p == Some(Piece::new(PieceType::King, color)))
                .count();
            match kings {
                0 => return Err(PositionError::MissingKing(color)),
                1 => {}
                _ => return Err(PositionError::TooManyKings(color)),
            }
        }
        if let Some(ep) = parsed.en_passant {
            if !en_passant_is_plausible(&parsed, ep) {
                return Err(PositionError::InvalidEnPassant(ep));
            }
        }
        if parsed.halfmove_clock > PackedGameInfo::MAX_HALFMOVE_CLOCK {
            return Err(PositionError::HalfmoveClockOutOfRange(parsed.halfmove_clock));
        }
        Ok(Self::from_parsed(&parsed))
    }

    fn from_parsed(fen: &Fen) -> Self {
        let mut position = Position::empty();
        for (idx, piece) in fen.board.iter().enumerate() {
            if let (Some(piece), Some(sq)) = (piece, Square::from_index(idx as u8)) {
                position.board.set_square(sq, *piece);
            }
        }
        position.board.update_occupancies();
        position.info = GameInfo {
            side_to_move: fen.side_to_move,
            castling: CastlingRights::from_bits(fen.castling),
            en_passant: fen.en_passant,
            halfmove_clock: fen.halfmove_clock,
        };
        position.info_key = Self::key_of(&position.info);
        position.root_fullmove = fen.fullmove_number.max(1);
        position.root_side = fen.side_to_move;
        position
    }

    pub fn to_fen(&self) -> String {
        let mut board = [None; 64];
        for (idx, slot) in board.iter_mut().enumerate() {
            *slot = Square::from_index(idx as u8).and_then(|sq| self.board.piece_at(sq));
        }
        Fen {
            board,
            side_to_move: self.info.side_to_move,
            castling: self.info.castling.bits(),
            en_passant: self.info.en_passant,
            halfmove_clock: self.info.halfmove_clock,
            fullmove_number: self.fullmove_number(),
        }
        .to_string()
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn game_info(&self) -> &GameInfo {
        &self.info
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.info.side_to_move
    }

    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.info.castling
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.info.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.info.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        let black_first = usize::from(self.root_side == Color::Black);
        self.root_fullmove + ((self.move_stack.len() + black_first) / 2) as u32
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board.piece_at(sq)
    }

    #[inline]
    pub fn pieces(&self, piece: Piece) -> Bitboard {
        self.board.pieces(piece)
    }

    #[inline]
    pub fn occupancy(&self) -> Bitboard {
        self.board.occupancy()
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.board.pieces(Piece::new(PieceType::King, color)).lsb()
    }

    /// Number of moves (including null moves) on the history stack.
    #[inline]
    pub fn ply_count(&self) -> usize {
        self.move_stack.len()
    }

    /// Makes the current position the bottom of the history.
    ///
    /// Used after replaying a game record so the search has the full history
    /// capacity available.
    pub fn reset_history(&mut self) {
        self.root_fullmove = self.fullmove_number();
        self.root_side = self.info.side_to_move;
        self.move_stack.clear();
        self.undo_stack.clear();
    }

    /// Zobrist key of the position, maintained incrementally.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.board.key() ^ self.info_key
    }

    /// Zobrist key recomputed from scratch.
    pub fn compute_hash(&self) -> u64 {
        self.board.compute_key() ^ Self::key_of(&self.info)
    }

    fn key_of(info: &GameInfo) -> u64 {
        ZOBRIST.state_key(info.side_to_move, info.castling.bits(), info.en_passant)
    }

    #[inline]
    pub fn set_square(&mut self, sq: Square, piece: Piece) {
        self.board.set_square(sq, piece);
    }

    #[inline]
    pub fn clear_square(&mut self, sq: Square) {
        self.board.clear_square(sq);
    }

    pub fn update_occupancies(&mut self) {
        self.board.update_occupancies();
    }

    /// Returns true if any piece of color `by` attacks `sq`.
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        let board = &self.board;
        let occupied = board.occupancy();
        let pawns = board.pieces(Piece::new(PieceType::Pawn, by));
        let knights = board.pieces(Piece::new(PieceType::Knight, by));
        let bishops = board.pieces(Piece::new(PieceType::Bishop, by));
        let rooks = board.pieces(Piece::new(PieceType::Rook, by));
        let queens = board.pieces(Piece::new(PieceType::Queen, by));
        let kings = board.pieces(Piece::new(PieceType::King, by));

        // A pawn of `by` attacks sq iff a pawn of the other color on sq would
        // attack that pawn.
        (pawn_attacks(sq, by.opposite()) & pawns).is_not_empty()
            || (knight_attacks(sq) & knights).is_not_empty()
            || (king_attacks(sq) & kings).is_not_empty()
            || (bishop_attacks(sq, occupied) & (bishops | queens)).is_not_empty()
            || (rook_attacks(sq, occupied) & (rooks | queens)).is_not_empty()
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        match self.king_square(color) {
            Some(king) => self.is_square_attacked(king, color.opposite()),
            None => false,
        }
    }

    pub fn can_castle_kingside(&self) -> bool {
        let us = self.info.side_to_move;
        let (king, rook, cross, land) = match us {
            Color::White => (Square::E1, Square::H1, Square::F1, Square::G1),
            Color::Black => (Square::E8, Square::H8, Square::F8, Square::G8),
        };
        self.can_castle(CastlingRights::kingside_flag(us), king, rook, &[cross, land], &[cross, land])
    }

    pub fn can_castle_queenside(&self) -> bool {
        let us = self.info.side_to_move;
        let (king, rook, between) = match us {
            Color::White => (Square::E1, Square::A1, [Square::D1, Square::C1, Square::B1]),
            Color::Black => (Square::E8, Square::A8, [Square::D8, Square::C8, Square::B8]),
        };
        self.can_castle(
            CastlingRights::queenside_flag(us),
            king,
            rook,
            &between,
            &between[..2],
        )
    }

    fn can_castle(
        &self,
        flag: u8,
        king: Square,
        rook: Square,
        between: &[Square],
        king_path: &[Square],
    ) -> bool {
        let us = self.info.side_to_move;
        if self.is_in_check(us) || !self.info.castling.has(flag) {
            return false;
        }
        if between.iter().any(|sq| self.board.piece_at(*sq).is_some()) {
            return false;
        }
        if self.board.piece_at(king) != Some(Piece::new(PieceType::King, us))
            || self.board.piece_at(rook) != Some(Piece::new(PieceType::Rook, us))
        {
            return false;
        }
        !king_path
            .iter()
            .any(|sq| self.is_square_attacked(*sq, us.opposite()))
    }

    /// Applies a move produced by the move generator for this position.
    pub fn make_move(&mut self, m: Move) {
        debug_assert!(
            self.move_stack.len() < HISTORY_CAPACITY,
            "history exceeds {HISTORY_CAPACITY} plies"
        );
        let us = self.info.side_to_move;
        let (from, to, moved, captured) = (m.from(), m.to(), m.moved(), m.captured());

        self.move_stack.push(m);
        self.undo_stack.push(PackedGameInfo::pack(&self.info));
        self.info_key ^= Self::key_of(&self.info);

        self.board.clear_square(from);
        let mut en_passant = None;

        match m.flag() {
            MoveFlag::Castling => {
                let (rook_from, rook_to) = castling_rook_squares(to);
                if let Some(rook) = self.board.piece_at(rook_from) {
                    self.board.clear_square(rook_from);
                    self.board.set_square(rook_to, rook);
                }
                self.board.set_square(to, moved);
                self.info.castling.remove(CastlingRights::color_flags(us));
            }
            MoveFlag::EnPassant => {
                self.board.clear_square(en_passant_victim(to, us));
                self.board.set_square(to, moved);
            }
            MoveFlag::DoublePush => {
                self.board.set_square(to, moved);
                en_passant = Some(en_passant_victim(to, us));
            }
            MoveFlag::PromoteKnight
            | MoveFlag::PromoteBishop
            | MoveFlag::PromoteRook
            | MoveFlag::PromoteQueen => {
                // set_square removes any captured piece on the way.
                self.board.set_square(to, m.promotion_piece().unwrap_or(moved));
            }
            MoveFlag::Normal => {
                self.board.set_square(to, moved);
            }
        }

        let mut lost = 0;
        if moved.piece_type() == PieceType::Rook {
            lost |= corner_rights(from);
        }
        if captured.is_some() {
            lost |= corner_rights(to);
        }
        if moved.piece_type() == PieceType::King {
            lost |= CastlingRights::color_flags(us);
        }
        self.info.castling.remove(lost);

        if moved.piece_type() == PieceType::Pawn || captured.is_some() {
            self.info.halfmove_clock = 0;
        } else {
            self.info.halfmove_clock += 1;
        }

        self.info.en_passant = en_passant;
        self.info.side_to_move = us.opposite();
        self.info_key ^= Self::key_of(&self.info);
    }

    /// Reverts the last [`Position::make_move`].
    ///
    /// # Panics
    ///
    /// Panics if the history is empty.
    pub fn undo_move(&mut self) {
        self.info_key ^= Self::key_of(&self.info);
        self.info.side_to_move = self.info.side_to_move.opposite();
        let us = self.info.side_to_move;

        let m = self.move_stack.pop().expect("undo_move with empty history");
        let snapshot = self.undo_stack.pop().expect("undo stack out of step with moves");
        snapshot.restore(&mut self.info);
        self.info_key ^= Self::key_of(&self.info);

        let (from, to, moved) = (m.from(), m.to(), m.moved());
        self.board.clear_square(to);
        self.board.set_square(from, moved);

        match m.flag() {
            MoveFlag::Castling => {
                let (rook_from, rook_to) = castling_rook_squares(to);
                if let Some(rook) = self.board.piece_at(rook_to) {
                    self.board.clear_square(rook_to);
                    self.board.set_square(rook_from, rook);
                }
            }
            MoveFlag::EnPassant => {
                let pawn = m
                    .captured()
                    .unwrap_or(Piece::new(PieceType::Pawn, us.opposite()));
                self.board.set_square(en_passant_victim(to, us), pawn);
            }
            _ => {
                if let Some(captured) = m.captured() {
                    self.board.set_square(to, captured);
                }
            }
        }
    }

    /// Passes the turn: records a snapshot, clears en passant, flips the side.
    pub fn make_null_move(&mut self) {
        debug_assert!(self.move_stack.len() < HISTORY_CAPACITY);
        self.move_stack.push(Move::NULL);
        self.undo_stack.push(PackedGameInfo::pack(&self.info));
        self.info_key ^= Self::key_of(&self.info);
        self.info.en_passant = None;
        self.info.side_to_move = self.info.side_to_move.opposite();
        self.info_key ^= Self::key_of(&self.info);
    }

    /// Reverts the last [`Position::make_null_move`].
    pub fn undo_null_move(&mut self) {
        self.info_key ^= Self::key_of(&self.info);
        self.info.side_to_move = self.info.side_to_move.opposite();
        let m = self.move_stack.pop().expect("undo_null_move with empty history");
        debug_assert_eq!(m, Move::NULL);
        let snapshot = self.undo_stack.pop().expect("undo stack out of step with moves");
        snapshot.restore(&mut self.info);
        self.info_key ^= Self::key_of(&self.info);
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

impl PartialEq for Position {
    /// Positions compare equal when board and game info match; history and
    /// move counters are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board && self.info == other.info
    }
}

impl Eq for Position {}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.to_fen())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const RULE: &str = "  +---+---+---+---+---+---+---+---+";
        writeln!(f, "{RULE}")?;
        for rank in (0..8u8).rev() {
            write!(f, "{} |", rank + 1)?;
            for file in 0..8u8 {
                let c = Square::from_index(rank * 8 + file)
                    .and_then(|sq| self.piece_at(sq))
                    .map_or(' ', Piece::to_fen_char);
                write!(f, " {c} |")?;
            }
            writeln!(f)?;
            writeln!(f, "{RULE}")?;
        }
        writeln!(f, "    a   b   c   d   e   f   g   h")?;
        writeln!(f)?;
        writeln!(f, "Fen: {}", self.to_fen())?;
        write!(f, "Key: {:016X}", self.hash())
    }
}
