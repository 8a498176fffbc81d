//! Piece placement: bitboards plus a mailbox kept in lockstep.

use chess_core::{Color, Piece, Square};

use crate::zobrist::ZOBRIST;
use crate::Bitboard;

/// Piece placement.
///
/// For every square the mailbox entry is `None` exactly when no piece
/// bitboard has that bit; otherwise only `pieces[mailbox[sq]]` has it. The
/// color boards and the occupancy are the unions of the matching piece boards.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    pieces: [Bitboard; Piece::COUNT],
    mailbox: [Option<Piece>; 64],
    colors: [Bitboard; 2],
    occupancy: Bitboard,
    /// XOR of the Zobrist keys of every piece on the board.
    key: u64,
}

impl Board {
    pub fn empty() -> Self {
        Board {
            pieces: [Bitboard::EMPTY; Piece::COUNT],
            mailbox: [None; 64],
            colors: [Bitboard::EMPTY; 2],
            occupancy: Bitboard::EMPTY,
            key: 0,
        }
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.mailbox[sq.index() as usize]
    }

    #[inline]
    pub fn pieces(&self, piece: Piece) -> Bitboard {
        self.pieces[piece.index()]
    }

    #[inline]
    pub fn color(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    #[inline]
    pub fn occupancy(&self) -> Bitboard {
        self.occupancy
    }

    #[inline]
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Puts `piece` on `sq`, removing whatever stood there.
    #[inline]
    pub fn set_square(&mut self, sq: Square, piece: Piece) {
        self.clear_square(sq);
        let bit = Bitboard::from_square(sq);
        self.pieces[piece.index()] |= bit;
        self.colors[piece.color().index()] |= bit;
        self.occupancy |= bit;
        self.mailbox[sq.index() as usize] = Some(piece);
        self.key ^= ZOBRIST.piece(piece, sq);
    }

    /// Empties `sq`. A no-op on an empty square.
    #[inline]
    pub fn clear_square(&mut self, sq: Square) {
        if let Some(piece) = self.mailbox[sq.index() as usize].take() {
            let bit = !Bitboard::from_square(sq);
            self.pieces[piece.index()] &= bit;
            self.colors[piece.color().index()] &= bit;
            self.occupancy &= bit;
            self.key ^= ZOBRIST.piece(piece, sq);
        }
    }

    /// Recomputes the color boards and the occupancy from the piece boards.
    pub fn update_occupancies(&mut self) {
        self.colors = [Bitboard::EMPTY; 2];
        for piece in Piece::ALL {
            self.colors[piece.color().index()] |= self.pieces[piece.index()];
        }
        self.occupancy = self.colors[0] | self.colors[1];
    }

    /// Piece-square key recomputed from the mailbox.
    pub fn compute_key(&self) -> u64 {
        (0..64u8)
            .filter_map(Square::from_index)
            .filter_map(|sq| self.piece_at(sq).map(|piece| ZOBRIST.piece(piece, sq)))
            .fold(0, |acc, k| acc ^ k)
    }

    /// Checks the mailbox/bitboard/occupancy invariant.
    pub fn is_consistent(&self) -> bool {
        let mut union = Bitboard::EMPTY;
        for piece in Piece::ALL {
            let bb = self.pieces[piece.index()];
            if (union & bb).is_not_empty() {
                return false;
            }
            union |= bb;
        }

        for idx in 0..64u8 {
            let Some(sq) = Square::from_index(idx) else {
                return false;
            };
            let ok = match self.mailbox[idx as usize] {
                Some(piece) => self.pieces[piece.index()].contains(sq),
                None => !union.contains(sq),
            };
            if !ok {
                return false;
            }
        }

        let white = Piece::ALL[..6]
            .iter()
            .fold(Bitboard::EMPTY, |acc, p| acc | self.pieces[p.index()]);
        let black = Piece::ALL[6..]
            .iter()
            .fold(Bitboard::EMPTY, |acc, p| acc | self.pieces[p.index()]);

        self.colors[0] == white
            && self.colors[1] == black
            && self.occupancy == union
            && self.occupancy == (white | black)
            && self.key == self.compute_key()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    #[test]
    fn set_and_clear_keep_invariant() {
        let mut board = Board::empty();
        board.set_square(sq("e4"), Piece::WhiteKnight);
        board.set_square(sq("d5"), Piece::BlackPawn);
        assert!(board.is_consistent());
        assert_eq!(board.occupancy().count(), 2);
        assert!(board.color(Color::Black).contains(sq("d5")));

        // Overwriting removes the old piece from its bitboard.
        board.set_square(sq("d5"), Piece::WhiteKnight);
        assert!(board.pieces(Piece::BlackPawn).is_empty());
        assert_eq!(board.pieces(Piece::WhiteKnight).count(), 2);
        assert!(board.is_consistent());

        board.clear_square(sq("e4"));
        board.clear_square(sq("a1"));
        assert_eq!(board.piece_at(sq("e4")), None);
        assert!(board.is_consistent());
    }

    #[test]
    fn key_returns_to_zero_when_emptied() {
        let mut board = Board::empty();
        board.set_square(sq("a1"), Piece::WhiteRook);
        board.set_square(sq("h8"), Piece::BlackRook);
        assert_ne!(board.key(), 0);
        board.clear_square(sq("a1"));
        board.clear_square(sq("h8"));
        assert_eq!(board.key(), 0);
    }

    #[test]
    fn update_occupancies_repairs_color_boards() {
        let mut board = Board::empty();
        board.set_square(sq("c3"), Piece::BlackQueen);
        board.colors = [Bitboard::EMPTY; 2];
        board.occupancy = Bitboard::EMPTY;
        assert!(!board.is_consistent());
        board.update_occupancies();
        assert!(board.is_consistent());
    }
}
