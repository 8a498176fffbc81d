//! Zobrist keys for position hashing.
//!
//! A position's key is the XOR of:
//! - one key per (piece, square) pair on the board
//! - the side-to-move key when Black is to move
//! - one key per castling right still held
//! - one key per en passant file when a target square is set
//!
//! Piece keys are folded in by the board mutators; the remaining terms are
//! grouped into [`ZobristKeys::state_key`] so make/undo can swap them as one.

use chess_core::{Color, Piece, Square};

/// Table of Zobrist keys, generated at compile time from a fixed seed.
pub struct ZobristKeys {
    pieces: [[u64; 64]; Piece::COUNT],
    black_to_move: u64,
    castling: [u64; 4],
    en_passant: [u64; 8],
}

impl ZobristKeys {
    const fn new() -> Self {
        // xorshift64
        const fn next(mut x: u64) -> u64 {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            x
        }

        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut pieces = [[0u64; 64]; Piece::COUNT];
        let mut castling = [0u64; 4];
        let mut en_passant = [0u64; 8];

        let mut piece = 0;
        while piece < Piece::COUNT {
            let mut sq = 0;
            while sq < 64 {
                state = next(state);
                pieces[piece][sq] = state;
                sq += 1;
            }
            piece += 1;
        }

        state = next(state);
        let black_to_move = state;

        let mut i = 0;
        while i < 4 {
            state = next(state);
            castling[i] = state;
            i += 1;
        }

        let mut i = 0;
        while i < 8 {
            state = next(state);
            en_passant[i] = state;
            i += 1;
        }

        ZobristKeys {
            pieces,
            black_to_move,
            castling,
            en_passant,
        }
    }

    /// Key for `piece` standing on `sq`.
    #[inline]
    pub fn piece(&self, piece: Piece, sq: Square) -> u64 {
        self.pieces[piece.index()][sq.index() as usize]
    }

    /// Combined key of the non-board state: side to move, each held castling
    /// right (bit i of `castling` selects key i), and the en passant file.
    #[inline]
    pub fn state_key(&self, side: Color, castling: u8, en_passant: Option<Square>) -> u64 {
        let mut key = 0;
        if side == Color::Black {
            key ^= self.black_to_move;
        }
        for (bit, k) in self.castling.iter().enumerate() {
            if castling & (1 << bit) != 0 {
                key ^= k;
            }
        }
        if let Some(ep) = en_passant {
            key ^= self.en_passant[ep.file().index() as usize];
        }
        key
    }
}

/// Process-wide key table.
pub static ZOBRIST: ZobristKeys = ZobristKeys::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piece_keys_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for piece in Piece::ALL {
            for idx in 0..64 {
                let sq = Square::from_index(idx).unwrap();
                assert!(seen.insert(ZOBRIST.piece(piece, sq)));
            }
        }
        assert_eq!(seen.len(), 768);
    }

    #[test]
    fn state_key_components() {
        assert_eq!(ZOBRIST.state_key(Color::White, 0, None), 0);
        assert_ne!(ZOBRIST.state_key(Color::Black, 0, None), 0);

        let all = ZOBRIST.state_key(Color::White, 0b1111, None);
        let split = ZOBRIST.state_key(Color::White, 0b0011, None)
            ^ ZOBRIST.state_key(Color::White, 0b1100, None);
        assert_eq!(all, split);

        // Only the file of the en passant square matters.
        let e3 = Square::from_algebraic("e3");
        let e6 = Square::from_algebraic("e6");
        let d6 = Square::from_algebraic("d6");
        assert_eq!(
            ZOBRIST.state_key(Color::White, 0, e3),
            ZOBRIST.state_key(Color::White, 0, e6)
        );
        assert_ne!(
            ZOBRIST.state_key(Color::White, 0, e6),
            ZOBRIST.state_key(Color::White, 0, d6)
        );
    }
}
