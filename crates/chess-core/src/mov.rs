//! Packed move representation.

use crate::{Piece, PieceType, Square};
use std::fmt;

/// Kind of move, stored in the top field of a packed [`Move`].
///
/// The promotion variants are contiguous and last so that "is promotion" is a
/// single comparison against [`MoveFlag::PromoteKnight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum MoveFlag {
    /// Quiet move or ordinary capture.
    Normal = 0,
    /// King move of two squares; the rook moves too.
    Castling = 1,
    /// Pawn capture onto the en passant target square.
    EnPassant = 2,
    /// Pawn double push from its starting rank.
    DoublePush = 3,
    PromoteKnight = 4,
    PromoteBishop = 5,
    PromoteRook = 6,
    PromoteQueen = 7,
}

impl MoveFlag {
    const ALL: [MoveFlag; 8] = [
        MoveFlag::Normal,
        MoveFlag::Castling,
        MoveFlag::EnPassant,
        MoveFlag::DoublePush,
        MoveFlag::PromoteKnight,
        MoveFlag::PromoteBishop,
        MoveFlag::PromoteRook,
        MoveFlag::PromoteQueen,
    ];

    /// Promotion flags in the order the move generator emits them.
    pub const PROMOTIONS: [MoveFlag; 4] = [
        MoveFlag::PromoteQueen,
        MoveFlag::PromoteRook,
        MoveFlag::PromoteBishop,
        MoveFlag::PromoteKnight,
    ];

    /// Returns true if this is a promotion move.
    #[inline]
    pub const fn is_promotion(self) -> bool {
        self as u8 >= MoveFlag::PromoteKnight as u8
    }

    /// Returns the promoted piece kind if this is a promotion move.
    #[inline]
    pub const fn promotion_type(self) -> Option<PieceType> {
        match self {
            MoveFlag::PromoteKnight => Some(PieceType::Knight),
            MoveFlag::PromoteBishop => Some(PieceType::Bishop),
            MoveFlag::PromoteRook => Some(PieceType::Rook),
            MoveFlag::PromoteQueen => Some(PieceType::Queen),
            _ => None,
        }
    }
}

/// A chess move packed into 32 bits.
///
/// | bits  | field                        |
/// |-------|------------------------------|
/// | 0-5   | from square                  |
/// | 6-11  | to square                    |
/// | 12-15 | moved piece                  |
/// | 16-19 | captured piece (12 = none)   |
/// | 20-23 | [`MoveFlag`]                 |
///
/// Moves carry everything needed to undo them, so a position only has to
/// remember the game-info fields that a move destroys.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move(u32);

const SQUARE_MASK: u32 = 0x3F;
const FIELD_MASK: u32 = 0xF;
const TO_SHIFT: u32 = 6;
const MOVED_SHIFT: u32 = 12;
const CAPTURED_SHIFT: u32 = 16;
const FLAG_SHIFT: u32 = 20;

/// Code stored in a piece field when there is no piece.
const NO_PIECE: u32 = 12;

impl Move {
    /// The pass marker pushed by null moves. It is never generated.
    pub const NULL: Move = Move(NO_PIECE << CAPTURED_SHIFT);

    /// Packs a move from its five fields.
    #[inline]
    pub const fn new(
        from: Square,
        to: Square,
        moved: Piece,
        captured: Option<Piece>,
        flag: MoveFlag,
    ) -> Self {
        let captured = match captured {
            Some(piece) => piece as u32,
            None => NO_PIECE,
        };
        Move(
            (from.index() as u32)
                | ((to.index() as u32) << TO_SHIFT)
                | ((moved as u32) << MOVED_SHIFT)
                | (captured << CAPTURED_SHIFT)
                | ((flag as u32) << FLAG_SHIFT),
        )
    }

    /// Returns the source square.
    #[inline]
    pub const fn from(self) -> Square {
        Square::from_low_bits(self.0)
    }

    /// Returns the destination square.
    #[inline]
    pub const fn to(self) -> Square {
        Square::from_low_bits(self.0 >> TO_SHIFT)
    }

    /// Returns the piece that moves.
    #[inline]
    pub const fn moved(self) -> Piece {
        match Piece::from_index(((self.0 >> MOVED_SHIFT) & FIELD_MASK) as u8) {
            Some(piece) => piece,
            None => panic!("packed move holds no moved piece"),
        }
    }

    /// Returns the captured piece, if any.
    ///
    /// For en passant this is the captured pawn even though it does not stand
    /// on the destination square.
    #[inline]
    pub const fn captured(self) -> Option<Piece> {
        Piece::from_index(((self.0 >> CAPTURED_SHIFT) & FIELD_MASK) as u8)
    }

    /// Returns the move flag.
    #[inline]
    pub const fn flag(self) -> MoveFlag {
        MoveFlag::ALL[((self.0 >> FLAG_SHIFT) & 0x7) as usize]
    }

    /// Returns true if the move captures a piece.
    #[inline]
    pub const fn is_capture(self) -> bool {
        self.captured().is_some()
    }

    /// Returns true if the move promotes a pawn.
    #[inline]
    pub const fn is_promotion(self) -> bool {
        self.flag().is_promotion()
    }

    /// Returns the piece the pawn becomes, colored like the mover.
    #[inline]
    pub const fn promotion_piece(self) -> Option<Piece> {
        match self.flag().promotion_type() {
            Some(piece_type) => Some(Piece::new(piece_type, self.moved().color())),
            None => None,
        }
    }

    /// Returns the raw packed value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the coordinate notation for this move (e.g., "e2e4", "e7e8q").
    pub fn to_uci(self) -> String {
        match self.flag().promotion_type() {
            Some(piece_type) => format!("{}{}{}", self.from(), self.to(), piece_type.to_char()),
            None => format!("{}{}", self.from(), self.to()),
        }
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({})", self.to_uci())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}
