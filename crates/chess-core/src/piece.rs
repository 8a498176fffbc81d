//! Chess piece representation.
//!
//! [`PieceType`] is the colorless kind of a piece; [`Piece`] is one of the
//! twelve colored pieces. An empty square is `Option::<Piece>::None`.

use crate::Color;

/// The six kinds of chess pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PieceType {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceType {
    /// All piece types in order.
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Returns the index of this piece type (0-5).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns true if this piece type slides (bishop, rook, or queen).
    #[inline]
    pub const fn is_slider(self) -> bool {
        matches!(self, PieceType::Bishop | PieceType::Rook | PieceType::Queen)
    }

    /// Lowercase letter used in FEN and move strings.
    pub const fn to_char(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }
}

impl std::fmt::Display for PieceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PieceType::Pawn => "Pawn",
            PieceType::Knight => "Knight",
            PieceType::Bishop => "Bishop",
            PieceType::Rook => "Rook",
            PieceType::Queen => "Queen",
            PieceType::King => "King",
        };
        write!(f, "{}", name)
    }
}

/// One of the twelve colored pieces.
///
/// The discriminant is `color * 6 + piece_type`, which is also the index of
/// the piece's bitboard in a board and its 4-bit code inside a packed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Piece {
    WhitePawn = 0,
    WhiteKnight = 1,
    WhiteBishop = 2,
    WhiteRook = 3,
    WhiteQueen = 4,
    WhiteKing = 5,
    BlackPawn = 6,
    BlackKnight = 7,
    BlackBishop = 8,
    BlackRook = 9,
    BlackQueen = 10,
    BlackKing = 11,
}

impl Piece {
    /// Number of distinct colored pieces.
    pub const COUNT: usize = 12;

    /// All pieces, White first, in index order.
    pub const ALL: [Piece; 12] = [
        Piece::WhitePawn,
        Piece::WhiteKnight,
        Piece::WhiteBishop,
        Piece::WhiteRook,
        Piece::WhiteQueen,
        Piece::WhiteKing,
        Piece::BlackPawn,
        Piece::BlackKnight,
        Piece::BlackBishop,
        Piece::BlackRook,
        Piece::BlackQueen,
        Piece::BlackKing,
    ];

    /// Builds a piece from its kind and color.
    #[inline]
    pub const fn new(piece_type: PieceType, color: Color) -> Self {
        Self::ALL[color.index() * 6 + piece_type.index()]
    }

    /// Returns the piece with the given index (0-11).
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 12 {
            Some(Self::ALL[index as usize])
        } else {
            None
        }
    }

    /// Returns the index of this piece (0-11).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the colorless kind of this piece.
    #[inline]
    pub const fn piece_type(self) -> PieceType {
        PieceType::ALL[self as usize % 6]
    }

    /// Returns the color of this piece.
    #[inline]
    pub const fn color(self) -> Color {
        if (self as u8) < 6 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// Returns the FEN character for this piece (uppercase for White).
    pub const fn to_fen_char(self) -> char {
        let c = self.piece_type().to_char();
        match self.color() {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Parses a FEN character into a piece.
    pub const fn from_fen_char(c: char) -> Option<Self> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let piece_type = match c.to_ascii_lowercase() {
            'p' => PieceType::Pawn,
            'n' => PieceType::Knight,
            'b' => PieceType::Bishop,
            'r' => PieceType::Rook,
            'q' => PieceType::Queen,
            'k' => PieceType::King,
            _ => return None,
        };
        Some(Piece::new(piece_type, color))
    }
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_fen_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piece_to_fen() {
        assert_eq!(Piece::WhitePawn.to_fen_char(), 'P');
        assert_eq!(Piece::BlackPawn.to_fen_char(), 'p');
        assert_eq!(Piece::WhiteKing.to_fen_char(), 'K');
        assert_eq!(Piece::BlackKnight.to_fen_char(), 'n');
    }

    #[test]
    fn piece_from_fen() {
        assert_eq!(Piece::from_fen_char('P'), Some(Piece::WhitePawn));
        assert_eq!(Piece::from_fen_char('p'), Some(Piece::BlackPawn));
        assert_eq!(Piece::from_fen_char('K'), Some(Piece::WhiteKing));
        assert_eq!(Piece::from_fen_char('x'), None);
    }

    #[test]
    fn new_matches_type_and_color() {
        for piece in Piece::ALL {
            assert_eq!(Piece::new(piece.piece_type(), piece.color()), piece);
        }
        assert_eq!(Piece::new(PieceType::Rook, Color::Black), Piece::BlackRook);
        assert_eq!(Piece::BlackQueen.index(), 10);
    }

    #[test]
    fn from_index_bounds() {
        assert_eq!(Piece::from_index(0), Some(Piece::WhitePawn));
        assert_eq!(Piece::from_index(11), Some(Piece::BlackKing));
        assert_eq!(Piece::from_index(12), None);
    }

    #[test]
    fn is_slider() {
        assert!(!PieceType::Pawn.is_slider());
        assert!(!PieceType::Knight.is_slider());
        assert!(PieceType::Bishop.is_slider());
        assert!(PieceType::Rook.is_slider());
        assert!(PieceType::Queen.is_slider());
        assert!(!PieceType::King.is_slider());
    }
}
