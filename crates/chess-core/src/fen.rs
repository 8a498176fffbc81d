//! FEN (Forsyth-Edwards Notation) parsing and serialization.

use crate::{Color, File, Piece, Rank, Square};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when parsing FEN strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid FEN: expected 4 to 6 fields, got {0}")]
    InvalidFieldCount(usize),

    #[error("invalid piece placement: {0}")]
    InvalidPiecePlacement(String),

    #[error("invalid active color: expected 'w' or 'b', got '{0}'")]
    InvalidActiveColor(String),

    #[error("invalid castling rights: {0}")]
    InvalidCastlingRights(String),

    #[error("invalid en passant square: {0}")]
    InvalidEnPassantSquare(String),

    #[error("invalid halfmove clock: {0}")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number: {0}")]
    InvalidFullmoveNumber(String),
}

/// Castling bit for white kingside in [`Fen::castling`].
pub const FEN_WHITE_KINGSIDE: u8 = 1;
/// Castling bit for white queenside in [`Fen::castling`].
pub const FEN_WHITE_QUEENSIDE: u8 = 2;
/// Castling bit for black kingside in [`Fen::castling`].
pub const FEN_BLACK_KINGSIDE: u8 = 4;
/// Castling bit for black queenside in [`Fen::castling`].
pub const FEN_BLACK_QUEENSIDE: u8 = 8;

const CASTLING_CHARS: [(char, u8); 4] = [
    ('K', FEN_WHITE_KINGSIDE),
    ('Q', FEN_WHITE_QUEENSIDE),
    ('k', FEN_BLACK_KINGSIDE),
    ('q', FEN_BLACK_QUEENSIDE),
];

/// A parsed FEN record.
///
/// Only the syntax is checked here. Whether the position makes sense (one king
/// per side and so on) is up to whoever builds a board from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fen {
    /// Square contents indexed by [`Square::index`] (a1 = 0, h8 = 63).
    pub board: [Option<Piece>; 64],
    pub side_to_move: Color,
    /// Castling rights as a bitmask of the `FEN_*` constants.
    pub castling: u8,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl Fen {
    /// The standard starting position FEN.
    pub const STARTPOS: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Parses a FEN string.
    ///
    /// The halfmove clock and fullmove number may be omitted; they default to
    /// 0 and 1.
    pub fn parse(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(FenError::InvalidFieldCount(fields.len()));
        }

        let board = parse_placement(fields[0])?;

        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidActiveColor(other.to_string())),
        };

        let castling = parse_castling(fields[2])?;
        let en_passant = parse_en_passant(fields[3])?;

        let halfmove_clock = match fields.get(4) {
            Some(s) => s
                .parse::<u32>()
                .map_err(|_| FenError::InvalidHalfmoveClock(s.to_string()))?,
            None => 0,
        };

        let fullmove_number = match fields.get(5) {
            Some(s) => s
                .parse::<u32>()
                .map_err(|_| FenError::InvalidFullmoveNumber(s.to_string()))?,
            None => 1,
        };

        Ok(Fen {
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    /// Returns the piece on a square.
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board[sq.index() as usize]
    }
}

impl Default for Fen {
    fn default() -> Self {
        let mut board = [None; 64];
        let back = "RNBQKBNR";
        for (file, c) in back.chars().enumerate() {
            board[file] = Piece::from_fen_char(c);
            board[8 + file] = Some(Piece::WhitePawn);
            board[48 + file] = Some(Piece::BlackPawn);
            board[56 + file] = Piece::from_fen_char(c.to_ascii_lowercase());
        }
        Fen {
            board,
            side_to_move: Color::White,
            castling: FEN_WHITE_KINGSIDE | FEN_WHITE_QUEENSIDE | FEN_BLACK_KINGSIDE | FEN_BLACK_QUEENSIDE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

fn parse_placement(placement: &str) -> Result<[Option<Piece>; 64], FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::InvalidPiecePlacement(format!(
            "expected 8 ranks, got {}",
            ranks.len()
        )));
    }

    let mut board = [None; 64];
    // FEN lists rank 8 first.
    for (row, text) in ranks.iter().enumerate() {
        let rank = 7 - row;
        let mut file = 0usize;
        for c in text.chars() {
            if let Some(skip) = c.to_digit(10) {
                if skip == 0 || skip > 8 {
                    return Err(FenError::InvalidPiecePlacement(format!(
                        "bad empty-square count '{}' in rank {}",
                        c,
                        rank + 1
                    )));
                }
                file += skip as usize;
            } else if let Some(piece) = Piece::from_fen_char(c) {
                if file < 8 {
                    board[rank * 8 + file] = Some(piece);
                }
                file += 1;
            } else {
                return Err(FenError::InvalidPiecePlacement(format!(
                    "invalid character '{}' in rank {}",
                    c,
                    rank + 1
                )));
            }
            if file > 8 {
                break;
            }
        }
        if file != 8 {
            return Err(FenError::InvalidPiecePlacement(format!(
                "rank {} does not describe 8 squares",
                rank + 1
            )));
        }
    }
    Ok(board)
}

fn parse_castling(castling: &str) -> Result<u8, FenError> {
    if castling == "-" {
        return Ok(0);
    }
    let mut rights = 0u8;
    for c in castling.chars() {
        match CASTLING_CHARS.iter().find(|(name, _)| *name == c) {
            Some((_, bit)) => rights |= bit,
            None => {
                return Err(FenError::InvalidCastlingRights(format!(
                    "invalid character '{}'",
                    c
                )))
            }
        }
    }
    Ok(rights)
}

fn parse_en_passant(ep: &str) -> Result<Option<Square>, FenError> {
    if ep == "-" {
        return Ok(None);
    }
    match Square::from_algebraic(ep) {
        Some(sq) if sq.rank() == Rank::R3 || sq.rank() == Rank::R6 => Ok(Some(sq)),
        _ => Err(FenError::InvalidEnPassantSquare(ep.to_string())),
    }
}

impl fmt::Display for Fen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::ALL.iter().rev() {
            let mut empty = 0;
            for file in File::ALL {
                match self.piece_at(Square::new(file, *rank)) {
                    Some(piece) => {
                        if empty > 0 {
                            write!(f, "{}", empty)?;
                            empty = 0;
                        }
                        write!(f, "{}", piece.to_fen_char())?;
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                write!(f, "{}", empty)?;
            }
            if *rank != Rank::R1 {
                write!(f, "/")?;
            }
        }

        let side = match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        };
        write!(f, " {} ", side)?;

        if self.castling == 0 {
            write!(f, "-")?;
        } else {
            for (name, bit) in CASTLING_CHARS {
                if self.castling & bit != 0 {
                    write!(f, "{}", name)?;
                }
            }
        }

        match self.en_passant {
            Some(sq) => write!(f, " {}", sq)?,
            None => write!(f, " -")?,
        }

        write!(f, " {} {}", self.halfmove_clock, self.fullmove_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_startpos() {
        let fen = Fen::parse(Fen::STARTPOS).unwrap();
        assert_eq!(fen.side_to_move, Color::White);
        assert_eq!(fen.castling, 0b1111);
        assert_eq!(fen.en_passant, None);
        assert_eq!(fen.halfmove_clock, 0);
        assert_eq!(fen.fullmove_number, 1);
        assert_eq!(fen.piece_at(Square::E1), Some(Piece::WhiteKing));
        assert_eq!(fen.piece_at(Square::D8), Some(Piece::BlackQueen));
        assert_eq!(fen, Fen::default());
    }

    #[test]
    fn parse_custom_position() {
        let fen = Fen::parse("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3")
            .unwrap();
        assert_eq!(fen.halfmove_clock, 2);
        assert_eq!(fen.fullmove_number, 3);
        assert_eq!(
            fen.piece_at(Square::from_algebraic("c6").unwrap()),
            Some(Piece::BlackKnight)
        );
        assert_eq!(fen.piece_at(Square::G1), None);
    }

    #[test]
    fn clocks_are_optional() {
        let fen = Fen::parse("8/8/8/8/8/8/8/K6k b - -").unwrap();
        assert_eq!(fen.side_to_move, Color::Black);
        assert_eq!(fen.halfmove_clock, 0);
        assert_eq!(fen.fullmove_number, 1);

        let fen = Fen::parse("8/8/8/8/8/8/8/K6k w - - 7").unwrap();
        assert_eq!(fen.halfmove_clock, 7);
        assert_eq!(fen.fullmove_number, 1);
    }

    #[test]
    fn roundtrip() {
        for original in [
            Fen::STARTPOS,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        ] {
            assert_eq!(Fen::parse(original).unwrap().to_string(), original);
        }
    }

    #[test]
    fn castling_subsets() {
        assert_eq!(Fen::parse("8/8/8/8/8/8/8/8 w - - 0 1").unwrap().castling, 0);
        let fen = Fen::parse("8/8/8/8/8/8/8/8 w Kq - 0 1").unwrap();
        assert_eq!(fen.castling, FEN_WHITE_KINGSIDE | FEN_BLACK_QUEENSIDE);
        assert!(fen.to_string().contains(" Kq "));
    }

    #[test]
    fn en_passant_squares() {
        let fen = Fen::parse("8/8/8/8/8/8/8/8 b - d6 0 1").unwrap();
        assert_eq!(fen.en_passant, Square::from_algebraic("d6"));
    }

    #[test]
    fn invalid_field_count() {
        assert!(matches!(Fen::parse("invalid"), Err(FenError::InvalidFieldCount(1))));
        assert!(matches!(
            Fen::parse("8/8/8/8/8/8/8/8 w - - 0 1 extra"),
            Err(FenError::InvalidFieldCount(7))
        ));
    }

    #[test]
    fn invalid_active_color() {
        assert!(matches!(
            Fen::parse("8/8/8/8/8/8/8/8 x KQkq - 0 1"),
            Err(FenError::InvalidActiveColor(_))
        ));
    }

    #[test]
    fn invalid_piece_placement() {
        for bad in [
            "8/8/8/8/8/8/8 w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPXPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnrr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbn/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "9/8/8/8/8/8/8/8 w - - 0 1",
        ] {
            assert!(
                matches!(Fen::parse(bad), Err(FenError::InvalidPiecePlacement(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn invalid_castling_rights() {
        assert!(matches!(
            Fen::parse("8/8/8/8/8/8/8/8 w XYZ - 0 1"),
            Err(FenError::InvalidCastlingRights(_))
        ));
    }

    #[test]
    fn invalid_en_passant() {
        for bad in ["abc", "x3", "e4"] {
            let fen = format!("8/8/8/8/8/8/8/8 w - {bad} 0 1");
            assert!(matches!(Fen::parse(&fen), Err(FenError::InvalidEnPassantSquare(_))));
        }
    }

    #[test]
    fn invalid_clocks() {
        assert!(matches!(
            Fen::parse("8/8/8/8/8/8/8/8 w - - abc 1"),
            Err(FenError::InvalidHalfmoveClock(_))
        ));
        assert!(matches!(
            Fen::parse("8/8/8/8/8/8/8/8 w - - 0 xyz"),
            Err(FenError::InvalidFullmoveNumber(_))
        ));
    }

    #[test]
    fn fen_error_display() {
        assert!(FenError::InvalidFieldCount(3).to_string().contains('3'));
        assert!(FenError::InvalidCastlingRights("XYZ".into()).to_string().contains("XYZ"));
        assert!(FenError::InvalidEnPassantSquare("z9".into()).to_string().contains("z9"));
    }
}
