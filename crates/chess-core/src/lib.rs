//! Core types for chess.
//!
//! This crate provides the fundamental types shared by the engine:
//! - [`Color`], [`PieceType`] and the twelve colored [`Piece`]s
//! - [`Square`], [`File`], and [`Rank`] for board coordinates
//! - [`Move`], a packed 32-bit move record
//! - FEN parsing

mod color;
mod fen;
mod mov;
mod piece;
mod square;

pub use color::Color;
pub use fen::{
    Fen, FenError, FEN_BLACK_KINGSIDE, FEN_BLACK_QUEENSIDE, FEN_WHITE_KINGSIDE,
    FEN_WHITE_QUEENSIDE,
};
pub use mov::{Move, MoveFlag};
pub use piece::{Piece, PieceType};
pub use square::{File, Rank, Square};
