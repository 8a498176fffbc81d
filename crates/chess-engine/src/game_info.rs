//! Non-board position state and its packed snapshot.

use chess_core::{Color, Square};

/// Castling rights as a 4-bit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const WHITE_KINGSIDE: u8 = 0b0001;
    pub const WHITE_QUEENSIDE: u8 = 0b0010;
    pub const BLACK_KINGSIDE: u8 = 0b0100;
    pub const BLACK_QUEENSIDE: u8 = 0b1000;

    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    /// Creates rights from raw flags; bits above the low four are dropped.
    #[inline]
    pub const fn from_bits(flags: u8) -> Self {
        CastlingRights(flags & 0b1111)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn kingside_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    #[inline]
    pub const fn queenside_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    /// Both flags belonging to `color`.
    #[inline]
    pub const fn color_flags(color: Color) -> u8 {
        Self::kingside_flag(color) | Self::queenside_flag(color)
    }

    #[inline]
    pub const fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    #[inline]
    pub fn remove(&mut self, flags: u8) {
        self.0 &= !flags;
    }

    /// Number of rights still held.
    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

/// Side to move, castling rights, en passant target and the fifty-move clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameInfo {
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
}

impl Default for GameInfo {
    fn default() -> Self {
        GameInfo {
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
        }
    }
}

/// The part of [`GameInfo`] a move can destroy, packed into 32 bits.
///
/// | bits  | field                              |
/// |-------|------------------------------------|
/// | 0-3   | castling rights                    |
/// | 4-10  | en passant square (64 = none)      |
/// | 11-31 | half-move clock                    |
///
/// The side to move is not stored: undo flips it back instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedGameInfo(u32);

const EP_SHIFT: u32 = 4;
const EP_MASK: u32 = 0x7F;
const NO_EP: u32 = 64;
const CLOCK_SHIFT: u32 = 11;

impl PackedGameInfo {
    /// Largest half-move clock the packed form holds.
    pub const MAX_HALFMOVE_CLOCK: u32 = u32::MAX >> CLOCK_SHIFT;

    #[inline]
    pub fn pack(info: &GameInfo) -> Self {
        let ep = match info.en_passant {
            Some(sq) => sq.index() as u32,
            None => NO_EP,
        };
        let clock = info.halfmove_clock.min(Self::MAX_HALFMOVE_CLOCK);
        PackedGameInfo(info.castling.bits() as u32 | (ep << EP_SHIFT) | (clock << CLOCK_SHIFT))
    }

    #[inline]
    pub fn castling(self) -> CastlingRights {
        CastlingRights::from_bits((self.0 & 0xF) as u8)
    }

    #[inline]
    pub fn en_passant(self) -> Option<Square> {
        Square::from_index(((self.0 >> EP_SHIFT) & EP_MASK) as u8)
    }

    #[inline]
    pub fn halfmove_clock(self) -> u32 {
        self.0 >> CLOCK_SHIFT
    }

    /// Writes the packed fields back into `info`, leaving the side to move.
    #[inline]
    pub fn restore(self, info: &mut GameInfo) {
        info.castling = self.castling();
        info.en_passant = self.en_passant();
        info.halfmove_clock = self.halfmove_clock();
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}
