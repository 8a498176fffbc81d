//! Bitboard chess engine.
//!
//! This crate provides:
//! - [`Bitboard`] - 64-bit square sets with shift and iteration helpers
//! - [`Position`] - board, side to move, castling, en passant and clocks, with
//!   incremental make/undo and a Zobrist hash
//! - [`movegen`] - magic-bitboard attack tables and pseudo-legal move generation
//! - [`evaluate`] - static evaluation in centipawns
//! - [`TranspositionTable`] and [`Searcher`] - iterative-deepening negamax
//!
//! # Example
//!
//! ```
//! use chess_engine::{EngineConfig, Position, SearchLimits, Searcher};
//!
//! let mut searcher = Searcher::new(EngineConfig { hash_mb: 1, ..EngineConfig::default() });
//! searcher.load(Position::startpos());
//! let result = searcher.search(SearchLimits::depth(3), |info| {
//!     println!("depth {} score {:?}", info.depth, info.score);
//! });
//! assert!(result.best_move.is_some());
//! ```

mod bitboard;
mod board;
mod config;
pub mod eval;
mod game_info;
pub mod movegen;
mod position;
pub mod search;
mod tt;
mod zobrist;

pub use bitboard::Bitboard;
pub use board::Board;
pub use config::{ConfigError, EngineConfig};
pub use eval::{evaluate, MAX_CP};
pub use game_info::{CastlingRights, GameInfo, PackedGameInfo};
pub use movegen::{find_move, generate_legal_moves, generate_moves, MoveList};
pub use position::{Position, PositionError, HISTORY_CAPACITY};
pub use search::{
    Score, SearchInfo, SearchLimits, SearchResult, Searcher, StopHandle, INF, MATE, MAX_PLY,
};
pub use tt::{Bound, TranspositionTable, TtEntry};
pub use zobrist::{ZobristKeys, ZOBRIST};
