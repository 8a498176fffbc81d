//! Iterative-deepening negamax search.
//!
//! A [`Searcher`] owns everything one search needs: the position being
//! searched, the transposition table, killer moves, counters and the clock.
//! The search is single-threaded; the only thing shared with other threads is
//! the [`StopHandle`].

mod ordering;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chess_core::{Move, PieceType};
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::eval::{endgame_weight, evaluate, piece_value, MAX_CP};
use crate::movegen::{generate_legal_moves, generate_moves};
use crate::tt::{Bound, TranspositionTable};
use crate::Position;

pub use ordering::{promotion_bonus, score_move, Killers, OrderedMoves};

/// Score of a checkmate delivered at the root.
pub const MATE: i32 = 30_000;
/// Larger than any reachable score.
pub const INF: i32 = 30_001;
/// Deepest ply the killer table covers.
pub const MAX_PLY: usize = 64;

const NULL_MOVE_REDUCTION: i32 = 3;
const NULL_MOVE_MIN_DEPTH: i32 = 3;
const NULL_MOVE_MAX_PHASE: f32 = 0.6;
const LMR_MIN_INDEX: usize = 4;
const LMR_MIN_DEPTH: i32 = 3;
const DELTA_MARGIN: i32 = 200;

/// Cloneable handle that asks a running search to stop.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Budgets for one call to [`Searcher::search`]. Unset fields are unlimited;
/// the depth is always capped by [`EngineConfig::max_depth`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: Option<u32>,
    pub movetime: Option<Duration>,
    pub nodes: Option<u64>,
}

impl SearchLimits {
    pub fn depth(depth: u32) -> Self {
        SearchLimits {
            depth: Some(depth),
            ..Self::default()
        }
    }

    pub fn movetime(movetime: Duration) -> Self {
        SearchLimits {
            movetime: Some(movetime),
            ..Self::default()
        }
    }

    pub fn nodes(nodes: u64) -> Self {
        SearchLimits {
            nodes: Some(nodes),
            ..Self::default()
        }
    }
}

/// A search score from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawns.
    Cp(i32),
    /// Moves until mate; negative when the side to move is being mated.
    Mate(i32),
}

impl Score {
    pub fn from_raw(score: i32) -> Self {
        if score.abs() <= MAX_CP {
            return Score::Cp(score);
        }
        let plies = MATE - score.abs();
        let moves = (plies + 1) / 2;
        if score > 0 {
            Score::Mate(moves)
        } else {
            Score::Mate(-moves)
        }
    }
}

/// Progress report for one completed iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchInfo {
    pub depth: u32,
    pub score: Score,
    pub nodes: u64,
    pub nps: u64,
    pub elapsed_ms: u64,
    pub hashfull: u32,
    pub pv: Vec<Move>,
}

/// Outcome of [`Searcher::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// `None` only when the side to move has no legal move.
    pub best_move: Option<Move>,
    /// Raw score of the last completed iteration, side to move's view.
    pub score: i32,
    /// Depth of the last completed iteration, 0 if none completed.
    pub depth: u32,
    pub nodes: u64,
}

pub struct Searcher {
    position: Position,
    tt: TranspositionTable,
    killers: [Killers; MAX_PLY],
    config: EngineConfig,
    stop: StopHandle,
    stopped: bool,
    nodes: u64,
    start: Instant,
    deadline: Option<Instant>,
    node_limit: Option<u64>,
}

impl Searcher {
    pub fn new(config: EngineConfig) -> Self {
        let config = config.normalized();
        Searcher {
            position: Position::startpos(),
            tt: TranspositionTable::with_megabytes(config.hash_mb),
            killers: [[None; 2]; MAX_PLY],
            config,
            stop: StopHandle::new(),
            stopped: false,
            nodes: 0,
            start: Instant::now(),
            deadline: None,
            node_limit: None,
        }
    }

    /// Replaces the position to search. Its history is dropped so the whole
    /// history capacity is available below the root.
    pub fn load(&mut self, mut position: Position) {
        position.reset_history();
        self.position = position;
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Mutable access for replaying game moves between searches.
    pub fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn tt(&self) -> &TranspositionTable {
        &self.tt
    }

    /// Forgets everything learned from previous games.
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.killers = [[None; 2]; MAX_PLY];
    }

    /// Runs iterative deepening from the loaded position.
    ///
    /// `on_progress` is called once per completed iteration. An iteration cut
    /// short by a budget or the stop handle is discarded; the result is the
    /// last completed one. The stop flag is cleared on entry.
    pub fn search<F>(&mut self, limits: SearchLimits, mut on_progress: F) -> SearchResult
    where
        F: FnMut(&SearchInfo),
    {
        self.start = Instant::now();
        self.deadline = limits.movetime.map(|budget| self.start + budget);
        self.node_limit = limits.nodes;
        self.nodes = 0;
        self.stopped = false;
        self.stop.reset();
        self.killers = [[None; 2]; MAX_PLY];

        let max_depth = limits
            .depth
            .unwrap_or(self.config.max_depth)
            .min(self.config.max_depth)
            .min(MAX_PLY as u32 - 1)
            .max(1);

        let us = self.position.side_to_move();
        let legal = generate_legal_moves(&mut self.position);
        let mut result = SearchResult {
            best_move: legal.iter().next().copied(),
            score: 0,
            depth: 0,
            nodes: 0,
        };
        if legal.is_empty() {
            result.score = if self.position.is_in_check(us) { -MATE } else { 0 };
            return result;
        }

        let mut previous_best = None;
        for depth in 1..=max_depth {
            let Some((best, score)) = self.search_root(depth as i32, previous_best) else {
                trace!(depth, nodes = self.nodes, "iteration aborted");
                break;
            };
            previous_best = Some(best);
            result = SearchResult {
                best_move: Some(best),
                score,
                depth,
                nodes: self.nodes,
            };

            let elapsed_ms = self.start.elapsed().as_millis() as u64;
            let info = SearchInfo {
                depth,
                score: Score::from_raw(score),
                nodes: self.nodes,
                nps: self.nodes * 1000 / elapsed_ms.max(1),
                elapsed_ms,
                hashfull: self.tt.hashfull(),
                pv: self.principal_variation(best, depth as usize),
            };
            debug!(depth, score, nodes = self.nodes, elapsed_ms, best = %best, "iteration complete");
            on_progress(&info);

            if score.abs() > MAX_CP {
                break;
            }
        }

        result.nodes = self.nodes;
        result
    }

    /// Root node: full window for every move, exact store of the best one.
    /// Returns `None` when the iteration was aborted.
    fn search_root(&mut self, depth: i32, previous_best: Option<Move>) -> Option<(Move, i32)> {
        let us = self.position.side_to_move();
        let moves = OrderedMoves::new(generate_moves(&self.position), previous_best, &self.killers[0]);
        let mut best: Option<(Move, i32)> = None;

        for m in moves {
            self.position.make_move(m);
            if self.position.is_in_check(us) {
                self.position.undo_move();
                continue;
            }
            let score = -self.negamax(depth - 1, 1, -INF, INF, true);
            self.position.undo_move();
            if self.stopped {
                return None;
            }
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((m, score));
            }
        }

        if let Some((m, score)) = best {
            self.tt
                .store(self.position.hash(), depth, score, Bound::Exact, Some(m));
        }
        best
    }

    fn negamax(&mut self, depth: i32, ply: usize, mut alpha: i32, beta: i32, null_allowed: bool) -> i32 {
        self.nodes += 1;
        if self.poll() {
            return 0;
        }
        if depth <= 0 {
            return self.quiescence(self.config.max_qdepth as i32, alpha, beta);
        }

        let original_alpha = alpha;
        let us = self.position.side_to_move();
        let in_check = self.position.is_in_check(us);
        let key = self.position.hash();
        let hint = self.tt.probe(key).and_then(|entry| entry.best_move);

        if null_allowed
            && !in_check
            && depth >= NULL_MOVE_MIN_DEPTH
            && endgame_weight(&self.position) < NULL_MOVE_MAX_PHASE
        {
            self.position.make_null_move();
            let score = -self.negamax(depth - NULL_MOVE_REDUCTION, ply + 1, -beta, -beta + 1, false);
            self.position.undo_null_move();
            if self.stopped {
                return 0;
            }
            if score >= beta && score.abs() < MAX_CP {
                return beta;
            }
        }

        let killers = self.killers.get(ply).copied().unwrap_or_default();
        let moves = OrderedMoves::new(generate_moves(&self.position), hint, &killers);
        let mut best_score = -INF;
        let mut best_move = None;
        let mut searched = 0;

        for m in moves {
            self.position.make_move(m);
            if self.position.is_in_check(us) {
                self.position.undo_move();
                continue;
            }

            let quiet = !m.is_capture() && !m.is_promotion();
            let score = if quiet && searched >= LMR_MIN_INDEX && depth >= LMR_MIN_DEPTH && !in_check {
                let reduced = -self.negamax(depth - 2, ply + 1, -alpha - 1, -alpha, true);
                if reduced > alpha {
                    -self.negamax(depth - 1, ply + 1, -beta, -alpha, true)
                } else {
                    reduced
                }
            } else {
                -self.negamax(depth - 1, ply + 1, -beta, -alpha, true)
            };
            self.position.undo_move();
            if self.stopped {
                return 0;
            }
            searched += 1;

            if score > best_score {
                best_score = score;
                best_move = Some(m);
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                if !m.is_capture() {
                    self.store_killer(ply, m);
                }
                break;
            }
        }

        if searched == 0 {
            return if in_check { -(MATE - ply as i32) } else { 0 };
        }

        let bound = Bound::classify(best_score, original_alpha, beta);
        self.tt.store(key, depth, best_score, bound, best_move);
        best_score
    }

    /// Captures and promotions only, on top of the static evaluation.
    fn quiescence(&mut self, depth: i32, mut alpha: i32, beta: i32) -> i32 {
        self.nodes += 1;
        if self.poll() {
            return 0;
        }

        let stand_pat = evaluate(&self.position);
        if depth <= 0 {
            return stand_pat;
        }
        if stand_pat >= beta {
            return beta;
        }
        alpha = alpha.max(stand_pat);

        let us = self.position.side_to_move();
        let mut tactical = generate_moves(&self.position);
        tactical.retain(|m| m.is_capture() || m.is_promotion());

        for m in OrderedMoves::new(tactical, None, &[None, None]) {
            if stand_pat + material_gain(m) + DELTA_MARGIN < alpha {
                continue;
            }
            self.position.make_move(m);
            if self.position.is_in_check(us) {
                self.position.undo_move();
                continue;
            }
            let score = -self.quiescence(depth - 1, -beta, -alpha);
            self.position.undo_move();
            if self.stopped {
                return 0;
            }
            if score >= beta {
                return beta;
            }
            alpha = alpha.max(score);
        }
        alpha
    }

    fn store_killer(&mut self, ply: usize, m: Move) {
        if let Some(slot) = self.killers.get_mut(ply) {
            if slot[0] != Some(m) {
                slot[1] = slot[0];
                slot[0] = Some(m);
            }
        }
    }

    /// True once the search must unwind. Budgets are only consulted every
    /// `check_interval` nodes.
    #[inline]
    fn poll(&mut self) -> bool {
        if !self.stopped && self.nodes % self.config.check_interval == 0 {
            self.stopped = self.stop.is_stopped()
                || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
                || self.node_limit.is_some_and(|limit| self.nodes >= limit);
        }
        self.stopped
    }

    /// Follows best moves through the table, starting with `first`. Every
    /// step is checked for legality, and the position is restored afterwards.
    fn principal_variation(&mut self, first: Move, max_len: usize) -> Vec<Move> {
        let mut pv = vec![first];
        self.position.make_move(first);
        while pv.len() < max_len {
            let Some(next) = self.tt.probe(self.position.hash()).and_then(|entry| entry.best_move) else {
                break;
            };
            if !generate_legal_moves(&mut self.position).contains(next) {
                break;
            }
            self.position.make_move(next);
            pv.push(next);
        }
        for _ in 0..pv.len() {
            self.position.undo_move();
        }
        pv
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Most material a tactical move can win: the captured piece plus what a
/// promotion adds over the pawn.
fn material_gain(m: Move) -> i32 {
    let captured = m.captured().map_or(0, |piece| piece_value(piece.piece_type()));
    let promoted = m
        .flag()
        .promotion_type()
        .map_or(0, |piece_type| piece_value(piece_type) - piece_value(PieceType::Pawn));
    captured + promoted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn searcher_at(fen: &str) -> Searcher {
        let mut searcher = Searcher::new(EngineConfig {
            hash_mb: 1,
            ..EngineConfig::default()
        });
        searcher.load(Position::from_fen(fen).unwrap());
        searcher
    }

    #[test]
    fn test_score_from_raw() {
        assert_eq!(Score::from_raw(35), Score::Cp(35));
        assert_eq!(Score::from_raw(-MAX_CP), Score::Cp(-MAX_CP));
        assert_eq!(Score::from_raw(MATE - 1), Score::Mate(1));
        assert_eq!(Score::from_raw(MATE - 3), Score::Mate(2));
        assert_eq!(Score::from_raw(-(MATE - 2)), Score::Mate(-1));
    }

    #[test]
    fn test_material_gain() {
        let position = Position::from_fen("4k3/1P6/8/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let moves = generate_moves(&position);
        let capture = moves.iter().find(|m| m.to_uci() == "e4d5").copied().unwrap();
        let promotion = moves.iter().find(|m| m.to_uci() == "b7b8q").copied().unwrap();
        assert_eq!(material_gain(capture), 100);
        assert_eq!(material_gain(promotion), 800);
    }

    #[test]
    fn test_killers_shift() {
        let mut searcher = Searcher::default();
        let moves = generate_moves(searcher.position());
        searcher.store_killer(3, moves[0]);
        searcher.store_killer(3, moves[1]);
        searcher.store_killer(3, moves[1]);
        assert_eq!(searcher.killers[3], [Some(moves[1]), Some(moves[0])]);
        searcher.store_killer(MAX_PLY + 5, moves[2]);
    }

    #[test]
    fn test_stored_bound_matches_window() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        for (alpha, beta) in [(-INF, INF), (-50, 50), (200, 201), (-300, -299), (0, 1)] {
            let mut searcher = searcher_at(fen);
            let key = searcher.position.hash();
            let score = searcher.negamax(3, 0, alpha, beta, false);
            let entry = searcher.tt.probe(key).expect("root node stores its result");
            assert_eq!(entry.score, score);
            assert_eq!(entry.depth, 3);
            assert_eq!(entry.bound, Bound::classify(score, alpha, beta), "window ({alpha}, {beta})");
        }
    }

    #[test]
    fn test_stop_flag_aborts_at_next_poll() {
        let mut searcher = searcher_at(chess_core::Fen::STARTPOS);
        searcher.config.check_interval = 1;
        searcher.stop.stop();
        let before = searcher.position.clone();
        assert_eq!(searcher.negamax(4, 0, -INF, INF, true), 0);
        assert!(searcher.stopped);
        assert_eq!(searcher.position, before);
        assert_eq!(searcher.position.hash(), before.hash());
    }

    #[test]
    fn test_zero_check_interval_is_raised() {
        let config = EngineConfig {
            check_interval: 0,
            ..EngineConfig::default()
        };
        let mut searcher = Searcher::new(config);
        assert_eq!(searcher.config().check_interval, 1);
        let result = searcher.search(SearchLimits::depth(2), |_| {});
        assert!(result.best_move.is_some());
    }

    #[test]
    fn test_principal_variation_restores_position() {
        let mut searcher = searcher_at(chess_core::Fen::STARTPOS);
        let result = searcher.search(SearchLimits::depth(4), |_| {});
        let before = searcher.position.to_fen();
        let pv = searcher.principal_variation(result.best_move.unwrap(), 4);
        assert!(!pv.is_empty() && pv.len() <= 4);
        assert_eq!(pv[0], result.best_move.unwrap());
        assert_eq!(searcher.position.to_fen(), before);
        assert_eq!(searcher.position.ply_count(), 0);
    }

    #[test]
    fn test_new_game_clears_table() {
        let mut searcher = Searcher::default();
        searcher.search(SearchLimits::depth(3), |_| {});
        assert!(searcher.tt().hashfull() > 0 || searcher.tt().probe(searcher.position.hash()).is_some());
        searcher.new_game();
        assert!(searcher.tt().probe(searcher.position.hash()).is_none());
        assert_eq!(searcher.tt().hashfull(), 0);
    }
}
