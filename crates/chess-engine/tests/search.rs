//! End-to-end behaviour of the iterative-deepening search.

use std::thread;
use std::time::{Duration, Instant};

use chess_engine::{
    generate_legal_moves, EngineConfig, Position, Score, SearchInfo, SearchLimits, Searcher, MATE,
};

fn searcher(fen: &str) -> Searcher {
    let mut searcher = Searcher::new(EngineConfig {
        hash_mb: 4,
        ..EngineConfig::default()
    });
    searcher.load(Position::from_fen(fen).unwrap());
    searcher
}

#[test]
fn finds_back_rank_mate_for_white() {
    let mut searcher = searcher("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1");
    let mut reports = Vec::new();
    let result = searcher.search(SearchLimits::depth(5), |info| reports.push(info.clone()));

    assert_eq!(result.best_move.unwrap().to_uci(), "a1a8");
    assert_eq!(result.score, MATE - 1);
    assert_eq!(reports.last().unwrap().score, Score::Mate(1));
    // A proven mate ends the iteration loop early.
    assert!(result.depth < 5);
}

#[test]
fn finds_back_rank_mate_for_black() {
    let mut searcher = searcher("r5k1/8/8/8/8/8/5PPP/6K1 b - - 0 1");
    let result = searcher.search(SearchLimits::depth(4), |_| {});
    assert_eq!(result.best_move.unwrap().to_uci(), "a8a1");
    assert_eq!(result.score, MATE - 1);
}

#[test]
fn wins_hanging_queen() {
    let mut searcher = searcher("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1");
    let result = searcher.search(SearchLimits::depth(3), |_| {});
    assert_eq!(result.best_move.unwrap().to_uci(), "d2d5");
    assert!(result.score > 300, "score {}", result.score);
}

#[test]
fn checkmated_root_has_no_move() {
    let mut searcher = searcher("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
    let result = searcher.search(SearchLimits::depth(4), |_| panic!("no iteration should complete"));
    assert_eq!(result.best_move, None);
    assert_eq!(result.score, -MATE);
    assert_eq!(result.depth, 0);
}

#[test]
fn stalemated_root_scores_zero() {
    let mut searcher = searcher("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
    let result = searcher.search(SearchLimits::depth(4), |_| {});
    assert_eq!(result.best_move, None);
    assert_eq!(result.score, 0);
}

#[test]
fn fixed_depth_search_is_deterministic() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let first = searcher(fen).search(SearchLimits::depth(4), |_| {});
    let second = searcher(fen).search(SearchLimits::depth(4), |_| {});
    assert_eq!(first, second);
}

#[test]
fn progress_reports_every_completed_depth() {
    let mut searcher = searcher(chess_core::Fen::STARTPOS);
    let mut reports: Vec<SearchInfo> = Vec::new();
    let result = searcher.search(SearchLimits::depth(4), |info| reports.push(info.clone()));

    let depths: Vec<u32> = reports.iter().map(|info| info.depth).collect();
    assert_eq!(depths, vec![1, 2, 3, 4]);
    let last = reports.last().unwrap();
    assert_eq!(last.pv.first().copied(), result.best_move);
    assert!(last.pv.len() <= 4);
    assert!(reports.windows(2).all(|w| w[0].nodes <= w[1].nodes));
    assert_eq!(last.nodes, result.nodes);
}

#[test]
fn search_leaves_position_untouched() {
    let fen = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
    let mut searcher = searcher(fen);
    searcher.search(SearchLimits::depth(4), |_| {});
    assert_eq!(searcher.position().to_fen(), fen);
    assert_eq!(searcher.position().hash(), searcher.position().compute_hash());
}

#[test]
fn stop_handle_aborts_a_deep_search() {
    let mut searcher = Searcher::new(EngineConfig {
        hash_mb: 4,
        max_depth: 63,
        ..EngineConfig::default()
    });
    searcher.load(Position::startpos());
    let handle = searcher.stop_handle();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        handle.stop();
    });

    let started = Instant::now();
    let result = searcher.search(SearchLimits::default(), |_| {});
    stopper.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(result.depth < 63);
    let legal = generate_legal_moves(searcher.position_mut());
    assert!(legal.contains(result.best_move.unwrap()));
    assert_eq!(searcher.position().to_fen(), chess_core::Fen::STARTPOS);
}

#[test]
fn node_budget_is_respected() {
    let mut searcher = searcher(chess_core::Fen::STARTPOS);
    let check_interval = searcher.config().check_interval;
    let result = searcher.search(SearchLimits::nodes(5_000), |_| {});
    assert!(result.nodes < 5_000 + 2 * check_interval, "searched {} nodes", result.nodes);
    assert!(result.best_move.is_some());
}

#[test]
fn movetime_is_respected() {
    let mut searcher = searcher(chess_core::Fen::STARTPOS);
    let started = Instant::now();
    let result = searcher.search(SearchLimits::movetime(Duration::from_millis(100)), |_| {});
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(result.best_move.is_some());
}

#[test]
fn new_game_forgets_the_table() {
    let mut searcher = searcher(chess_core::Fen::STARTPOS);
    searcher.search(SearchLimits::depth(3), |_| {});
    let key = searcher.position().hash();
    assert!(searcher.tt().probe(key).is_some());
    searcher.new_game();
    assert!(searcher.tt().probe(key).is_none());
}
