//! Move generator node counts against published perft results.

use chess_engine::movegen::perft::perft;
use chess_engine::Position;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

fn assert_perft(fen: &str, expected: &[u64]) {
    let mut position = Position::from_fen(fen).unwrap();
    for (depth, &nodes) in (1..).zip(expected) {
        assert_eq!(perft(&mut position, depth), nodes, "{fen} at depth {depth}");
        assert_eq!(position.to_fen(), fen, "perft left the position modified");
    }
}

#[test]
fn startpos() {
    let mut position = Position::startpos();
    assert_eq!(perft(&mut position, 1), 20);
    assert_eq!(perft(&mut position, 2), 400);
    assert_eq!(perft(&mut position, 3), 8_902);
    assert_eq!(perft(&mut position, 4), 197_281);
}

#[test]
#[ignore = "slow in debug builds"]
fn startpos_depth_5() {
    let mut position = Position::startpos();
    assert_eq!(perft(&mut position, 5), 4_865_609);
}

#[test]
fn kiwipete() {
    assert_perft(KIWIPETE, &[48, 2_039, 97_862]);
}

#[test]
fn position_3() {
    assert_perft(POSITION_3, &[14, 191, 2_812, 43_238]);
}

#[test]
fn position_4() {
    assert_perft(POSITION_4, &[6, 264, 9_467]);
}

#[test]
fn position_5() {
    assert_perft(POSITION_5, &[44, 1_486, 62_379]);
}

#[test]
fn mirrored_position_4() {
    let fen = "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1";
    assert_perft(fen, &[6, 264, 9_467]);
}
