//! Perft: exhaustive legal move counting for generator validation.

use super::generate_moves;
use crate::Position;

/// Counts the leaf nodes of the legal move tree to `depth`.
pub fn perft(position: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let us = position.side_to_move();
    let moves = generate_moves(position);
    let mut nodes = 0;
    for &m in &moves {
        position.make_move(m);
        if !position.is_in_check(us) {
            nodes += if depth == 1 { 1 } else { perft(position, depth - 1) };
        }
        position.undo_move();
    }
    nodes
}

/// Leaf counts below each legal root move, sorted by move text.
pub fn perft_divide(position: &mut Position, depth: u32) -> Vec<(String, u64)> {
    let us = position.side_to_move();
    let moves = generate_moves(position);
    let mut results = Vec::with_capacity(moves.len());

    for &m in &moves {
        position.make_move(m);
        if !position.is_in_check(us) {
            let nodes = perft(position, depth.saturating_sub(1));
            results.push((m.to_uci(), nodes));
        }
        position.undo_move();
    }

    results.sort();
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_shallow() {
        let mut position = Position::startpos();
        assert_eq!(perft(&mut position, 0), 1);
        assert_eq!(perft(&mut position, 1), 20);
        assert_eq!(perft(&mut position, 2), 400);
        assert_eq!(position, Position::startpos());
    }

    #[test]
    fn divide_sums_to_perft() {
        let mut position = Position::startpos();
        let divide = perft_divide(&mut position, 3);
        assert_eq!(divide.len(), 20);
        assert_eq!(divide.iter().map(|(_, n)| n).sum::<u64>(), 8902);
        let e2e4 = divide.iter().find(|(m, _)| m == "e2e4").unwrap();
        assert_eq!(e2e4.1, 600);
    }
}
