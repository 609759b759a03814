//! Random playouts: long apply/undo sequences must never drift.

use mailbox_chess::engine::board::{Position, START_FEN};
use mailbox_chess::engine::movegen::legal_moves;
use mailbox_chess::engine::types::{Color, PieceKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

const ROOTS: [&str; 4] = [
    START_FEN,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 0",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
];

/// Play up to `plies` random legal moves, checking invariants on the way
/// down, then unwind and compare every intermediate FEN on the way up.
fn playout(root: &str, seed: u64, plies: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pos = Position::from_fen(root).unwrap();
    let mut trail = vec![pos.to_fen()];

    for _ in 0..plies {
        let moves = legal_moves(&mut pos);
        let Some(&mv) = moves.choose(&mut rng) else {
            break;
        };
        let applied = pos.apply(mv);
        assert_eq!(applied, mv);

        let fen = pos.to_fen();
        assert_eq!(Position::from_fen(&fen).unwrap().to_fen(), fen);
        assert_eq!(pos.history_len(), trail.len());
        for color in [Color::White, Color::Black] {
            let kings = pos
                .squares_of(color)
                .filter(|&sq| pos.get(sq).is_kind(PieceKind::King))
                .count();
            assert_eq!(kings, 1, "{color} kings after {mv} in {fen}");
        }
        if let Some(ep) = pos.en_passant {
            // The double-stepped pawn stands one rank past the target.
            let behind = ep.offset((!pos.active).forward(), 0).unwrap();
            assert!(pos.get(behind).is(!pos.active, PieceKind::Pawn));
        }
        trail.push(fen);
    }

    while let Some(expected) = trail.pop() {
        assert_eq!(pos.to_fen(), expected);
        if trail.is_empty() {
            break;
        }
        pos.undo();
    }
    assert_eq!(pos.history_len(), 0);
    assert_eq!(pos.to_fen(), root);
}

#[test]
fn random_playouts_unwind_exactly() {
    for (i, root) in ROOTS.iter().enumerate() {
        for seed in 0..8 {
            playout(root, seed * 31 + i as u64, 120);
        }
    }
}

#[test]
fn thread_rng_playout() {
    // One unseeded run per test invocation widens coverage over time.
    let mut pos = Position::starting();
    let mut rng = rand::thread_rng();
    let mut depth = 0;
    while depth < 200 {
        let moves = legal_moves(&mut pos);
        let Some(&mv) = moves.choose(&mut rng) else {
            break;
        };
        pos.apply(mv);
        depth += 1;
    }
    for _ in 0..depth {
        pos.undo();
    }
    assert_eq!(pos.to_fen(), START_FEN);
}
