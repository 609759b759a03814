//! Perft (PERFormance Test): exhaustive leaf counting of the legal move tree.
//!
//! If perft disagrees with the published numbers at any depth, there is a bug
//! in move generation, make/undo, or legality filtering.
//!
//! Reference: <https://www.chessprogramming.org/Perft_Results>

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::board::Position;
use crate::engine::movegen::legal_moves;
use crate::engine::types::Move;

/// Count leaf nodes `depth` plies below `pos`.
///
/// Every move is applied and undone in place, so `pos` is left exactly as it
/// was found.
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(pos);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0u64;
    for mv in moves {
        pos.apply(mv);
        nodes += perft(pos, depth - 1);
        pos.undo();
    }
    nodes
}

/// Perft broken down per root move, in generation order.
///
/// Depth 0 has no root moves and yields an empty list.
pub fn divide(pos: &mut Position, depth: u32) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    legal_moves(pos)
        .into_iter()
        .map(|mv| {
            pos.apply(mv);
            let nodes = perft(pos, depth - 1);
            pos.undo();
            tracing::debug!(%mv, nodes, "divide");
            (mv, nodes)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Node count below one root move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivideEntry {
    /// Root move in UCI form.
    #[serde(rename = "move")]
    pub mv: String,
    pub nodes: u64,
}

/// Summary of one perft run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerftReport {
    pub fen: String,
    pub depth: u32,
    pub nodes: u64,
    pub elapsed_ms: u64,
    pub nodes_per_second: u64,
    pub moves: Vec<DivideEntry>,
}

impl PerftReport {
    /// Build a report from divide output. At depth 0 the total is 1.
    pub fn new(fen: String, depth: u32, divided: &[(Move, u64)], elapsed: Duration) -> Self {
        let nodes = if depth == 0 {
            1
        } else {
            divided.iter().map(|(_, n)| n).sum::<u64>()
        };
        let elapsed_ms = elapsed.as_millis() as u64;
        let nodes_per_second = nodes * 1000 / elapsed_ms.max(1);
        PerftReport {
            fen,
            depth,
            nodes,
            elapsed_ms,
            nodes_per_second,
            moves: divided
                .iter()
                .map(|(mv, nodes)| DivideEntry {
                    mv: mv.to_uci(),
                    nodes: *nodes,
                })
                .collect(),
        }
    }

    /// Stockfish-style divide listing: `<move>: <count>`, a blank line, then
    /// `Nodes searched: <total>`.
    pub fn divide_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .moves
            .iter()
            .map(|entry| format!("{}: {}", entry.mv, entry.nodes))
            .collect();
        lines.push(String::new());
        lines.push(format!("Nodes searched: {}", self.nodes));
        lines
    }
}
