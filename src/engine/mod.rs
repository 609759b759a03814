pub mod board;
pub mod movegen;
pub mod notation;
pub mod perft;
pub mod types;

pub use board::{Position, START_FEN};
pub use movegen::{is_in_check, legal_moves, legal_moves_from};
pub use perft::{PerftReport, divide, perft};
pub use types::*;
