//! Move notation: UCI coordinates and minimal algebraic text.
//!
//! Examples: `e2e4`, `e7e8q`, `e4`, `Nf3`, `Nbd2`, `exd5`, `e8=Q`, `O-O`.
//!
//! Every parser resolves the text against the legal move list, so a parsed
//! move is always playable and carries the same capture and en-passant data
//! the generator would give it.

use crate::engine::board::Position;
use crate::engine::movegen;
use crate::engine::types::{ChessError, Move, PieceKind, Square};

// =========================================================================
// Algebraic generation
// =========================================================================

/// Convert a move to minimal algebraic notation (no `+` / `#` suffixes).
///
/// `legal` should be the full legal move list of `pos`; it is only used to
/// decide whether a piece move needs a file or rank disambiguator.
pub fn to_algebraic(pos: &Position, mv: Move, legal: &[Move]) -> String {
    if mv.is_castle() {
        return if mv.is_king_side_castle() {
            "O-O".into()
        } else {
            "O-O-O".into()
        };
    }

    let piece = pos.get(mv.from);
    let mut text = String::with_capacity(8);

    match piece.kind() {
        Some(PieceKind::Pawn) | None => {
            if mv.is_capture() {
                text.push(file_char(mv.from));
                text.push('x');
            }
            text.push_str(&mv.to.to_algebraic());
            if let Some(kind) = mv.promotion {
                text.push('=');
                text.push(kind.letter().to_ascii_uppercase());
            }
        }
        Some(kind) => {
            text.push(kind.letter().to_ascii_uppercase());
            text.push_str(&disambiguation(pos, mv, legal));
            if mv.is_capture() {
                text.push('x');
            }
            text.push_str(&mv.to.to_algebraic());
        }
    }

    text
}

/// File, rank, or both, whichever tells `mv` apart from twins of the same kind.
fn disambiguation(pos: &Position, mv: Move, legal: &[Move]) -> String {
    let piece = pos.get(mv.from);
    let twins: Vec<&Move> = legal
        .iter()
        .filter(|m| {
            m.to == mv.to && m.from != mv.from && !m.is_castle() && pos.get(m.from) == piece
        })
        .collect();

    if twins.is_empty() {
        return String::new();
    }

    let same_file = twins.iter().any(|m| m.from.col() == mv.from.col());
    let same_rank = twins.iter().any(|m| m.from.row() == mv.from.row());

    match (same_file, same_rank) {
        (false, _) => file_char(mv.from).to_string(),
        (true, false) => rank_char(mv.from).to_string(),
        (true, true) => mv.from.to_algebraic(),
    }
}

fn file_char(sq: Square) -> char {
    (b'a' + sq.col()) as char
}

fn rank_char(sq: Square) -> char {
    (b'1' + sq.row()) as char
}

// =========================================================================
// Parsing
// =========================================================================

/// Parse either notation and return the matching legal move.
///
/// Text shaped like a coordinate pair (`e2e4`, `e7e8q`) is read as UCI,
/// anything else as algebraic.
pub fn parse_move(pos: &mut Position, text: &str) -> Result<Move, ChessError> {
    if looks_like_uci(text) {
        parse_uci(pos, text)
    } else {
        parse_algebraic(pos, text)
    }
}

/// Parse a move and apply it, returning the move as applied.
pub fn play(pos: &mut Position, text: &str) -> Result<Move, ChessError> {
    let mv = parse_move(pos, text)?;
    Ok(pos.apply(mv))
}

fn looks_like_uci(text: &str) -> bool {
    let b = text.as_bytes();
    let square = |f: u8, r: u8| (b'a'..=b'h').contains(&f) && (b'1'..=b'8').contains(&r);
    match b.len() {
        4 => square(b[0], b[1]) && square(b[2], b[3]),
        5 => square(b[0], b[1]) && square(b[2], b[3]) && b[4].is_ascii_alphabetic(),
        _ => false,
    }
}

/// Parse a UCI coordinate move: `<from><to>[promotion]`.
///
/// Castling is accepted both as the king's two-file step (`e1g1`) and as
/// king-onto-rook (`e1h1`). A pawn reaching the last rank without a
/// promotion letter promotes to a queen.
pub fn parse_uci(pos: &mut Position, text: &str) -> Result<Move, ChessError> {
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(ChessError::InvalidNotation(text.to_string()));
    }
    let from = Square::from_algebraic(&text[0..2])?;
    let mut to = Square::from_algebraic(&text[2..4])?;
    let promotion = match text[4..].chars().next() {
        None => None,
        Some(c) => match PieceKind::from_letter(c) {
            Some(kind) if kind != PieceKind::Pawn && kind != PieceKind::King => Some(kind),
            _ => return Err(ChessError::InvalidNotation(text.to_string())),
        },
    };

    // King two-file step names the castle by its rook corner.
    let piece = pos.get(from);
    if piece.is_kind(PieceKind::King)
        && from.row() == to.row()
        && from.col().abs_diff(to.col()) == 2
    {
        let corner = if to.col() > from.col() { 7 } else { 0 };
        to = Square::at(from.row(), corner);
    }

    let promotion = promotion.or_else(|| {
        let last_rank = piece
            .color()
            .is_some_and(|color| to.row() == color.promotion_row());
        (piece.is_kind(PieceKind::Pawn) && last_rank).then_some(PieceKind::Queen)
    });

    movegen::legal_moves(pos)
        .into_iter()
        .find(|m| m.from == from && m.to == to && m.promotion == promotion)
        .ok_or_else(|| ChessError::AmbiguousOrIllegalNotation(text.to_string()))
}

/// Parse minimal algebraic notation and return the matching legal move.
///
/// Accepts `e4`, `exd5`, `e8=Q`, `Nf3`, `Nbd2`, `R1a3`, `Qh4e1`, `O-O` and
/// `0-0-0`. The markers `x`, `+` and `#` are ignored.
pub fn parse_algebraic(pos: &mut Position, text: &str) -> Result<Move, ChessError> {
    let cleaned: String = text.chars().filter(|c| !matches!(c, 'x' | '+' | '#')).collect();
    let legal = movegen::legal_moves(pos);
    let no_match = || ChessError::AmbiguousOrIllegalNotation(text.to_string());

    // Castling.
    let king_side = match cleaned.as_str() {
        "O-O" | "0-0" => Some(true),
        "O-O-O" | "0-0-0" => Some(false),
        _ => None,
    };
    if let Some(king_side) = king_side {
        return legal
            .into_iter()
            .find(|m| m.is_castle() && m.is_king_side_castle() == king_side)
            .ok_or_else(no_match);
    }

    // Promotion suffix.
    let (body, promotion) = match cleaned.split_once('=') {
        Some((body, suffix)) => {
            let mut chars = suffix.chars();
            let kind = match (chars.next().and_then(PieceKind::from_letter), chars.next()) {
                (Some(kind), None) if kind != PieceKind::Pawn && kind != PieceKind::King => kind,
                _ => return Err(ChessError::InvalidNotation(text.to_string())),
            };
            (body, Some(kind))
        }
        None => (cleaned.as_str(), None),
    };

    // Piece letter.
    let (kind, rest) = match body.chars().next() {
        Some(c @ ('N' | 'B' | 'R' | 'Q' | 'K')) => (PieceKind::from_letter(c), &body[1..]),
        Some(_) => (Some(PieceKind::Pawn), body),
        None => return Err(ChessError::InvalidNotation(text.to_string())),
    };
    let kind = kind.ok_or_else(|| ChessError::InvalidNotation(text.to_string()))?;

    if !rest.is_ascii() || rest.len() < 2 || rest.len() > 4 {
        return Err(ChessError::InvalidNotation(text.to_string()));
    }
    let dest = Square::from_algebraic(&rest[rest.len() - 2..])?;

    // Source constraints: nothing, a file, a rank, or the full square.
    let hint = &rest[..rest.len() - 2];
    let (hint_file, hint_rank, hint_square) = match hint.as_bytes() {
        [] => (None, None, None),
        [f @ b'a'..=b'h'] => (Some(f - b'a'), None, None),
        [r @ b'1'..=b'8'] => (None, Some(r - b'1'), None),
        [_, _] => (None, None, Some(Square::from_algebraic(hint)?)),
        _ => return Err(ChessError::InvalidNotation(text.to_string())),
    };

    let candidates: Vec<Move> = legal
        .into_iter()
        .filter(|m| {
            m.to == dest
                && !m.is_castle()
                && m.piece.is_kind(kind)
                && hint_file.is_none_or(|f| m.from.col() == f)
                && hint_rank.is_none_or(|r| m.from.row() == r)
                && hint_square.is_none_or(|s| m.from == s)
                && match promotion {
                    Some(wanted) => m.promotion == Some(wanted),
                    None => matches!(m.promotion, None | Some(PieceKind::Queen)),
                }
        })
        .filter(|m| {
            // A bare pawn destination is a push, never a capture.
            kind != PieceKind::Pawn || !hint.is_empty() || m.from.col() == dest.col()
        })
        .collect();

    match candidates.as_slice() {
        [mv] => Ok(*mv),
        _ => Err(no_match()),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::board::START_FEN;
    use crate::engine::types::{Color, Piece};

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    /// Algebraic text of the legal move `from`→`to` (first match).
    fn algebraic(fen: &str, from: &str, to: &str) -> String {
        let mut p = pos(fen);
        let legal = movegen::legal_moves(&mut p);
        let mv = *legal
            .iter()
            .find(|m| m.from == sq(from) && m.to == sq(to))
            .expect("move not legal");
        to_algebraic(&p, mv, &legal)
    }

    // -------------------------------------------------------------------
    // Algebraic generation
    // -------------------------------------------------------------------

    #[test]
    fn algebraic_pawn_push() {
        assert_eq!(algebraic(START_FEN, "e2", "e4"), "e4");
    }

    #[test]
    fn algebraic_pawn_capture() {
        assert_eq!(
            algebraic(
                "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2",
                "e4",
                "d5"
            ),
            "exd5"
        );
    }

    #[test]
    fn algebraic_pawn_promotion() {
        assert_eq!(algebraic("7k/4P3/8/8/8/8/8/4K3 w - - 0 1", "e7", "e8"), "e8=Q");
    }

    #[test]
    fn algebraic_en_passant() {
        assert_eq!(
            algebraic(
                "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
                "e5",
                "f6"
            ),
            "exf6"
        );
    }

    #[test]
    fn algebraic_knight_move() {
        assert_eq!(algebraic(START_FEN, "g1", "f3"), "Nf3");
    }

    #[test]
    fn algebraic_bishop_capture() {
        assert_eq!(
            algebraic(
                "rnbqk1nr/pppp1ppp/4p3/8/1b6/2N5/PPPPPPPP/R1BQKBNR b KQkq - 2 2",
                "b4",
                "c3"
            ),
            "Bxc3"
        );
    }

    #[test]
    fn algebraic_castling() {
        let fen = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";
        assert_eq!(algebraic(fen, "e1", "h1"), "O-O");
        assert_eq!(algebraic(fen, "e1", "a1"), "O-O-O");
    }

    #[test]
    fn algebraic_file_disambiguation() {
        assert_eq!(
            algebraic("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1", "b1", "d2"),
            "Nbd2"
        );
    }

    #[test]
    fn algebraic_rank_disambiguation() {
        assert_eq!(algebraic("4k3/R7/8/8/8/8/8/R3K3 w - - 0 1", "a1", "a3"), "R1a3");
    }

    #[test]
    fn algebraic_square_disambiguation() {
        assert_eq!(
            algebraic("k7/8/8/4Q2Q/8/8/7Q/4K3 w - - 0 1", "h5", "e2"),
            "Qh5e2"
        );
    }

    // -------------------------------------------------------------------
    // UCI parsing
    // -------------------------------------------------------------------

    #[test]
    fn uci_plain_move() {
        let mut p = Position::starting();
        let mv = parse_uci(&mut p, "g1f3").unwrap();
        assert_eq!(mv.from, sq("g1"));
        assert_eq!(mv.to, sq("f3"));
        assert_eq!(mv.piece, Piece::new(Color::White, PieceKind::Knight));
    }

    #[test]
    fn uci_castle_both_forms() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let by_king = parse_uci(&mut pos(fen), "e1g1").unwrap();
        let by_rook = parse_uci(&mut pos(fen), "e1h1").unwrap();
        assert_eq!(by_king, by_rook);
        assert!(by_king.is_castle());
        assert_eq!(by_king.to_uci(), "e1g1");

        let long = parse_uci(&mut pos(fen), "e1c1").unwrap();
        assert_eq!(long.to, sq("a1"));
    }

    #[test]
    fn uci_promotion_letters() {
        let fen = "7k/4P3/8/8/8/8/8/4K3 w - - 0 1";
        let knight = parse_uci(&mut pos(fen), "e7e8n").unwrap();
        assert_eq!(knight.promotion, Some(PieceKind::Knight));
        let default = parse_uci(&mut pos(fen), "e7e8").unwrap();
        assert_eq!(default.promotion, Some(PieceKind::Queen));
        assert!(matches!(
            parse_uci(&mut pos(fen), "e7e8k"),
            Err(ChessError::InvalidNotation(_))
        ));
    }

    #[test]
    fn uci_en_passant_is_flagged() {
        let mut p = pos("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
        let mv = parse_uci(&mut p, "e5f6").unwrap();
        assert!(mv.en_passant);
        assert_eq!(mv.captured, Piece::new(Color::Black, PieceKind::Pawn));
    }

    #[test]
    fn uci_illegal_move_rejected() {
        let mut p = Position::starting();
        assert_eq!(
            parse_uci(&mut p, "e2e5"),
            Err(ChessError::AmbiguousOrIllegalNotation("e2e5".into()))
        );
        assert!(matches!(parse_uci(&mut p, "z2e4"), Err(ChessError::InvalidNotation(_))));
        assert!(matches!(parse_uci(&mut p, "e2"), Err(ChessError::InvalidNotation(_))));
    }

    // -------------------------------------------------------------------
    // Algebraic parsing
    // -------------------------------------------------------------------

    #[test]
    fn parse_pawn_pushes() {
        let mut p = Position::starting();
        assert_eq!(parse_algebraic(&mut p, "e4").unwrap().from, sq("e2"));
        assert_eq!(parse_algebraic(&mut p, "e3").unwrap().from, sq("e2"));
        assert!(parse_algebraic(&mut p, "e5").is_err());
    }

    #[test]
    fn parse_black_pawn_push() {
        let mut p = pos("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        let mv = parse_algebraic(&mut p, "d5").unwrap();
        assert_eq!(mv.from, sq("d7"));
    }

    #[test]
    fn parse_pawn_capture_needs_file() {
        let mut p = pos("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        let mv = parse_algebraic(&mut p, "exd5").unwrap();
        assert_eq!(mv.from, sq("e4"));
        assert!(mv.is_capture());
        // Bare destination never means a capture.
        assert!(parse_algebraic(&mut p, "d5").is_err());
    }

    #[test]
    fn parse_promotion_suffix() {
        let fen = "3rk3/4P3/8/8/8/8/8/4K3 w - - 0 1";
        let mv = parse_algebraic(&mut pos(fen), "exd8=N").unwrap();
        assert_eq!(mv.promotion, Some(PieceKind::Knight));
        let mv = parse_algebraic(&mut pos(fen), "exd8").unwrap();
        assert_eq!(mv.promotion, Some(PieceKind::Queen));
        assert!(parse_algebraic(&mut pos(fen), "exd8=K").is_err());
    }

    #[test]
    fn parse_piece_moves() {
        let mut p = Position::starting();
        assert_eq!(parse_algebraic(&mut p, "Nf3").unwrap().from, sq("g1"));
        assert_eq!(parse_algebraic(&mut p, "Nc3").unwrap().from, sq("b1"));
        assert!(parse_algebraic(&mut p, "Bc4").is_err());
    }

    #[test]
    fn parse_disambiguation() {
        let fen = "4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1";
        assert_eq!(
            parse_algebraic(&mut pos(fen), "Nd2"),
            Err(ChessError::AmbiguousOrIllegalNotation("Nd2".into()))
        );
        assert_eq!(parse_algebraic(&mut pos(fen), "Nbd2").unwrap().from, sq("b1"));
        assert_eq!(parse_algebraic(&mut pos(fen), "Nfd2").unwrap().from, sq("f1"));
        assert_eq!(parse_algebraic(&mut pos(fen), "Nf1d2").unwrap().from, sq("f1"));

        let fen = "4k3/R7/8/8/8/8/8/R3K3 w - - 0 1";
        assert_eq!(parse_algebraic(&mut pos(fen), "R7a3").unwrap().from, sq("a7"));
    }

    #[test]
    fn parse_ignores_markers() {
        let mut p = pos("rnbqk1nr/pppp1ppp/4p3/8/1b6/2N5/PPPPPPPP/R1BQKBNR b KQkq - 2 2");
        assert_eq!(parse_algebraic(&mut p, "Bxc3+").unwrap().to, sq("c3"));
        assert_eq!(parse_algebraic(&mut p, "Bc3#").unwrap().to, sq("c3"));
    }

    #[test]
    fn parse_castling_tokens() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        for (token, corner) in [("O-O", "h1"), ("0-0", "h1"), ("O-O-O", "a1"), ("0-0-0", "a1")] {
            let mv = parse_algebraic(&mut pos(fen), token).unwrap();
            assert!(mv.is_castle());
            assert_eq!(mv.to, sq(corner));
        }
        assert!(parse_algebraic(&mut Position::starting(), "O-O").is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        let mut p = Position::starting();
        assert!(matches!(parse_algebraic(&mut p, ""), Err(ChessError::InvalidNotation(_))));
        assert!(matches!(parse_algebraic(&mut p, "N"), Err(ChessError::InvalidNotation(_))));
        assert!(matches!(parse_algebraic(&mut p, "Nz9"), Err(ChessError::InvalidNotation(_))));
        assert!(matches!(
            parse_algebraic(&mut p, "Nabcf3"),
            Err(ChessError::InvalidNotation(_))
        ));
    }

    // -------------------------------------------------------------------
    // parse_move / play
    // -------------------------------------------------------------------

    #[test]
    fn parse_move_dispatches() {
        let mut p = Position::starting();
        assert_eq!(parse_move(&mut p, "e2e4"), parse_move(&mut p, "e4"));
        assert_eq!(parse_move(&mut p, "g1f3"), parse_move(&mut p, "Nf3"));
    }

    #[test]
    fn play_applies_moves() {
        let mut p = Position::starting();
        for text in ["e4", "e7e5", "Nf3", "Nc6", "Bc4", "Bc5", "O-O"] {
            play(&mut p, text).unwrap();
        }
        assert_eq!(
            p.to_fen(),
            "r1bqk1nr/pppp1ppp/2n5/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQ1RK1 b kq - 5 4"
        );
        assert_eq!(p.history_len(), 7);
    }

    #[test]
    fn play_failure_leaves_position() {
        let mut p = Position::starting();
        assert!(play(&mut p, "e2e5").is_err());
        assert_eq!(p.to_fen(), START_FEN);
    }

    #[test]
    fn algebraic_round_trip_over_legal_moves() {
        let mut p = pos("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 0");
        let legal = movegen::legal_moves(&mut p);
        for &mv in &legal {
            let text = to_algebraic(&p, mv, &legal);
            assert_eq!(parse_algebraic(&mut p, &text), Ok(mv), "{text}");
            assert_eq!(parse_uci(&mut p, &mv.to_uci()), Ok(mv), "{mv}");
        }
    }
}
