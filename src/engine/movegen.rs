//! Legal move generation.
//!
//! Pipeline:
//!   1. Generate pseudo-legal moves per piece (ignoring king safety).
//!   2. Filter: apply the move, scan the opponent's pseudo-legal replies for
//!      one that takes our king, undo.
//!
//! Castling gets two extra reply checks on top of that: a reply landing on
//! the king's origin square means the king castled out of check, and a reply
//! taking the castled rook means the king crossed an attacked square.

use crate::engine::board::Position;
use crate::engine::types::{Color, Move, Piece, PieceKind, Square};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Promotion choices in generation order; the first is the default.
const PROMOTIONS: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
];

// =========================================================================
// Public API
// =========================================================================

/// Generate all legal moves for the side to move.
///
/// The position is used as scratch space (each candidate is applied and
/// undone) and is left exactly as it was found.
pub fn legal_moves(pos: &mut Position) -> Vec<Move> {
    let us = pos.active;
    let mut moves = pseudo_legal_moves(pos);
    moves.retain(|&mv| survives_replies(pos, us, mv));
    moves
}

/// Generate all legal moves originating from a specific square.
pub fn legal_moves_from(pos: &mut Position, from: Square) -> Vec<Move> {
    let mut moves = legal_moves(pos);
    moves.retain(|m| m.from == from);
    moves
}

/// True when the side to move has its king en prise.
pub fn is_in_check(pos: &Position) -> bool {
    king_capturable(pos, pos.active)
}

/// Every pseudo-legal move of the side to move, square by square from a1.
pub fn pseudo_legal_moves(pos: &Position) -> Vec<Move> {
    pseudo_legal_for(pos, pos.active)
}

/// Pseudo-legal moves of the piece on `from`, whichever colour it is.
///
/// # Panics
///
/// Panics if `from` is empty.
pub fn moves_from(pos: &Position, from: Square) -> Vec<Move> {
    let mut moves = Vec::with_capacity(28);
    push_moves_from(pos, from, &mut moves);
    moves
}

/// Drop moves whose destination holds a piece of the mover's own colour.
pub fn not_onto_allies(moves: &mut Vec<Move>) {
    moves.retain(|m| m.captured.is_empty() || m.captured.color() != m.piece.color());
}

/// Keep only captures of the opposing colour (en passant included).
pub fn onto_enemies(moves: &mut Vec<Move>) {
    moves.retain(Move::is_capture);
}

// =========================================================================
// Legality (internal)
// =========================================================================

fn survives_replies(pos: &mut Position, us: Color, mv: Move) -> bool {
    // Taking the king means the position was already broken.
    if mv.captured.is(!us, PieceKind::King) {
        return false;
    }

    let applied = pos.apply(mv);
    let mut replies = pseudo_legal_moves(pos);

    let safe = if applied.is_castle() {
        let rook_col = if applied.is_king_side_castle() { 5 } else { 3 };
        let rook_square = Square::at(applied.from.row(), rook_col);
        !replies.iter().any(|reply| {
            reply.captured.is(us, PieceKind::King)
                || reply.to == applied.from
                || (reply.to == rook_square && reply.captured.is(us, PieceKind::Rook))
        })
    } else {
        onto_enemies(&mut replies);
        !replies
            .iter()
            .any(|reply| reply.captured.is(us, PieceKind::King))
    };

    pos.undo();
    safe
}

/// Can any piece of the other colour take `victim`'s king right now?
fn king_capturable(pos: &Position, victim: Color) -> bool {
    let Some(king) = pos.king_square(victim) else {
        return false;
    };
    pseudo_legal_for(pos, !victim)
        .iter()
        .any(|reply| reply.to == king)
}

// =========================================================================
// Pseudo-legal generation (internal)
// =========================================================================

fn pseudo_legal_for(pos: &Position, color: Color) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    for from in pos.squares_of(color) {
        push_moves_from(pos, from, &mut moves);
    }
    moves
}

fn push_moves_from(pos: &Position, from: Square, moves: &mut Vec<Move>) {
    let piece = pos.get(from);
    let (Some(color), Some(kind)) = (piece.color(), piece.kind()) else {
        panic!("moves_from: no piece on {from} (fen {})", pos.to_fen());
    };

    match kind {
        PieceKind::Pawn => pawn_moves(pos, from, color, moves),
        PieceKind::Knight => step_moves(pos, from, &KNIGHT_OFFSETS, moves),
        PieceKind::Bishop => slide_moves(pos, from, &DIAGONALS, moves),
        PieceKind::Rook => slide_moves(pos, from, &ORTHOGONALS, moves),
        PieceKind::Queen => {
            slide_moves(pos, from, &DIAGONALS, moves);
            slide_moves(pos, from, &ORTHOGONALS, moves);
        }
        PieceKind::King => {
            step_moves(pos, from, &KING_OFFSETS, moves);
            castling_moves(pos, from, color, moves);
        }
    }
}

// =========================================================================
// Pawn moves
// =========================================================================

fn pawn_moves(pos: &Position, from: Square, us: Color, moves: &mut Vec<Move>) {
    let forward = us.forward();

    // --- Pushes ---
    if let Ok(one) = from.offset(forward, 0) {
        if pos.get(one).is_empty() {
            push_pawn_move(pos.create_move(from, one), us, moves);

            if from.row() == us.pawn_row() {
                if let Ok(two) = one.offset(forward, 0) {
                    if pos.get(two).is_empty() {
                        moves.push(pos.create_move(from, two));
                    }
                }
            }
        }
    }

    // --- Captures (including promotion captures) ---
    for d_col in [-1, 1] {
        let Ok(to) = from.offset(forward, d_col) else {
            continue;
        };
        if pos.get(to).is_color(!us) {
            push_pawn_move(pos.create_move(from, to), us, moves);
        }
    }

    // --- En passant ---
    if let Some(ep) = pos.en_passant {
        let diagonal_forward = ep.row() as i16 - from.row() as i16 == forward as i16
            && ep.col().abs_diff(from.col()) == 1;
        let victim_square = Square::at(from.row(), ep.col());
        let victim = pos.get(victim_square);
        if diagonal_forward && pos.get(ep).is_empty() && victim.is(!us, PieceKind::Pawn) {
            moves.push(Move {
                captured: victim,
                en_passant: true,
                ..pos.create_move(from, ep)
            });
        }
    }
}

/// Push a pawn move, expanding it into the promotion variants on the last rank.
fn push_pawn_move(mv: Move, us: Color, moves: &mut Vec<Move>) {
    if mv.to.row() != us.promotion_row() {
        moves.push(mv);
        return;
    }
    for kind in PROMOTIONS {
        moves.push(Move {
            promotion: Some(kind),
            ..mv
        });
    }
}

// =========================================================================
// Knight and king steps
// =========================================================================

fn step_moves(pos: &Position, from: Square, offsets: &[(i8, i8)], moves: &mut Vec<Move>) {
    let mut steps: Vec<Move> = offsets
        .iter()
        .filter_map(|&(d_row, d_col)| from.offset(d_row, d_col).ok())
        .map(|to| pos.create_move(from, to))
        .collect();
    not_onto_allies(&mut steps);
    moves.append(&mut steps);
}

// =========================================================================
// Slider moves (bishop, rook, queen)
// =========================================================================

fn slide_moves(pos: &Position, from: Square, directions: &[(i8, i8)], moves: &mut Vec<Move>) {
    let us = pos.get(from).color();
    for &(d_row, d_col) in directions {
        let mut cursor = from;
        while let Ok(to) = cursor.offset(d_row, d_col) {
            let target = pos.get(to);
            if target.is_empty() {
                moves.push(pos.create_move(from, to));
                cursor = to;
                continue;
            }
            if target.color() != us {
                moves.push(pos.create_move(from, to));
            }
            break;
        }
    }
}

// =========================================================================
// Castling candidates
// =========================================================================

fn castling_moves(pos: &Position, from: Square, us: Color, moves: &mut Vec<Move>) {
    let home = us.home_row();
    if from != Square::at(home, 4) {
        return;
    }
    let rights = pos.castling[us.index()];
    if !rights.any() {
        return;
    }

    // An enemy pawn on d2/f2 (d7/f7) checks the king or guards the rook's
    // landing square, so neither castle can be legal.
    let enemy_pawn = Piece::new(!us, PieceKind::Pawn);
    let pawn_guard = [-1i8, 1]
        .into_iter()
        .filter_map(|d_col| from.offset(us.forward(), d_col).ok())
        .any(|sq| pos.get(sq) == enemy_pawn);
    if pawn_guard {
        return;
    }

    let rook = Piece::new(us, PieceKind::Rook);
    let empty = |cols: &[u8]| cols.iter().all(|&col| pos.get(Square::at(home, col)).is_empty());

    if rights.king_side && pos.get(Square::at(home, 7)) == rook && empty(&[5, 6]) {
        moves.push(castle(pos, from, Square::at(home, 7)));
    }
    if rights.queen_side && pos.get(Square::at(home, 0)) == rook && empty(&[1, 2, 3]) {
        moves.push(castle(pos, from, Square::at(home, 0)));
    }
}

/// A castle aimed at the rook's corner. The rook is not a capture.
fn castle(pos: &Position, king: Square, rook: Square) -> Move {
    Move {
        captured: Piece::EMPTY,
        ..pos.create_move(king, rook)
    }
}

// =========================================================================
// Tests
// =========================================================================
