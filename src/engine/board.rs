//! Mailbox chess position.
//!
//! `Position` stores piece placement as an 8×8 grid of packed `Piece` cells
//! (row 0 = rank 1), side to move, per-side castling rights, the en-passant
//! target, move counters, and an undo history that makes every `apply`
//! reversible by `undo`.

use crate::engine::types::{CastlingRights, ChessError, Color, Move, Piece, PieceKind, Square};

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// ---------------------------------------------------------------------------
// HistoryEntry: saved state for reversing a move
// ---------------------------------------------------------------------------

/// State captured by `apply` so `undo` can restore the position exactly.
#[derive(Clone, Debug, PartialEq, Eq)]
struct HistoryEntry {
    /// The move as applied, with its capture and en-passant flag finalized.
    mv: Move,
    castling: [CastlingRights; 2],
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A complete chess position on a mailbox board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    /// Cells indexed `[row][col]`; row 0 is White's home rank.
    pub board: [[Piece; 8]; 8],

    /// Whose turn it is.
    pub active: Color,

    /// Castling availability, indexed by `Color::index()`.
    pub castling: [CastlingRights; 2],

    /// En-passant target square (the square *behind* the double-pushed pawn).
    pub en_passant: Option<Square>,

    /// Plies since the last capture or pawn move.
    pub halfmove_clock: u32,

    /// Full-move number, incremented after Black moves.
    pub fullmove_number: u32,

    /// Applied-but-not-undone moves, most recent last.
    history: Vec<HistoryEntry>,
}

// ---------------------------------------------------------------------------
// Construction helpers
// ---------------------------------------------------------------------------

impl Position {
    /// Create an empty board with no pieces.
    pub fn empty() -> Self {
        Position {
            board: [[Piece::EMPTY; 8]; 8],
            active: Color::White,
            castling: [CastlingRights::NONE; 2],
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            history: Vec::new(),
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        let mut pos = Position::empty();
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for color in [Color::White, Color::Black] {
            for (col, kind) in back.into_iter().enumerate() {
                pos.board[color.home_row() as usize][col] = Piece::new(color, kind);
                pos.board[color.pawn_row() as usize][col] = Piece::new(color, PieceKind::Pawn);
            }
        }
        pos.castling = [CastlingRights::BOTH; 2];
        pos
    }

    // -----------------------------------------------------------------------
    // Cell access
    // -----------------------------------------------------------------------

    /// What is on a given square (`Piece::EMPTY` if nothing).
    #[inline]
    pub fn get(&self, sq: Square) -> Piece {
        self.board[sq.row() as usize][sq.col() as usize]
    }

    /// Overwrite a square.
    #[inline]
    pub fn set(&mut self, sq: Square, piece: Piece) {
        self.board[sq.row() as usize][sq.col() as usize] = piece;
    }

    /// Occupied squares of one colour, rank 1 first.
    pub fn squares_of(&self, color: Color) -> impl Iterator<Item = Square> + '_ {
        (0..8u8)
            .flat_map(|row| (0..8u8).map(move |col| Square::at(row, col)))
            .filter(move |&sq| self.get(sq).is_color(color))
    }

    /// Where the king of `color` stands, if it is on the board.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = Piece::new(color, PieceKind::King);
        self.squares_of(color).find(|&sq| self.get(sq) == king)
    }

    /// Number of applied-but-not-undone moves.
    #[inline]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// The most recently applied move, if any.
    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|entry| entry.mv)
    }

    /// Snapshot a move from the current cells of `from` and `to`.
    pub fn create_move(&self, from: Square, to: Square) -> Move {
        Move {
            from,
            to,
            piece: self.get(from),
            captured: self.get(to),
            promotion: None,
            en_passant: false,
        }
    }

    // -----------------------------------------------------------------------
    // Make / Undo move
    // -----------------------------------------------------------------------

    /// Apply a move and push it onto the history. Returns the move as applied.
    ///
    /// The moving and captured pieces are re-read from the board, so a move
    /// created against an earlier position is still applied correctly.
    /// Legality is the caller's concern.
    ///
    /// # Panics
    ///
    /// Panics if `mv.from` is empty.
    pub fn apply(&mut self, mv: Move) -> Move {
        let moving = self.get(mv.from);
        let Some(us) = moving.color() else {
            panic!("apply: no piece on {} (fen {})", mv.from, self.to_fen());
        };
        let them = !us;

        let entry_state = (
            self.castling,
            self.en_passant,
            self.halfmove_clock,
            self.fullmove_number,
        );

        let mut mv = Move { piece: moving, ..mv };
        let is_pawn = moving.is_kind(PieceKind::Pawn);

        // ---- Capture bookkeeping ----
        if mv.is_castle() {
            mv.captured = Piece::EMPTY;
            mv.en_passant = false;
        } else {
            let target = self.get(mv.to);
            mv.en_passant = is_pawn
                && mv.from.col() != mv.to.col()
                && target.is_empty()
                && self.en_passant == Some(mv.to);
            mv.captured = if mv.en_passant {
                self.get(en_passant_victim(&mv))
            } else {
                target
            };
        }

        // ---- Move the pieces ----
        if mv.is_castle() {
            let (rook_from, rook_to) = castling_rook_squares(&mv);
            let king_to = mv.king_destination();
            self.set(mv.from, Piece::EMPTY);
            self.set(rook_from, Piece::EMPTY);
            self.set(king_to, moving);
            self.set(rook_to, Piece::new(us, PieceKind::Rook));
        } else {
            if mv.en_passant {
                self.set(en_passant_victim(&mv), Piece::EMPTY);
            }
            self.set(mv.from, Piece::EMPTY);
            let landing = if is_pawn && mv.to.row() == us.promotion_row() {
                Piece::new(us, mv.promotion.unwrap_or(PieceKind::Queen))
            } else {
                moving
            };
            self.set(mv.to, landing);
        }

        // ---- En-passant target ----
        self.en_passant = None;
        if is_pawn && mv.from.row().abs_diff(mv.to.row()) == 2 {
            let enemy_pawn = Piece::new(them, PieceKind::Pawn);
            let capturable = [-1i8, 1]
                .into_iter()
                .filter_map(|dc| mv.to.offset(0, dc).ok())
                .any(|sq| self.get(sq) == enemy_pawn);
            if capturable {
                self.en_passant = Some(Square::at((mv.from.row() + mv.to.row()) / 2, mv.from.col()));
            }
        }

        // ---- Castling rights ----
        if moving.is_kind(PieceKind::King) {
            self.castling[us.index()] = CastlingRights::NONE;
        } else if moving.is_kind(PieceKind::Rook) {
            revoke_corner(&mut self.castling[us.index()], us, mv.from);
        }
        if mv.is_capture() {
            revoke_corner(&mut self.castling[them.index()], them, mv.to);
        }

        // ---- Counters ----
        if is_pawn || mv.is_capture() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.active = them;

        let (castling, en_passant, halfmove_clock, fullmove_number) = entry_state;
        self.history.push(HistoryEntry {
            mv,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        });
        mv
    }

    /// Reverse the most recent `apply`, returning the move that was undone.
    pub fn try_undo(&mut self) -> Result<Move, ChessError> {
        let entry = self.history.pop().ok_or(ChessError::EmptyHistory)?;
        let mv = entry.mv;

        if mv.is_castle() {
            let (rook_from, rook_to) = castling_rook_squares(&mv);
            let rook = self.get(rook_to);
            self.set(mv.king_destination(), Piece::EMPTY);
            self.set(rook_to, Piece::EMPTY);
            self.set(rook_from, rook);
        } else if mv.en_passant {
            self.set(mv.to, Piece::EMPTY);
            self.set(en_passant_victim(&mv), mv.captured);
        } else {
            self.set(mv.to, mv.captured);
        }
        self.set(mv.from, mv.piece);

        self.castling = entry.castling;
        self.en_passant = entry.en_passant;
        self.halfmove_clock = entry.halfmove_clock;
        self.fullmove_number = entry.fullmove_number;
        self.active = !self.active;

        Ok(mv)
    }

    /// Reverse the most recent `apply`.
    ///
    /// # Panics
    ///
    /// Panics if nothing has been applied; an unmatched undo is a caller bug.
    pub fn undo(&mut self) -> Move {
        match self.try_undo() {
            Ok(mv) => mv,
            Err(err) => panic!("{err}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Special-move helpers (free functions)
// ---------------------------------------------------------------------------

/// Square of the pawn removed by an en-passant capture: same row as the
/// capturing pawn's origin, same column as its destination.
#[inline]
fn en_passant_victim(mv: &Move) -> Square {
    Square::at(mv.from.row(), mv.to.col())
}

/// For a castling move, return (rook_from, rook_to).
fn castling_rook_squares(mv: &Move) -> (Square, Square) {
    let row = mv.from.row();
    if mv.is_king_side_castle() {
        (Square::at(row, 7), Square::at(row, 5))
    } else {
        (Square::at(row, 0), Square::at(row, 3))
    }
}

/// Clear the right tied to a rook corner when `sq` is one of `color`'s corners.
fn revoke_corner(rights: &mut CastlingRights, color: Color, sq: Square) {
    if sq.row() != color.home_row() {
        return;
    }
    match sq.col() {
        0 => rights.queen_side = false,
        7 => rights.king_side = false,
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// FEN parsing & generation
// ---------------------------------------------------------------------------

impl Position {
    /// Parse a FEN string into a `Position`.
    ///
    /// The six fields must be separated by single spaces. King count is not
    /// validated, so partial boards used in tests parse fine.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fields: Vec<&str> = fen.split(' ').collect();
        if fields.len() != 6 {
            return Err(ChessError::MalformedFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        let mut pos = Position::empty();

        // ----- Field 1: Piece placement -----
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::MalformedFen(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let row = 7 - rank_idx as u8; // FEN starts from rank 8
            let mut col: u8 = 0;
            for ch in rank_str.chars() {
                if col > 7 {
                    return Err(ChessError::MalformedFen(format!(
                        "too many squares in rank {}",
                        row + 1
                    )));
                }
                if ('1'..='8').contains(&ch) {
                    col += ch as u8 - b'0';
                    if col > 8 {
                        return Err(ChessError::MalformedFen(format!(
                            "too many squares in rank {}",
                            row + 1
                        )));
                    }
                } else {
                    let piece = Piece::from_char(ch).map_err(|_| {
                        ChessError::MalformedFen(format!(
                            "invalid character '{ch}' in rank {}",
                            row + 1
                        ))
                    })?;
                    pos.board[row as usize][col as usize] = piece;
                    col += 1;
                }
            }
        }

        // ----- Field 2: Side to move -----
        pos.active = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(ChessError::InvalidActiveColor(other.to_string())),
        };

        // ----- Field 3: Castling availability -----
        pos.castling = [
            CastlingRights::from_fen(fields[2], Color::White),
            CastlingRights::from_fen(fields[2], Color::Black),
        ];

        // ----- Field 4: En passant target square -----
        if fields[3] != "-" {
            pos.en_passant = Some(Square::from_algebraic(fields[3])?);
        }

        // ----- Fields 5 & 6: Counters -----
        pos.halfmove_clock = parse_counter(fields[4], "halfmove clock")?;
        pos.fullmove_number = parse_counter(fields[5], "fullmove number")?;

        Ok(pos)
    }

    /// Export the position as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(80);

        // ----- Field 1: Piece placement -----
        for row in (0..8).rev() {
            let mut empty_count = 0u8;
            for col in 0..8 {
                let piece = self.board[row][col];
                if piece.is_empty() {
                    empty_count += 1;
                    continue;
                }
                if empty_count > 0 {
                    fen.push((b'0' + empty_count) as char);
                    empty_count = 0;
                }
                fen.push(piece.to_char());
            }
            if empty_count > 0 {
                fen.push((b'0' + empty_count) as char);
            }
            if row > 0 {
                fen.push('/');
            }
        }

        // ----- Field 2: Side to move -----
        fen.push(' ');
        fen.push(match self.active {
            Color::White => 'w',
            Color::Black => 'b',
        });

        // ----- Field 3: Castling -----
        fen.push(' ');
        fen.push_str(&CastlingRights::to_fen(&self.castling));

        // ----- Field 4: En passant -----
        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_algebraic()),
            None => fen.push('-'),
        }

        // ----- Fields 5 & 6: Counters -----
        fen.push(' ');
        fen.push_str(&self.halfmove_clock.to_string());
        fen.push(' ');
        fen.push_str(&self.fullmove_number.to_string());

        fen
    }
}

fn parse_counter(text: &str, field: &'static str) -> Result<u32, ChessError> {
    text.parse::<u32>().map_err(|source| ChessError::InvalidCounter {
        field,
        text: text.to_string(),
        source,
    })
}

impl Default for Position {
    fn default() -> Self {
        Position::starting()
    }
}

impl std::str::FromStr for Position {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
