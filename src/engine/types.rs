use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Row delta of a pawn step: +1 for White, -1 for Black.
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Back rank where the king and rooks start.
    #[inline]
    pub const fn home_row(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Rank a pawn may double-step from.
    #[inline]
    pub const fn pawn_row(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// Farthest rank, where pawns promote.
    #[inline]
    pub const fn promotion_row(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// PieceKind
// ---------------------------------------------------------------------------

/// The six piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// All piece kinds in order.
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// Lowercase letter used by FEN and UCI promotion suffixes.
    pub const fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    /// Parse a letter in either case.
    pub fn from_letter(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    #[inline]
    const fn from_bits(bits: u8) -> Option<PieceKind> {
        match bits {
            1 => Some(PieceKind::Pawn),
            2 => Some(PieceKind::Knight),
            3 => Some(PieceKind::Bishop),
            4 => Some(PieceKind::Rook),
            5 => Some(PieceKind::Queen),
            6 => Some(PieceKind::King),
            _ => None,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceKind::Pawn => write!(f, "pawn"),
            PieceKind::Knight => write!(f, "knight"),
            PieceKind::Bishop => write!(f, "bishop"),
            PieceKind::Rook => write!(f, "rook"),
            PieceKind::Queen => write!(f, "queen"),
            PieceKind::King => write!(f, "king"),
        }
    }
}

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// A board cell value: colour and kind packed into one byte.
///
/// Bits 0-2 hold the kind (1 = pawn .. 6 = king), bit 3 marks White and
/// bit 4 marks Black. `EMPTY` is zero and so has neither a colour nor a kind.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Piece(u8);

impl Piece {
    pub const EMPTY: Piece = Piece(0);

    const KIND_MASK: u8 = 0b0_0111;
    const WHITE_BIT: u8 = 0b0_1000;
    const BLACK_BIT: u8 = 0b1_0000;

    #[inline]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        let color_bit = match color {
            Color::White => Self::WHITE_BIT,
            Color::Black => Self::BLACK_BIT,
        };
        Piece(color_bit | (kind as u8 + 1))
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn color(self) -> Option<Color> {
        if self.0 & Self::WHITE_BIT != 0 {
            Some(Color::White)
        } else if self.0 & Self::BLACK_BIT != 0 {
            Some(Color::Black)
        } else {
            None
        }
    }

    #[inline]
    pub const fn kind(self) -> Option<PieceKind> {
        PieceKind::from_bits(self.0 & Self::KIND_MASK)
    }

    /// True when the cell holds exactly this colour and kind.
    #[inline]
    pub fn is(self, color: Color, kind: PieceKind) -> bool {
        self == Piece::new(color, kind)
    }

    /// True when the cell holds any piece of `color`.
    #[inline]
    pub fn is_color(self, color: Color) -> bool {
        self.color() == Some(color)
    }

    /// True when the cell holds a piece of `kind`, either colour.
    #[inline]
    pub fn is_kind(self, kind: PieceKind) -> bool {
        self.kind() == Some(kind)
    }

    /// Single letter, uppercase for White, lowercase for Black, `.` when empty.
    pub fn to_char(self) -> char {
        match (self.color(), self.kind()) {
            (Some(Color::White), Some(kind)) => kind.letter().to_ascii_uppercase(),
            (Some(Color::Black), Some(kind)) => kind.letter(),
            _ => '.',
        }
    }

    /// Parse a FEN piece letter; case selects the colour.
    pub fn from_char(c: char) -> Result<Self, ChessError> {
        let kind = PieceKind::from_letter(c).ok_or(ChessError::UnknownPieceChar(c))?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Ok(Piece::new(color, kind))
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Piece({})", self.to_char())
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A square on the board, `row * 8 + col` (a1 = 0, h1 = 7, h8 = 63).
///
/// Row 0 is rank 1 and column 0 is file a.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    /// Build a square from row and column, both in `0..8`.
    pub fn new(row: u8, col: u8) -> Result<Self, ChessError> {
        if row > 7 || col > 7 {
            return Err(ChessError::OutOfRange {
                row: row as i16,
                col: col as i16,
            });
        }
        Ok(Square(row * 8 + col))
    }

    /// Unchecked constructor for squares the caller already knows are on the board.
    #[inline]
    pub(crate) const fn at(row: u8, col: u8) -> Self {
        debug_assert!(row < 8 && col < 8);
        Square(row * 8 + col)
    }

    #[inline]
    pub const fn row(self) -> u8 {
        self.0 >> 3
    }

    #[inline]
    pub const fn col(self) -> u8 {
        self.0 & 7
    }

    /// Step by a signed row and column delta, failing when it leaves the board.
    #[inline]
    pub fn offset(self, d_row: i8, d_col: i8) -> Result<Self, ChessError> {
        let row = self.row() as i16 + d_row as i16;
        let col = self.col() as i16 + d_col as i16;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Ok(Square::at(row as u8, col as u8))
        } else {
            Err(ChessError::OutOfRange { row, col })
        }
    }

    /// Parse algebraic notation like "e4".
    pub fn from_algebraic(s: &str) -> Result<Self, ChessError> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidNotation(s.to_string()));
        }
        let col = bytes[0].wrapping_sub(b'a');
        let row = bytes[1].wrapping_sub(b'1');
        if col < 8 && row < 8 {
            Ok(Square::at(row, col))
        } else {
            Err(ChessError::InvalidNotation(s.to_string()))
        }
    }

    /// Convert to algebraic notation like "e4".
    pub fn to_algebraic(self) -> String {
        let file = (b'a' + self.col()) as char;
        let rank = (b'1' + self.row()) as char;
        format!("{file}{rank}")
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Square::from_algebraic(s)
    }
}

// ---------------------------------------------------------------------------
// CastlingRights
// ---------------------------------------------------------------------------

/// Castling availability for one side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub king_side: bool,
    pub queen_side: bool,
}

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights {
        king_side: false,
        queen_side: false,
    };
    pub const BOTH: CastlingRights = CastlingRights {
        king_side: true,
        queen_side: true,
    };

    #[inline]
    pub fn any(self) -> bool {
        self.king_side || self.queen_side
    }

    /// Read one side's rights out of a FEN castling field.
    pub fn from_fen(field: &str, color: Color) -> Self {
        let (k, q) = match color {
            Color::White => ('K', 'Q'),
            Color::Black => ('k', 'q'),
        };
        CastlingRights {
            king_side: field.contains(k),
            queen_side: field.contains(q),
        }
    }

    /// Render both sides as a FEN castling field (`KQkq` order, `-` when empty).
    pub fn to_fen(rights: &[CastlingRights; 2]) -> String {
        let white = rights[Color::White.index()];
        let black = rights[Color::Black.index()];
        let mut s = String::with_capacity(4);
        if white.king_side {
            s.push('K');
        }
        if white.queen_side {
            s.push('Q');
        }
        if black.king_side {
            s.push('k');
        }
        if black.queen_side {
            s.push('q');
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// One transition, snapshotted from the position it was created in.
///
/// `piece` and `captured` are the cell values of `from` and `to` at creation
/// time. Castling moves target the rook's original square (the king's
/// two-file destination is accepted as well). `en_passant` is set only for
/// captures made by the en-passant rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub captured: Piece,
    pub promotion: Option<PieceKind>,
    pub en_passant: bool,
}

impl Move {
    /// True iff a king moves more than one column.
    #[inline]
    pub fn is_castle(&self) -> bool {
        self.piece.is_kind(PieceKind::King) && self.from.col().abs_diff(self.to.col()) > 1
    }

    /// Castle toward the h-file rook.
    #[inline]
    pub fn is_king_side_castle(&self) -> bool {
        self.is_castle() && self.to.col() > self.from.col()
    }

    /// True when the move takes an enemy piece (en passant included).
    #[inline]
    pub fn is_capture(&self) -> bool {
        self.en_passant
            || (!self.captured.is_empty()
                && !self.is_castle()
                && self.captured.color() != self.piece.color())
    }

    /// Square the king ends on. Differs from `to` only for castles.
    pub fn king_destination(&self) -> Square {
        if !self.is_castle() {
            return self.to;
        }
        let col = if self.is_king_side_castle() { 6 } else { 2 };
        Square::at(self.from.row(), col)
    }

    /// UCI coordinate form, e.g. `e2e4`, `e7e8q`, `e1g1`.
    pub fn to_uci(&self) -> String {
        let mut s = format!("{}{}", self.from, self.king_destination());
        if let Some(kind) = self.promotion {
            s.push(kind.letter());
        }
        s
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

// ---------------------------------------------------------------------------
// ChessError
// ---------------------------------------------------------------------------

/// Domain errors for the chess engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    #[error("malformed FEN: {0}")]
    MalformedFen(String),

    #[error("malformed FEN: invalid {field} '{text}'")]
    InvalidCounter {
        field: &'static str,
        text: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid active color: '{0}'")]
    InvalidActiveColor(String),

    #[error("coordinate out of range: row {row}, col {col}")]
    OutOfRange { row: i16, col: i16 },

    #[error("invalid square notation: '{0}'")]
    InvalidNotation(String),

    #[error("ambiguous or illegal move notation: '{0}'")]
    AmbiguousOrIllegalNotation(String),

    #[error("unknown piece character: '{0}'")]
    UnknownPieceChar(char),

    #[error("no move to undo")]
    EmptyHistory,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
