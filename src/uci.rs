//! Line-oriented UCI front-end.
//!
//! `parse_line` turns one line of input into a [`UciCommand`];
//! [`UciSession`] holds the current position and answers each command with
//! the lines to write back. Neither knows about stdin or stdout; `run` wires
//! a session to any async reader and writer.

use std::time::Instant;

use rand::seq::SliceRandom;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::AppConfig;
use crate::engine::board::Position;
use crate::engine::types::ChessError;
use crate::engine::{movegen, notation, perft};

/// A parsed UCI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    Debug(bool),
    IsReady,
    /// Options are accepted and ignored; the engine has none.
    SetOption {
        name: String,
        value: Option<String>,
    },
    NewGame,
    /// `fen` is `None` for `startpos`.
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    /// `perft` is the depth of a `go perft N` request; plain `go` picks a move.
    Go {
        perft: Option<u32>,
    },
    /// Non-standard `d`: dump the current position.
    Display,
    Stop,
    Quit,
}

/// The result of parsing one line. Errors are meant to be logged and skipped.
pub type UciParseResult = Result<UciCommand, String>;

/// Parse one line of UCI input.
pub fn parse_line(line: &str) -> UciParseResult {
    let mut tokens = line.split_ascii_whitespace();
    let first_tok = tokens.next().ok_or("line contains no tokens")?;
    match first_tok {
        "uci" => Ok(UciCommand::Uci),
        "debug" => match tokens.next() {
            Some("on") | None => Ok(UciCommand::Debug(true)),
            Some("off") => Ok(UciCommand::Debug(false)),
            Some(other) => Err(format!("unrecognized debug option `{other}`")),
        },
        "isready" => Ok(UciCommand::IsReady),
        "setoption" => parse_set_option(&mut tokens),
        "ucinewgame" => Ok(UciCommand::NewGame),
        "position" => parse_position(&mut tokens),
        "go" => parse_go(&mut tokens),
        "d" => Ok(UciCommand::Display),
        "stop" => Ok(UciCommand::Stop),
        "quit" => Ok(UciCommand::Quit),
        other => Err(format!("unrecognized UCI command `{other}`")),
    }
}

/// Parse the rest of a `setoption` line: `name <id...> [value <x...>]`.
/// Both the id and the value may span several tokens.
fn parse_set_option<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> UciParseResult {
    match tokens.next() {
        Some("name") => {}
        Some(other) => return Err(format!("expected `name` for `setoption`, got `{other}`")),
        None => return Err("reached end of line while parsing `setoption`".into()),
    }
    let name: Vec<&str> = tokens.by_ref().take_while(|&tok| tok != "value").collect();
    if name.is_empty() {
        return Err("`setoption` has an empty name".into());
    }
    let value: Vec<&str> = tokens.collect();
    Ok(UciCommand::SetOption {
        name: name.join(" "),
        value: (!value.is_empty()).then(|| value.join(" ")),
    })
}

/// Parse the rest of a `position` line: `startpos | fen <fields>`, then an
/// optional `moves` list.
fn parse_position<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> UciParseResult {
    let fen = match tokens.next() {
        Some("startpos") => {
            match tokens.next() {
                None => {
                    return Ok(UciCommand::Position {
                        fen: None,
                        moves: Vec::new(),
                    });
                }
                Some("moves") => {}
                Some(other) => {
                    return Err(format!("expected `moves` after `startpos`, got `{other}`"));
                }
            }
            None
        }
        Some("fen") => {
            let fields: Vec<&str> = tokens.by_ref().take_while(|&tok| tok != "moves").collect();
            if fields.is_empty() {
                return Err("reached end of line while parsing FEN".into());
            }
            Some(fields.join(" "))
        }
        Some(other) => return Err(format!("illegal starting position token `{other}`")),
        None => return Err("reached end of line while parsing position".into()),
    };

    Ok(UciCommand::Position {
        fen,
        moves: tokens.map(str::to_string).collect(),
    })
}

/// Parse the rest of a `go` line. Only `perft N` changes behaviour; search
/// limits such as `wtime` or `depth` are accepted and ignored.
fn parse_go<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> UciParseResult {
    let mut perft = None;
    while let Some(tok) = tokens.next() {
        if tok == "perft" {
            let depth = tokens.next().ok_or("expected a depth after `perft`")?;
            perft = Some(
                depth
                    .parse::<u32>()
                    .map_err(|e| format!("invalid perft depth `{depth}`: {e}"))?,
            );
        }
    }
    Ok(UciCommand::Go { perft })
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Protocol state: the current position plus the `debug` flag.
#[derive(Debug, Clone)]
pub struct UciSession {
    name: String,
    author: String,
    position: Position,
    debug: bool,
    quit: bool,
}

impl UciSession {
    pub fn new(config: &AppConfig) -> Self {
        UciSession {
            name: config.engine_name.clone(),
            author: config.engine_author.clone(),
            position: Position::starting(),
            debug: false,
            quit: false,
        }
    }

    /// The position commands are currently applied to.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// True once `quit` has been handled.
    pub fn is_quit(&self) -> bool {
        self.quit
    }

    /// Parse and handle one line of input. Unparsable lines are logged and
    /// produce no output unless debug mode is on.
    pub fn handle_line(&mut self, line: &str) -> Vec<String> {
        if line.trim().is_empty() {
            return Vec::new();
        }
        match parse_line(line) {
            Ok(cmd) => self.handle(cmd),
            Err(err) => self.reject_line(line, &err),
        }
    }

    fn reject_line(&self, line: &str, err: &str) -> Vec<String> {
        tracing::warn!(line, %err, "ignoring UCI input");
        self.debug_info(err)
    }

    /// Handle a parsed command, returning the lines to send back.
    pub fn handle(&mut self, cmd: UciCommand) -> Vec<String> {
        tracing::debug!(?cmd, "uci command");
        match cmd {
            UciCommand::Uci => vec![
                format!("id name {}", self.name),
                format!("id author {}", self.author),
                "uciok".to_string(),
            ],
            UciCommand::Debug(on) => {
                self.debug = on;
                Vec::new()
            }
            UciCommand::IsReady => vec!["readyok".to_string()],
            UciCommand::SetOption { name, value } => {
                tracing::debug!(%name, ?value, "ignoring option");
                Vec::new()
            }
            UciCommand::NewGame => {
                self.position = Position::starting();
                Vec::new()
            }
            UciCommand::Position { fen, moves } => match load_position(fen.as_deref(), &moves) {
                Ok(pos) => {
                    self.position = pos;
                    Vec::new()
                }
                Err(err) => {
                    tracing::warn!(%err, "rejected position; keeping previous one");
                    self.debug_info(&err.to_string())
                }
            },
            UciCommand::Go { perft: Some(depth) } => self.go_perft(depth),
            UciCommand::Go { perft: None } => self.go_random(),
            UciCommand::Display => vec![
                format!("Fen: {}", self.position.to_fen()),
                format!(
                    "Checkers: {}",
                    if movegen::is_in_check(&self.position) {
                        "yes"
                    } else {
                        "no"
                    }
                ),
            ],
            UciCommand::Stop => Vec::new(),
            UciCommand::Quit => {
                self.quit = true;
                Vec::new()
            }
        }
    }

    fn go_perft(&mut self, depth: u32) -> Vec<String> {
        perft_lines(&mut self.position, depth)
    }

    /// `go perft` on a blocking worker, so a deep count does not stall the
    /// runtime. Input is still answered in order once it finishes.
    async fn go_perft_blocking(&self, depth: u32) -> std::io::Result<Vec<String>> {
        let mut pos = self.position.clone();
        tokio::task::spawn_blocking(move || perft_lines(&mut pos, depth))
            .await
            .map_err(std::io::Error::other)
    }

    fn go_random(&mut self) -> Vec<String> {
        let legal = movegen::legal_moves(&mut self.position);
        let best = legal
            .choose(&mut rand::thread_rng())
            .map_or_else(|| "0000".to_string(), |mv| mv.to_uci());
        vec![format!("bestmove {best}")]
    }

    fn debug_info(&self, message: &str) -> Vec<String> {
        if self.debug {
            vec![format!("info string {message}")]
        } else {
            Vec::new()
        }
    }

    /// Drive the session from `reader` until `quit` or end of input, writing
    /// every response line to `writer`.
    pub async fn run<R, W>(&mut self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let response = match parse_line(&line) {
                Ok(UciCommand::Go { perft: Some(depth) }) => self.go_perft_blocking(depth).await?,
                Ok(cmd) => self.handle(cmd),
                Err(err) => self.reject_line(&line, &err),
            };
            for out in response {
                writer.write_all(out.as_bytes()).await?;
                writer.write_all(b"\n").await?;
            }
            writer.flush().await?;
            if self.quit {
                break;
            }
        }
        Ok(())
    }
}

/// Divide listing for `go perft`; `pos` is restored before returning.
fn perft_lines(pos: &mut Position, depth: u32) -> Vec<String> {
    let start = Instant::now();
    let divided = perft::divide(pos, depth);
    let report = perft::PerftReport::new(pos.to_fen(), depth, &divided, start.elapsed());
    tracing::info!(depth, nodes = report.nodes, ms = report.elapsed_ms, "perft finished");
    report.divide_lines()
}

/// Build the position a `position` command describes, replaying its moves.
fn load_position(fen: Option<&str>, moves: &[String]) -> Result<Position, ChessError> {
    let mut pos = match fen {
        Some(fen) => Position::from_fen(fen)?,
        None => Position::starting(),
    };
    for text in moves {
        notation::play(&mut pos, text)?;
    }
    Ok(pos)
}
