//! Command-line front-end: argument parsing and the `perft` subcommand.

use std::error::Error;
use std::time::Instant;

use crate::config::AppConfig;
use crate::engine::board::Position;
use crate::engine::movegen::legal_moves;
use crate::engine::perft::{self, PerftReport};
use crate::engine::types::Move;

pub type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

pub const USAGE: &str = "usage: mailbox-chess [uci | perft [depth] [--json] [--serial] [fen...]]";

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Speak UCI over stdin/stdout.
    Uci,
    Perft(PerftArgs),
}

/// Options of the `perft` subcommand. `None` means "use the configured default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerftArgs {
    pub depth: Option<u32>,
    pub fen: Option<String>,
    pub json: bool,
    pub serial: bool,
}

/// Parse the arguments that follow the program name.
pub fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    match args.next().as_deref() {
        None | Some("uci") => Ok(Command::Uci),
        Some("perft") => {
            let mut perft = PerftArgs::default();
            let mut fen_fields: Vec<String> = Vec::new();
            for arg in args {
                if arg == "--json" {
                    perft.json = true;
                } else if arg == "--serial" {
                    perft.serial = true;
                } else if arg.starts_with("--") {
                    return Err(format!("unknown flag `{arg}`\n{USAGE}"));
                } else if perft.depth.is_none() && fen_fields.is_empty() {
                    // A leading number is the depth; anything else starts the FEN.
                    match arg.parse::<u32>() {
                        Ok(depth) => perft.depth = Some(depth),
                        Err(_) => fen_fields.push(arg),
                    }
                } else {
                    fen_fields.push(arg);
                }
            }
            if !fen_fields.is_empty() {
                perft.fen = Some(fen_fields.join(" "));
            }
            Ok(Command::Perft(perft))
        }
        Some(other) => Err(format!("unknown command `{other}`\n{USAGE}")),
    }
}

/// Divide with each root move's subtree counted on a blocking worker.
///
/// Every worker gets its own deep copy of the position after its root move,
/// so no state is shared. Results come back in generation order.
pub async fn divide_parallel(pos: &Position, depth: u32) -> CliResult<Vec<(Move, u64)>> {
    if depth == 0 {
        return Ok(Vec::new());
    }
    let mut root = pos.clone();
    let handles: Vec<_> = legal_moves(&mut root)
        .into_iter()
        .map(|mv| {
            let mut child = root.clone();
            child.apply(mv);
            let handle = tokio::task::spawn_blocking(move || perft::perft(&mut child, depth - 1));
            (mv, handle)
        })
        .collect();

    let mut divided = Vec::with_capacity(handles.len());
    for (mv, handle) in handles {
        let nodes = handle.await?;
        tracing::debug!(%mv, nodes, "divide");
        divided.push((mv, nodes));
    }
    Ok(divided)
}

/// Run the `perft` subcommand with defaults filled in from `config`.
pub async fn run_perft(args: &PerftArgs, config: &AppConfig) -> CliResult<PerftReport> {
    let fen = args.fen.as_deref().unwrap_or(&config.perft_fen);
    let depth = args.depth.unwrap_or(config.perft_depth);
    let parallel = config.perft_parallel && !args.serial;
    let mut pos = Position::from_fen(fen)?;

    tracing::info!(fen, depth, parallel, "starting perft");
    let start = Instant::now();
    let divided = if parallel {
        divide_parallel(&pos, depth).await?
    } else {
        perft::divide(&mut pos, depth)
    };
    let report = PerftReport::new(pos.to_fen(), depth, &divided, start.elapsed());
    tracing::info!(
        nodes = report.nodes,
        ms = report.elapsed_ms,
        nps = report.nodes_per_second,
        "perft finished"
    );
    Ok(report)
}

/// Text printed for a finished perft run.
pub fn render_report(report: &PerftReport, json: bool) -> CliResult<String> {
    if json {
        return Ok(serde_json::to_string_pretty(report)?);
    }
    let mut lines = report.divide_lines();
    lines.push(format!("Time: {} ms", report.elapsed_ms));
    lines.push(format!("Nodes/second: {}", report.nodes_per_second));
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::board::START_FEN;
    use std::time::Duration;

    fn args(list: &[&str]) -> Result<Command, String> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_args_is_uci() {
        assert_eq!(args(&[]), Ok(Command::Uci));
        assert_eq!(args(&["uci"]), Ok(Command::Uci));
    }

    #[test]
    fn perft_defaults() {
        assert_eq!(args(&["perft"]), Ok(Command::Perft(PerftArgs::default())));
    }

    #[test]
    fn perft_depth_flags_and_fen() {
        let parsed = args(&[
            "perft", "3", "--json", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8", "w", "-", "-", "0", "1",
            "--serial",
        ]);
        assert_eq!(
            parsed,
            Ok(Command::Perft(PerftArgs {
                depth: Some(3),
                fen: Some("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1".into()),
                json: true,
                serial: true,
            }))
        );
    }

    #[test]
    fn perft_fen_without_depth() {
        let parsed = args(&["perft", "8/8/8/8/8/8/8/K6k", "w", "-", "-", "0", "1"]);
        let Ok(Command::Perft(perft)) = parsed else {
            panic!("expected perft, got {parsed:?}");
        };
        assert_eq!(perft.depth, None);
        assert_eq!(perft.fen.as_deref(), Some("8/8/8/8/8/8/8/K6k w - - 0 1"));
    }

    #[test]
    fn unknown_input_is_rejected() {
        assert!(args(&["serve"]).is_err());
        assert!(args(&["perft", "--fast"]).is_err());
    }

    #[tokio::test]
    async fn parallel_divide_matches_serial() {
        let mut pos =
            Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 0")
                .unwrap();
        let parallel = divide_parallel(&pos, 2).await.unwrap();
        let serial = perft::divide(&mut pos, 2);
        assert_eq!(parallel, serial);
        assert_eq!(parallel.iter().map(|(_, n)| n).sum::<u64>(), 2_039);
    }

    #[tokio::test]
    async fn parallel_divide_depth_zero() {
        assert!(divide_parallel(&Position::starting(), 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_perft_uses_config_defaults() {
        let config = AppConfig {
            perft_depth: 2,
            ..AppConfig::default()
        };
        let report = run_perft(&PerftArgs::default(), &config).await.unwrap();
        assert_eq!(report.fen, START_FEN);
        assert_eq!(report.depth, 2);
        assert_eq!(report.nodes, 400);
        assert_eq!(report.moves.len(), 20);
    }

    #[tokio::test]
    async fn run_perft_serial_with_fen() {
        let perft_args = PerftArgs {
            depth: Some(3),
            fen: Some("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1".into()),
            json: false,
            serial: true,
        };
        let report = run_perft(&perft_args, &AppConfig::default()).await.unwrap();
        assert_eq!(report.nodes, 2_812);
    }

    #[tokio::test]
    async fn run_perft_rejects_bad_fen() {
        let perft_args = PerftArgs {
            fen: Some("not a fen".into()),
            ..PerftArgs::default()
        };
        assert!(run_perft(&perft_args, &AppConfig::default()).await.is_err());
    }

    #[test]
    fn render_text_and_json() {
        let mut pos = Position::starting();
        let divided = perft::divide(&mut pos, 1);
        let report = PerftReport::new(pos.to_fen(), 1, &divided, Duration::from_millis(2));

        let text = render_report(&report, false).unwrap();
        assert!(text.contains("Nodes searched: 20"));
        assert!(text.ends_with("Nodes/second: 10000"));

        let json = render_report(&report, true).unwrap();
        let back: PerftReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
