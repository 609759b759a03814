use crate::engine::START_FEN;

/// Engine configuration parsed from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Reported in `id name`.
    pub engine_name: String,
    /// Reported in `id author`.
    pub engine_author: String,
    /// Default depth for the `perft` subcommand.
    pub perft_depth: u32,
    /// Default root position for the `perft` subcommand.
    pub perft_fen: String,
    /// Split the `perft` subcommand's root moves across worker threads.
    pub perft_parallel: bool,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to
    /// defaults for missing or unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = AppConfig::default();
        AppConfig {
            engine_name: lookup("CHESS_ENGINE_NAME").unwrap_or(defaults.engine_name),
            engine_author: lookup("CHESS_ENGINE_AUTHOR").unwrap_or(defaults.engine_author),
            perft_depth: lookup("CHESS_PERFT_DEPTH")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.perft_depth),
            perft_fen: lookup("CHESS_PERFT_FEN").unwrap_or(defaults.perft_fen),
            perft_parallel: lookup("CHESS_PERFT_PARALLEL")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.perft_parallel),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            engine_name: "MailboxChess".to_string(),
            engine_author: "mailbox-chess developers".to_string(),
            perft_depth: 4,
            perft_fen: START_FEN.to_string(),
            perft_parallel: true,
        }
    }
}
