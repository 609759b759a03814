use std::process::ExitCode;

use mailbox_chess::cli::{self, Command};
use mailbox_chess::config::AppConfig;
use mailbox_chess::uci::UciSession;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout belongs to the UCI stream.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailbox_chess=info".into()),
        )
        .init();

    let command = match cli::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(usage) => {
            eprintln!("{usage}");
            return ExitCode::from(2);
        }
    };

    let config = AppConfig::from_env();
    match run(command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &AppConfig) -> cli::CliResult<()> {
    match command {
        Command::Uci => {
            tracing::info!(
                "mailbox-chess v{} speaking UCI on stdin/stdout",
                env!("CARGO_PKG_VERSION")
            );
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            UciSession::new(config).run(stdin, tokio::io::stdout()).await?;
        }
        Command::Perft(args) => {
            let report = cli::run_perft(&args, config).await?;
            println!("{}", cli::render_report(&report, args.json)?);
        }
    }
    Ok(())
}
