mod protocol;
mod session;

use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::{Env, Target};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};

use crate::protocol::{HANDSHAKE, Response};
use crate::session::Session;

#[derive(Parser)]
#[command(name = "border0-plugin")]
#[command(about = "Border0 infrastructure provider plugin", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the plugin protocol on stdin/stdout
    Serve,
    /// Print the provider schema as JSON
    Schema {
        /// Print on a single line
        #[arg(long)]
        compact: bool,
    },
}

#[tokio::main]
async fn main() {
    // stdout carries the protocol, so logs go to stderr only
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .target(Target::Stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve => run_serve().await,
        Commands::Schema { compact } => run_schema(compact),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run_serve() -> Result<(), String> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    write_line(&mut stdout, HANDSHAKE).await?;

    let mut session = Session::new();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.map_err(|e| format!("Failed to read request: {e}"))?,
            _ = tokio::signal::ctrl_c() => {
                log::warn!("Interrupted, shutting down");
                return Ok(());
            }
        };
        let Some(line) = line else {
            log::debug!("Host closed stdin");
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        // An interrupted request is dropped as is; no compensating writes follow
        let response: Response = tokio::select! {
            response = session.handle_line(&line) => response,
            _ = tokio::signal::ctrl_c() => {
                log::warn!("Interrupted, abandoning the current request");
                return Ok(());
            }
        };
        let encoded = serde_json::to_string(&response)
            .map_err(|e| format!("Failed to encode response: {e}"))?;
        write_line(&mut stdout, &encoded).await?;
    }
}

async fn write_line(stdout: &mut Stdout, line: &str) -> Result<(), String> {
    stdout
        .write_all(format!("{line}\n").as_bytes())
        .await
        .map_err(|e| format!("Failed to write response: {e}"))?;
    stdout
        .flush()
        .await
        .map_err(|e| format!("Failed to write response: {e}"))
}

fn run_schema(compact: bool) -> Result<(), String> {
    let schema = Session::new().schema();
    let output = if compact {
        serde_json::to_string(&schema)
    } else {
        serde_json::to_string_pretty(&schema)
    }
    .map_err(|e| format!("Failed to encode schema: {e}"))?;

    println!("{output}");
    Ok(())
}
