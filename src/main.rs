mod cli;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, load_config};
use embridge::EmacsBridge;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let bridge = EmacsBridge::new(config);

    match cli.command {
        Commands::Visit {
            file,
            line,
            col,
            mode,
        } => {
            // The editor resolves paths relative to its own cwd, so hand
            // it an absolute one.
            let file = std::fs::canonicalize(&file).unwrap_or(file);
            bridge.visit_file_position(&file, line, col, &mode).await?;
        }
        Commands::Append { buffer, text } => bridge.append_to_buffer(&buffer, &text).await?,
        Commands::Clear { buffer } => bridge.clear_buffer(&buffer).await?,
        Commands::Kill { buffer } => bridge.kill_buffer(&buffer).await?,
        Commands::Compile { buffer } => bridge.create_compilation_buffer(&buffer).await?,
        Commands::Exit => bridge.exit_emacs().await?,
        Commands::Repl => repl(&bridge).await?,
    }
    Ok(())
}

/// Send each stdin line to the editor verbatim; "quit" ends the loop.
/// Inbound "echo" commands from the editor are printed as they arrive.
async fn repl(bridge: &EmacsBridge) -> Result<()> {
    bridge.register_action("echo", |args: &[String]| {
        println!("<- echo {}", args.join(" "));
    });
    bridge.ensure_running().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }
        if let Err(err) = bridge.eval(line).await {
            eprintln!("send failed: {err}");
        }
    }
    bridge.close().await;
    Ok(())
}
