use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use embridge::ChannelConfig;

/// Embridge - drive an external Emacs as a remote display
#[derive(Parser, Debug)]
#[command(name = "embridge")]
#[command(version)]
#[command(about = "Drive an external Emacs as a remote display surface")]
#[command(long_about = "Embridge spawns an Emacs on demand, connects it back over a loopback
socket, and sends it display commands: visit a file position, append to a
buffer, create a compilation buffer, and so on. Commands typed in the
editor flow back over the same connection.

Quick start:
  1. Run 'embridge visit src/main.rs --line 10' to open a file
  2. Run 'embridge repl' for an interactive raw command loop
  3. Drop an .embridge.toml next to your project to pin the editor path")]
pub struct Cli {
    /// Path to config file (defaults to .embridge.toml when present)
    #[arg(short, long, default_value = ".embridge.toml")]
    pub config: String,

    /// Editor program to launch (overrides config file setting)
    #[arg(long)]
    pub emacs: Option<PathBuf>,

    /// Application name shown in editor buffers (overrides config)
    #[arg(long)]
    pub app: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands, one per channel operation
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open a file in the editor at a position
    Visit {
        file: PathBuf,
        /// Line to move to (1-based)
        #[arg(long, default_value = "1")]
        line: u32,
        /// Column to move to (0-based)
        #[arg(long, default_value = "0")]
        col: u32,
        /// Buffer mode string; "disabled" opens the file read-only
        #[arg(long, default_value = "")]
        mode: String,
    },
    /// Append text to a named editor buffer
    Append { buffer: String, text: String },
    /// Clear a named editor buffer
    Clear { buffer: String },
    /// Kill a named editor buffer
    Kill { buffer: String },
    /// Create a compilation buffer
    Compile { buffer: String },
    /// Ask the editor to save all buffers and exit
    Exit,
    /// Interactive loop: each stdin line is sent to the editor verbatim
    Repl,
}

/// Load the config file when it exists, then apply CLI overrides.
pub fn load_config(cli: &Cli) -> anyhow::Result<ChannelConfig> {
    let mut config = if Path::new(&cli.config).exists() {
        ChannelConfig::from_file(&cli.config)
            .with_context(|| format!("failed to load config from {}", cli.config))?
    } else {
        ChannelConfig::default()
    };
    if let Some(program) = &cli.emacs {
        config.program = program.clone();
    }
    if let Some(app) = &cli.app {
        config.app_name = app.clone();
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn visit_defaults_to_line_one_column_zero() {
        let cli = parse(&["embridge", "visit", "src/main.rs"]);
        match cli.command {
            Commands::Visit {
                file,
                line,
                col,
                mode,
            } => {
                assert_eq!(file, PathBuf::from("src/main.rs"));
                assert_eq!(line, 1);
                assert_eq!(col, 0);
                assert_eq!(mode, "");
            }
            other => panic!("expected Visit, got {other:?}"),
        }
    }

    #[test]
    fn visit_accepts_position_flags() {
        let cli = parse(&[
            "embridge", "visit", "a.rs", "--line", "12", "--col", "4", "--mode", "disabled",
        ]);
        match cli.command {
            Commands::Visit { line, col, mode, .. } => {
                assert_eq!(line, 12);
                assert_eq!(col, 4);
                assert_eq!(mode, "disabled");
            }
            other => panic!("expected Visit, got {other:?}"),
        }
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "app_name = \"from-file\"").unwrap();

        let cli = parse(&[
            "embridge",
            "--config",
            file.path().to_str().unwrap(),
            "--emacs",
            "/opt/emacs",
            "--app",
            "rudibugger",
            "exit",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.program, PathBuf::from("/opt/emacs"));
        assert_eq!(config.app_name, "rudibugger");
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let cli = parse(&["embridge", "--config", "/no/such/file.toml", "exit"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.base_port, 4444);
    }
}
