//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for braid
#[derive(Parser, Debug)]
#[command(name = "braid")]
#[command(author, version, about = "Streamed chat with a locally hosted LLM service")]
#[command(long_about = r#"
Braid is an interactive chat client for a locally hosted LLM service
(Ollama). Conversations are persisted locally and replayed in full on
every turn, so the model always sees the whole thread.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./braid.toml        Project-level config
3. ~/.config/braid/config.toml   Global config

Example:
  braid                          Start the interactive REPL
  braid "Why is the sky blue?"   Send one message and exit
  braid -m mistral               Start with a specific model
"#)]
pub struct Cli {
    /// One-shot message to send (starts the interactive REPL when omitted)
    pub message: Option<String>,

    /// Model to use, overriding the remembered selection
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,
}
