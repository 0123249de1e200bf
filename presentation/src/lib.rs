//! Presentation layer for braid
//!
//! Command-line argument parsing, console output formatting and the
//! interactive chat REPL.

pub mod chat;
pub mod cli;
pub mod output;

pub use chat::ChatRepl;
pub use cli::Cli;
pub use output::ConsoleFormatter;
