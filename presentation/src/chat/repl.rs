//! REPL (Read-Eval-Print Loop) for interactive chat
//!
//! Plain lines are sent to the active conversation; slash commands
//! manage conversations, models and telemetry. While a reply streams,
//! tokens are printed as they arrive and Ctrl-C cancels the stream
//! (keeping whatever was already generated) instead of exiting.

use crate::output::ConsoleFormatter;
use braid_application::{
    ChatEventBus, ConversationController, ModelCatalog, PullProgress, SessionState,
    TelemetryHandle,
};
use braid_domain::StreamEvent;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Interactive chat REPL
pub struct ChatRepl {
    controller: ConversationController,
    catalog: ModelCatalog,
    bus: Arc<ChatEventBus>,
    telemetry: TelemetryHandle,
}

impl ChatRepl {
    pub fn new(
        controller: ConversationController,
        catalog: ModelCatalog,
        bus: Arc<ChatEventBus>,
        telemetry: TelemetryHandle,
    ) -> Self {
        Self {
            controller,
            catalog,
            bus,
            telemetry,
        }
    }

    /// Send a single message and exit. Used for one-shot invocations.
    pub async fn one_shot(&mut self, message: &str) {
        self.process_message(message).await;
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = dirs::data_dir().map(|p| p.join("braid").join("history.txt"));

        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            let readline = rl.readline(">>> ");

            match readline {
                Ok(line) => {
                    let line = line.trim().to_string();

                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        if self.handle_command(&line).await {
                            break;
                        }
                        continue;
                    }

                    let _ = rl.add_history_entry(&line);

                    self.process_message(&line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│                braid - chat                 │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        match self.catalog.selected() {
            Some(model) => println!("Model: {}", model.bold()),
            None => println!("{}", "No model selected. Use /models to pick one.".yellow()),
        }
        println!();
        println!("Type a message to chat, /help for commands.");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    async fn handle_command(&mut self, cmd: &str) -> bool {
        let mut parts = cmd.splitn(2, ' ');
        let head = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).unwrap_or_default();

        match head {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                return true;
            }
            "/help" | "/h" | "/?" => self.print_help(),
            "/models" => self.show_models().await,
            "/model" => self.select_model(arg).await,
            "/pull" => self.pull_model(arg).await,
            "/rm" => self.remove_model(arg).await,
            "/chats" => self.show_conversations().await,
            "/open" => self.open_conversation(arg).await,
            "/new" => {
                self.controller.start_new();
                println!("Started a new conversation.");
            }
            "/delete" => self.delete_conversation(arg).await,
            "/stats" => {
                println!();
                print!("{}", ConsoleFormatter::format_stats(&self.telemetry.latest()));
                println!();
            }
            _ => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
        }
        false
    }

    fn print_help(&self) {
        println!();
        println!("Commands:");
        println!("  /models          - List installed models");
        println!("  /model <name>    - Select a model");
        println!("  /pull <name>     - Download a model");
        println!("  /rm <name>       - Remove a model");
        println!("  /chats           - List conversations");
        println!("  /open <n>        - Open conversation n from /chats");
        println!("  /new             - Start a new conversation");
        println!("  /delete <n>      - Delete conversation n from /chats");
        println!("  /stats           - Show host and service status");
        println!("  /help, /h, /?    - Show this help");
        println!("  /quit, /exit, /q - Exit");
        println!();
    }

    async fn show_models(&mut self) {
        match self.catalog.refresh().await {
            Ok(_) => {
                println!();
                print!(
                    "{}",
                    ConsoleFormatter::format_models(
                        self.catalog.models(),
                        self.catalog.selected()
                    )
                );
                println!();
            }
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
    }

    async fn select_model(&mut self, name: &str) {
        if name.is_empty() {
            println!("Usage: /model <name>");
            return;
        }
        if !self.catalog.models().iter().any(|m| m.name == name) {
            println!(
                "{} '{}' is not installed. Use /models to list, /pull to download.",
                "Warning:".yellow().bold(),
                name
            );
        }
        self.catalog.select(name).await;
        println!("Model: {}", name.bold());
    }

    async fn pull_model(&mut self, name: &str) {
        if name.is_empty() {
            println!("Usage: /pull <name>");
            return;
        }
        println!("Pulling {}...", name.bold());

        let on_progress = |progress: PullProgress| {
            match (progress.completed, progress.total) {
                (Some(completed), Some(total)) if total > 0 => {
                    let percent = completed as f64 / total as f64 * 100.0;
                    print!("\r{}: {:.1}%    ", progress.status, percent);
                }
                _ => print!("\r{}    ", progress.status),
            }
            let _ = std::io::stdout().flush();
        };

        match self.catalog.pull(name, &on_progress).await {
            Ok(()) => {
                println!();
                println!("{} pulled {}", "Done:".green().bold(), name);
                // Refresh so the new model is selectable immediately
                let _ = self.catalog.refresh().await;
            }
            Err(e) => {
                println!();
                eprintln!("{} {}", "Error:".red().bold(), e);
            }
        }
    }

    async fn remove_model(&mut self, name: &str) {
        if name.is_empty() {
            println!("Usage: /rm <name>");
            return;
        }
        match self.catalog.remove(name).await {
            Ok(()) => {
                println!("Removed {}", name.bold());
                let _ = self.catalog.refresh().await;
            }
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
    }

    async fn show_conversations(&mut self) {
        self.controller.refresh_conversations().await;
        println!();
        print!(
            "{}",
            ConsoleFormatter::format_conversations(
                self.controller.conversations(),
                self.controller.active_id()
            )
        );
        println!();
    }

    /// Resolve a 1-based index from the last /chats listing.
    fn conversation_at(&self, arg: &str) -> Option<String> {
        let index: usize = arg.parse().ok()?;
        self.controller
            .conversations()
            .get(index.checked_sub(1)?)
            .map(|c| c.id.clone())
    }

    async fn open_conversation(&mut self, arg: &str) {
        let Some(id) = self.conversation_at(arg) else {
            println!("Usage: /open <n>  (run /chats first)");
            return;
        };
        match self.controller.select_conversation(&id).await {
            Ok(()) => {
                println!();
                print!(
                    "{}",
                    ConsoleFormatter::format_messages(self.controller.messages())
                );
                println!();
            }
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
    }

    async fn delete_conversation(&mut self, arg: &str) {
        let Some(id) = self.conversation_at(arg) else {
            println!("Usage: /delete <n>  (run /chats first)");
            return;
        };
        match self.controller.delete_conversation(&id).await {
            Ok(()) => println!("Deleted."),
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
    }

    async fn process_message(&mut self, message: &str) {
        let Some(model) = self.catalog.selected().map(str::to_string) else {
            println!(
                "{}",
                "No model selected. Use /models to pick one or /pull to download.".yellow()
            );
            return;
        };

        let cancel = CancellationToken::new();
        // Tap the event feed for display; the session consumes its own
        // subscription independently.
        let mut tap = self.bus.subscribe_all();

        println!();
        let send = self.controller.send(message, &model, cancel.clone());
        tokio::pin!(send);

        let result = loop {
            tokio::select! {
                result = &mut send => break result,

                event = tap.recv() => {
                    if let Some(StreamEvent::Token { token, .. }) = event {
                        print!("{token}");
                        let _ = std::io::stdout().flush();
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    cancel.cancel();
                }
            }
        };

        // Tokens the session consumed before we were polled may still
        // be queued on the tap.
        while let Some(event) = tap.try_recv() {
            if let StreamEvent::Token { token, .. } = event {
                print!("{token}");
            }
        }
        println!();

        match result {
            Ok(outcome) => match outcome.state {
                SessionState::Completed => println!(),
                SessionState::Cancelled => {
                    println!("{}", "[cancelled]".yellow());
                    println!();
                }
                _ => {
                    if let Some(error) = outcome.error {
                        eprintln!("{} {}", "Error:".red().bold(), error);
                    }
                    println!();
                }
            },
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                println!();
            }
        }
    }
}
