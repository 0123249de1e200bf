//! Console formatting for models, conversations and telemetry

use braid_domain::{Conversation, Message, ModelDescriptor, Role, ServiceStatus, SystemStats};
use colored::Colorize;

/// Formats application state for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the model catalog, marking the selected entry.
    pub fn format_models(models: &[ModelDescriptor], selected: Option<&str>) -> String {
        if models.is_empty() {
            return format!(
                "{}\n",
                "No models installed. Use /pull <name> to download one.".yellow()
            );
        }

        let mut output = String::new();
        for model in models {
            let marker = if selected == Some(model.name.as_str()) {
                "*".green().bold().to_string()
            } else {
                " ".to_string()
            };
            output.push_str(&format!(
                "{} {}  {}\n",
                marker,
                model.name.bold(),
                human_size(model.size).dimmed()
            ));
        }
        output
    }

    /// Format the conversation list, newest first, marking the active one.
    pub fn format_conversations(conversations: &[Conversation], active: Option<&str>) -> String {
        if conversations.is_empty() {
            return format!("{}\n", "No conversations yet.".dimmed());
        }

        let mut output = String::new();
        for (index, conversation) in conversations.iter().enumerate() {
            let marker = if active == Some(conversation.id.as_str()) {
                "*".green().bold().to_string()
            } else {
                " ".to_string()
            };
            output.push_str(&format!(
                "{} {:>3}. {}  {}\n",
                marker,
                index + 1,
                conversation.title.bold(),
                conversation
                    .updated_at
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
                    .dimmed()
            ));
        }
        output
    }

    /// Format a replayed message history.
    pub fn format_messages(messages: &[Message]) -> String {
        let mut output = String::new();
        for message in messages {
            let label = match message.role {
                Role::User => "you".cyan().bold(),
                Role::Assistant => "assistant".green().bold(),
                Role::System => "system".yellow().bold(),
            };
            output.push_str(&format!("{}: {}\n", label, message.content));
        }
        output
    }

    /// Format one telemetry sample.
    pub fn format_stats(stats: &SystemStats) -> String {
        let status = match stats.service_status {
            ServiceStatus::Online => "online".green().bold().to_string(),
            ServiceStatus::Offline => "offline".red().bold().to_string(),
        };
        format!(
            "Service: {}\nCPU:     {:.1}%\nRAM:     {} / {} ({:.1}%)\nDisk:    {} / {} ({:.1}%)\nUptime:  {}\n",
            status,
            stats.cpu_percent,
            human_size(stats.ram_used),
            human_size(stats.ram_total),
            stats.ram_percent,
            human_size(stats.disk_used),
            human_size(stats.disk_total),
            stats.disk_percent,
            human_duration(stats.uptime),
        )
    }
}

/// Render a byte count as a short human-readable figure.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Render seconds as `1d 2h 3m` style.
pub fn human_duration(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
