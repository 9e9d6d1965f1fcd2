//! Output formatting for CLI

use crate::scenario::ReplayEntry;
use kino_tracker::{Metadata, Report};
use tabled::{Table, Tabled};

/// Output format options
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "#")]
    seq: String,
    kind: String,
    event: String,
    token: String,
    metadata: String,
}

/// Render replay output in the selected format
pub fn format_entries(entries: &[ReplayEntry], format: &str) -> anyhow::Result<String> {
    match OutputFormat::from(format) {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(entries)?),
        OutputFormat::Table => {
            let rows: Vec<EntryRow> = entries.iter().map(row).collect();
            Ok(Table::new(rows).to_string())
        }
        OutputFormat::Text => Ok(entries.iter().map(text_line).collect::<Vec<_>>().join("\n")),
    }
}

fn short_token(token: &str) -> String {
    if token.is_empty() {
        "-".to_string()
    } else {
        token.chars().take(8).collect()
    }
}

fn inline(metadata: &Metadata) -> String {
    if metadata.is_empty() {
        return String::new();
    }
    metadata
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

fn row(entry: &ReplayEntry) -> EntryRow {
    match entry {
        ReplayEntry::Record(record) => {
            let (kind, event) = match &record.report {
                Report::Configure { .. } => ("configure", String::new()),
                Report::Dispatch { event, .. } => ("dispatch", event.to_string()),
            };
            EntryRow {
                seq: record.sequence.to_string(),
                kind: kind.to_string(),
                event,
                token: short_token(record.report.token()),
                metadata: inline(record.report.metadata()),
            }
        }
        ReplayEntry::BindFailed { step, player, error } => EntryRow {
            seq: format!("step {}", step),
            kind: "bind_failed".to_string(),
            event: player.clone(),
            token: "-".to_string(),
            metadata: error.clone(),
        },
        ReplayEntry::State {
            step,
            session,
            playback,
        } => EntryRow {
            seq: format!("step {}", step),
            kind: "state".to_string(),
            event: session.transition_state.to_string(),
            token: short_token(&session.token),
            metadata: inline(playback),
        },
    }
}

fn text_line(entry: &ReplayEntry) -> String {
    let r = row(entry);
    let mut line = format!("{:>7}  {:<11} {:<12} {:<8}", r.seq, r.kind, r.event, r.token);
    if !r.metadata.is_empty() {
        line.push_str("  ");
        line.push_str(&r.metadata);
    }
    line.trim_end().to_string()
}
