//! Output formatting utilities

use serde::Serialize;
use tendril_core::{EdgeAction, EdgeMutation};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Table,
        }
    }
}

/// Pretty JSON for any serializable value
pub fn to_json<T: Serialize>(data: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// One line per edge mutation, e.g. `+ out installed_at -> site`
pub fn mutation_lines(mutations: &[EdgeMutation]) -> Vec<String> {
    mutations
        .iter()
        .map(|m| {
            let sign = match m.action {
                EdgeAction::Add => '+',
                EdgeAction::Remove => '-',
            };
            format!("{} {} {} -> {}", sign, m.direction, m.key, m.target_type)
        })
        .collect()
}
