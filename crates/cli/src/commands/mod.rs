//! Subcommand implementations and the wiring they share.

pub mod advise;
pub mod classify;
pub mod onboard;
pub mod search;
pub mod show;
pub mod status;

use std::sync::Arc;

use smartmeds_config::AppConfig;
use smartmeds_core::provider::Provider;
use smartmeds_core::record::{MedicationRecord, TableSchema};
use smartmeds_triage::{BatchSynchronizer, Session};

/// Load config; `--demo` swaps the store for the in-memory sample ward.
pub fn load_config(demo: bool) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if demo {
        config.store.backend = "memory".into();
    }
    Ok(config)
}

/// Build the configured store and take the first snapshot.
pub async fn open_session(config: &AppConfig) -> Result<Session, Box<dyn std::error::Error>> {
    let store = smartmeds_store::build_from_config(config)?;
    let session = Session::open(store)
        .await?
        .with_synchronizer(BatchSynchronizer::from_config(config));
    Ok(session)
}

/// The default provider, or a setup hint when no key is configured.
pub fn require_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, Box<dyn std::error::Error>> {
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  No API key configured. Set one of:");
        eprintln!("    SMARTMEDS_API_KEY, OPENAI_API_KEY, OPENROUTER_API_KEY");
        eprintln!("  or add api_key to {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found".into());
    }
    let router = smartmeds_providers::build_from_config(config);
    router.default().ok_or_else(|| {
        format!(
            "Provider '{0}' is not a known endpoint; set providers.{0}.api_url",
            config.default_provider
        )
        .into()
    })
}

/// Print records as an aligned text table.
pub fn print_records(columns: &[String], records: &[&MedicationRecord], schema: &TableSchema) {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(records.len() + 1);
    let mut header = vec!["#".to_string()];
    header.extend(columns.iter().cloned());
    rows.push(header);
    for record in records {
        let mut row = vec![record.row.to_string()];
        row.extend(columns.iter().map(|c| record.cell(c, schema).to_string()));
        rows.push(row);
    }

    let widths: Vec<usize> = (0..rows[0].len())
        .map(|i| rows.iter().map(|r| display_width(&r[i])).max().unwrap_or(0))
        .collect();

    for (n, row) in rows.iter().enumerate() {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad(cell, *width))
            .collect();
        println!("  {}", line.join("  ").trim_end());
        if n == 0 {
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            println!("  {}", rule.join("  "));
        }
    }
}

/// Terminal columns taken by `text`; CJK and full-width forms count double.
fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| match c as u32 {
            0x1100..=0x115F | 0x2E80..=0xA4CF | 0xAC00..=0xD7A3 | 0xF900..=0xFAFF | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60 | 0xFFE0..=0xFFE6 => 2,
            _ => 1,
        })
        .sum()
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(text));
    format!("{text}{}", " ".repeat(fill))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cjk_counts_double() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("目前用藥"), 8);
        assert_eq!(display_width("ＡＢ"), 4);
    }

    #[test]
    fn pad_fills_to_display_width() {
        assert_eq!(pad("紅", 4), "紅  ");
        assert_eq!(pad("toolong", 3), "toolong");
    }
}
