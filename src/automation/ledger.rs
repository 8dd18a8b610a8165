//! CSV ledger of dispatched actions.
//!
//! Writes one row per firing in append-only mode for crash safety.
//! Each row contains: timestamp, rule id, matched text, price and the
//! full-frame target box.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::engine::ActionCommand;

/// CSV header row.
const LEDGER_HEADER: &str = "timestamp,rule_id,matched_text,price,x,y,width,height";

/// Initializes the ledger with a header if it doesn't exist or is empty.
///
/// If the file exists and has content, this does nothing (preserves existing data).
pub fn init_ledger(path: &Path) -> Result<()> {
    if path.exists() {
        let file = File::open(path).context("Failed to open existing ledger")?;
        match BufReader::new(file).lines().next() {
            Some(Ok(_)) => return Ok(()),
            Some(Err(e)) => return Err(e).context("Failed to read existing ledger"),
            None => {}
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create ledger directory")?;
    }

    let mut file = File::create(path).context("Failed to create ledger file")?;
    writeln!(file, "{}", LEDGER_HEADER).context("Failed to write ledger header")?;
    Ok(())
}

/// Appends one firing to the ledger.
///
/// Opens the file in append mode for each write so completed rows survive a crash.
pub fn append_firing(path: &Path, command: &ActionCommand, at: DateTime<Local>) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open ledger for append")?;

    let target = &command.target_box;
    let line = format!(
        "{},{},{},{},{},{},{},{}",
        at.format("%Y-%m-%dT%H:%M:%S%.3f"),
        escape_field(&command.rule_id),
        escape_field(&command.matched_text),
        command.price.map(|p| p.to_string()).unwrap_or_default(),
        target.x,
        target.y,
        target.width,
        target.height,
    );

    writeln!(file, "{}", line).context("Failed to write ledger row")?;
    Ok(())
}

/// Quotes a field containing a comma, quote or line break.
fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BoundingBox;
    use std::time::Duration;
    use tempfile::tempdir;

    fn command(rule_id: &str, text: &str, price: Option<u64>) -> ActionCommand {
        ActionCommand {
            target_box: BoundingBox::new(330.0, 20.0, 30.0, 15.0),
            rule_id: rule_id.to_string(),
            hold_duration_secs: 1.2,
            dispatched_at: Duration::ZERO,
            action_key: "e".to_string(),
            matched_text: text.to_string(),
            price,
        }
    }

    #[test]
    fn test_init_ledger_creates_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("firings.csv");

        init_ledger(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(LEDGER_HEADER));
    }

    #[test]
    fn test_init_ledger_preserves_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("firings.csv");
        std::fs::write(&path, "existing,data\n").unwrap();

        init_ledger(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("existing,data"));
    }

    #[test]
    fn test_init_ledger_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("firings.csv");

        init_ledger(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_append_firing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("firings.csv");
        init_ledger(&path).unwrap();

        append_firing(&path, &command("cheap", "450g", Some(450)), Local::now()).unwrap();
        append_firing(&path, &command("any", "epic, slime", None), Local::now()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 3); // header + 2 rows
        assert!(lines[1].ends_with(",cheap,450g,450,330,20,30,15"));
        assert!(lines[2].contains(",any,\"epic, slime\",,330,"));
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
