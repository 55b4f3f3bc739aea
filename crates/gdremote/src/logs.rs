//! Reader for the append-only DevTools log stream.
//!
//! The log is the responder's side channel: newline-delimited JSON the
//! controller only ever reads. Category filtering matches the serialized
//! field as a literal substring in either quoting spelling rather than
//! parsing every line first, so selection and parsing stay independent.

use std::fs;
use std::io;

use crate::bridge::mailbox::Mailbox;
use crate::bridge::protocol::{LogEntry, LogLine};

/// Selection applied to the log before parsing.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub category: Option<String>,
    /// Keep only the last N lines, applied after category filtering.
    pub tail: Option<usize>,
}

impl LogFilter {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            tail: None,
        }
    }

    pub fn with_tail(mut self, tail: usize) -> Self {
        self.tail = Some(tail);
        self
    }
}

/// Read the log stream, filtered and truncated per `filter`.
///
/// A missing log file is a normal state and yields no entries. Lines that
/// fail to parse come back as [`LogLine::Raw`] in their original position;
/// nothing is silently dropped.
pub fn read_log(mailbox: &Mailbox, filter: &LogFilter) -> io::Result<Vec<LogLine>> {
    let contents = match fs::read_to_string(mailbox.log_path()) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut lines: Vec<&str> = contents.trim().lines().collect();

    if let Some(category) = &filter.category {
        let tight = format!("\"category\":\"{category}\"");
        let spaced = format!("\"category\": \"{category}\"");
        lines.retain(|line| line.contains(&tight) || line.contains(&spaced));
    }

    if let Some(tail) = filter.tail {
        let skip = lines.len().saturating_sub(tail);
        lines.drain(..skip);
    }

    Ok(lines
        .into_iter()
        .map(|line| match serde_json::from_str::<LogEntry>(line) {
            Ok(entry) => LogLine::Entry(entry),
            Err(_) => LogLine::Raw(line.to_string()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn mailbox_with_log(lines: &[&str]) -> (tempfile::TempDir, Mailbox) {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = Mailbox::at(dir.path());
        fs::write(mailbox.log_path(), lines.join("\n")).unwrap();
        (dir, mailbox)
    }

    fn entry(timestamp: f64, category: &str, message: &str) -> String {
        format!(
            r#"{{"timestamp": {timestamp}, "category": "{category}", "message": "{message}"}}"#
        )
    }

    fn message(line: &LogLine) -> &str {
        match line {
            LogLine::Entry(entry) => &entry.message,
            LogLine::Raw(raw) => raw,
        }
    }

    #[test]
    fn missing_log_file_yields_no_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = Mailbox::at(dir.path());
        let lines = read_log(&mailbox, &LogFilter::default()).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn category_filter_then_tail_keeps_original_order() {
        let (_dir, mailbox) = mailbox_with_log(&[
            &entry(1.0, "A", "first"),
            &entry(2.0, "B", "second"),
            &entry(3.0, "A", "third"),
            &entry(4.0, "C", "fourth"),
            &entry(5.0, "A", "fifth"),
        ]);

        let lines = read_log(&mailbox, &LogFilter::category("A").with_tail(2)).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(message(&lines[0]), "third");
        assert_eq!(message(&lines[1]), "fifth");
    }

    #[test]
    fn filter_matches_both_quoting_spellings() {
        let (_dir, mailbox) = mailbox_with_log(&[
            r#"{"timestamp":1,"category":"input","message":"tight"}"#,
            r#"{"timestamp": 2, "category": "input", "message": "spaced"}"#,
            r#"{"timestamp": 3, "category": "scene", "message": "other"}"#,
        ]);

        let lines = read_log(&mailbox, &LogFilter::category("input")).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(message(&lines[0]), "tight");
        assert_eq!(message(&lines[1]), "spaced");
    }

    #[test]
    fn unparseable_line_passes_through_raw() {
        let (_dir, mailbox) = mailbox_with_log(&[
            &entry(1.0, "A", "ok"),
            "not json at all",
            &entry(2.0, "A", "also ok"),
        ]);

        let lines = read_log(&mailbox, &LogFilter::default()).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(matches!(&lines[0], LogLine::Entry(_)));
        assert!(matches!(&lines[1], LogLine::Raw(raw) if raw == "not json at all"));
        assert!(matches!(&lines[2], LogLine::Entry(_)));
    }

    #[test]
    fn tail_larger_than_log_keeps_everything() {
        let (_dir, mailbox) = mailbox_with_log(&[&entry(1.0, "A", "only")]);
        let lines = read_log(&mailbox, &LogFilter::default().with_tail(10)).unwrap();
        assert_eq!(lines.len(), 1);
    }
}
