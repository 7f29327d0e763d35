//! Loader diagnostics shown to the user alongside the form

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Severity of a diagnostic entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single loader message
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEntry {
    pub severity: Severity,
    /// Failure tag such as `not_found`, or `loaded` for successes
    pub kind: String,
    pub message: String,
}

/// A file found in the artifact directory
#[derive(Debug, Clone, Serialize)]
pub struct StorageEntry {
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Report produced by the artifact loader.
///
/// Carries what happened to the model and scaler plus an advisory listing of
/// the artifact directory. Nothing here drives control flow.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub entries: Vec<DiagnosticEntry>,
    pub storage: Vec<StorageEntry>,
    pub created_at: DateTime<Utc>,
}

impl Diagnostic {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            storage: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn info(&mut self, kind: &str, message: impl Into<String>) {
        self.push(Severity::Info, kind, message);
    }

    pub fn warn(&mut self, kind: &str, message: impl Into<String>) {
        self.push(Severity::Warning, kind, message);
    }

    pub fn error(&mut self, kind: &str, message: impl Into<String>) {
        self.push(Severity::Error, kind, message);
    }

    fn push(&mut self, severity: Severity, kind: &str, message: impl Into<String>) {
        self.entries.push(DiagnosticEntry {
            severity,
            kind: kind.to_string(),
            message: message.into(),
        });
    }

    /// Whether any entry is an error
    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.severity == Severity::Error)
    }

    /// Messages of all error entries
    pub fn errors(&self) -> Vec<&str> {
        self.messages(Severity::Error)
    }

    /// Messages of all warning entries
    pub fn warnings(&self) -> Vec<&str> {
        self.messages(Severity::Warning)
    }

    fn messages(&self, severity: Severity) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// Record the files in `dir`, sorted by name.
    ///
    /// An unreadable directory becomes an info entry rather than an error.
    pub fn record_storage(&mut self, dir: &Path) {
        let read_dir = match std::fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                self.info(
                    "storage",
                    format!("could not list {}: {}", dir.display(), e),
                );
                return;
            }
        };

        let mut storage: Vec<StorageEntry> = read_dir
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }
                Some(StorageEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    size: metadata.len(),
                    modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                })
            })
            .collect();
        storage.sort_by(|a, b| a.name.cmp(&b.name));
        self.storage = storage;
    }
}

impl Default for Diagnostic {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "[{}] {}: {}", entry.severity, entry.kind, entry.message)?;
        }
        if !self.storage.is_empty() {
            writeln!(f, "Artifact directory:")?;
            for file in &self.storage {
                writeln!(f, "  {} ({} bytes)", file.name, file.size)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_filters() {
        let mut diagnostic = Diagnostic::new();
        diagnostic.info("loaded", "model loaded");
        diagnostic.warn("deserialize", "scaler unreadable");
        assert!(!diagnostic.has_errors());
        assert_eq!(diagnostic.warnings(), vec!["scaler unreadable"]);

        diagnostic.error("not_found", "model missing");
        assert!(diagnostic.has_errors());
        assert_eq!(diagnostic.errors(), vec!["model missing"]);
    }

    #[test]
    fn test_record_storage_lists_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("a.onnx"), b"12345").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let mut diagnostic = Diagnostic::new();
        diagnostic.record_storage(dir.path());

        let names: Vec<&str> = diagnostic.storage.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a.onnx", "b.json"]);
        assert_eq!(diagnostic.storage[0].size, 5);
        assert!(diagnostic.entries.is_empty());
    }

    #[test]
    fn test_record_storage_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut diagnostic = Diagnostic::new();
        diagnostic.record_storage(&dir.path().join("absent"));

        assert!(diagnostic.storage.is_empty());
        assert_eq!(diagnostic.entries.len(), 1);
        assert_eq!(diagnostic.entries[0].severity, Severity::Info);
    }

    #[test]
    fn test_display() {
        let mut diagnostic = Diagnostic::new();
        diagnostic.error("not_found", "artifact not found: model.onnx");
        let text = diagnostic.to_string();
        assert!(text.contains("[error] not_found: artifact not found: model.onnx"));
    }
}
