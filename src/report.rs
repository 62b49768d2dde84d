//! Operation results returned to the caller
//!
//! Every mutating operation returns counts plus an [`OperationLog`]: an
//! append-only list of human-readable lines in the order events happened.
//! The log is descriptive output for a front end, not an audit trail.

use serde::Serialize;

/// Ordered, append-only list of log lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OperationLog {
    lines: Vec<String>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl<'a> IntoIterator for &'a OperationLog {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// Uniform result of sort, prune, transcode and frame extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    /// Items that completed
    pub succeeded: usize,
    /// Items that failed and were skipped
    pub failed: usize,
    /// Line items in the order they happened
    pub log: OperationLog,
}

impl OperationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> String {
        format!("Succeeded: {}, Failed: {}", self.succeeded, self.failed)
    }
}

/// Result of a duplicate scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    /// Check-tree files whose content exists in the reference tree
    pub found: usize,
    /// Matches actually removed (always zero in dry-run)
    pub deleted: usize,
    /// Check-tree files that could not be read or removed
    pub failed: usize,
    pub log: OperationLog,
}

impl DuplicateReport {
    pub fn summary(&self) -> String {
        format!(
            "Found: {}, Deleted: {}, Failed: {}",
            self.found, self.deleted, self.failed
        )
    }
}
