//! Analysis session bookkeeping.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
}

/// Accumulated findings. Both sets only grow while a session runs; a reset
/// replaces them wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResults {
    pub routes: BTreeSet<String>,
    pub vulnerabilities: BTreeSet<String>,
}

impl AnalysisResults {
    pub fn absorb(&mut self, routes: Vec<String>, vulnerabilities: Vec<String>) {
        self.routes.extend(routes);
        self.vulnerabilities.extend(vulnerabilities);
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.vulnerabilities.is_empty()
    }
}

/// State of one discover/retrieve/analyze run. Created on start, mutated only
/// by the orchestrator, destroyed on stop, clear, completion, or error.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    pub status: SessionStatus,
    pub total_files: usize,
    pub completed_files: usize,
    analyzed: HashSet<String>,
    pub results: AnalysisResults,
}

impl AnalysisSession {
    pub fn begin(&mut self, total_files: usize) {
        self.reset();
        self.status = SessionStatus::Running;
        self.total_files = total_files;
    }

    pub fn reset(&mut self) {
        self.status = SessionStatus::Idle;
        self.total_files = 0;
        self.completed_files = 0;
        self.analyzed.clear();
        self.results = AnalysisResults::default();
    }

    /// Membership is granted only after a file's reply parsed successfully;
    /// failed files stay out and are never retried within the session.
    pub fn mark_analyzed(&mut self, key: &str) {
        self.analyzed.insert(key.to_string());
    }

    pub fn is_analyzed(&self, key: &str) -> bool {
        self.analyzed.contains(key)
    }

    pub fn analyzed_count(&self) -> usize {
        self.analyzed.len()
    }

    pub fn progress_percent(&self) -> u8 {
        if self.total_files == 0 {
            return 0;
        }

        ((self.completed_files as f64 / self.total_files as f64) * 100.0).round() as u8
    }
}
