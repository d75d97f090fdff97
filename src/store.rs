//! Persisted tool state: current target, chat transcript, and the last
//! results snapshot. One JSON blob, read at startup and written after every
//! mutation.

use std::path::{Path, PathBuf};

use miette::{Context as _, IntoDiagnostic as _};
use serde::{Deserialize, Serialize};

use crate::session::AnalysisResults;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            role: "error".to_string(),
            content: content.into(),
        }
    }
}

/// Wire/persisted rendering of [`AnalysisResults`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultsSnapshot {
    pub routes: Vec<String>,
    pub vulnerabilities: Vec<String>,
}

impl From<&AnalysisResults> for ResultsSnapshot {
    fn from(results: &AnalysisResults) -> Self {
        Self {
            routes: results.routes.iter().cloned().collect(),
            vulnerabilities: results.vulnerabilities.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredState {
    #[serde(default)]
    pub current_target: Option<String>,

    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,

    #[serde(default)]
    pub analysis_results: ResultsSnapshot,
}

/// Partial update carried by a `setState` command; present fields replace the
/// stored ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    #[serde(default, with = "double_option")]
    pub current_target: Option<Option<String>>,

    #[serde(default)]
    pub chat_history: Option<Vec<ChatMessage>>,

    #[serde(default)]
    pub analysis_results: Option<ResultsSnapshot>,
}

impl StoredState {
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(current_target) = patch.current_target {
            self.current_target = current_target;
        }
        if let Some(chat_history) = patch.chat_history {
            self.chat_history = chat_history;
        }
        if let Some(analysis_results) = patch.analysis_results {
            self.analysis_results = analysis_results;
        }
    }
}

// `Option<Option<T>>` so a patch can distinguish "leave the target alone"
// from "clear it".
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state, falling back to defaults when the blob is
    /// missing or unreadable.
    pub fn load(&self) -> StoredState {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return StoredState::default();
        };

        serde_json::from_str(&contents).unwrap_or_default()
    }

    pub fn save(&self, state: &StoredState) -> miette::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .into_diagnostic()
                .with_context(|| format!("failed to create state directory {}", parent.display()))?;
        }

        let serialized = serde_json::to_string_pretty(state).into_diagnostic()?;

        std::fs::write(&self.path, serialized)
            .into_diagnostic()
            .with_context(|| format!("failed to write state file {}", self.path.display()))
    }
}
