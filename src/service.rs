//! Command handling and event push for the analysis orchestrator.
//!
//! The command and event shapes mirror a small message protocol: commands are
//! tagged with an `action`, replies are either a full state view or a bare
//! `{success: true}`, and events are one-way and best-effort (dropped when
//! nobody is subscribed to the target).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use crate::analyzer;
use crate::config::{ApiConfig, RootConfig};
use crate::session::{AnalysisSession, SessionStatus};
use crate::store::{ResultsSnapshot, StatePatch, Store, StoredState};

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    GetState,
    SetState { state: StatePatch },
    StartAnalysis { target: String },
    StopAnalysis,
    ClearResults,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Reply {
    State(Box<StateView>),
    Ack { success: bool },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub session: SessionSnapshot,
    pub current_target: Option<String>,
    pub chat_history: Vec<crate::store::ChatMessage>,
    pub analysis_results: ResultsSnapshot,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub total_files: usize,
    pub completed_files: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    UpdateProgress {
        progress: u8,
        current_file: String,
        total_files: usize,
        current_file_index: usize,
    },
    UpdateResults {
        results: ResultsSnapshot,
    },
    AnalysisComplete {
        results: ResultsSnapshot,
    },
    AnalysisError {
        error: String,
    },
}

/// Registry of (target → channels). The orchestrator only ever writes to it.
#[derive(Default)]
pub struct EventBus {
    channels: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Event>>>>,
}

impl EventBus {
    pub fn subscribe(&self, target: &str) -> mpsc::UnboundedReceiver<Event> {
        let (sender, receiver) = mpsc::unbounded_channel();

        self.channels
            .lock()
            .expect("event bus poisoned")
            .entry(target.to_string())
            .or_default()
            .push(sender);

        receiver
    }

    pub fn publish(&self, target: &str, event: Event) {
        let mut channels = self.channels.lock().expect("event bus poisoned");

        if let Some(senders) = channels.get_mut(target) {
            senders.retain(|sender| sender.send(event.clone()).is_ok());
        }
    }
}

pub struct Service {
    config: RootConfig,
    store: Store,
    state: Mutex<StoredState>,
    session: Mutex<AnalysisSession>,
    bus: EventBus,
    cancel: Mutex<Arc<AtomicBool>>,
}

impl Service {
    pub fn open(config: RootConfig, state_path: impl Into<PathBuf>) -> Self {
        let store = Store::open(state_path);
        let state = store.load();

        Self {
            config,
            store,
            state: Mutex::new(state),
            session: Mutex::new(AnalysisSession::default()),
            bus: EventBus::default(),
            cancel: Mutex::new(Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Handle one command. `startAnalysis` acks immediately; the work runs as
    /// a spawned task and must therefore be issued from within a runtime.
    pub fn handle(self: &Arc<Self>, command: Command) -> Reply {
        match command {
            Command::GetState => Reply::State(Box::new(self.state_view())),
            Command::SetState { state: patch } => {
                let mut state = self.state.lock().expect("state poisoned");
                state.apply(patch);
                self.persist(&state);
                Reply::Ack { success: true }
            }
            Command::StartAnalysis { target } => {
                self.start(target);
                Reply::Ack { success: true }
            }
            Command::StopAnalysis => {
                self.stop();
                Reply::Ack { success: true }
            }
            Command::ClearResults => {
                self.reset_session();
                Reply::Ack { success: true }
            }
        }
    }

    /// Start a session for the target. A running session is forcibly reset
    /// first; there is no queuing and no rejection.
    fn start(self: &Arc<Self>, target: String) {
        self.stop();

        let cancel = Arc::new(AtomicBool::new(false));
        *self.cancel.lock().expect("cancel poisoned") = cancel.clone();

        {
            let mut session = self.session.lock().expect("session poisoned");
            session.status = SessionStatus::Running;
        }

        {
            let mut state = self.state.lock().expect("state poisoned");
            state.current_target = Some(target.clone());
            self.persist(&state);
        }

        tokio::spawn(analyzer::run_analysis(self.clone(), target, cancel));
    }

    /// Cooperative stop: flags the current run and resets immediately. The
    /// in-flight network attempt is allowed to finish; no further files start.
    fn stop(&self) {
        self.cancel
            .lock()
            .expect("cancel poisoned")
            .store(true, Ordering::SeqCst);

        self.reset_session();
    }

    pub(crate) fn reset_session(&self) {
        self.session.lock().expect("session poisoned").reset();

        let mut state = self.state.lock().expect("state poisoned");
        state.analysis_results = ResultsSnapshot::default();
        self.persist(&state);
    }

    /// Reset issued by a finishing run; a no-op when another run has taken
    /// over in the meantime.
    pub(crate) fn finish_run(&self, cancel: &Arc<AtomicBool>) {
        let current = self.cancel.lock().expect("cancel poisoned").clone();

        if Arc::ptr_eq(&current, cancel) {
            self.reset_session();
        }
    }

    pub(crate) fn api(&self) -> &ApiConfig {
        &self.config.api
    }

    pub(crate) fn publish(&self, target: &str, event: Event) {
        self.bus.publish(target, event);
    }

    pub(crate) fn with_session<T>(&self, f: impl FnOnce(&mut AnalysisSession) -> T) -> T {
        f(&mut self.session.lock().expect("session poisoned"))
    }

    /// Write the current results into the persisted blob.
    pub(crate) fn persist_results(&self, results: ResultsSnapshot) -> miette::Result<()> {
        let mut state = self.state.lock().expect("state poisoned");
        state.analysis_results = results;
        self.store.save(&state)
    }

    fn state_view(&self) -> StateView {
        let session = self.session.lock().expect("session poisoned");
        let state = self.state.lock().expect("state poisoned");

        StateView {
            session: SessionSnapshot {
                status: session.status,
                total_files: session.total_files,
                completed_files: session.completed_files,
            },
            current_target: state.current_target.clone(),
            chat_history: state.chat_history.clone(),
            analysis_results: state.analysis_results.clone(),
        }
    }

    fn persist(&self, state: &StoredState) {
        if let Err(error) = self.store.save(state) {
            warn!(%error, "failed to persist state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_dropped_without_subscribers() {
        let bus = EventBus::default();

        // must not panic or accumulate anything
        bus.publish(
            "https://app.example.com",
            Event::AnalysisError {
                error: "boom".to_string(),
            },
        );
    }

    #[test]
    fn subscribers_only_see_their_target() {
        let bus = EventBus::default();
        let mut ours = bus.subscribe("https://a.example.com");
        let mut theirs = bus.subscribe("https://b.example.com");

        bus.publish(
            "https://a.example.com",
            Event::UpdateResults {
                results: ResultsSnapshot::default(),
            },
        );

        assert!(ours.try_recv().is_ok());
        assert!(theirs.try_recv().is_err());
    }

    #[test]
    fn closed_subscribers_are_pruned_on_publish() {
        let bus = EventBus::default();
        let receiver = bus.subscribe("https://a.example.com");
        drop(receiver);

        bus.publish(
            "https://a.example.com",
            Event::UpdateResults {
                results: ResultsSnapshot::default(),
            },
        );

        let channels = bus.channels.lock().unwrap();
        assert!(channels.get("https://a.example.com").unwrap().is_empty());
    }

    #[test]
    fn set_state_merges_and_persists() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("state.json");
        let service = Arc::new(Service::open(RootConfig::default(), path.clone()));

        let patch: StatePatch =
            serde_json::from_str(r#"{"currentTarget": "https://x.example.com"}"#).expect("patch");
        let reply = service.handle(Command::SetState { state: patch });
        assert!(matches!(reply, Reply::Ack { success: true }));

        match service.handle(Command::GetState) {
            Reply::State(view) => {
                assert_eq!(view.current_target.as_deref(), Some("https://x.example.com"));
            }
            Reply::Ack { .. } => panic!("getState must return the state view"),
        }

        let stored = Store::open(path).load();
        assert_eq!(
            stored.current_target.as_deref(),
            Some("https://x.example.com")
        );
    }

    #[test]
    fn clear_results_wipes_the_persisted_snapshot() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("state.json");
        let service = Arc::new(Service::open(RootConfig::default(), path.clone()));

        let patch: StatePatch = serde_json::from_str(
            r#"{"analysisResults": {"routes": ["/api"], "vulnerabilities": []}}"#,
        )
        .expect("patch");
        service.handle(Command::SetState { state: patch });

        let reply = service.handle(Command::ClearResults);
        assert!(matches!(reply, Reply::Ack { success: true }));

        let stored = Store::open(path).load();
        assert!(stored.analysis_results.routes.is_empty());
    }

    #[test]
    fn commands_parse_from_their_wire_shape() {
        let command: Command =
            serde_json::from_str(r#"{"action": "startAnalysis", "target": "https://x.example.com"}"#)
                .expect("parse");

        assert!(matches!(command, Command::StartAnalysis { target } if target == "https://x.example.com"));
    }

    #[test]
    fn progress_events_serialize_with_action_tags() {
        let event = Event::UpdateProgress {
            progress: 75,
            current_file: "app.js".to_string(),
            total_files: 4,
            current_file_index: 3,
        };

        let serialized = serde_json::to_value(&event).expect("serialize");

        assert_eq!(serialized["action"], "updateProgress");
        assert_eq!(serialized["progress"], 75);
        assert_eq!(serialized["currentFile"], "app.js");
        assert_eq!(serialized["currentFileIndex"], 3);
    }
}
