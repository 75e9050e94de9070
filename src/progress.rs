use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStatus {
    Requesting,
    Success,
    Error,
}

impl QueryStatus {
    /// Success and Error are terminal; once a source reaches either, a late
    /// `Requesting` for the same key must not roll it back.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryStatus::Success | QueryStatus::Error)
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryStatus::Requesting => write!(f, "requesting"),
            QueryStatus::Success => write!(f, "success"),
            QueryStatus::Error => write!(f, "error"),
        }
    }
}

/// Immutable record emitted by the orchestrator as each source transitions
/// state. The core only emits these; display is the caller's business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub source_id: String,
    pub category: Category,
    pub status: QueryStatus,
    pub elapsed_seconds: f64,
}

impl ProgressEvent {
    pub fn requesting(source_id: &str, category: Category) -> Self {
        ProgressEvent {
            source_id: source_id.to_string(),
            category,
            status: QueryStatus::Requesting,
            elapsed_seconds: 0.0,
        }
    }

    pub fn terminal(
        source_id: &str,
        category: Category,
        status: QueryStatus,
        elapsed_seconds: f64,
    ) -> Self {
        ProgressEvent {
            source_id: source_id.to_string(),
            category,
            status,
            elapsed_seconds,
        }
    }
}

type Observer = Box<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Keyed merge of progress events from concurrently completing query tasks.
///
/// State is keyed by (source, category), so completion order between sources
/// never corrupts it; the only guarded transition is terminal-then-stale
/// `Requesting`, which is dropped.
pub struct ProgressTracker {
    states: DashMap<(String, Category), ProgressEvent>,
    observer: Option<Observer>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        ProgressTracker {
            states: DashMap::new(),
            observer: None,
        }
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a display callback invoked for every accepted event.
    pub fn with_observer(observer: impl Fn(&ProgressEvent) + Send + Sync + 'static) -> Self {
        ProgressTracker {
            states: DashMap::new(),
            observer: Some(Box::new(observer)),
        }
    }

    pub fn record(&self, event: ProgressEvent) {
        let key = (event.source_id.clone(), event.category);

        if let Some(existing) = self.states.get(&key) {
            if existing.status.is_terminal() && !event.status.is_terminal() {
                return;
            }
        }

        if let Some(observer) = &self.observer {
            observer(&event);
        }
        self.states.insert(key, event);
    }

    pub fn status_of(&self, source_id: &str, category: Category) -> Option<QueryStatus> {
        self.states
            .get(&(source_id.to_string(), category))
            .map(|entry| entry.status)
    }

    /// Sources currently in a terminal error state, for the completeness
    /// summary shown after a partially failed run.
    pub fn failed_sources(&self) -> Vec<(String, Category)> {
        let mut failed: Vec<(String, Category)> = self
            .states
            .iter()
            .filter(|entry| entry.status == QueryStatus::Error)
            .map(|entry| entry.key().clone())
            .collect();
        failed.sort();
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_state_not_overwritten_by_stale_requesting() {
        let tracker = ProgressTracker::new();
        tracker.record(ProgressEvent::requesting("model-a", Category::Incumbent));
        tracker.record(ProgressEvent::terminal(
            "model-a",
            Category::Incumbent,
            QueryStatus::Success,
            1.42,
        ));
        // Stale transition arriving out of order.
        tracker.record(ProgressEvent::requesting("model-a", Category::Incumbent));

        assert_eq!(
            tracker.status_of("model-a", Category::Incumbent),
            Some(QueryStatus::Success)
        );
    }

    #[test]
    fn test_states_are_keyed_per_source_and_category() {
        let tracker = ProgressTracker::new();
        tracker.record(ProgressEvent::terminal(
            "model-a",
            Category::Incumbent,
            QueryStatus::Error,
            0.5,
        ));
        tracker.record(ProgressEvent::requesting("model-a", Category::Regional));

        assert_eq!(
            tracker.status_of("model-a", Category::Incumbent),
            Some(QueryStatus::Error)
        );
        assert_eq!(
            tracker.status_of("model-a", Category::Regional),
            Some(QueryStatus::Requesting)
        );
        assert_eq!(
            tracker.failed_sources(),
            vec![("model-a".to_string(), Category::Incumbent)]
        );
    }
}
