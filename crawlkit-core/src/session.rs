use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::state::StateVertex;

/// Why the crawl stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    /// The configured maximum number of states was reached.
    MaxStates,
    /// Every candidate element was fired.
    Exhausted,
    /// The configured maximum run time elapsed.
    MaxTime,
    /// Stopped on request.
    Stopped,
    /// The crawl ended because of an error.
    Error,
}

impl ExitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitStatus::MaxStates => "max_states",
            ExitStatus::Exhausted => "exhausted",
            ExitStatus::MaxTime => "max_time",
            ExitStatus::Stopped => "stopped",
            ExitStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a whole crawl, handed to post-crawling plugins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSession {
    pub id: Uuid,
    pub url: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub states: Vec<StateVertex>,
    #[serde(default)]
    pub exit_status: Option<ExitStatus>,
    /// Output left behind by post-crawling plugins, keyed by plugin.
    #[serde(default)]
    pub reports: HashMap<String, serde_json::Value>,
}

impl CrawlSession {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            started_at: Utc::now(),
            states: Vec::new(),
            exit_status: None,
            reports: HashMap::new(),
        }
    }

    pub fn add_state(&mut self, state: StateVertex) {
        self.states.push(state);
    }

    pub fn set_report(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.reports.insert(key.into(), value);
    }

    pub fn report(&self, key: &str) -> Option<&serde_json::Value> {
        self.reports.get(key)
    }
}
