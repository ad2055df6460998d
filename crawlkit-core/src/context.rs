use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::browser::BrowserHandle;
use crate::state::{Eventable, StateVertex};

/// Per-worker crawl context.
///
/// Every crawler worker owns exactly one context. Plugins receive it by
/// mutable reference, so whatever they change is seen by the engine and by
/// the plugins that run after them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerContext {
    pub worker_id: usize,
    pub browser: BrowserHandle,
    /// Events fired since the index state, in order.
    #[serde(default)]
    pub crawl_path: Vec<Eventable>,
    #[serde(default)]
    pub current_state: Option<StateVertex>,
    /// Shared scratch space between plugins (key-value store).
    #[serde(default)]
    pub vars: HashMap<String, Value>,
}

impl CrawlerContext {
    pub fn new(worker_id: usize, browser: BrowserHandle) -> Self {
        Self {
            worker_id,
            browser,
            crawl_path: Vec::new(),
            current_state: None,
            vars: HashMap::new(),
        }
    }

    /// Record a fired event on the current crawl path.
    pub fn push_event(&mut self, event: Eventable) {
        self.crawl_path.push(event);
    }

    /// Forget the crawl path, e.g. after navigating back to the index.
    pub fn reset_path(&mut self) {
        self.crawl_path.clear();
    }

    pub fn set_current_state(&mut self, state: StateVertex) {
        self.current_state = Some(state);
    }

    pub fn set_var(&mut self, key: String, value: Value) {
        self.vars.insert(key, value);
    }

    pub fn get_var(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }
}
