use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::plugin::Capability;

/// Where a DOM-change decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// The installed DomChangeNotifier plugin answered.
    Strategy,
    /// The engine compared the two states itself.
    Default,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionSource::Strategy => "strategy",
            DecisionSource::Default => "default",
        }
    }
}

/// Something the plugin subsystem wants operators to know about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The registry was built from an empty plugin list.
    NoPlugins,
    PluginLoaded { plugin: String, capability: Capability },
    /// Plugins that implement none of the known capabilities.
    UnroutablePlugins { plugins: Vec<String> },
    PluginInvoked { plugin: String, capability: Capability },
    PluginFailed { plugin: String, capability: Capability, message: String },
    /// The DOM-change strategy failed and the default comparison was used.
    StrategyFallback { plugin: String, message: String },
    SlowPlugin { plugin: String, capability: Capability, elapsed: Duration },
    DomCompared { changed: bool, source: DecisionSource },
}

/// Receiver for [`Diagnostic`]s.
///
/// Injected into the registry at build time and shared with every bus built
/// on it. Called from crawler worker threads, possibly concurrently.
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, diagnostic: Diagnostic);
}

/// Default sink: structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn record(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::NoPlugins => {
                tracing::warn!("No plugins loaded. There will be no output");
            }
            Diagnostic::PluginLoaded { plugin, capability } => {
                tracing::info!(%plugin, %capability, "Loaded plugin");
            }
            Diagnostic::UnroutablePlugins { plugins } => {
                tracing::warn!(
                    plugins = ?plugins,
                    "Plugins were added but are ignored because they implement no known capability"
                );
            }
            Diagnostic::PluginInvoked { plugin, capability } => {
                tracing::debug!(%plugin, %capability, "Calling plugin");
            }
            Diagnostic::PluginFailed { plugin, capability, message } => {
                tracing::error!(%plugin, %capability, error = %message, "Plugin errored while running");
            }
            Diagnostic::StrategyFallback { plugin, message } => {
                tracing::error!(
                    %plugin,
                    error = %message,
                    "DOM change strategy failed, running default DOM comparison"
                );
            }
            Diagnostic::SlowPlugin { plugin, capability, elapsed } => {
                tracing::warn!(
                    %plugin,
                    %capability,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    "Slow plugin call"
                );
            }
            Diagnostic::DomCompared { changed, source } => {
                tracing::debug!(changed, source = source.as_str(), "DOM compared");
            }
        }
    }
}

/// Keeps every diagnostic in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    /// Recorded plugin failures as `(plugin, capability, message)`.
    pub fn failures(&self) -> Vec<(String, Capability, String)> {
        self.lock()
            .iter()
            .filter_map(|d| match d {
                Diagnostic::PluginFailed { plugin, capability, message } => {
                    Some((plugin.clone(), *capability, message.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Order in which plugins were called for `capability`.
    pub fn invocations(&self, capability: Capability) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|d| match d {
                Diagnostic::PluginInvoked { plugin, capability: c } if *c == capability => {
                    Some(plugin.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, diagnostic: &Diagnostic) -> bool {
        self.lock().iter().any(|d| d == diagnostic)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn record(&self, diagnostic: Diagnostic) {
        self.lock().push(diagnostic);
    }
}

/// Forwards every diagnostic to each inner sink, in order.
#[derive(Default, Clone)]
pub struct FanoutDiagnostics {
    sinks: Vec<Arc<dyn DiagnosticsSink>>,
}

impl FanoutDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl DiagnosticsSink for FanoutDiagnostics {
    fn record(&self, diagnostic: Diagnostic) {
        let Some((last, rest)) = self.sinks.split_last() else {
            return;
        };
        for sink in rest {
            sink.record(diagnostic.clone());
        }
        last.record(diagnostic);
    }
}
