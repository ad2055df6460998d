use crawlkit_plugin::{Diagnostic, DiagnosticsSink};
use prometheus::{IntCounterVec, Opts, Registry};

use crate::prometheus_exporter::render_metrics;

/// Plugin diagnostics as Prometheus counters.
///
/// When `enabled = false` no registry or counter is allocated and
/// [`record`](DiagnosticsSink::record) returns immediately.
pub struct PluginMetrics {
    enabled: bool,
    registry: Option<Registry>,
    pub registrations: Option<IntCounterVec>,
    pub invocations: Option<IntCounterVec>,
    pub failures: Option<IntCounterVec>,
    pub slow_calls: Option<IntCounterVec>,
    pub strategy_fallbacks: Option<IntCounterVec>,
    pub dom_decisions: Option<IntCounterVec>,
}

fn counter(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> anyhow::Result<IntCounterVec> {
    let counter = IntCounterVec::new(Opts::new(name, help).namespace("crawlkit"), labels)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl PluginMetrics {
    pub fn new(enabled: bool) -> anyhow::Result<Self> {
        if !enabled {
            return Ok(Self {
                enabled: false,
                registry: None,
                registrations: None,
                invocations: None,
                failures: None,
                slow_calls: None,
                strategy_fallbacks: None,
                dom_decisions: None,
            });
        }

        let registry = Registry::new();
        let registrations = counter(
            &registry,
            "plugin_registrations_total",
            "Plugins registered per capability",
            &["capability"],
        )?;
        let invocations = counter(
            &registry,
            "plugin_invocations_total",
            "Hook calls",
            &["plugin", "capability"],
        )?;
        let failures = counter(
            &registry,
            "plugin_failures_total",
            "Hook calls that errored or panicked",
            &["plugin", "capability"],
        )?;
        let slow_calls = counter(
            &registry,
            "plugin_slow_calls_total",
            "Hook calls over the slow-call threshold",
            &["plugin", "capability"],
        )?;
        let strategy_fallbacks = counter(
            &registry,
            "dom_strategy_fallbacks_total",
            "DOM change strategy failures answered by the default comparison",
            &["plugin"],
        )?;
        let dom_decisions = counter(
            &registry,
            "dom_decisions_total",
            "DOM change decisions",
            &["source", "changed"],
        )?;
        tracing::debug!("Plugin metrics enabled");

        Ok(Self {
            enabled: true,
            registry: Some(registry),
            registrations: Some(registrations),
            invocations: Some(invocations),
            failures: Some(failures),
            slow_calls: Some(slow_calls),
            strategy_fallbacks: Some(strategy_fallbacks),
            dom_decisions: Some(dom_decisions),
        })
    }

    /// Render prometheus text exposition format.
    pub fn render(&self) -> String {
        match self.registry {
            Some(ref registry) => render_metrics(registry),
            None => String::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

fn inc(counter: &Option<IntCounterVec>, labels: &[&str]) {
    if let Some(counter) = counter {
        counter.with_label_values(labels).inc();
    }
}

impl DiagnosticsSink for PluginMetrics {
    fn record(&self, diagnostic: Diagnostic) {
        if !self.enabled {
            return;
        }
        match diagnostic {
            Diagnostic::PluginLoaded { capability, .. } => {
                inc(&self.registrations, &[capability.as_str()]);
            }
            Diagnostic::PluginInvoked { plugin, capability } => {
                inc(&self.invocations, &[plugin.as_str(), capability.as_str()]);
            }
            Diagnostic::PluginFailed { plugin, capability, .. } => {
                inc(&self.failures, &[plugin.as_str(), capability.as_str()]);
            }
            Diagnostic::SlowPlugin { plugin, capability, .. } => {
                inc(&self.slow_calls, &[plugin.as_str(), capability.as_str()]);
            }
            Diagnostic::StrategyFallback { plugin, .. } => {
                inc(&self.strategy_fallbacks, &[plugin.as_str()]);
            }
            Diagnostic::DomCompared { changed, source } => {
                let changed = if changed { "true" } else { "false" };
                inc(&self.dom_decisions, &[source.as_str(), changed]);
            }
            Diagnostic::NoPlugins | Diagnostic::UnroutablePlugins { .. } => {}
        }
    }
}

impl std::fmt::Debug for PluginMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginMetrics")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
