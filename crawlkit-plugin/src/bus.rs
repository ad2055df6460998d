use crawlkit_core::{
    BrowserHandle, CandidateElement, CrawlSession, CrawlerContext, Eventable, ExitStatus,
    Invariant, ProxyConfiguration, StateVertex,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::diagnostics::{Diagnostic, DiagnosticsSink};
use crate::error::PluginFailure;
use crate::plugin::{Capability, Plugin};
use crate::registry::PluginRegistry;

/// Dispatches crawl lifecycle events to registered plugins.
///
/// Every `run_*` call invokes the plugins of one capability sequentially,
/// in registration order, on the calling thread. A plugin that returns an
/// error or panics is reported and skipped; the dispatch always completes
/// and never fails. There is no locking: concurrent dispatches from several
/// workers may reach the same plugin instance at the same time, and keeping
/// that safe is the plugin's job.
///
/// Arguments are passed by reference, not copied. What a plugin changes in a
/// `&mut` argument is visible to the engine and to the plugins after it.
#[derive(Clone)]
pub struct PluginBus {
    pub(crate) registry: Arc<PluginRegistry>,
    pub(crate) diagnostics: Arc<dyn DiagnosticsSink>,
    slow_call_threshold: Option<Duration>,
}

impl PluginBus {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        let diagnostics = Arc::clone(registry.diagnostics());
        Self {
            registry,
            diagnostics,
            slow_call_threshold: None,
        }
    }

    /// Report hook calls that take longer than `threshold`.
    ///
    /// Slow calls still run to completion; a hung plugin hangs the
    /// dispatching worker.
    pub fn with_slow_call_threshold(mut self, threshold: Duration) -> Self {
        self.slow_call_threshold = Some(threshold);
        self
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Run the OnUrlLoad plugins, after the browser went to the start url.
    pub fn run_on_url_load(&self, context: &mut CrawlerContext) {
        self.dispatch(Capability::OnUrlLoad, |plugin| {
            plugin.as_on_url_load().map(|hook| hook.on_url_load(context))
        });
    }

    /// Run the OnNewState plugins for a freshly discovered state.
    pub fn run_on_new_state(&self, context: &mut CrawlerContext, new_state: &StateVertex) {
        self.dispatch(Capability::OnNewState, |plugin| {
            plugin
                .as_on_new_state()
                .map(|hook| hook.on_new_state(context, new_state))
        });
    }

    /// Run the OnInvariantViolation plugins for a failed invariant.
    pub fn run_on_invariant_violation(&self, invariant: &Invariant, context: &mut CrawlerContext) {
        self.dispatch(Capability::OnInvariantViolation, |plugin| {
            plugin
                .as_on_invariant_violation()
                .map(|hook| hook.on_invariant_violation(invariant, context))
        });
    }

    /// Run the PostCrawling plugins once the crawl is over.
    pub fn run_post_crawling(&self, session: &mut CrawlSession, exit_status: ExitStatus) {
        self.dispatch(Capability::PostCrawling, |plugin| {
            plugin
                .as_post_crawling()
                .map(|hook| hook.post_crawling(session, exit_status))
        });
    }

    /// Run the OnRevisitState plugins while backtracking through `current_state`.
    pub fn run_on_revisit_state(&self, context: &mut CrawlerContext, current_state: &StateVertex) {
        self.dispatch(Capability::OnRevisitState, |plugin| {
            plugin
                .as_on_revisit_state()
                .map(|hook| hook.on_revisit_state(context, current_state))
        });
    }

    /// Run the PreStateCrawling plugins before events are fired on `state`.
    pub fn run_pre_state_crawling(
        &self,
        context: &mut CrawlerContext,
        candidate_elements: &[CandidateElement],
        state: &StateVertex,
    ) {
        self.dispatch(Capability::PreStateCrawling, |plugin| {
            plugin
                .as_pre_state_crawling()
                .map(|hook| hook.pre_state_crawling(context, candidate_elements, state))
        });
    }

    /// Run the ProxyServer plugins over the browser proxy configuration.
    pub fn run_proxy_server(&self, config: &mut ProxyConfiguration) {
        self.dispatch(Capability::ProxyServer, |plugin| {
            plugin.as_proxy_server().map(|hook| hook.proxy_server(config))
        });
    }

    /// Run the OnFireEventFailed plugins. `path` leads to `eventable`,
    /// excluding it.
    pub fn run_on_fire_event_failed(
        &self,
        context: &mut CrawlerContext,
        eventable: &Eventable,
        path: &[Eventable],
    ) {
        self.dispatch(Capability::OnFireEventFailed, |plugin| {
            plugin
                .as_on_fire_event_failed()
                .map(|hook| hook.on_fire_event_failed(context, eventable, path))
        });
    }

    /// Run the OnBrowserCreated plugins for a browser fresh from the pool.
    pub fn run_on_browser_created(&self, browser: &BrowserHandle) {
        self.dispatch(Capability::OnBrowserCreated, |plugin| {
            plugin
                .as_on_browser_created()
                .map(|hook| hook.on_browser_created(browser))
        });
    }

    /// Call `call` for every plugin of `capability`, absorbing failures.
    ///
    /// `call` answers `None` for a plugin that does not expose the hook;
    /// the registry never hands out such plugins.
    fn dispatch<F>(&self, capability: Capability, mut call: F)
    where
        F: FnMut(&dyn Plugin) -> Option<anyhow::Result<()>>,
    {
        for plugin in self.registry.plugins_for(capability) {
            let plugin = plugin.as_ref();
            let outcome = self.invoke(plugin, capability, || call(plugin).unwrap_or(Ok(())));
            if let Err(failure) = outcome {
                self.report_failure(plugin, capability, &failure);
            }
        }
    }

    /// Run one hook call, turning errors and panics into a [`PluginFailure`].
    pub(crate) fn invoke<T>(
        &self,
        plugin: &dyn Plugin,
        capability: Capability,
        call: impl FnOnce() -> anyhow::Result<T>,
    ) -> Result<T, PluginFailure> {
        self.diagnostics.record(Diagnostic::PluginInvoked {
            plugin: plugin.name().to_string(),
            capability,
        });

        let started = Instant::now();
        // The arguments may be left half-updated by a panicking plugin;
        // the engine sees them as they are, like any other plugin change.
        let outcome = panic::catch_unwind(AssertUnwindSafe(call));
        self.check_slow(plugin, capability, started.elapsed());

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(PluginFailure::Error(err)),
            Err(payload) => Err(PluginFailure::from_panic(payload)),
        }
    }

    fn report_failure(&self, plugin: &dyn Plugin, capability: Capability, failure: &PluginFailure) {
        self.diagnostics.record(Diagnostic::PluginFailed {
            plugin: plugin.name().to_string(),
            capability,
            message: failure.to_string(),
        });
    }

    fn check_slow(&self, plugin: &dyn Plugin, capability: Capability, elapsed: Duration) {
        if let Some(threshold) = self.slow_call_threshold {
            if elapsed >= threshold {
                self.diagnostics.record(Diagnostic::SlowPlugin {
                    plugin: plugin.name().to_string(),
                    capability,
                    elapsed,
                });
            }
        }
    }
}

impl std::fmt::Debug for PluginBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginBus")
            .field("registry", &self.registry)
            .field("slow_call_threshold", &self.slow_call_threshold)
            .finish_non_exhaustive()
    }
}
