use crawlkit_core::{
    BrowserHandle, CandidateElement, CrawlSession, CrawlerContext, Eventable, ExitStatus,
    Invariant, StateVertex,
};
use crawlkit_plugin::{
    OnBrowserCreatedPlugin, OnFireEventFailedPlugin, OnInvariantViolationPlugin,
    OnNewStatePlugin, OnRevisitStatePlugin, OnUrlLoadPlugin, Plugin, PostCrawlingPlugin,
    PreStateCrawlingPlugin,
};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Key under which the statistics land in [`CrawlSession::reports`].
pub const REPORT_KEY: &str = "crawl-stats";

/// Counts lifecycle events across all crawler workers.
///
/// Counters are lock-free; revisits are kept per state name in a
/// concurrent map. When the crawl ends the totals are stored in the
/// session reports under [`REPORT_KEY`].
#[derive(Debug, Default)]
pub struct CrawlStatsPlugin {
    url_loads: AtomicU64,
    new_states: AtomicU64,
    revisits: DashMap<String, u64>,
    invariant_violations: AtomicU64,
    crawled_states: AtomicU64,
    candidate_elements: AtomicU64,
    failed_events: AtomicU64,
    browsers_created: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    pub url_loads: u64,
    pub new_states: u64,
    pub revisits: BTreeMap<String, u64>,
    pub invariant_violations: u64,
    pub crawled_states: u64,
    pub candidate_elements: u64,
    pub failed_events: u64,
    pub browsers_created: u64,
}

impl CrawlStats {
    pub fn total_revisits(&self) -> u64 {
        self.revisits.values().sum()
    }
}

impl CrawlStatsPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> CrawlStats {
        CrawlStats {
            url_loads: self.url_loads.load(Ordering::Relaxed),
            new_states: self.new_states.load(Ordering::Relaxed),
            revisits: self
                .revisits
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
            invariant_violations: self.invariant_violations.load(Ordering::Relaxed),
            crawled_states: self.crawled_states.load(Ordering::Relaxed),
            candidate_elements: self.candidate_elements.load(Ordering::Relaxed),
            failed_events: self.failed_events.load(Ordering::Relaxed),
            browsers_created: self.browsers_created.load(Ordering::Relaxed),
        }
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl Plugin for CrawlStatsPlugin {
    fn name(&self) -> &str {
        "crawl-stats"
    }

    fn as_on_url_load(&self) -> Option<&dyn OnUrlLoadPlugin> { Some(self) }
    fn as_on_new_state(&self) -> Option<&dyn OnNewStatePlugin> { Some(self) }
    fn as_on_invariant_violation(&self) -> Option<&dyn OnInvariantViolationPlugin> { Some(self) }
    fn as_post_crawling(&self) -> Option<&dyn PostCrawlingPlugin> { Some(self) }
    fn as_on_revisit_state(&self) -> Option<&dyn OnRevisitStatePlugin> { Some(self) }
    fn as_pre_state_crawling(&self) -> Option<&dyn PreStateCrawlingPlugin> { Some(self) }
    fn as_on_fire_event_failed(&self) -> Option<&dyn OnFireEventFailedPlugin> { Some(self) }
    fn as_on_browser_created(&self) -> Option<&dyn OnBrowserCreatedPlugin> { Some(self) }
}

impl OnUrlLoadPlugin for CrawlStatsPlugin {
    fn on_url_load(&self, _context: &mut CrawlerContext) -> anyhow::Result<()> {
        bump(&self.url_loads);
        Ok(())
    }
}

impl OnNewStatePlugin for CrawlStatsPlugin {
    fn on_new_state(&self, _context: &mut CrawlerContext, _new_state: &StateVertex) -> anyhow::Result<()> {
        bump(&self.new_states);
        Ok(())
    }
}

impl OnInvariantViolationPlugin for CrawlStatsPlugin {
    fn on_invariant_violation(&self, _invariant: &Invariant, _context: &mut CrawlerContext) -> anyhow::Result<()> {
        bump(&self.invariant_violations);
        Ok(())
    }
}

impl OnRevisitStatePlugin for CrawlStatsPlugin {
    fn on_revisit_state(&self, _context: &mut CrawlerContext, current_state: &StateVertex) -> anyhow::Result<()> {
        *self.revisits.entry(current_state.name.clone()).or_insert(0) += 1;
        Ok(())
    }
}

impl PreStateCrawlingPlugin for CrawlStatsPlugin {
    fn pre_state_crawling(
        &self,
        _context: &mut CrawlerContext,
        candidate_elements: &[CandidateElement],
        _state: &StateVertex,
    ) -> anyhow::Result<()> {
        bump(&self.crawled_states);
        self.candidate_elements
            .fetch_add(candidate_elements.len() as u64, Ordering::Relaxed);
        Ok(())
    }
}

impl OnFireEventFailedPlugin for CrawlStatsPlugin {
    fn on_fire_event_failed(
        &self,
        _context: &mut CrawlerContext,
        _eventable: &Eventable,
        _path: &[Eventable],
    ) -> anyhow::Result<()> {
        bump(&self.failed_events);
        Ok(())
    }
}

impl OnBrowserCreatedPlugin for CrawlStatsPlugin {
    fn on_browser_created(&self, _browser: &BrowserHandle) -> anyhow::Result<()> {
        bump(&self.browsers_created);
        Ok(())
    }
}

impl PostCrawlingPlugin for CrawlStatsPlugin {
    fn post_crawling(&self, session: &mut CrawlSession, exit_status: ExitStatus) -> anyhow::Result<()> {
        let stats = self.snapshot();
        tracing::info!(
            session = %session.id,
            %exit_status,
            url_loads = stats.url_loads,
            new_states = stats.new_states,
            revisits = stats.total_revisits(),
            invariant_violations = stats.invariant_violations,
            failed_events = stats.failed_events,
            browsers_created = stats.browsers_created,
            "Crawl statistics"
        );
        session.set_report(REPORT_KEY, serde_json::to_value(&stats)?);
        Ok(())
    }
}
