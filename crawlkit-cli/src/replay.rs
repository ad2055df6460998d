use anyhow::Context;
use crawlkit_core::{
    BrowserHandle, BrowserKind, CandidateElement, CrawlSession, CrawlerContext, Eventable,
    ExitStatus, Invariant, ProxyConfiguration, StateVertex,
};
use crawlkit_plugin::PluginBus;
use serde::Deserialize;
use std::fmt::Write;
use std::path::Path;

/// One recorded lifecycle event.
///
/// ```json
/// [
///   { "event": "browser_created", "browser": { "id": 1, "kind": "chrome_headless" } },
///   { "event": "url_load" },
///   { "event": "new_state", "state": { "id": 0, "name": "index", "url": "http://x/", "dom": "<html/>" } },
///   { "event": "post_crawling", "exit_status": "exhausted" }
/// ]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    ProxyServer,
    BrowserCreated {
        browser: BrowserHandle,
    },
    UrlLoad,
    NewState {
        state: StateVertex,
    },
    RevisitState {
        state: StateVertex,
    },
    PreStateCrawling {
        state: StateVertex,
        #[serde(default)]
        candidates: Vec<CandidateElement>,
    },
    InvariantViolation {
        invariant: Invariant,
    },
    FireEventFailed {
        eventable: Eventable,
        #[serde(default)]
        path: Vec<Eventable>,
    },
    DomChanged {
        before: StateVertex,
        eventable: Eventable,
        after: StateVertex,
    },
    PostCrawling {
        exit_status: ExitStatus,
    },
}

/// A DOM-change decision taken during replay.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub event: String,
    pub changed: bool,
}

#[derive(Debug)]
pub struct ReplayOutcome {
    pub context: CrawlerContext,
    pub proxy: ProxyConfiguration,
    pub session: CrawlSession,
    pub decisions: Vec<Decision>,
}

pub fn load_trace(path: &Path) -> anyhow::Result<Vec<LifecycleEvent>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading trace {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing trace {}", path.display()))
}

/// Dispatch `events` in order on a fresh worker context and session.
pub fn run(bus: &PluginBus, url: &str, events: Vec<LifecycleEvent>) -> ReplayOutcome {
    let browser = BrowserHandle::new(0, BrowserKind::ChromeHeadless);
    let mut context = CrawlerContext::new(0, browser);
    let mut proxy = ProxyConfiguration::none();
    let mut session = CrawlSession::new(url);
    let mut decisions = Vec::new();

    for event in events {
        match event {
            LifecycleEvent::ProxyServer => bus.run_proxy_server(&mut proxy),
            LifecycleEvent::BrowserCreated { browser } => {
                bus.run_on_browser_created(&browser);
                context.browser = browser;
            }
            LifecycleEvent::UrlLoad => {
                context.reset_path();
                bus.run_on_url_load(&mut context);
            }
            LifecycleEvent::NewState { state } => {
                context.set_current_state(state.clone());
                bus.run_on_new_state(&mut context, &state);
                session.add_state(state);
            }
            LifecycleEvent::RevisitState { state } => {
                context.set_current_state(state.clone());
                bus.run_on_revisit_state(&mut context, &state);
            }
            LifecycleEvent::PreStateCrawling { state, candidates } => {
                bus.run_pre_state_crawling(&mut context, &candidates, &state);
            }
            LifecycleEvent::InvariantViolation { invariant } => {
                bus.run_on_invariant_violation(&invariant, &mut context);
            }
            LifecycleEvent::FireEventFailed { eventable, path } => {
                bus.run_on_fire_event_failed(&mut context, &eventable, &path);
            }
            LifecycleEvent::DomChanged { before, eventable, after } => {
                let changed = bus.run_dom_change_notifier(&context, &before, &eventable, &after);
                decisions.push(Decision { event: eventable.to_string(), changed });
                context.push_event(eventable);
            }
            LifecycleEvent::PostCrawling { exit_status } => {
                session.exit_status = Some(exit_status);
                bus.run_post_crawling(&mut session, exit_status);
            }
        }
    }

    ReplayOutcome { context, proxy, session, decisions }
}

impl ReplayOutcome {
    /// Human readable report for stdout.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "session {} ({})", self.session.id, self.session.url);
        let status = self.session.exit_status.map(|s| s.as_str()).unwrap_or("-");
        let _ = writeln!(out, "states: {}  exit: {status}", self.session.states.len());
        if self.proxy.is_enabled() {
            let _ = writeln!(
                out,
                "proxy: {:?} {}:{}",
                self.proxy.kind,
                self.proxy.hostname.as_deref().unwrap_or("-"),
                self.proxy.port
            );
        }
        for (i, decision) in self.decisions.iter().enumerate() {
            let verdict = if decision.changed { "changed" } else { "unchanged" };
            let _ = writeln!(out, "decision #{}: {} -> {verdict}", i + 1, decision.event);
        }
        let mut keys: Vec<&String> = self.session.reports.keys().collect();
        keys.sort();
        for key in keys {
            let report = &self.session.reports[key];
            let rendered = serde_json::to_string_pretty(report).unwrap_or_default();
            let _ = writeln!(out, "report {key}:\n{rendered}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawlkit_core::config::{DomCompareConfig, PluginSettings, StaticProxyConfig};
    use crawlkit_core::ProxyKind;
    use crawlkit_plugin::{PluginRegistry, RecordingDiagnostics};
    use std::io::Write as _;
    use std::sync::Arc;

    const TRACE: &str = r#"[
        { "event": "proxy_server" },
        { "event": "browser_created", "browser": { "id": 4, "kind": "firefox" } },
        { "event": "url_load" },
        { "event": "new_state", "state": { "id": 0, "name": "index", "url": "http://x/", "dom": "<p>a</p>" } },
        { "event": "pre_state_crawling",
          "state": { "id": 0, "name": "index", "url": "http://x/", "dom": "<p>a</p>" },
          "candidates": [ { "xpath": "/html/body/a" } ] },
        { "event": "dom_changed",
          "before": { "id": 0, "name": "index", "url": "http://x/", "dom": "<p>a</p>" },
          "eventable": { "id": 1, "event_type": "click", "xpath": "/html/body/a" },
          "after": { "id": 1, "name": "state1", "url": "http://x/", "dom": "<p>b</p>" } },
        { "event": "dom_changed",
          "before": { "id": 1, "name": "state1", "url": "http://x/", "dom": "<p>b</p>" },
          "eventable": { "id": 2, "event_type": "hover", "xpath": "/html/body/p" },
          "after": { "id": 1, "name": "state1", "url": "http://x/", "dom": "<p>b</p>\n" } },
        { "event": "revisit_state", "state": { "id": 0, "name": "index", "url": "http://x/", "dom": "<p>a</p>" } },
        { "event": "invariant_violation", "invariant": { "description": "no errors", "condition": "//div[@class='error']" } },
        { "event": "fire_event_failed", "eventable": { "id": 3, "event_type": "click", "xpath": "/html/body/b" } },
        { "event": "post_crawling", "exit_status": "exhausted" }
    ]"#;

    fn bus(settings: &PluginSettings) -> PluginBus {
        let plugins = crawlkit_plugins::builtin_plugins(settings).unwrap();
        let sink = Arc::new(RecordingDiagnostics::new());
        PluginBus::new(Arc::new(PluginRegistry::build_with(plugins, sink).unwrap()))
    }

    fn events() -> Vec<LifecycleEvent> {
        serde_json::from_str(TRACE).unwrap()
    }

    #[test]
    fn parses_every_event_kind() {
        let events = events();
        assert_eq!(events.len(), 11);
        assert!(matches!(events[0], LifecycleEvent::ProxyServer));
        assert!(matches!(
            &events[4],
            LifecycleEvent::PreStateCrawling { candidates, .. } if candidates.len() == 1
        ));
        assert!(matches!(
            &events[9],
            LifecycleEvent::FireEventFailed { path, .. } if path.is_empty()
        ));
    }

    #[test]
    fn unknown_event_is_rejected() {
        let result: Result<Vec<LifecycleEvent>, _> =
            serde_json::from_str(r#"[{ "event": "teleport" }]"#);
        assert!(result.is_err());
    }

    #[test]
    fn replay_with_default_comparison() {
        let outcome = run(&bus(&PluginSettings::default()), "http://x/", events());

        assert_eq!(outcome.decisions.len(), 2);
        assert!(outcome.decisions[0].changed);
        assert!(outcome.decisions[1].changed);
        assert_eq!(outcome.decisions[0].event, "click /html/body/a");
        assert_eq!(outcome.context.crawl_path.len(), 2);
        assert_eq!(outcome.context.browser.kind, BrowserKind::Firefox);
        assert_eq!(outcome.session.states.len(), 1);
        assert_eq!(outcome.session.exit_status, Some(ExitStatus::Exhausted));

        let stats = outcome.session.report("crawl-stats").unwrap();
        assert_eq!(stats["url_loads"], 1);
        assert_eq!(stats["revisits"]["index"], 1);
        assert_eq!(stats["failed_events"], 1);
    }

    #[test]
    fn replay_with_normalizing_strategy_and_proxy() {
        let settings = PluginSettings {
            proxy: Some(StaticProxyConfig { hostname: "localhost".into(), port: 8118 }),
            dom_compare: Some(DomCompareConfig {
                ignore_patterns: vec![],
                collapse_whitespace: true,
            }),
            ..PluginSettings::default()
        };
        let outcome = run(&bus(&settings), "http://x/", events());

        assert!(outcome.decisions[0].changed);
        assert!(!outcome.decisions[1].changed);
        assert_eq!(outcome.proxy.kind, ProxyKind::Manual);
        assert_eq!(outcome.proxy.port, 8118);

        let summary = outcome.summary();
        assert!(summary.contains("proxy: Manual localhost:8118"));
        assert!(summary.contains("decision #2: hover /html/body/p -> unchanged"));
        assert!(summary.contains("report crawl-stats:"));
    }

    #[test]
    fn load_trace_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRACE.as_bytes()).unwrap();
        let events = load_trace(file.path()).unwrap();
        assert_eq!(events.len(), 11);
    }

    #[test]
    fn load_trace_reports_path() {
        let err = load_trace(Path::new("/nonexistent/trace.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/trace.json"));
    }
}
