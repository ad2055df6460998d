use crawlkit_core::browser::{BrowserHandle, BrowserKind, ProxyConfiguration, ProxyKind};
use crawlkit_core::context::CrawlerContext;
use crawlkit_core::error::ConfigurationError;
use crawlkit_core::invariant::Invariant;
use crawlkit_core::session::{CrawlSession, ExitStatus};
use crawlkit_core::state::{CandidateElement, EventType, Eventable, StateVertex};
use std::collections::HashSet;

// =============================================================================
// StateVertex Tests
// =============================================================================

#[test]
fn test_state_equality_uses_stripped_dom() {
    let a = StateVertex::new(1, "index", "http://a/", "<body>1</body>", "<body/>");
    let b = StateVertex::new(7, "state7", "http://a/#x", "<body>2</body>", "<body/>");
    assert_eq!(a, b);
}

#[test]
fn test_state_inequality_on_different_stripped_dom() {
    let a = StateVertex::unstripped(1, "index", "http://a/", "<body>1</body>");
    let b = StateVertex::unstripped(1, "index", "http://a/", "<body>2</body>");
    assert_ne!(a, b);
}

#[test]
fn test_state_hash_consistent_with_equality() {
    let a = StateVertex::new(1, "index", "http://a/", "<p>x</p>", "<p/>");
    let b = StateVertex::new(2, "other", "http://b/", "<p>y</p>", "<p/>");
    let set: HashSet<StateVertex> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_state_minimal_deserialization() {
    let json = r#"{"id":3,"name":"state3","url":"http://a/","dom":"<a/>"}"#;
    let state: StateVertex = serde_json::from_str(json).unwrap();
    assert_eq!(state.id, 3);
    assert_eq!(state.dom(), "<a/>");
    assert_eq!(state.stripped_dom(), "<a/>");
}

#[test]
fn test_state_explicit_stripped_dom_is_kept() {
    let json = r#"{"id":3,"name":"s","url":"http://a/","dom":"<a>1</a>","stripped_dom":"<a/>"}"#;
    let state: StateVertex = serde_json::from_str(json).unwrap();
    assert_eq!(state.dom(), "<a>1</a>");
    assert_eq!(state.stripped_dom(), "<a/>");
}

// =============================================================================
// Eventable / CandidateElement Tests
// =============================================================================

#[test]
fn test_event_type_serializes_to_lowercase() {
    assert_eq!(serde_json::to_string(&EventType::Click).unwrap(), "\"click\"");
    assert_eq!(EventType::Hover.to_string(), "hover");
}

#[test]
fn test_eventable_display() {
    let event = Eventable::new(1, EventType::Click, "/HTML/BODY/A[1]");
    assert_eq!(event.to_string(), "click /HTML/BODY/A[1]");
    assert!(event.source_state.is_none());
}

#[test]
fn test_candidate_element_from_yaml() {
    let yaml = "xpath: /HTML/BODY/BUTTON\nrelated_frame: frame0\n";
    let candidate: CandidateElement = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(candidate.xpath, "/HTML/BODY/BUTTON");
    assert_eq!(candidate.related_frame.as_deref(), Some("frame0"));
    assert!(candidate.element_text.is_empty());
}

// =============================================================================
// Session Tests
// =============================================================================

#[test]
fn test_exit_status_display_matches_serde() {
    for status in [
        ExitStatus::MaxStates,
        ExitStatus::Exhausted,
        ExitStatus::MaxTime,
        ExitStatus::Stopped,
        ExitStatus::Error,
    ] {
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, format!("\"{status}\""));
    }
}

#[test]
fn test_session_reports() {
    let mut session = CrawlSession::new("http://example.com");
    assert!(session.report("crawl-stats").is_none());
    session.set_report("crawl-stats", serde_json::json!({"states": 2}));
    assert_eq!(session.report("crawl-stats").unwrap()["states"], 2);
    assert!(session.exit_status.is_none());
}

#[test]
fn test_session_serialization_roundtrip() {
    let mut session = CrawlSession::new("http://example.com");
    session.add_state(StateVertex::unstripped(0, "index", "http://example.com", "<html/>"));
    session.exit_status = Some(ExitStatus::Exhausted);

    let json = serde_json::to_string(&session).unwrap();
    let back: CrawlSession = serde_json::from_str(&json).unwrap();
    assert_eq!(back.id, session.id);
    assert_eq!(back.states.len(), 1);
    assert_eq!(back.exit_status, Some(ExitStatus::Exhausted));
}

// =============================================================================
// Context / Browser / Invariant Tests
// =============================================================================

#[test]
fn test_context_path_and_vars() {
    let mut ctx = CrawlerContext::new(2, BrowserHandle::new(9, BrowserKind::ChromeHeadless));
    assert_eq!(ctx.worker_id, 2);
    ctx.push_event(Eventable::new(1, EventType::Click, "/A"));
    ctx.push_event(Eventable::new(2, EventType::Click, "/B"));
    assert_eq!(ctx.crawl_path.len(), 2);
    ctx.reset_path();
    assert!(ctx.crawl_path.is_empty());

    ctx.set_var("seen".to_string(), serde_json::json!(true));
    assert_eq!(ctx.get_var("seen"), Some(&serde_json::json!(true)));
    assert!(ctx.get_var("missing").is_none());
}

#[test]
fn test_proxy_configuration_default_is_disabled() {
    let proxy = ProxyConfiguration::default();
    assert_eq!(proxy.kind, ProxyKind::Nothing);
    assert!(!proxy.is_enabled());

    let manual = ProxyConfiguration::manual("localhost", 3128);
    assert!(manual.is_enabled());
    assert_eq!(manual.hostname.as_deref(), Some("localhost"));
}

#[test]
fn test_browser_kind_snake_case() {
    let json = serde_json::to_string(&BrowserKind::ChromeHeadless).unwrap();
    assert_eq!(json, "\"chrome_headless\"");
}

#[test]
fn test_invariant_display() {
    let inv = Invariant::new("no error banner", "!contains('.error')");
    assert_eq!(inv.to_string(), "no error banner (!contains('.error'))");
}

// =============================================================================
// ConfigurationError Tests
// =============================================================================

#[test]
fn test_configuration_error_names_plugins() {
    let err = ConfigurationError::TooManyDomChangeStrategies {
        plugins: vec!["a".into(), "b".into()],
    };
    let msg = err.to_string();
    assert!(msg.contains("got 2"));
    assert!(msg.contains("a, b"));
    assert_eq!(err.plugins(), ["a".to_string(), "b".to_string()]);
}
