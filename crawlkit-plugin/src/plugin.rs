use crawlkit_core::{
    BrowserHandle, CandidateElement, CrawlSession, CrawlerContext, Eventable, ExitStatus,
    Invariant, ProxyConfiguration, StateVertex,
};
use serde::{Deserialize, Serialize};

/// Extension points of the crawl lifecycle.
///
/// The catalog is closed: the engine dispatches exactly these ten, and a new
/// capability means a new variant plus its hook trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// The browser navigated to the start url (first load and every reset).
    OnUrlLoad = 0,
    /// A new state was added to the state graph, the index state included.
    OnNewState = 1,
    /// An invariant failed after a DOM change.
    OnInvariantViolation = 2,
    /// The crawl finished.
    PostCrawling = 3,
    /// A known state was reached again while backtracking.
    OnRevisitState = 4,
    /// Candidate elements of a state are known, nothing fired yet.
    PreStateCrawling = 5,
    /// The proxy configuration is being prepared for the browsers.
    ProxyServer = 6,
    /// An eventable could not be fired.
    OnFireEventFailed = 7,
    /// The browser pool created a new browser.
    OnBrowserCreated = 8,
    /// Decides whether firing an event changed the DOM.
    DomChangeNotifier = 9,
}

impl Capability {
    pub const COUNT: usize = 10;

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::OnUrlLoad => "on_url_load",
            Capability::OnNewState => "on_new_state",
            Capability::OnInvariantViolation => "on_invariant_violation",
            Capability::PostCrawling => "post_crawling",
            Capability::OnRevisitState => "on_revisit_state",
            Capability::PreStateCrawling => "pre_state_crawling",
            Capability::ProxyServer => "proxy_server",
            Capability::OnFireEventFailed => "on_fire_event_failed",
            Capability::OnBrowserCreated => "on_browser_created",
            Capability::DomChangeNotifier => "dom_change_notifier",
        }
    }

    pub fn all() -> &'static [Capability] {
        &[
            Capability::OnUrlLoad,
            Capability::OnNewState,
            Capability::OnInvariantViolation,
            Capability::PostCrawling,
            Capability::OnRevisitState,
            Capability::PreStateCrawling,
            Capability::ProxyServer,
            Capability::OnFireEventFailed,
            Capability::OnBrowserCreated,
            Capability::DomChangeNotifier,
        ]
    }

    /// Position in [`Capability::all`].
    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runs after the browser loaded the start url, on the first visit and on
/// every navigation back to it.
///
/// May be called from several workers at once, each with its own context.
pub trait OnUrlLoadPlugin: Send + Sync {
    fn on_url_load(&self, context: &mut CrawlerContext) -> anyhow::Result<()>;
}

/// Runs when a new state is found, the index state included.
pub trait OnNewStatePlugin: Send + Sync {
    fn on_new_state(
        &self,
        context: &mut CrawlerContext,
        new_state: &StateVertex,
    ) -> anyhow::Result<()>;
}

/// Runs when an invariant is violated after the DOM changed.
pub trait OnInvariantViolationPlugin: Send + Sync {
    fn on_invariant_violation(
        &self,
        invariant: &Invariant,
        context: &mut CrawlerContext,
    ) -> anyhow::Result<()>;
}

/// Runs once the crawl is over.
///
/// The session is not a copy: changes are seen by the post-crawling plugins
/// registered after this one.
pub trait PostCrawlingPlugin: Send + Sync {
    fn post_crawling(
        &self,
        session: &mut CrawlSession,
        exit_status: ExitStatus,
    ) -> anyhow::Result<()>;
}

/// Runs when backtracking reaches an already known state.
///
/// `current_state` is passed explicitly because the context's current state
/// is not reliable while backtracking.
pub trait OnRevisitStatePlugin: Send + Sync {
    fn on_revisit_state(
        &self,
        context: &mut CrawlerContext,
        current_state: &StateVertex,
    ) -> anyhow::Result<()>;
}

/// Runs before any event is fired on `state`.
pub trait PreStateCrawlingPlugin: Send + Sync {
    fn pre_state_crawling(
        &self,
        context: &mut CrawlerContext,
        candidate_elements: &[CandidateElement],
        state: &StateVertex,
    ) -> anyhow::Result<()>;
}

/// Prepares the proxy the browsers will use.
///
/// The configuration is rewritten in place and influences every browser
/// created afterwards.
pub trait ProxyServerPlugin: Send + Sync {
    fn proxy_server(&self, config: &mut ProxyConfiguration) -> anyhow::Result<()>;
}

/// Runs when `eventable` could not be fired. `path` leads to it and does not
/// include it.
pub trait OnFireEventFailedPlugin: Send + Sync {
    fn on_fire_event_failed(
        &self,
        context: &mut CrawlerContext,
        eventable: &Eventable,
        path: &[Eventable],
    ) -> anyhow::Result<()>;
}

/// Runs when the browser pool created a browser that is ready for a worker.
pub trait OnBrowserCreatedPlugin: Send + Sync {
    fn on_browser_created(&self, browser: &BrowserHandle) -> anyhow::Result<()>;
}

/// Strategy deciding whether firing `event` changed the DOM.
///
/// At most one may be installed. When it fails the engine falls back to
/// comparing the two states.
pub trait DomChangeNotifierPlugin: Send + Sync {
    fn is_dom_changed(
        &self,
        context: &CrawlerContext,
        dom_before: &str,
        event: &Eventable,
        dom_after: &str,
    ) -> anyhow::Result<bool>;
}

/// A crawl plugin.
///
/// A plugin takes part in a capability by returning itself from the
/// matching accessor, e.g.
///
/// ```ignore
/// fn as_on_new_state(&self) -> Option<&dyn OnNewStatePlugin> { Some(self) }
/// ```
///
/// The registry probes every accessor once when it is built. A plugin that
/// answers `None` everywhere is reported and never called.
pub trait Plugin: Send + Sync {
    /// Identity used in logs and in the installed-plugin listing.
    fn name(&self) -> &str;

    fn as_on_url_load(&self) -> Option<&dyn OnUrlLoadPlugin> { None }
    fn as_on_new_state(&self) -> Option<&dyn OnNewStatePlugin> { None }
    fn as_on_invariant_violation(&self) -> Option<&dyn OnInvariantViolationPlugin> { None }
    fn as_post_crawling(&self) -> Option<&dyn PostCrawlingPlugin> { None }
    fn as_on_revisit_state(&self) -> Option<&dyn OnRevisitStatePlugin> { None }
    fn as_pre_state_crawling(&self) -> Option<&dyn PreStateCrawlingPlugin> { None }
    fn as_proxy_server(&self) -> Option<&dyn ProxyServerPlugin> { None }
    fn as_on_fire_event_failed(&self) -> Option<&dyn OnFireEventFailedPlugin> { None }
    fn as_on_browser_created(&self) -> Option<&dyn OnBrowserCreatedPlugin> { None }
    fn as_dom_change_notifier(&self) -> Option<&dyn DomChangeNotifierPlugin> { None }

    /// Whether this plugin takes part in `capability`.
    fn implements(&self, capability: Capability) -> bool {
        match capability {
            Capability::OnUrlLoad => self.as_on_url_load().is_some(),
            Capability::OnNewState => self.as_on_new_state().is_some(),
            Capability::OnInvariantViolation => self.as_on_invariant_violation().is_some(),
            Capability::PostCrawling => self.as_post_crawling().is_some(),
            Capability::OnRevisitState => self.as_on_revisit_state().is_some(),
            Capability::PreStateCrawling => self.as_pre_state_crawling().is_some(),
            Capability::ProxyServer => self.as_proxy_server().is_some(),
            Capability::OnFireEventFailed => self.as_on_fire_event_failed().is_some(),
            Capability::OnBrowserCreated => self.as_on_browser_created().is_some(),
            Capability::DomChangeNotifier => self.as_dom_change_notifier().is_some(),
        }
    }

    /// Every capability this plugin takes part in, in catalog order.
    fn capabilities(&self) -> Vec<Capability> {
        Capability::all()
            .iter()
            .copied()
            .filter(|c| self.implements(*c))
            .collect()
    }
}
