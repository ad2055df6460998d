//! Structured log line for every lifecycle notification.
//!
//! Installed by default (`plugins.lifecycle_log: true`). Does not change
//! any argument it receives.

use crawlkit_core::{
    BrowserHandle, CandidateElement, CrawlSession, CrawlerContext, Eventable, ExitStatus,
    Invariant, ProxyConfiguration, StateVertex,
};
use crawlkit_plugin::{
    OnBrowserCreatedPlugin, OnFireEventFailedPlugin, OnInvariantViolationPlugin,
    OnNewStatePlugin, OnRevisitStatePlugin, OnUrlLoadPlugin, Plugin, PostCrawlingPlugin,
    PreStateCrawlingPlugin, ProxyServerPlugin,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct LifecycleLogPlugin;

impl Plugin for LifecycleLogPlugin {
    fn name(&self) -> &str {
        "lifecycle-log"
    }

    fn as_on_url_load(&self) -> Option<&dyn OnUrlLoadPlugin> { Some(self) }
    fn as_on_new_state(&self) -> Option<&dyn OnNewStatePlugin> { Some(self) }
    fn as_on_invariant_violation(&self) -> Option<&dyn OnInvariantViolationPlugin> { Some(self) }
    fn as_post_crawling(&self) -> Option<&dyn PostCrawlingPlugin> { Some(self) }
    fn as_on_revisit_state(&self) -> Option<&dyn OnRevisitStatePlugin> { Some(self) }
    fn as_pre_state_crawling(&self) -> Option<&dyn PreStateCrawlingPlugin> { Some(self) }
    fn as_proxy_server(&self) -> Option<&dyn ProxyServerPlugin> { Some(self) }
    fn as_on_fire_event_failed(&self) -> Option<&dyn OnFireEventFailedPlugin> { Some(self) }
    fn as_on_browser_created(&self) -> Option<&dyn OnBrowserCreatedPlugin> { Some(self) }
}

impl OnUrlLoadPlugin for LifecycleLogPlugin {
    fn on_url_load(&self, context: &mut CrawlerContext) -> anyhow::Result<()> {
        tracing::info!(worker = context.worker_id, browser = context.browser.id, "URL loaded");
        Ok(())
    }
}

impl OnNewStatePlugin for LifecycleLogPlugin {
    fn on_new_state(&self, context: &mut CrawlerContext, new_state: &StateVertex) -> anyhow::Result<()> {
        tracing::info!(
            worker = context.worker_id,
            state = %new_state.name,
            url = %new_state.url,
            path_len = context.crawl_path.len(),
            "New state found"
        );
        Ok(())
    }
}

impl OnInvariantViolationPlugin for LifecycleLogPlugin {
    fn on_invariant_violation(&self, invariant: &Invariant, context: &mut CrawlerContext) -> anyhow::Result<()> {
        let state = context.current_state.as_ref().map(|s| s.name.as_str()).unwrap_or("-");
        tracing::warn!(worker = context.worker_id, %invariant, state, "Invariant violated");
        Ok(())
    }
}

impl PostCrawlingPlugin for LifecycleLogPlugin {
    fn post_crawling(&self, session: &mut CrawlSession, exit_status: ExitStatus) -> anyhow::Result<()> {
        tracing::info!(
            session = %session.id,
            url = %session.url,
            states = session.states.len(),
            %exit_status,
            "Crawl finished"
        );
        Ok(())
    }
}

impl OnRevisitStatePlugin for LifecycleLogPlugin {
    fn on_revisit_state(&self, context: &mut CrawlerContext, current_state: &StateVertex) -> anyhow::Result<()> {
        tracing::debug!(worker = context.worker_id, state = %current_state.name, "State revisited");
        Ok(())
    }
}

impl PreStateCrawlingPlugin for LifecycleLogPlugin {
    fn pre_state_crawling(
        &self,
        context: &mut CrawlerContext,
        candidate_elements: &[CandidateElement],
        state: &StateVertex,
    ) -> anyhow::Result<()> {
        tracing::debug!(
            worker = context.worker_id,
            state = %state.name,
            candidates = candidate_elements.len(),
            "Crawling state"
        );
        Ok(())
    }
}

impl ProxyServerPlugin for LifecycleLogPlugin {
    fn proxy_server(&self, config: &mut ProxyConfiguration) -> anyhow::Result<()> {
        tracing::info!(
            kind = ?config.kind,
            hostname = config.hostname.as_deref().unwrap_or("-"),
            port = config.port,
            "Proxy configuration"
        );
        Ok(())
    }
}

impl OnFireEventFailedPlugin for LifecycleLogPlugin {
    fn on_fire_event_failed(
        &self,
        context: &mut CrawlerContext,
        eventable: &Eventable,
        path: &[Eventable],
    ) -> anyhow::Result<()> {
        tracing::warn!(
            worker = context.worker_id,
            event = %eventable,
            path_len = path.len(),
            "Firing event failed"
        );
        Ok(())
    }
}

impl OnBrowserCreatedPlugin for LifecycleLogPlugin {
    fn on_browser_created(&self, browser: &BrowserHandle) -> anyhow::Result<()> {
        tracing::info!(browser = browser.id, kind = ?browser.kind, "Browser created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawlkit_core::BrowserKind;
    use crawlkit_plugin::Capability;

    #[test]
    fn implements_every_notification() {
        let caps = LifecycleLogPlugin.capabilities();
        assert_eq!(caps.len(), 9);
        assert!(!caps.contains(&Capability::DomChangeNotifier));
    }

    #[test]
    fn leaves_arguments_untouched() {
        let mut ctx = CrawlerContext::new(3, BrowserHandle::new(1, BrowserKind::Chrome));
        let before = ctx.clone();
        let state = StateVertex::unstripped(1, "index", "http://localhost/", "<html/>");

        LifecycleLogPlugin.on_url_load(&mut ctx).unwrap();
        LifecycleLogPlugin.on_new_state(&mut ctx, &state).unwrap();
        LifecycleLogPlugin
            .on_invariant_violation(&Invariant::new("title set", "//title"), &mut ctx)
            .unwrap();

        assert_eq!(ctx.worker_id, before.worker_id);
        assert!(ctx.vars.is_empty());
        assert!(ctx.crawl_path.is_empty());

        let mut proxy = ProxyConfiguration::manual("localhost", 8080);
        LifecycleLogPlugin.proxy_server(&mut proxy).unwrap();
        assert_eq!(proxy, ProxyConfiguration::manual("localhost", 8080));
    }
}
