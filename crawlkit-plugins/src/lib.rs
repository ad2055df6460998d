pub mod browser;
pub mod observe;
pub mod strategy;

use crawlkit_core::config::PluginSettings;
use crawlkit_plugin::Plugin;
use std::sync::Arc;

/// Build the built-in plugins enabled by `settings`, in registration order.
///
/// Fails when a plugin rejects its configuration, e.g. an ignore pattern
/// that is not a valid regular expression.
pub fn builtin_plugins(settings: &PluginSettings) -> anyhow::Result<Vec<Arc<dyn Plugin>>> {
    let mut plugins: Vec<Arc<dyn Plugin>> = Vec::new();

    // Browser setup
    if let Some(proxy) = &settings.proxy {
        plugins.push(Arc::new(browser::static_proxy::StaticProxyPlugin::from_config(proxy)?));
    }

    // Observers
    if settings.lifecycle_log {
        plugins.push(Arc::new(observe::lifecycle_log::LifecycleLogPlugin));
    }
    if settings.crawl_stats {
        plugins.push(Arc::new(observe::crawl_stats::CrawlStatsPlugin::new()));
    }

    // DOM change strategy
    if let Some(dom_compare) = &settings.dom_compare {
        plugins.push(Arc::new(
            strategy::normalized_dom::NormalizedDomComparator::from_config(dom_compare)?,
        ));
    }

    Ok(plugins)
}
