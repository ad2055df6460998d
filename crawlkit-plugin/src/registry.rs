use crawlkit_core::ConfigurationError;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::diagnostics::{Diagnostic, DiagnosticsSink, TracingDiagnostics};
use crate::plugin::{Capability, Plugin};

/// Plugins of a crawl, classified by capability.
///
/// Built once before the crawl starts and never mutated afterwards, so
/// workers share it through an `Arc` without locking.
pub struct PluginRegistry {
    /// Indexed by [`Capability::index`]; each list keeps input order.
    by_capability: [Vec<Arc<dyn Plugin>>; Capability::COUNT],
    /// Names of supplied plugins that implement no capability.
    unrouted: Vec<String>,
    degraded: bool,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl PluginRegistry {
    /// Build a registry reporting through `tracing`.
    pub fn build(plugins: Vec<Arc<dyn Plugin>>) -> Result<Self, ConfigurationError> {
        Self::build_with(plugins, Arc::new(TracingDiagnostics))
    }

    /// Build a registry reporting to `diagnostics`.
    ///
    /// Fails when more than one plugin implements
    /// [`Capability::DomChangeNotifier`].
    pub fn build_with(
        plugins: Vec<Arc<dyn Plugin>>,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Result<Self, ConfigurationError> {
        let registry = Self::classify(plugins, diagnostics);

        let strategies = registry.plugins_for(Capability::DomChangeNotifier);
        if strategies.len() > 1 {
            return Err(ConfigurationError::TooManyDomChangeStrategies {
                plugins: strategies.iter().map(|p| p.name().to_string()).collect(),
            });
        }

        Ok(registry)
    }

    /// A registry without plugins.
    pub fn empty() -> Self {
        Self::classify(Vec::new(), Arc::new(TracingDiagnostics))
    }

    fn classify(plugins: Vec<Arc<dyn Plugin>>, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        let mut by_capability: [Vec<Arc<dyn Plugin>>; Capability::COUNT] = Default::default();
        let mut unrouted = Vec::new();
        let degraded = plugins.is_empty();

        if degraded {
            diagnostics.record(Diagnostic::NoPlugins);
        }

        for plugin in &plugins {
            let mut routed = false;
            for &capability in Capability::all() {
                if plugin.implements(capability) {
                    by_capability[capability.index()].push(Arc::clone(plugin));
                    diagnostics.record(Diagnostic::PluginLoaded {
                        plugin: plugin.name().to_string(),
                        capability,
                    });
                    routed = true;
                }
            }
            if !routed {
                unrouted.push(plugin.name().to_string());
            }
        }

        if !unrouted.is_empty() {
            diagnostics.record(Diagnostic::UnroutablePlugins {
                plugins: unrouted.clone(),
            });
        }

        Self {
            by_capability,
            unrouted,
            degraded,
            diagnostics,
        }
    }

    /// Plugins registered for `capability`, in registration order.
    #[inline]
    pub fn plugins_for(&self, capability: Capability) -> &[Arc<dyn Plugin>] {
        &self.by_capability[capability.index()]
    }

    /// Sorted, de-duplicated names of every plugin registered under at
    /// least one capability.
    pub fn installed_names(&self) -> BTreeSet<String> {
        self.by_capability
            .iter()
            .flatten()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Names of supplied plugins that were ignored, in input order.
    pub fn unrouted(&self) -> &[String] {
        &self.unrouted
    }

    /// Whether the registry was built from an empty plugin list.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Check if a given capability has any plugins.
    #[inline]
    pub fn has_capability(&self, capability: Capability) -> bool {
        !self.plugins_for(capability).is_empty()
    }

    pub fn diagnostics(&self) -> &Arc<dyn DiagnosticsSink> {
        &self.diagnostics
    }

    /// Total number of (capability, plugin) registrations.
    pub fn len(&self) -> usize {
        self.by_capability.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_capability.iter().all(Vec::is_empty)
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for &capability in Capability::all() {
            let names: Vec<&str> = self.plugins_for(capability).iter().map(|p| p.name()).collect();
            if !names.is_empty() {
                map.entry(&capability.as_str(), &names);
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::plugin::{DomChangeNotifierPlugin, OnNewStatePlugin};
    use crawlkit_core::{CrawlerContext, Eventable, StateVertex};

    struct Named(&'static str);
    impl Plugin for Named {
        fn name(&self) -> &str { self.0 }
    }

    struct NewState(&'static str);
    impl Plugin for NewState {
        fn name(&self) -> &str { self.0 }
        fn as_on_new_state(&self) -> Option<&dyn OnNewStatePlugin> { Some(self) }
    }
    impl OnNewStatePlugin for NewState {
        fn on_new_state(&self, _: &mut CrawlerContext, _: &StateVertex) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Strategy(&'static str);
    impl Plugin for Strategy {
        fn name(&self) -> &str { self.0 }
        fn as_dom_change_notifier(&self) -> Option<&dyn DomChangeNotifierPlugin> { Some(self) }
    }
    impl DomChangeNotifierPlugin for Strategy {
        fn is_dom_changed(&self, _: &CrawlerContext, _: &str, _: &Eventable, _: &str) -> anyhow::Result<bool> {
            Ok(true)
        }
    }

    #[test]
    fn test_empty_registry() {
        let reg = PluginRegistry::empty();
        assert!(reg.is_empty());
        assert!(reg.is_degraded());
        assert_eq!(reg.len(), 0);
        assert!(reg.installed_names().is_empty());
        for &capability in Capability::all() {
            assert!(reg.plugins_for(capability).is_empty());
            assert!(!reg.has_capability(capability));
        }
    }

    #[test]
    fn test_default_is_empty() {
        let reg = PluginRegistry::default();
        assert!(reg.is_empty());
    }

    #[test]
    fn test_unrouted_plugin_is_listed_not_registered() {
        let sink = Arc::new(RecordingDiagnostics::new());
        let reg = PluginRegistry::build_with(
            vec![Arc::new(Named("idle")), Arc::new(NewState("states"))],
            sink.clone(),
        )
        .unwrap();

        assert_eq!(reg.unrouted(), ["idle".to_string()]);
        assert_eq!(reg.installed_names().into_iter().collect::<Vec<_>>(), vec!["states"]);
        assert!(!reg.is_degraded());
        assert!(sink.contains(&Diagnostic::UnroutablePlugins {
            plugins: vec!["idle".into()]
        }));
    }

    #[test]
    fn test_second_strategy_is_rejected() {
        let err = PluginRegistry::build(vec![
            Arc::new(Strategy("first")),
            Arc::new(NewState("states")),
            Arc::new(Strategy("second")),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::TooManyDomChangeStrategies {
                plugins: vec!["first".into(), "second".into()]
            }
        );
    }

    #[test]
    fn test_same_instance_twice_is_registered_twice() {
        let plugin: Arc<dyn Plugin> = Arc::new(NewState("twice"));
        let reg = PluginRegistry::build(vec![plugin.clone(), plugin]).unwrap();
        assert_eq!(reg.plugins_for(Capability::OnNewState).len(), 2);
        assert_eq!(reg.installed_names().len(), 1);
    }

    #[test]
    fn test_debug_lists_capabilities_with_plugins() {
        let reg = PluginRegistry::build(vec![Arc::new(NewState("states"))]).unwrap();
        let debug = format!("{reg:?}");
        assert!(debug.contains("on_new_state"));
        assert!(debug.contains("states"));
        assert!(!debug.contains("post_crawling"));
    }
}
