use crawlkit_core::{CrawlerContext, Eventable, StateVertex};

use crate::bus::PluginBus;
use crate::diagnostics::{DecisionSource, Diagnostic};
use crate::plugin::Capability;

/// The engine's own answer to "did the DOM change": the states differ.
///
/// State equality is the state graph's: stripped DOMs are compared.
#[inline]
pub fn default_dom_comparison(state_before: &StateVertex, state_after: &StateVertex) -> bool {
    state_after != state_before
}

impl PluginBus {
    /// Decide whether firing `event` turned `state_before` into a different
    /// state.
    ///
    /// Asks the installed DomChangeNotifier plugin with both raw DOMs and
    /// returns its answer untouched. Without a strategy, or when it fails,
    /// the states are compared with [`default_dom_comparison`].
    pub fn run_dom_change_notifier(
        &self,
        context: &CrawlerContext,
        state_before: &StateVertex,
        event: &Eventable,
        state_after: &StateVertex,
    ) -> bool {
        let Some(plugin) = self.registry.plugins_for(Capability::DomChangeNotifier).first() else {
            return self.compare_by_default(state_before, state_after);
        };
        let plugin = plugin.as_ref();

        let outcome = self.invoke(plugin, Capability::DomChangeNotifier, || {
            match plugin.as_dom_change_notifier() {
                Some(strategy) => {
                    strategy.is_dom_changed(context, state_before.dom(), event, state_after.dom())
                }
                None => Err(anyhow::anyhow!("plugin does not expose a DOM change strategy")),
            }
        });

        match outcome {
            Ok(changed) => {
                self.diagnostics.record(Diagnostic::DomCompared {
                    changed,
                    source: DecisionSource::Strategy,
                });
                changed
            }
            Err(failure) => {
                self.diagnostics.record(Diagnostic::StrategyFallback {
                    plugin: plugin.name().to_string(),
                    message: failure.to_string(),
                });
                self.compare_by_default(state_before, state_after)
            }
        }
    }

    fn compare_by_default(&self, state_before: &StateVertex, state_after: &StateVertex) -> bool {
        let changed = default_dom_comparison(state_before, state_after);
        self.diagnostics.record(Diagnostic::DomCompared {
            changed,
            source: DecisionSource::Default,
        });
        changed
    }
}
