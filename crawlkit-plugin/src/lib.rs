//! Lifecycle plugin orchestration.
//!
//! A [`PluginRegistry`] classifies the plugins of a crawl by [`Capability`]
//! once, and a [`PluginBus`] dispatches every lifecycle event to the plugins
//! registered for it, in registration order, isolating each call's failure.

pub mod bus;
pub mod decision;
pub mod diagnostics;
pub mod error;
pub mod plugin;
pub mod registry;

pub use bus::PluginBus;
pub use decision::default_dom_comparison;
pub use diagnostics::{
    DecisionSource, Diagnostic, DiagnosticsSink, FanoutDiagnostics, RecordingDiagnostics,
    TracingDiagnostics,
};
pub use error::PluginFailure;
pub use plugin::{
    Capability, DomChangeNotifierPlugin, OnBrowserCreatedPlugin, OnFireEventFailedPlugin,
    OnInvariantViolationPlugin, OnNewStatePlugin, OnRevisitStatePlugin, OnUrlLoadPlugin, Plugin,
    PostCrawlingPlugin, PreStateCrawlingPlugin, ProxyServerPlugin,
};
pub use registry::PluginRegistry;
