#[cfg(feature = "prometheus")]
pub mod metrics;

#[cfg(feature = "prometheus")]
pub mod prometheus_exporter;

#[cfg(feature = "prometheus")]
pub use metrics::PluginMetrics;
