use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level crawlkit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlkitConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default)]
    pub plugins: PluginSettings,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Plugin subsystem settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Hook calls slower than this are reported. Calls are never interrupted.
    #[serde(default)]
    pub slow_call_threshold_ms: Option<u64>,
    /// Install the built-in lifecycle logger.
    #[serde(default = "default_true")]
    pub lifecycle_log: bool,
    /// Install the built-in crawl statistics collector.
    #[serde(default = "default_true")]
    pub crawl_stats: bool,
    /// Force every browser through a fixed proxy.
    #[serde(default)]
    pub proxy: Option<StaticProxyConfig>,
    /// Replace the default DOM comparison with a normalizing one.
    #[serde(default)]
    pub dom_compare: Option<DomCompareConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaticProxyConfig {
    pub hostname: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomCompareConfig {
    /// Regular expressions whose matches are removed from both DOMs.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default = "default_true")]
    pub collapse_whitespace: bool,
}

/// Observability settings, disabled by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// When false, diagnostics are not counted.
    #[serde(default)]
    pub enabled: bool,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_log_level() -> String { "info".into() }
fn default_true() -> bool { true }

// ── Impls ─────────────────────────────────────────────────────

impl Default for CrawlkitConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Text,
            plugins: PluginSettings::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            slow_call_threshold_ms: None,
            lifecycle_log: true,
            crawl_stats: true,
            proxy: None,
            dom_compare: None,
        }
    }
}

impl PluginSettings {
    pub fn slow_call_threshold(&self) -> Option<Duration> {
        self.slow_call_threshold_ms.map(Duration::from_millis)
    }
}

impl CrawlkitConfig {
    /// Load configuration from YAML file + env overrides.
    ///
    /// Environment keys use the `CRAWLKIT_` prefix and `__` between nested
    /// keys, e.g. `CRAWLKIT_PLUGINS__SLOW_CALL_THRESHOLD_MS=250`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: CrawlkitConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("CRAWLKIT_").split("__"))
            .extract()?;
        Ok(config)
    }
}
