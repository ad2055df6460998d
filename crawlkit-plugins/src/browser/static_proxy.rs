use crawlkit_core::config::StaticProxyConfig;
use crawlkit_core::ProxyConfiguration;
use crawlkit_plugin::{Plugin, ProxyServerPlugin};

/// Routes every browser through one fixed HTTP proxy.
///
/// ```yaml
/// plugins:
///   proxy:
///     hostname: 127.0.0.1
///     port: 8080
/// ```
#[derive(Debug, Clone)]
pub struct StaticProxyPlugin {
    hostname: String,
    port: u16,
}

impl StaticProxyPlugin {
    pub fn new(hostname: impl Into<String>, port: u16) -> anyhow::Result<Self> {
        let hostname = hostname.into();
        if hostname.trim().is_empty() {
            anyhow::bail!("static-proxy: hostname must not be empty");
        }
        if port == 0 {
            anyhow::bail!("static-proxy: port must not be 0");
        }
        Ok(Self { hostname, port })
    }

    pub fn from_config(config: &StaticProxyConfig) -> anyhow::Result<Self> {
        Self::new(config.hostname.clone(), config.port)
    }
}

impl Plugin for StaticProxyPlugin {
    fn name(&self) -> &str {
        "static-proxy"
    }

    fn as_proxy_server(&self) -> Option<&dyn ProxyServerPlugin> {
        Some(self)
    }
}

impl ProxyServerPlugin for StaticProxyPlugin {
    fn proxy_server(&self, config: &mut ProxyConfiguration) -> anyhow::Result<()> {
        if config.is_enabled() {
            tracing::info!(
                previous = ?config.kind,
                hostname = %self.hostname,
                port = self.port,
                "Overriding configured proxy"
            );
        }
        *config = ProxyConfiguration::manual(self.hostname.clone(), self.port);
        Ok(())
    }
}
