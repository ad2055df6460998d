use serde::{Deserialize, Serialize};

/// Browser flavour backing a crawler worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserKind {
    Chrome,
    ChromeHeadless,
    Firefox,
    Remote,
}

/// Handle to a browser instance owned by the engine's browser pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserHandle {
    pub id: u64,
    pub kind: BrowserKind,
    /// WebDriver endpoint when `kind` is `Remote`.
    #[serde(default)]
    pub remote_url: Option<String>,
}

impl BrowserHandle {
    pub fn new(id: u64, kind: BrowserKind) -> Self {
        Self {
            id,
            kind,
            remote_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyKind {
    #[default]
    Nothing,
    Manual,
    Automatic,
    SystemDefault,
    Pac,
}

/// Proxy settings handed to the browser. ProxyServer plugins rewrite this
/// in place before the first browser is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfiguration {
    #[serde(default)]
    pub kind: ProxyKind,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub port: u16,
}

impl ProxyConfiguration {
    /// No proxy at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// A manually configured `host:port` proxy.
    pub fn manual(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            kind: ProxyKind::Manual,
            hostname: Some(hostname.into()),
            port,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.kind != ProxyKind::Nothing
    }
}
