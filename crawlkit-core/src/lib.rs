pub mod browser;
pub mod config;
pub mod context;
pub mod error;
pub mod invariant;
pub mod session;
pub mod state;

pub use browser::{BrowserHandle, BrowserKind, ProxyConfiguration, ProxyKind};
pub use config::CrawlkitConfig;
pub use context::CrawlerContext;
pub use error::ConfigurationError;
pub use invariant::Invariant;
pub use session::{CrawlSession, ExitStatus};
pub use state::{CandidateElement, EventType, Eventable, StateVertex};
