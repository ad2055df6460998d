use thiserror::Error;

/// Errors raised while assembling the plugin configuration of a crawl.
///
/// These are precondition violations: a registry that fails with one of
/// these is never handed to the crawler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error(
        "Only one or none dom_change_notifier plugin can be specified, got {}: {}",
        plugins.len(),
        plugins.join(", ")
    )]
    TooManyDomChangeStrategies { plugins: Vec<String> },
}

impl ConfigurationError {
    /// Names of the plugins that caused the error.
    pub fn plugins(&self) -> &[String] {
        match self {
            ConfigurationError::TooManyDomChangeStrategies { plugins } => plugins,
        }
    }
}
