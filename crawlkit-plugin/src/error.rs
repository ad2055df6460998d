use std::any::Any;
use thiserror::Error;

/// Why a single hook call did not complete normally.
///
/// Never surfaced to the engine: the bus records it and moves on to the
/// next plugin.
#[derive(Error, Debug)]
pub enum PluginFailure {
    #[error("{0:#}")]
    Error(anyhow::Error),

    #[error("panicked: {0}")]
    Panicked(String),
}

impl PluginFailure {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        PluginFailure::Panicked(message)
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, PluginFailure::Panicked(_))
    }
}

impl From<anyhow::Error> for PluginFailure {
    fn from(err: anyhow::Error) -> Self {
        PluginFailure::Error(err)
    }
}
