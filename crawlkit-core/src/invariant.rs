use serde::{Deserialize, Serialize};

/// A condition that must hold in every crawled state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invariant {
    pub description: String,
    pub condition: String,
}

impl Invariant {
    pub fn new(description: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            condition: condition.into(),
        }
    }
}

impl std::fmt::Display for Invariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description, self.condition)
    }
}
