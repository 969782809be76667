//! Evaluation context passed to the flag evaluator.

use serde::{Deserialize, Serialize};

/// Context kind used when none is given.
pub const DEFAULT_KIND: &str = "user";

/// Identity against which a flag's targets are matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationContext {
    pub kind: String,
    pub key: String,
    #[serde(default)]
    pub anonymous: bool,
}

impl EvaluationContext {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            kind: DEFAULT_KIND.to_string(),
            key: key.into(),
            anonymous: false,
        }
    }

    /// The fixed anonymous identity every `/get-toggle` request evaluates for.
    pub fn minimal() -> Self {
        Self::new("minimal").anonymous(true)
    }

    pub fn anonymous(mut self, anonymous: bool) -> Self {
        self.anonymous = anonymous;
        self
    }
}
