use serde::{Deserialize, Serialize};

/// Outcome of validating a piece of configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationKind {
    Ok,
    Warning,
    Error,
}

impl ValidationKind {
    pub fn is_error(&self) -> bool {
        matches!(self, ValidationKind::Error)
    }
}
