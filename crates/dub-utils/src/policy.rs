//! Strictness policy for handling recoverable recipe/config problems.

use serde::{Deserialize, Serialize};

/// How to react to a recoverable problem such as an unknown recipe field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictnessPolicy {
    /// Silently accept and move on.
    Ignore,
    /// Accept, but surface a diagnostic warning.
    #[default]
    Warn,
    /// Treat the problem as fatal.
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_warn() {
        assert_eq!(StrictnessPolicy::default(), StrictnessPolicy::Warn);
    }
}
