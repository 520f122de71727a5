//! A single pinned dependency: a concrete version, a local path, or a
//! repository reference at a specific revision.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pin {
    Version(String),
    Path { path: String },
    Repository { repository: String, version: String },
}

impl Pin {
    pub fn version(version: impl Into<String>) -> Self {
        Pin::Version(version.into())
    }

    pub fn path(path: impl Into<String>) -> Self {
        Pin::Path { path: path.into() }
    }

    pub fn repository(repository: impl Into<String>, version: impl Into<String>) -> Self {
        Pin::Repository { repository: repository.into(), version: version.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_all_three_pin_shapes() {
        for pin in [
            Pin::version("1.0.0"),
            Pin::path("../vibe-d"),
            Pin::repository("git+https://example.com/vibe-d", "abc123"),
        ] {
            let json = serde_json::to_string(&pin).unwrap();
            let parsed: Pin = serde_json::from_str(&json).unwrap();
            assert_eq!(pin, parsed);
        }
    }
}
