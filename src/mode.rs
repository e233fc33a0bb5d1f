use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Process variable carrying the environment designation.
pub const ENV_SIGNAL: &str = "NODE_ENV";

const DEVELOPMENT: &str = "development";
const PRODUCTION: &str = "production";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BuildMode {
    Development,
    #[default]
    Production,
}

impl BuildMode {
    /// Only the exact literal `"development"` opts into a development build.
    /// Anything else, including an absent or empty signal, resolves to
    /// production.
    pub fn resolve(signal: Option<&str>) -> Self {
        match signal {
            Some(DEVELOPMENT) => BuildMode::Development,
            Some(PRODUCTION) | None => BuildMode::Production,
            Some(other) => {
                if !other.is_empty() {
                    warn!(
                        signal = other,
                        "Unrecognized environment designation, building for production"
                    );
                }
                BuildMode::Production
            }
        }
    }

    pub fn from_env() -> Self {
        let signal = std::env::var(ENV_SIGNAL).ok();
        Self::resolve(signal.as_deref())
    }

    pub fn is_development(self) -> bool {
        matches!(self, BuildMode::Development)
    }

    pub fn is_production(self) -> bool {
        !self.is_development()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Development => DEVELOPMENT,
            BuildMode::Production => PRODUCTION,
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::BuildMode;

    #[test]
    fn only_exact_literal_selects_development() {
        assert_eq!(
            BuildMode::resolve(Some("development")),
            BuildMode::Development
        );
        for signal in ["Development", " development", "develop", "dev", "test", ""] {
            assert_eq!(
                BuildMode::resolve(Some(signal)),
                BuildMode::Production,
                "signal {signal:?}"
            );
        }
        assert_eq!(BuildMode::resolve(None), BuildMode::Production);
        assert_eq!(BuildMode::default(), BuildMode::Production);
    }
}
