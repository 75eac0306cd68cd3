//! Platform identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A billing platform whose usage API we can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// OpenAI organization usage/costs API.
    OpenAi,
}

impl Platform {
    /// Stable lowercase identifier used in config keys and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::OpenAi => "openai",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::OpenAi => "OpenAI",
        }
    }

    /// All known platforms, in display order.
    pub fn all() -> &'static [Platform] {
        &[Platform::OpenAi]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Platform::OpenAi),
            other => Err(CoreError::PlatformNotFound(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_roundtrip() {
        for platform in Platform::all() {
            let parsed: Platform = platform.as_str().parse().unwrap();
            assert_eq!(parsed, *platform);
        }
    }

    #[test]
    fn test_platform_parse_case_insensitive() {
        assert_eq!("OpenAI".parse::<Platform>().unwrap(), Platform::OpenAi);
    }

    #[test]
    fn test_platform_parse_unknown() {
        assert!("acme".parse::<Platform>().is_err());
    }
}
