//! Build mode selection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a bundle is assembled for local development or for release.
///
/// Production builds drop development dependencies from the output descriptor
/// and treat unapproved licenses as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

impl BuildMode {
    /// Get the mode name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }

    /// Check if this is a production build.
    pub fn is_production(&self) -> bool {
        matches!(self, BuildMode::Production)
    }

    /// Whether development dependencies survive pruning.
    pub fn keeps_dev_dependencies(&self) -> bool {
        !self.is_production()
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(BuildMode::Development),
            "production" | "prod" | "release" => Ok(BuildMode::Production),
            _ => Err(format!(
                "invalid build mode '{}'; expected 'development' or 'production'",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_mode() {
        assert_eq!("production".parse::<BuildMode>().unwrap(), BuildMode::Production);
        assert_eq!("PROD".parse::<BuildMode>().unwrap(), BuildMode::Production);
        assert_eq!("dev".parse::<BuildMode>().unwrap(), BuildMode::Development);
        assert!("staging".parse::<BuildMode>().is_err());
    }

    #[test]
    fn test_default_is_development() {
        let mode = BuildMode::default();
        assert!(!mode.is_production());
        assert!(mode.keeps_dev_dependencies());
    }
}
