// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Factory configuration.
//!
//! Built in code or, with the `config-loaders` feature, loaded from YAML:
//!
//! ```yaml
//! # typewire.yaml
//! encoding: deflate          # none | deflate | lz4
//! carpentry: true            # synthesize records for unknown wire types
//! builtin_serializers: true  # duration, instant, decimal, remote error
//! policy: ALLOW_LIST         # ALLOW_ALL | ALLOW_LIST
//! allow_list:
//!   - demo.Order
//!   - demo.Side
//! ```

use crate::encoding::Encoding;
use crate::policy::{AllowAll, AllowList, TypePolicy};
use std::fmt;
use std::str::FromStr;

/// Which [`TypePolicy`] the factory starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyMode {
    #[default]
    AllowAll,
    AllowList,
}

impl FromStr for PolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "ALLOW_ALL" => Ok(Self::AllowAll),
            "ALLOW_LIST" => Ok(Self::AllowList),
            other => Err(format!("unknown policy '{}'", other)),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, reason: String },
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, reason } => write!(f, "Cannot read config {}: {}", path, reason),
            Self::Parse(reason) => write!(f, "Config parse error: {}", reason),
            Self::Invalid(reason) => write!(f, "Invalid config: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializationConfig {
    /// Transport encoding applied by `serialize`.
    pub encoding: Encoding,
    /// Synthesize stand-ins for wire types with no local definition.
    pub carpentry: bool,
    /// Register the built-in custom serializers.
    pub builtin_serializers: bool,
    pub policy: PolicyMode,
    /// Names permitted under [`PolicyMode::AllowList`].
    pub allow_list: Vec<String>,
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::None,
            carpentry: true,
            builtin_serializers: true,
            policy: PolicyMode::AllowAll,
            allow_list: Vec::new(),
        }
    }
}

impl SerializationConfig {
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_carpentry(mut self, enabled: bool) -> Self {
        self.carpentry = enabled;
        self
    }

    pub fn with_builtin_serializers(mut self, enabled: bool) -> Self {
        self.builtin_serializers = enabled;
        self
    }

    /// Switch to allow-list mode and permit `names`.
    pub fn allow<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy = PolicyMode::AllowList;
        self.allow_list.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.encoding.is_supported() {
            return Err(ConfigError::Invalid(format!(
                "encoding '{}' needs the '{}' feature",
                self.encoding, self.encoding
            )));
        }
        if self.policy == PolicyMode::AllowAll && !self.allow_list.is_empty() {
            log::warn!(
                "[config] allow_list has {} entries but policy is ALLOW_ALL",
                self.allow_list.len()
            );
        }
        Ok(())
    }

    pub fn build_policy(&self) -> Box<dyn TypePolicy> {
        match self.policy {
            PolicyMode::AllowAll => Box::new(AllowAll),
            PolicyMode::AllowList => Box::new(AllowList::new(self.allow_list.iter().cloned())),
        }
    }
}

#[cfg(feature = "config-loaders")]
mod yaml {
    use super::{ConfigError, PolicyMode, SerializationConfig};
    use crate::encoding::Encoding;
    use serde::Deserialize;
    use std::fs;
    use std::path::Path;

    /// Root YAML document structure.
    #[derive(Debug, Deserialize, Default)]
    #[serde(default)]
    pub struct YamlConfigDocument {
        /// none, deflate or lz4
        pub encoding: Option<String>,
        pub carpentry: Option<bool>,
        pub builtin_serializers: Option<bool>,
        /// ALLOW_ALL or ALLOW_LIST
        pub policy: Option<String>,
        pub allow_list: Option<Vec<String>>,
    }

    impl SerializationConfig {
        /// Parse a YAML document; unspecified keys keep their defaults.
        pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
            let doc: YamlConfigDocument =
                serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
            let mut config = SerializationConfig::default();

            if let Some(encoding) = doc.encoding {
                config.encoding = encoding.parse::<Encoding>().map_err(ConfigError::Invalid)?;
            }
            if let Some(carpentry) = doc.carpentry {
                config.carpentry = carpentry;
            }
            if let Some(builtins) = doc.builtin_serializers {
                config.builtin_serializers = builtins;
            }
            if let Some(policy) = doc.policy {
                config.policy = policy.parse::<PolicyMode>().map_err(ConfigError::Invalid)?;
            }
            if let Some(names) = doc.allow_list {
                config.allow_list = names;
            }

            config.validate()?;
            Ok(config)
        }

        pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
            let path = path.as_ref();
            let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            log::debug!("[config] loading {}", path.display());
            Self::from_yaml_str(&content)
        }
    }
}

#[cfg(feature = "config-loaders")]
pub use yaml::YamlConfigDocument;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LocalType, Shape, TypeKey};

    #[test]
    fn test_defaults() {
        let config = SerializationConfig::default();
        assert_eq!(config.encoding, Encoding::None);
        assert!(config.carpentry);
        assert!(config.builtin_serializers);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_mode_parsing() {
        assert_eq!("allow-list".parse::<PolicyMode>(), Ok(PolicyMode::AllowList));
        assert_eq!("ALLOW_ALL".parse::<PolicyMode>(), Ok(PolicyMode::AllowAll));
        assert!("deny".parse::<PolicyMode>().is_err());
    }

    #[test]
    fn test_allow_builds_allow_list() {
        let config = SerializationConfig::default().allow(["demo.Order"]);
        let policy = config.build_policy();
        let order = LocalType::new("demo.Order", TypeKey::Synthetic("demo.Order".into()), Shape::Opaque);
        let other = LocalType::new("demo.Other", TypeKey::Synthetic("demo.Other".into()), Shape::Opaque);
        assert!(policy.is_permitted(&order));
        assert!(!policy.is_permitted(&other));
    }

    #[cfg(not(feature = "lz4"))]
    #[test]
    fn test_lz4_without_feature_is_invalid() {
        let config = SerializationConfig::default().with_encoding(Encoding::Lz4);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
encoding: Deflate
carpentry: false
policy: ALLOW_LIST
allow_list:
  - demo.Order
"#;
        let config = SerializationConfig::from_yaml_str(yaml).expect("parse");
        assert_eq!(config.encoding, Encoding::Deflate);
        assert!(!config.carpentry);
        assert!(config.builtin_serializers);
        assert_eq!(config.policy, PolicyMode::AllowList);
        assert_eq!(config.allow_list, vec!["demo.Order".to_string()]);
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_from_yaml_str_rejects_unknown_encoding() {
        assert!(matches!(
            SerializationConfig::from_yaml_str("encoding: zstd"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SerializationConfig::from_yaml_str("carpentry: [1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }
}
