//! Configuration model for a rapman publish target.
//!
//! A [`Rapman`] is deserialized once from a YAML, TOML or JSON document, validated,
//! and then consumed by the plan writer. Nothing mutates it afterwards.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::condition::Condition;
use crate::error::{ConfigError, RapmanError, Result};
use crate::permissions::PolicyOverrides;

/// Directory name reserved for image definitions inside the artifact root.
pub const IMAGE_DIR: &str = "docker-file";

/// Remote registry repository that test images are staged into.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RapmanRepo {
    #[serde(rename = "github_repo", default)]
    pub git_repo: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl RapmanRepo {
    /// Names of the fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.username.is_empty() {
            missing.push("username");
        }
        if self.password.is_empty() {
            missing.push("password");
        }
        if self.git_repo.is_empty() {
            missing.push("github_repo");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// A single named test.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedTest {
    #[serde(default)]
    pub command: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    /// Per-test sandbox policy overrides.
    #[serde(default, skip_serializing_if = "PolicyOverrides::is_empty")]
    pub permissions: PolicyOverrides,
}

/// Tests in declaration order.
pub type TestSet = Vec<NamedTest>;

/// Publish target: the aggregate root of a configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rapman {
    #[serde(rename = "target_repo", default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<RapmanRepo>,

    #[serde(default)]
    pub tests: TestSet,

    #[serde(rename = "docker_image", default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,

    #[serde(rename = "base_image", default)]
    pub base_image_name: String,

    #[serde(rename = "build_script", default)]
    pub script: Vec<String>,

    #[serde(rename = "build_environment", default)]
    pub env: Vec<String>,

    #[serde(rename = "when", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl Rapman {
    /// Load and validate a configuration file. The format follows the
    /// extension: `.yml`/`.yaml`, `.toml` or `.json`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RapmanError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        debug!(path = %path.display(), format = %ext, "loading configuration");
        match ext.as_str() {
            "yml" | "yaml" => Self::from_yaml_str(&text),
            "toml" => Self::from_toml_str(&text),
            "json" => Self::from_json_str(&text),
            other => Err(ConfigError::UnsupportedFormat(other.to_string()).into()),
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(text).map_err(|e| RapmanError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the mandatory base image and test-name rules.
    ///
    /// Partial repository credentials are not rejected here; the plan writer
    /// reports them in the build script and skips staging.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.base_image_name.trim().is_empty() {
            return Err(ConfigError::MissingBaseImage);
        }

        let mut seen = HashSet::new();
        for (index, test) in self.tests.iter().enumerate() {
            if test.name.is_empty() {
                return Err(ConfigError::EmptyTestName { index });
            }
            if !is_path_safe(&test.name) {
                return Err(ConfigError::UnsafeTestName {
                    name: test.name.clone(),
                });
            }
            if !seen.insert(test.name.as_str()) {
                return Err(ConfigError::DuplicateTestName {
                    name: test.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// The configured run-gating condition, unevaluated.
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Tests that will contribute commands to the plan.
    pub fn enabled_tests(&self) -> impl Iterator<Item = &NamedTest> {
        self.tests.iter().filter(|t| t.enabled)
    }
}

/// ASCII letters, digits, `.`, `_` and `-` only: safe both as a path
/// component and inside a double-quoted shell word.
pub(crate) fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn is_path_safe(name: &str) -> bool {
    is_plain_name(name) && name != "." && name != ".." && name != IMAGE_DIR
}
