//! Pipeline configuration.
//!
//! `PipelineConfig` carries everything the original workflow hardcoded: the
//! image name, the build context and Dockerfile path, the target platform
//! set, the default branch, the version-tag filter, the fixed label set, and
//! the names of the environment variables holding registry credentials.
//!
//! The config is loaded from an optional TOML file; every field has a default
//! matching the workflow it replaces, so a bare `run` works with no file at
//! all.

use crate::error::{ConfigError, PipelineError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Fixed OCI label set carried by every pushed image.
///
/// The three labels are independent of the trigger: vendor, documentation
/// URL, and base-image reference.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ImageLabels {
    /// Value for `org.opencontainers.image.vendor`
    pub vendor: String,
    /// Value for `org.opencontainers.image.documentation`
    pub documentation: String,
    /// Value for `org.opencontainers.image.base.name`
    pub base_image: String,
}

impl Default for ImageLabels {
    fn default() -> Self {
        Self {
            vendor: "Greenbone".to_string(),
            documentation: "https://greenbone.github.io/docs/".to_string(),
            base_image: "debian:stable-slim".to_string(),
        }
    }
}

impl ImageLabels {
    /// Expand into `(key, value)` pairs under the OCI annotation keys
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            (
                "org.opencontainers.image.vendor".to_string(),
                self.vendor.clone(),
            ),
            (
                "org.opencontainers.image.documentation".to_string(),
                self.documentation.clone(),
            ),
            (
                "org.opencontainers.image.base.name".to_string(),
                self.base_image.clone(),
            ),
        ]
    }
}

/// Names of the environment variables holding registry credentials.
///
/// Only the variable names live in the config; the values are read from the
/// environment at login time and never written anywhere.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialSource {
    /// Variable holding the registry username
    pub username_var: String,
    /// Variable holding the registry access token
    pub token_var: String,
}

impl Default for CredentialSource {
    fn default() -> Self {
        Self {
            username_var: "REGISTRY_USERNAME".to_string(),
            token_var: "REGISTRY_TOKEN".to_string(),
        }
    }
}

/// Complete configuration for one pipeline run
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Image repository the tags attach to, e.g. `greenbone/gvm-tools`
    pub image: String,
    /// Registry host to authenticate against
    pub registry: String,
    /// Build context root
    pub context: PathBuf,
    /// Build-definition file, relative to the context
    pub dockerfile: PathBuf,
    /// Target platforms, each `os/arch`
    pub platforms: Vec<String>,
    /// Branch whose pushes publish `latest`
    pub default_branch: String,
    /// Glob a tag must match to be treated as a version tag
    pub tag_pattern: String,
    /// Fixed label set applied to every image
    pub labels: ImageLabels,
    /// Where registry credentials come from
    pub credentials: CredentialSource,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            image: "greenbone/gvm-tools".to_string(),
            registry: "docker.io".to_string(),
            context: PathBuf::from("."),
            dockerfile: PathBuf::from(".docker/prod.Dockerfile"),
            platforms: vec!["linux/amd64".to_string(), "linux/arm64".to_string()],
            default_branch: "main".to_string(),
            tag_pattern: "v*".to_string(),
            labels: ImageLabels::default(),
            credentials: CredentialSource::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from an optional TOML file.
    ///
    /// With no path, the built-in defaults are used. A path that does not
    /// exist is an error rather than a silent fallback.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(PipelineError::Config(ConfigError::FileNotFound {
                        path: path.to_path_buf(),
                    }));
                }
                let raw = std::fs::read_to_string(path)?;
                toml::from_str(&raw)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    ///
    /// The Dockerfile's existence is deliberately not checked here: `resolve`
    /// and dry runs never touch the file system, so that check belongs to the
    /// build step.
    pub fn validate(&self) -> Result<()> {
        validate_image_name(&self.image)?;

        if self.platforms.is_empty() {
            return Err(PipelineError::Config(ConfigError::NoPlatforms));
        }
        for platform in &self.platforms {
            // os/arch, with an optional variant (linux/arm/v7)
            let parts: Vec<&str> = platform.split('/').collect();
            if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.is_empty()) {
                return Err(PipelineError::Config(ConfigError::InvalidPlatform {
                    platform: platform.clone(),
                }));
            }
        }

        if let Err(e) = glob::Pattern::new(&self.tag_pattern) {
            return Err(PipelineError::Config(ConfigError::InvalidTagPattern {
                pattern: self.tag_pattern.clone(),
                reason: e.to_string(),
            }));
        }

        Ok(())
    }

    /// Absolute or context-relative path of the build-definition file
    pub fn dockerfile_path(&self) -> PathBuf {
        if self.dockerfile.is_absolute() {
            self.dockerfile.clone()
        } else {
            self.context.join(&self.dockerfile)
        }
    }
}

fn validate_image_name(name: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(PipelineError::Config(ConfigError::InvalidImageName {
            name: name.to_string(),
            reason: reason.to_string(),
        }))
    };

    if name.is_empty() {
        return reject("name is empty");
    }
    if name.chars().any(|c| c.is_whitespace()) {
        return reject("name contains whitespace");
    }
    if name.chars().any(|c| c.is_ascii_uppercase()) {
        return reject("repository names must be lowercase");
    }
    if name.contains(':') {
        return reject("name must not carry a tag; tags are resolved per run");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_workflow() {
        let config = PipelineConfig::default();
        assert_eq!(config.image, "greenbone/gvm-tools");
        assert_eq!(config.platforms, vec!["linux/amd64", "linux/arm64"]);
        assert_eq!(config.default_branch, "main");
        assert_eq!(config.tag_pattern, "v*");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn labels_expand_to_three_oci_pairs() {
        let pairs = ImageLabels::default().to_pairs();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].0, "org.opencontainers.image.vendor");
        assert_eq!(pairs[1].0, "org.opencontainers.image.documentation");
        assert_eq!(pairs[2].0, "org.opencontainers.image.base.name");
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: PipelineConfig = toml::from_str(
            r#"
            image = "example/tool"
            default_branch = "master"

            [labels]
            vendor = "Example Org"
            "#,
        )
        .expect("config should parse");
        assert_eq!(config.image, "example/tool");
        assert_eq!(config.default_branch, "master");
        assert_eq!(config.labels.vendor, "Example Org");
        // untouched fields keep their defaults
        assert_eq!(config.registry, "docker.io");
        assert_eq!(config.labels.base_image, "debian:stable-slim");
    }

    #[test]
    fn rejects_bad_image_names() {
        for bad in ["", "Has/Upper", "with space", "img:tag"] {
            let config = PipelineConfig {
                image: bad.to_string(),
                ..PipelineConfig::default()
            };
            assert!(config.validate().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rejects_empty_or_malformed_platforms() {
        let mut config = PipelineConfig {
            platforms: vec![],
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        config.platforms = vec!["linux".to_string()];
        assert!(config.validate().is_err());

        config.platforms = vec!["linux//".to_string()];
        assert!(config.validate().is_err());

        // variant form is allowed
        config.platforms = vec!["linux/arm/v7".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn dockerfile_path_joins_the_context() {
        let config = PipelineConfig {
            context: PathBuf::from("/work"),
            ..PipelineConfig::default()
        };
        assert_eq!(
            config.dockerfile_path(),
            PathBuf::from("/work/.docker/prod.Dockerfile")
        );
    }
}
