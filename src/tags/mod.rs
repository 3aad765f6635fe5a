//! Tag and label resolution.
//!
//! The resolver is the one piece of real logic the pipeline owns: a pure
//! function from (trigger event, configuration) to the tag and label set the
//! build will push. A version-tag push resolves to exactly that tag, a push
//! to the default branch resolves to the literal `latest`, and everything
//! else resolves to the empty set — which the run pipeline treats as a
//! refusal to build, not a silent no-op.

use crate::config::PipelineConfig;
use crate::error::{ConfigError, PipelineError, Result};
use crate::trigger::{GitRef, TriggerEvent, is_version_tag};
use serde::Serialize;
use std::collections::BTreeMap;

/// A resolved image reference: one image name, the tags to push under, and
/// the labels every pushed image carries.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImageReference {
    /// Image repository, e.g. `greenbone/gvm-tools`
    pub image: String,
    /// Resolved tag set (may be empty for refs that publish nothing)
    pub tags: Vec<String>,
    /// Fixed label set, keyed by OCI annotation name
    pub labels: BTreeMap<String, String>,
}

impl ImageReference {
    /// Fully qualified `image:tag` strings, one per resolved tag
    pub fn qualified_tags(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|tag| format!("{}:{}", self.image, tag))
            .collect()
    }

    /// True when resolution produced nothing to push
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Resolve the tag and label set for a trigger event.
///
/// Pure function of its inputs: no I/O, no clock, identical output for
/// identical input. Rules:
///
/// - push of a version tag → exactly that tag
/// - push to the default branch → exactly `latest`
/// - any other ref (including manual dispatch on one) → empty tag set
///
/// A manual dispatch resolves its ref under the same two rules, so
/// dispatching from the default branch or a version tag behaves like the
/// corresponding push.
pub fn resolve(event: &TriggerEvent, config: &PipelineConfig) -> Result<ImageReference> {
    let pattern = glob::Pattern::new(&config.tag_pattern).map_err(|e| {
        PipelineError::Config(ConfigError::InvalidTagPattern {
            pattern: config.tag_pattern.clone(),
            reason: e.to_string(),
        })
    })?;

    let tags = match event.git_ref() {
        GitRef::Tag(tag) if is_version_tag(&tag, &pattern) => vec![tag],
        GitRef::Branch(branch) if branch == config.default_branch => {
            vec!["latest".to_string()]
        }
        _ => Vec::new(),
    };

    Ok(ImageReference {
        image: config.image.clone(),
        tags,
        labels: config.labels.to_pairs().into_iter().collect(),
    })
}
