//! Trigger event detection.
//!
//! The pipeline runs in response to one of three repository events: a push to
//! a branch, a push of a tag, or a manual dispatch. Outside CI the event is
//! supplied with `--event`/`--git-ref`; inside CI it is read from the
//! `GITHUB_EVENT_NAME` and `GITHUB_REF` variables the runner exports.
//! Explicit flags always win over the environment.

use crate::error::{Result, TriggerError};
use std::fmt;

/// Environment variable carrying the event name in CI
pub const EVENT_NAME_VAR: &str = "GITHUB_EVENT_NAME";

/// Environment variable carrying the fully qualified git ref in CI
pub const GIT_REF_VAR: &str = "GITHUB_REF";

/// A parsed git ref.
///
/// Only fully qualified refs are classified; anything else is carried through
/// as [`GitRef::Other`] so a manual dispatch of an arbitrary ref stays
/// representable (it resolves to an empty tag set downstream).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitRef {
    /// `refs/heads/<branch>`
    Branch(String),
    /// `refs/tags/<tag>`
    Tag(String),
    /// Any other non-empty ref
    Other(String),
}

impl GitRef {
    /// Parse a ref string
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TriggerError::MissingRef.into());
        }
        if let Some(branch) = raw.strip_prefix("refs/heads/") {
            Ok(GitRef::Branch(branch.to_string()))
        } else if let Some(tag) = raw.strip_prefix("refs/tags/") {
            Ok(GitRef::Tag(tag.to_string()))
        } else {
            Ok(GitRef::Other(raw.to_string()))
        }
    }
}

impl fmt::Display for GitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitRef::Branch(branch) => write!(f, "refs/heads/{branch}"),
            GitRef::Tag(tag) => write!(f, "refs/tags/{tag}"),
            GitRef::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// The repository activity that caused this pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Push to a branch
    BranchPush {
        /// Branch name without the `refs/heads/` prefix
        branch: String,
    },
    /// Push of a tag
    TagPush {
        /// Tag name without the `refs/tags/` prefix
        tag: String,
    },
    /// Manual invocation against an arbitrary ref
    ManualDispatch {
        /// Ref the dispatch ran against
        git_ref: GitRef,
    },
}

impl TriggerEvent {
    /// Build an event from an event name and a ref string.
    ///
    /// Pure function of its inputs; the env/flag plumbing lives in
    /// [`TriggerEvent::detect`].
    pub fn from_parts(event_name: &str, git_ref: &str) -> Result<Self> {
        let git_ref = GitRef::parse(git_ref)?;
        match event_name {
            "push" => match git_ref {
                GitRef::Branch(branch) => Ok(TriggerEvent::BranchPush { branch }),
                GitRef::Tag(tag) => Ok(TriggerEvent::TagPush { tag }),
                GitRef::Other(raw) => {
                    Err(TriggerError::UnrecognizedPushRef { git_ref: raw }.into())
                }
            },
            // Accept the CI event name and a short alias for manual use
            "workflow_dispatch" | "dispatch" => Ok(TriggerEvent::ManualDispatch { git_ref }),
            other => Err(TriggerError::UnknownEvent {
                name: other.to_string(),
            }
            .into()),
        }
    }

    /// Detect the trigger event from explicit flags, falling back to the CI
    /// environment for whichever of the two inputs was not supplied.
    pub fn detect(event_flag: Option<&str>, ref_flag: Option<&str>) -> Result<Self> {
        let event_name = match event_flag {
            Some(name) => name.to_string(),
            None => std::env::var(EVENT_NAME_VAR).map_err(|_| TriggerError::MissingEvent)?,
        };
        let git_ref = match ref_flag {
            Some(git_ref) => git_ref.to_string(),
            None => std::env::var(GIT_REF_VAR).map_err(|_| TriggerError::MissingRef)?,
        };
        log::debug!("detected trigger: event={event_name} ref={git_ref}");
        Self::from_parts(&event_name, &git_ref)
    }

    /// The ref this event ran against
    pub fn git_ref(&self) -> GitRef {
        match self {
            TriggerEvent::BranchPush { branch } => GitRef::Branch(branch.clone()),
            TriggerEvent::TagPush { tag } => GitRef::Tag(tag.clone()),
            TriggerEvent::ManualDispatch { git_ref } => git_ref.clone(),
        }
    }

    /// Short human-readable description for pipeline narration
    pub fn describe(&self) -> String {
        match self {
            TriggerEvent::BranchPush { branch } => format!("push to branch '{branch}'"),
            TriggerEvent::TagPush { tag } => format!("push of tag '{tag}'"),
            TriggerEvent::ManualDispatch { git_ref } => {
                format!("manual dispatch on '{git_ref}'")
            }
        }
    }
}

/// Check whether a tag name is a version tag.
///
/// The tag must match the configured glob (default `v*`) and the remainder
/// after the `v` prefix must parse as a semantic version, so `verbose` never
/// qualifies while `v1.2.3` does.
pub fn is_version_tag(tag: &str, pattern: &glob::Pattern) -> bool {
    if !pattern.matches(tag) {
        return false;
    }
    semver::Version::parse(tag.strip_prefix('v').unwrap_or(tag)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_qualified_refs() {
        assert_eq!(
            GitRef::parse("refs/heads/main").unwrap(),
            GitRef::Branch("main".to_string())
        );
        assert_eq!(
            GitRef::parse("refs/tags/v1.2.3").unwrap(),
            GitRef::Tag("v1.2.3".to_string())
        );
        assert_eq!(
            GitRef::parse("refs/pull/42/merge").unwrap(),
            GitRef::Other("refs/pull/42/merge".to_string())
        );
        assert!(GitRef::parse("  ").is_err());
    }

    #[test]
    fn push_events_classify_by_ref() {
        assert_eq!(
            TriggerEvent::from_parts("push", "refs/heads/main").unwrap(),
            TriggerEvent::BranchPush {
                branch: "main".to_string()
            }
        );
        assert_eq!(
            TriggerEvent::from_parts("push", "refs/tags/v2.0.0").unwrap(),
            TriggerEvent::TagPush {
                tag: "v2.0.0".to_string()
            }
        );
        // a push must carry a branch or tag ref
        assert!(TriggerEvent::from_parts("push", "refs/pull/1/merge").is_err());
    }

    #[test]
    fn dispatch_accepts_any_ref() {
        let event = TriggerEvent::from_parts("workflow_dispatch", "refs/heads/feature-x").unwrap();
        assert_eq!(
            event,
            TriggerEvent::ManualDispatch {
                git_ref: GitRef::Branch("feature-x".to_string())
            }
        );
        assert!(TriggerEvent::from_parts("dispatch", "refs/tags/v1.0.0").is_ok());
    }

    #[test]
    fn unknown_events_are_rejected() {
        assert!(TriggerEvent::from_parts("pull_request", "refs/heads/main").is_err());
    }

    #[test]
    fn version_tags_need_pattern_and_semver() {
        let pattern = glob::Pattern::new("v*").unwrap();
        assert!(is_version_tag("v1.2.3", &pattern));
        assert!(is_version_tag("v0.0.1-rc.1", &pattern));
        assert!(!is_version_tag("verbose", &pattern));
        assert!(!is_version_tag("1.2.3", &pattern));
        assert!(!is_version_tag("v1.2", &pattern));
    }

    #[test]
    fn ref_round_trips_through_display() {
        for raw in ["refs/heads/main", "refs/tags/v1.0.0", "refs/pull/7/head"] {
            assert_eq!(GitRef::parse(raw).unwrap().to_string(), raw);
        }
    }
}
