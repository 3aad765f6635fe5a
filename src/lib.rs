//! # Container Release
//!
//! Multi-platform container image release pipeline.
//!
//! This crate reimplements a container build-and-publish workflow as a single
//! binary: it detects the trigger event (push to the default branch, push of
//! a version tag, or manual dispatch), resolves a deterministic tag/label set
//! for the configured image, authenticates against the registry, and drives a
//! multi-platform `docker buildx` build-and-push producing one manifest that
//! covers every target architecture.
//!
//! ## Pipeline shape
//!
//! Control flow is strictly linear: resolve, authenticate, build, push. There
//! are no retries, no partial success, and no state persisted between runs.
//! The exit code is zero on full success and non-zero if any step fails.
//!
//! ## Usage
//!
//! ```bash
//! container_release run                      # full pipeline, trigger from CI env
//! container_release run --dry-run            # print the build invocation only
//! container_release resolve --event push --git-ref refs/tags/v1.2.3
//! container_release check                    # preflight: config, docker, credentials
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod registry;
pub mod tags;
pub mod trigger;

// Re-export main types for public API
pub use builder::BuildRequest;
pub use cli::Args;
pub use config::{ImageLabels, PipelineConfig};
pub use error::{PipelineError, Result};
pub use registry::RegistryCredentials;
pub use tags::ImageReference;
pub use trigger::{GitRef, TriggerEvent};
