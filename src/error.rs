//! Error types for the release pipeline.
//!
//! Every failure mode is fatal to the run; the taxonomy exists so the CLI can
//! report which stage failed and suggest a concrete fix.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for all pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Trigger event detection errors
    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),

    /// Tag resolution errors
    #[error("Tag error: {0}")]
    Tag(#[from] TagError),

    /// Registry authentication errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Build and push errors
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file missing at the given path
    #[error("Config file not found at {path}")]
    FileNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// Image name failed validation
    #[error("Invalid image name '{name}': {reason}")]
    InvalidImageName {
        /// Image name as configured
        name: String,
        /// Reason for the rejection
        reason: String,
    },

    /// Platform set is empty
    #[error("No target platforms configured. At least one platform (e.g. linux/amd64) is required.")]
    NoPlatforms,

    /// Platform string is not os/arch
    #[error("Invalid platform '{platform}': expected os/arch, e.g. linux/amd64")]
    InvalidPlatform {
        /// Platform string as configured
        platform: String,
    },

    /// Version-tag glob does not compile
    #[error("Invalid tag pattern '{pattern}': {reason}")]
    InvalidTagPattern {
        /// Pattern as configured
        pattern: String,
        /// Reason for the rejection
        reason: String,
    },

    /// Build-definition file missing
    #[error("Dockerfile not found at {path}")]
    MissingDockerfile {
        /// Path that was checked
        path: PathBuf,
    },
}

/// Trigger event detection errors
#[derive(Error, Debug)]
pub enum TriggerError {
    /// Event name is not one the pipeline responds to
    #[error("Unknown trigger event '{name}'. Expected 'push' or 'workflow_dispatch'.")]
    UnknownEvent {
        /// Event name as supplied
        name: String,
    },

    /// No git ref available from flags or environment
    #[error("No git ref available. Pass --git-ref or set GITHUB_REF.")]
    MissingRef,

    /// No event name available from flags or environment
    #[error("No trigger event available. Pass --event or set GITHUB_EVENT_NAME.")]
    MissingEvent,

    /// Push event carried a ref that is neither a branch nor a tag
    #[error("Push event with unrecognized ref '{git_ref}': expected refs/heads/* or refs/tags/*")]
    UnrecognizedPushRef {
        /// Ref as supplied
        git_ref: String,
    },
}

/// Tag resolution errors
#[derive(Error, Debug)]
pub enum TagError {
    /// Resolution produced no tags, so there is nothing to push
    #[error("Ref '{git_ref}' resolves to an empty tag set; refusing to build with nothing to push")]
    EmptyTagSet {
        /// Ref that was resolved
        git_ref: String,
    },
}

/// Registry authentication errors
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Credential env var not set
    #[error("Registry credential not found: environment variable '{variable}' is not set")]
    MissingCredential {
        /// Name of the missing variable
        variable: String,
    },

    /// docker login rejected the credentials
    #[error("Login to '{registry}' failed: {reason}")]
    LoginFailed {
        /// Registry host
        registry: String,
        /// Reason reported by the docker CLI
        reason: String,
    },
}

/// Build and push errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// Docker daemon unavailable or docker not installed
    #[error("Docker is not available: {reason}")]
    DockerUnavailable {
        /// Diagnostic detail
        reason: String,
    },

    /// binfmt/QEMU registration failed
    #[error("Emulation setup failed: {reason}")]
    EmulationSetupFailed {
        /// Reason reported by the docker CLI
        reason: String,
    },

    /// buildx builder instance could not be created or selected
    #[error("Builder '{name}' setup failed: {reason}")]
    BuilderSetupFailed {
        /// Builder instance name
        name: String,
        /// Reason reported by the docker CLI
        reason: String,
    },

    /// buildx build exited non-zero
    #[error("Multi-platform build failed with exit code {exit_code}")]
    BuildFailed {
        /// Exit code of the buildx process
        exit_code: i32,
    },

    /// Build exceeded its timeout and was killed
    #[error("Build timed out after {minutes} minutes and was terminated")]
    Timeout {
        /// Timeout in minutes
        minutes: u64,
    },
}

impl PipelineError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            PipelineError::Registry(RegistryError::MissingCredential { variable }) => vec![
                format!("Export the credential: export {}=...", variable),
                "Registry credentials are read from the environment, never from the config file"
                    .to_string(),
            ],
            PipelineError::Registry(RegistryError::LoginFailed { registry, .. }) => vec![
                "Verify the username and access token are current".to_string(),
                format!("Test manually: docker login {}", registry),
            ],
            PipelineError::Build(BuildError::DockerUnavailable { .. }) => vec![
                "Ensure the Docker daemon is running: docker info".to_string(),
                "Install from https://docs.docker.com/get-docker/ if missing".to_string(),
            ],
            PipelineError::Tag(TagError::EmptyTagSet { .. }) => vec![
                "Run from the default branch or a version tag (vX.Y.Z)".to_string(),
                "Override the ref explicitly: --git-ref refs/tags/v1.2.3".to_string(),
            ],
            PipelineError::Trigger(TriggerError::MissingRef | TriggerError::MissingEvent) => vec![
                "Pass --event and --git-ref when running outside CI".to_string(),
            ],
            PipelineError::Config(ConfigError::MissingDockerfile { path }) => vec![
                format!("Create the build definition at {}", path.display()),
                "Or point the config's `dockerfile` key at the right file".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
