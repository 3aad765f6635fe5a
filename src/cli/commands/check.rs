//! Check command implementation.
//!
//! Preflight only: validates the configuration and reports the status of
//! docker, buildx, and registry credentials without touching the registry or
//! starting a build. Credential values are never printed, only presence.

use crate::builder::check_docker_available;
use crate::cli::{Args, RuntimeConfig};
use crate::config::PipelineConfig;
use crate::error::{BuildError, Result};
use crate::registry::RegistryCredentials;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as ProcessCommand;
use tokio::time::timeout;

const BUILDX_VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Execute the check command
pub(super) async fn execute_check(args: &Args, config: &RuntimeConfig) -> Result<()> {
    config.section("Preflight checks");

    // Configuration
    let pipeline = PipelineConfig::load(args.config.as_deref())?;
    config.success_println(&format!(
        "✓ Config valid: image {} → {} ({} platform(s))",
        pipeline.image,
        pipeline.registry,
        pipeline.platforms.len()
    ));

    // Build definition (required at build time, advisory here)
    let dockerfile = pipeline.dockerfile_path();
    if dockerfile.exists() {
        config.success_println(&format!("✓ Dockerfile present: {}", dockerfile.display()));
    } else {
        config.warning_println(&format!(
            "Dockerfile not found at {} (required when the build runs)",
            dockerfile.display()
        ));
    }

    // Docker binary and daemon
    let docker_path = which::which("docker").map_err(|e| BuildError::DockerUnavailable {
        reason: format!("docker binary not found on PATH: {e}"),
    })?;
    config.success_println(&format!("✓ Docker binary: {}", docker_path.display()));

    check_docker_available().await?;
    config.success_println("✓ Docker daemon responding");

    // Buildx plugin
    let buildx = timeout(
        BUILDX_VERSION_TIMEOUT,
        ProcessCommand::new("docker")
            .args(["buildx", "version"])
            .stderr(Stdio::null())
            .output(),
    )
    .await
    .map_err(|_| BuildError::BuilderSetupFailed {
        name: "buildx".to_string(),
        reason: "version check timed out".to_string(),
    })?
    .map_err(|e| BuildError::BuilderSetupFailed {
        name: "buildx".to_string(),
        reason: e.to_string(),
    })?;

    if !buildx.status.success() {
        return Err(BuildError::BuilderSetupFailed {
            name: "buildx".to_string(),
            reason: "docker buildx is not installed or not working".to_string(),
        }
        .into());
    }
    let version_line = String::from_utf8_lossy(&buildx.stdout);
    config.success_println(&format!(
        "✓ Buildx available: {}",
        version_line.lines().next().unwrap_or("unknown version")
    ));

    // Credentials: presence only, values are never shown
    let credentials = RegistryCredentials::from_env(&pipeline.credentials)?;
    config.success_println(&format!(
        "✓ Registry credentials present (${} / ${}, user '{}')",
        pipeline.credentials.username_var,
        pipeline.credentials.token_var,
        credentials.username()
    ));

    Ok(())
}
