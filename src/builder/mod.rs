//! Multi-platform build and push via `docker buildx`.
//!
//! The heavy lifting (cross-compilation, emulation, manifest assembly) is
//! owned by the external tooling; this module prepares it (daemon preflight,
//! binfmt registration, a dedicated builder instance) and drives one
//! `buildx build --push` invocation carrying the resolved tags and labels.
//! A failure on any platform aborts the whole manifest push.

use crate::cli::RuntimeConfig;
use crate::error::{BuildError, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

/// Name of the dedicated buildx builder instance
pub const BUILDER_NAME: &str = "container-release-builder";

/// Image used to register binfmt handlers for foreign architectures
pub const BINFMT_IMAGE: &str = "tonistiigi/binfmt";

/// Timeout for the docker daemon availability check
pub const DOCKER_INFO_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for emulation and builder setup commands
pub const SETUP_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for the multi-platform build and push (1 hour)
///
/// Emulated builds are slow; an arm64 build under QEMU routinely takes many
/// times its native duration.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(3600);

/// Platform-specific Docker startup instructions
#[cfg(target_os = "macos")]
const DOCKER_START_HELP: &str = "Start Docker Desktop from Applications or Spotlight";

#[cfg(target_os = "linux")]
const DOCKER_START_HELP: &str = "Start Docker daemon: sudo systemctl start docker";

#[cfg(target_os = "windows")]
const DOCKER_START_HELP: &str = "Start Docker Desktop from the Start menu";

/// Everything one build-and-push invocation needs
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Build context root
    pub context: PathBuf,
    /// Build-definition file path
    pub dockerfile: PathBuf,
    /// Target platforms, each `os/arch`
    pub platforms: Vec<String>,
    /// Fully qualified `image:tag` strings to push under
    pub tags: Vec<String>,
    /// Label key/value pairs applied to every image
    pub labels: BTreeMap<String, String>,
    /// Push the result (false leaves the manifest in the builder cache)
    pub push: bool,
}

impl BuildRequest {
    /// The argv handed to `docker`, excluding the program name.
    ///
    /// Kept separate from execution so dry runs and tests can inspect the
    /// exact invocation.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![
            "buildx".to_string(),
            "build".to_string(),
            "--file".to_string(),
            self.dockerfile.display().to_string(),
            "--platform".to_string(),
            self.platforms.join(","),
        ];
        for tag in &self.tags {
            argv.push("--tag".to_string());
            argv.push(tag.clone());
        }
        for (key, value) in &self.labels {
            argv.push("--label".to_string());
            argv.push(format!("{key}={value}"));
        }
        if self.push {
            argv.push("--push".to_string());
        }
        argv.push(self.context.display().to_string());
        argv
    }
}

/// Checks that docker is installed and the daemon is responding.
pub async fn check_docker_available() -> Result<()> {
    let status_result = timeout(
        DOCKER_INFO_TIMEOUT,
        Command::new("docker")
            .arg("info")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status(),
    )
    .await;

    match status_result {
        // Timeout occurred
        Err(_) => Err(BuildError::DockerUnavailable {
            reason: format!(
                "daemon check timed out after {} seconds. {}",
                DOCKER_INFO_TIMEOUT.as_secs(),
                DOCKER_START_HELP
            ),
        }
        .into()),

        // Command succeeded
        Ok(Ok(status)) if status.success() => Ok(()),

        // Docker command exists but daemon isn't responding
        Ok(Ok(status)) => Err(BuildError::DockerUnavailable {
            reason: format!(
                "daemon is not responding (exit code {}). {}",
                status.code().unwrap_or(-1),
                DOCKER_START_HELP
            ),
        }
        .into()),

        // Docker command not found
        Ok(Err(e)) => Err(BuildError::DockerUnavailable {
            reason: format!(
                "docker command not found: {e}. Install from https://docs.docker.com/get-docker/"
            ),
        }
        .into()),
    }
}

/// The platform string of the machine we are running on
pub fn host_platform() -> String {
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    };
    format!("{}/{}", std::env::consts::OS, arch)
}

/// True when any requested platform differs from the host and therefore
/// needs binfmt/QEMU emulation.
pub fn needs_emulation(platforms: &[String]) -> bool {
    let host = host_platform();
    platforms.iter().any(|platform| platform != &host)
}

/// Registers binfmt handlers for foreign architectures.
///
/// Runs the privileged binfmt installer image. Skipped by the caller when
/// every requested platform matches the host.
pub async fn ensure_emulation(runtime_config: &RuntimeConfig) -> Result<()> {
    runtime_config.progress("Registering QEMU binfmt handlers...");

    let output = timeout(
        SETUP_TIMEOUT,
        Command::new("docker")
            .args(["run", "--privileged", "--rm", BINFMT_IMAGE, "--install", "all"])
            .output(),
    )
    .await
    .map_err(|_| BuildError::EmulationSetupFailed {
        reason: format!(
            "binfmt registration timed out after {} seconds",
            SETUP_TIMEOUT.as_secs()
        ),
    })?
    .map_err(|e| BuildError::EmulationSetupFailed {
        reason: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(BuildError::EmulationSetupFailed { reason: stderr }.into());
    }

    runtime_config.verbose_println("binfmt handlers registered");
    Ok(())
}

/// Ensures the dedicated buildx builder instance exists and is selected.
pub async fn ensure_builder(runtime_config: &RuntimeConfig) -> Result<()> {
    let inspect = timeout(
        SETUP_TIMEOUT,
        Command::new("docker")
            .args(["buildx", "inspect", BUILDER_NAME])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status(),
    )
    .await
    .map_err(|_| builder_setup_error("buildx inspect timed out"))?
    .map_err(|e| builder_setup_error(&e.to_string()))?;

    let args: &[&str] = if inspect.success() {
        runtime_config.verbose_println(&format!("Using existing builder '{BUILDER_NAME}'"));
        &["buildx", "use", BUILDER_NAME]
    } else {
        runtime_config.progress(&format!("Creating builder instance '{BUILDER_NAME}'..."));
        &[
            "buildx",
            "create",
            "--name",
            BUILDER_NAME,
            "--driver",
            "docker-container",
            "--use",
        ]
    };

    let output = timeout(SETUP_TIMEOUT, Command::new("docker").args(args).output())
        .await
        .map_err(|_| builder_setup_error("builder setup timed out"))?
        .map_err(|e| builder_setup_error(&e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(builder_setup_error(&stderr).into());
    }

    Ok(())
}

fn builder_setup_error(reason: &str) -> BuildError {
    BuildError::BuilderSetupFailed {
        name: BUILDER_NAME.to_string(),
        reason: reason.to_string(),
    }
}

/// Runs the multi-platform build and push.
///
/// One `docker buildx build` invocation produces one image per platform,
/// combines them into a single multi-platform manifest, and pushes every
/// resolved tag. Build output is streamed line by line; on timeout the child
/// is killed and reaped before the error is returned.
pub async fn build_and_push(request: &BuildRequest, runtime_config: &RuntimeConfig) -> Result<()> {
    let argv = request.argv();
    log::debug!("docker {}", argv.join(" "));

    let mut command = Command::new("docker");
    command.args(&argv);

    let status = run_streamed(&mut command, BUILD_TIMEOUT, runtime_config).await?;

    if !status.success() {
        return Err(BuildError::BuildFailed {
            exit_code: status.code().unwrap_or(-1),
        }
        .into());
    }

    Ok(())
}

/// Spawns a command, streams its stdout line by line, and waits for exit,
/// all under one deadline.
///
/// The deadline covers the streaming phase: a child that stalls while
/// keeping stdout open (no output, no EOF) hits the timeout the same way a
/// child that never exits does. On expiry the child is killed and reaped
/// before the error is returned.
async fn run_streamed(
    command: &mut Command,
    deadline: Duration,
    runtime_config: &RuntimeConfig,
) -> Result<std::process::ExitStatus> {
    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| BuildError::DockerUnavailable {
            reason: e.to_string(),
        })?;

    let waited = timeout(deadline, async {
        if let Some(stdout) = child.stdout.take() {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();

            while let Ok(Some(line)) = lines.next_line().await {
                runtime_config.indent(&line);
            }
        }
        child.wait().await
    })
    .await;

    match waited {
        Ok(Ok(status)) => Ok(status),
        Ok(Err(e)) => Err(BuildError::BuildFailed {
            exit_code: e.raw_os_error().unwrap_or(-1),
        }
        .into()),
        Err(_elapsed) => {
            runtime_config.warning_println("Build timed out, terminating process...");

            if let Err(e) = child.kill().await {
                log::warn!("failed to kill buildx process: {e}");
            }

            // Reap the child so no zombie is left behind
            let _ = timeout(Duration::from_secs(10), child.wait()).await;

            Err(BuildError::Timeout {
                minutes: deadline.as_secs() / 60,
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BuildRequest {
        BuildRequest {
            context: PathBuf::from("."),
            dockerfile: PathBuf::from(".docker/prod.Dockerfile"),
            platforms: vec!["linux/amd64".to_string(), "linux/arm64".to_string()],
            tags: vec!["greenbone/gvm-tools:v1.2.3".to_string()],
            labels: [(
                "org.opencontainers.image.vendor".to_string(),
                "Greenbone".to_string(),
            )]
            .into_iter()
            .collect(),
            push: true,
        }
    }

    #[test]
    fn argv_carries_every_resolved_tag_and_label() {
        let mut request = request();
        request.tags.push("greenbone/gvm-tools:latest".to_string());
        let argv = request.argv();

        assert_eq!(argv[0], "buildx");
        assert_eq!(argv[1], "build");
        assert_eq!(
            argv.iter().filter(|a| a.as_str() == "--tag").count(),
            2
        );
        assert!(argv.contains(&"greenbone/gvm-tools:v1.2.3".to_string()));
        assert!(argv.contains(&"greenbone/gvm-tools:latest".to_string()));
        assert!(argv.contains(&"org.opencontainers.image.vendor=Greenbone".to_string()));
        // context is the last argument
        assert_eq!(argv.last().map(String::as_str), Some("."));
    }

    #[test]
    fn platforms_are_joined_into_one_flag() {
        let argv = request().argv();
        let idx = argv.iter().position(|a| a == "--platform").unwrap();
        assert_eq!(argv[idx + 1], "linux/amd64,linux/arm64");
    }

    #[test]
    fn push_flag_tracks_the_request() {
        assert!(request().argv().contains(&"--push".to_string()));

        let mut no_push = request();
        no_push.push = false;
        assert!(!no_push.argv().contains(&"--push".to_string()));
    }

    #[test]
    fn host_platform_is_os_slash_arch() {
        let host = host_platform();
        let parts: Vec<&str> = host.split('/').collect();
        assert_eq!(parts.len(), 2);
        assert!(!parts[0].is_empty() && !parts[1].is_empty());
    }

    #[tokio::test]
    async fn deadline_covers_a_stalled_child_with_open_stdout() {
        // Emits one line, then sleeps holding stdout open - no EOF, no exit
        let mut command = Command::new("sh");
        command.args(["-c", "echo building; sleep 30"]);

        let runtime_config = RuntimeConfig::new(false, true);
        let result = run_streamed(&mut command, Duration::from_millis(200), &runtime_config).await;

        match result {
            Err(crate::error::PipelineError::Build(BuildError::Timeout { .. })) => {}
            other => panic!("expected a timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn streamed_child_exit_code_is_reported() {
        let mut command = Command::new("sh");
        command.args(["-c", "exit 0"]);

        let runtime_config = RuntimeConfig::new(false, true);
        let status = run_streamed(&mut command, Duration::from_secs(10), &runtime_config)
            .await
            .expect("child should run to completion");
        assert!(status.success());
    }

    #[test]
    fn emulation_needed_only_for_foreign_platforms() {
        assert!(!needs_emulation(&[host_platform()]));
        assert!(needs_emulation(&[
            host_platform(),
            "plan9/mips".to_string()
        ]));
    }
}
