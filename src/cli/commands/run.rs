//! Run command implementation: the full linear pipeline.
//!
//! Phases: trigger detection, tag/label resolution, docker preflight,
//! registry login, emulation/builder setup, build-and-push. Every failure is
//! fatal; there are no retries and no partial success.

use crate::builder::{
    self, BuildRequest, build_and_push, check_docker_available, ensure_builder, ensure_emulation,
    needs_emulation,
};
use crate::cli::{Args, Command, RuntimeConfig};
use crate::config::PipelineConfig;
use crate::error::{ConfigError, PipelineError, Result, TagError};
use crate::registry::{self, RegistryCredentials};
use crate::tags;
use crate::trigger::TriggerEvent;
use std::time::Instant;

/// Execute the run command, returning the process exit code
pub(super) async fn execute_run(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Run {
        event,
        git_ref,
        default_branch,
        dry_run,
    } = &args.command
    else {
        unreachable!("execute_run called with non-Run command");
    };

    let started = Instant::now();
    config.section("Container release pipeline");

    // ===== PHASE 1: CONFIGURATION + TRIGGER =====
    let mut pipeline = PipelineConfig::load(args.config.as_deref())?;
    if let Some(branch) = default_branch {
        pipeline.default_branch = branch.clone();
    }

    let event = TriggerEvent::detect(event.as_deref(), git_ref.as_deref())?;
    config.println(&format!("🔔 Trigger: {}", event.describe()));

    // ===== PHASE 2: TAG/LABEL RESOLUTION =====
    let reference = tags::resolve(&event, &pipeline)?;
    if reference.is_empty() {
        return Err(TagError::EmptyTagSet {
            git_ref: event.git_ref().to_string(),
        }
        .into());
    }

    config.success_println(&format!("✓ Resolved tags: {}", reference.tags.join(", ")));
    if config.is_verbose() {
        for (key, value) in &reference.labels {
            config.verbose_println(&format!("label {key}={value}"));
        }
    }

    let request = BuildRequest {
        context: pipeline.context.clone(),
        dockerfile: pipeline.dockerfile_path(),
        platforms: pipeline.platforms.clone(),
        tags: reference.qualified_tags(),
        labels: reference.labels.clone(),
        push: true,
    };

    if *dry_run {
        config.println("🔎 Dry run - printing the build invocation only");
        config.indent(&format!("docker {}", request.argv().join(" ")));
        config.indent(&format!(
            "(after: docker login {} as ${})",
            pipeline.registry, pipeline.credentials.username_var
        ));
        config.success_println("✓ Dry run complete, nothing was built or pushed");
        return Ok(0);
    }

    // ===== PHASE 3: DOCKER PREFLIGHT =====
    check_docker_available().await?;
    config.verbose_println("Docker daemon is responding");

    let dockerfile = pipeline.dockerfile_path();
    if !dockerfile.exists() {
        return Err(PipelineError::Config(ConfigError::MissingDockerfile {
            path: dockerfile,
        }));
    }

    // ===== PHASE 4: REGISTRY LOGIN =====
    config.progress(&format!("Authenticating to {}...", pipeline.registry));
    let credentials = RegistryCredentials::from_env(&pipeline.credentials)?;
    registry::login(&pipeline.registry, &credentials).await?;
    config.success_println(&format!(
        "✓ Authenticated to {} as {}",
        pipeline.registry,
        credentials.username()
    ));

    // Everything past this point runs under an authenticated session, so the
    // best-effort logout must cover every exit, setup failures included.
    let build_result = async {
        // ===== PHASE 5: EMULATION + BUILDER SETUP =====
        if needs_emulation(&pipeline.platforms) {
            ensure_emulation(config).await?;
        } else {
            config.verbose_println("All target platforms are native, skipping emulation setup");
        }
        ensure_builder(config).await?;
        config.success_println(&format!("✓ Builder '{}' ready", builder::BUILDER_NAME));

        // ===== PHASE 6: BUILD + PUSH =====
        config.println(&format!(
            "🔨 Building {} for {}...",
            pipeline.image,
            pipeline.platforms.join(", ")
        ));

        build_and_push(&request, config).await
    }
    .await;

    registry::logout(&pipeline.registry).await;
    build_result?;

    config.success_println(&format!(
        "✓ Pushed {} tag(s) across {} platform(s) in {:.1}s",
        request.tags.len(),
        pipeline.platforms.len(),
        started.elapsed().as_secs_f64()
    ));
    for tag in &request.tags {
        config.indent(tag);
    }

    Ok(0)
}
