//! Resolve command implementation.
//!
//! Runs only the tag/label resolver and prints the resolved image reference
//! as JSON on stdout. The output shape is stable: `image`, `tags`, `labels`,
//! and the fully qualified `references`.

use crate::cli::{Args, Command, RuntimeConfig};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::tags;
use crate::trigger::TriggerEvent;

/// Execute the resolve command
pub(super) async fn execute_resolve(args: &Args, _config: &RuntimeConfig) -> Result<()> {
    let Command::Resolve {
        event,
        git_ref,
        default_branch,
        pretty,
    } = &args.command
    else {
        unreachable!("execute_resolve called with non-Resolve command");
    };

    let mut pipeline = PipelineConfig::load(args.config.as_deref())?;
    if let Some(branch) = default_branch {
        pipeline.default_branch = branch.clone();
    }

    let event = TriggerEvent::detect(event.as_deref(), git_ref.as_deref())?;
    log::debug!("resolving for {}", event.describe());

    let reference = tags::resolve(&event, &pipeline)?;
    let payload = serde_json::json!({
        "image": reference.image,
        "tags": reference.tags,
        "labels": reference.labels,
        "references": reference.qualified_tags(),
    });

    let rendered = if *pretty {
        serde_json::to_string_pretty(&payload)
    } else {
        serde_json::to_string(&payload)
    }
    .map_err(PipelineError::Json)?;

    // Raw stdout, bypassing the output manager: this is the scriptable surface
    println!("{rendered}");
    Ok(())
}
