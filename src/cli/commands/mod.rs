//! Command execution coordinating the pipeline operations.

// Submodules
mod check;
mod resolve;
mod run;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

use check::execute_check;
use resolve::execute_resolve;
use run::execute_run;

/// Execute the main command based on parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    // Validate arguments
    if let Err(validation_error) = args.validate() {
        // Create output for validation errors (never quiet)
        let output = super::OutputManager::new(false, false);
        output.error(&format!("Invalid arguments: {}", validation_error));
        return Ok(2);
    }

    let config = RuntimeConfig::from(&args);

    match &args.command {
        Command::Run { .. } => {
            // Run returns its own exit code on success
            match execute_run(&args, &config).await {
                Ok(exit_code) => Ok(exit_code),
                Err(e) => {
                    config.error_println(&format!("Command 'run' failed: {}", e));
                    show_suggestions(&config, &e);
                    Ok(1)
                }
            }
        }
        Command::Resolve { .. } => {
            // No success banner: stdout carries the machine-readable payload
            match execute_resolve(&args, &config).await {
                Ok(()) => Ok(0),
                Err(e) => {
                    config.error_println(&format!("Command 'resolve' failed: {}", e));
                    show_suggestions(&config, &e);
                    Ok(1)
                }
            }
        }
        Command::Check => match execute_check(&args, &config).await {
            Ok(()) => {
                if !config.is_quiet() {
                    config.success_println("Command 'check' completed successfully");
                }
                Ok(0)
            }
            Err(e) => {
                config.error_println(&format!("Command 'check' failed: {}", e));
                show_suggestions(&config, &e);
                Ok(1)
            }
        },
    }
}

fn show_suggestions(config: &RuntimeConfig, error: &crate::error::PipelineError) {
    let suggestions = error.recovery_suggestions();
    if !suggestions.is_empty() {
        config.println("\n💡 Recovery suggestions:");
        for suggestion in suggestions {
            config.println(&format!("  • {}", suggestion));
        }
    }
}
