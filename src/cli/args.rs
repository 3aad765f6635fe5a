//! Command line argument parsing and validation.
//!
//! The tool is designed to "just work" inside CI: with no flags, the trigger
//! event comes from the runner's environment and the configuration from the
//! built-in defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Multi-platform container image release pipeline
#[derive(Parser, Debug)]
#[command(
    name = "container_release",
    version,
    about = "Multi-platform container image release pipeline",
    long_about = "Resolve the tag/label set for the triggering event, authenticate to the
registry, and build-and-push a multi-platform container image.

Usage:
  container_release run
  container_release run --dry-run --event push --git-ref refs/tags/v1.2.3
  container_release resolve --event push --git-ref refs/heads/main
  container_release check"
)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML config file (built-in defaults when omitted)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Suppress all non-error output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full pipeline: resolve, authenticate, build, push
    Run {
        /// Trigger event name (push, workflow_dispatch); defaults to GITHUB_EVENT_NAME
        #[arg(long, value_name = "EVENT")]
        event: Option<String>,

        /// Git ref the event ran against; defaults to GITHUB_REF
        #[arg(long, value_name = "REF")]
        git_ref: Option<String>,

        /// Override the configured default branch
        #[arg(long, value_name = "BRANCH")]
        default_branch: Option<String>,

        /// Print the build invocation instead of executing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Resolve the tag/label set and print it as JSON
    Resolve {
        /// Trigger event name (push, workflow_dispatch); defaults to GITHUB_EVENT_NAME
        #[arg(long, value_name = "EVENT")]
        event: Option<String>,

        /// Git ref the event ran against; defaults to GITHUB_REF
        #[arg(long, value_name = "REF")]
        git_ref: Option<String>,

        /// Override the configured default branch
        #[arg(long, value_name = "BRANCH")]
        default_branch: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Preflight: validate config and report docker/buildx/credential status
    Check,
}

impl Command {
    /// Subcommand name for user-facing messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Run { .. } => "run",
            Command::Resolve { .. } => "resolve",
            Command::Check => "check",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.quiet && self.verbose {
            return Err("--quiet and --verbose are mutually exclusive".to_string());
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Create a runtime configuration with explicit output flags
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose, quiet),
        }
    }

    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print verbose message (only with --verbose)
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print progress message
    pub fn progress(&self, message: &str) {
        let _ = self.output.progress(message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        let _ = self.output.section(title);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }

    /// Check if verbose output is enabled
    pub fn is_verbose(&self) -> bool {
        self.output.is_verbose()
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.output.is_quiet()
    }
}
