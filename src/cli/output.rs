//! Colored terminal output for pipeline runs.
//!
//! Every line of narration is a glyph plus a message. The glyph carries the
//! color; the message stays in the default style so streamed build output and
//! status lines read uniformly. All stdout writes go through one buffered
//! emit path and respect quiet mode; errors always reach stderr.

use std::io::Write;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Output manager for the pipeline's terminal narration
#[derive(Debug)]
pub struct OutputManager {
    stdout: BufferWriter,
    verbose: bool,
    quiet: bool,
}

impl Clone for OutputManager {
    fn clone(&self) -> Self {
        Self::new(self.verbose, self.quiet)
    }
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            stdout: BufferWriter::stdout(ColorChoice::Auto),
            verbose,
            quiet,
        }
    }

    /// One colored glyph, then the message in the default style
    fn emit(&self, glyph: &str, color: Color, bold: bool, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut buffer = self.stdout.buffer();
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
        let _ = write!(&mut buffer, "{glyph}");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, " {message}");
        self.stdout.print(&buffer)
    }

    /// Print a success message
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.emit("✓", Color::Green, true, message)
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.emit("⚠", Color::Yellow, true, message)
    }

    /// Print a progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.emit("⋯", Color::Magenta, false, message)
    }

    /// Print a verbose message (only in verbose mode)
    pub fn verbose(&self, message: &str) -> std::io::Result<()> {
        if !self.verbose {
            return Ok(());
        }
        self.emit("→", Color::Blue, false, message)
    }

    /// Print an error message to stderr (always shown, quiet or not)
    pub fn error(&self, message: &str) {
        let stderr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = stderr.buffer();
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
        let _ = write!(&mut buffer, "✗");
        let _ = buffer.reset();
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
        let _ = writeln!(&mut buffer, " {message}");
        let _ = buffer.reset();
        if stderr.print(&buffer).is_err() {
            // Stderr failed - fall back to stdout as last resort
            println!("✗ {message}");
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut buffer = self.stdout.buffer();
        let _ = writeln!(&mut buffer);
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
        let _ = writeln!(&mut buffer, "═══ {title} ═══");
        let _ = buffer.reset();
        self.stdout.print(&buffer)
    }

    /// Print indented text (for sub-items and streamed build output)
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut buffer = self.stdout.buffer();
        let _ = writeln!(&mut buffer, "    {message}");
        self.stdout.print(&buffer)
    }

    /// Print a plain message (respects quiet mode)
    pub fn println(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut buffer = self.stdout.buffer();
        let _ = writeln!(&mut buffer, "{message}");
        self.stdout.print(&buffer)
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_survive_construction_and_clone() {
        let output = OutputManager::new(true, false);
        assert!(output.is_verbose());
        assert!(!output.is_quiet());

        let cloned = output.clone();
        assert!(cloned.is_verbose());
        assert!(!cloned.is_quiet());
    }

    #[test]
    fn quiet_manager_swallows_stdout_without_error() {
        let output = OutputManager::new(false, true);
        assert!(output.success("done").is_ok());
        assert!(output.warn("careful").is_ok());
        assert!(output.progress("working").is_ok());
        assert!(output.section("title").is_ok());
        assert!(output.indent("detail").is_ok());
        assert!(output.println("plain").is_ok());
    }

    #[test]
    fn verbose_output_is_gated() {
        let silent = OutputManager::new(false, false);
        assert!(silent.verbose("hidden").is_ok());
        assert!(!silent.is_verbose());
    }
}
