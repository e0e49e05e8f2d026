//! Terminal output helpers
//!
//! Logs go to stderr through tracing; this is for what a command reports
//! back to the person who ran it.

use console::style;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    /// Errors are shown even in quiet mode
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✖").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    /// Only printed with `--verbose`
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn key_value(&self, key: &str, value: &str, highlight: bool) {
        if !self.quiet {
            let value = if highlight {
                style(value).green().bold()
            } else {
                style(value).white()
            };
            println!("  {:<18} {}", style(key).dim(), value);
        }
    }

    /// One recorded finding: id, gist link, file and suspicious lines
    pub fn finding(&self, internal_id: i64, html_url: &str, file: &str, lines: &[usize]) {
        if self.quiet {
            return;
        }
        let lines = lines.iter().map(usize::to_string).collect::<Vec<_>>().join(", ");
        println!(
            "  {:>6}  {}  {} {}",
            style(internal_id).yellow().bold(),
            style(html_url).underlined(),
            style(file).cyan(),
            style(format!("[lines {lines}]")).dim()
        );
    }

    pub fn blank_line(&self) {
        if !self.quiet {
            println!();
        }
    }
}
