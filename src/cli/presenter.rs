//! CLI presenter for output formatting

use colored::*;

use crate::application::Signal;
use crate::application::KeyStatus;

/// Presenter for CLI output formatting
pub struct Presenter;

impl Presenter {
    pub fn new() -> Self {
        Self
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print daemon status
    pub fn daemon_status(&self, state: &str) {
        eprintln!("{} {}", "●".cyan(), state);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Render one pipeline signal
    pub fn signal(&self, signal: &Signal) {
        match signal {
            Signal::Log { message, color } => {
                eprintln!("{} {}", "›".dimmed(), tint(message, color.as_deref()));
            }
            Signal::JobStarted { label } => {
                eprintln!("{} {}", "▶".cyan(), label.bold());
            }
            Signal::JobSucceeded {
                label,
                elapsed_secs,
            } => {
                eprintln!(
                    "{} {} {}",
                    "✓".green(),
                    label,
                    format!("({:.2}s)", elapsed_secs).dimmed()
                );
            }
            Signal::JobFailed {
                label,
                kind,
                message,
            } => {
                eprintln!(
                    "{} {} {} {}",
                    "✗".red(),
                    label,
                    format!("[{}]", kind).red(),
                    message
                );
            }
        }
    }

    /// Render a key pool table
    pub fn key_table(&self, provider: &str, keys: &[KeyStatus]) {
        if keys.is_empty() {
            self.warn(&format!("No keys configured for {}", provider));
            return;
        }

        println!("{}", provider.bold());
        for (i, key) in keys.iter().enumerate() {
            let state = if !key.active {
                "inactive".dimmed()
            } else if key.exhausted {
                "cooling down".yellow()
            } else {
                "active".green()
            };
            println!(
                "  {:>2}. {:<16} {:<14} {:<14} {} uses/24h",
                i + 1,
                key.label,
                key.masked,
                state,
                key.uses_24h
            );
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a `#RRGGBB` display hint; anything else leaves the text plain
fn tint(text: &str, color: Option<&str>) -> ColoredString {
    match color.and_then(parse_hex_color) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex_color("#FBB6CE"), Some((0xFB, 0xB6, 0xCE)));
        assert_eq!(parse_hex_color("#ffffff"), Some((255, 255, 255)));
    }

    #[test]
    fn rejects_malformed_colors() {
        assert_eq!(parse_hex_color("FBB6CE"), None);
        assert_eq!(parse_hex_color("#FFF"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
        assert_eq!(parse_hex_color("#ÿÿÿ"), None);
    }
}
