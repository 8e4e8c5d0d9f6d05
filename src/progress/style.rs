//! Status line styling options.
//!
//! A run draws a single status line. By default it is a spinner followed by
//! the rendered throughput message, and it stays on screen once the run is
//! over.
//!
//! ```rust
//! use slurp::progress::ProgressBarOpts;
//!
//! let quiet = ProgressBarOpts::hidden();
//! assert!(!quiet.is_enabled());
//!
//! let plain = ProgressBarOpts::new(Some("{msg}".to_string()), None, true, true);
//! assert!(plain.is_enabled());
//! ```

use indicatif::{ProgressBar, ProgressStyle};

/// Define the options for the status line.
#[derive(Debug, Clone)]
pub struct ProgressBarOpts {
    /// Progress bar template string.
    template: Option<String>,
    /// Spinner tick characters.
    tick_chars: Option<String>,
    /// Enable or disable the status line.
    pub(crate) enabled: bool,
    /// Clear the status line once the run is over.
    pub(crate) clear: bool,
}

impl Default for ProgressBarOpts {
    fn default() -> Self {
        Self {
            template: Some(ProgressBarOpts::TEMPLATE_SPINNER.into()),
            tick_chars: Some(ProgressBarOpts::TICKS_BRAILLE.into()),
            enabled: true,
            clear: false,
        }
    }
}

impl ProgressBarOpts {
    /// Spinner, elapsed time and the rendered message.
    ///
    /// `⠹ [00:00:12] 3/10 files  12.40 MiB  1.02 MiB/s (avg 1.03 MiB/s)`
    pub const TEMPLATE_SPINNER: &'static str = "{spinner:.green} [{elapsed_precise}] {msg}";
    /// Only the rendered message.
    pub const TEMPLATE_PLAIN: &'static str = "{msg}";
    /// Braille dots: `"⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "`.
    pub const TICKS_BRAILLE: &'static str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ";
    /// Rotating line: `"|/-\\ "`.
    pub const TICKS_LINE: &'static str = "|/-\\ ";

    /// Create a new [`ProgressBarOpts`].
    pub fn new(
        template: Option<String>,
        tick_chars: Option<String>,
        enabled: bool,
        clear: bool,
    ) -> Self {
        Self {
            template,
            tick_chars,
            enabled,
            clear,
        }
    }

    /// Create a [`ProgressStyle`] based on the provided options.
    ///
    /// An invalid template falls back to the plain message template.
    pub fn to_progress_style(self) -> ProgressStyle {
        let mut style = ProgressStyle::default_spinner();
        if let Some(template) = self.template {
            style = match ProgressStyle::default_spinner().template(&template) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(%template, error = %e, "Invalid status line template");
                    style
                        .template(Self::TEMPLATE_PLAIN)
                        .unwrap_or_else(|_| ProgressStyle::default_spinner())
                }
            };
        }
        if let Some(tick_chars) = self.tick_chars {
            style = style.tick_chars(&tick_chars);
        }
        style
    }

    /// Create a [`ProgressBar`] based on the provided options.
    pub fn to_progress_bar(self) -> ProgressBar {
        // Return a hidden bar if we disabled it.
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let style = self.to_progress_style();
        ProgressBar::new_spinner().with_style(style)
    }

    /// Set to `true` to clear the status line upon completion.
    pub fn set_clear(&mut self, clear: bool) {
        self.clear = clear;
    }

    /// Whether the status line is drawn at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Create a new [`ProgressBarOpts`] which hides the status line.
    pub fn hidden() -> Self {
        Self {
            enabled: false,
            ..ProgressBarOpts::default()
        }
    }
}
