//! Spinners for long-running commands.
//!
//! Spinners draw to stderr and are hidden entirely in JSON mode so stdout
//! stays machine-readable.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create a spinner for indeterminate operations.
///
/// # Example
/// ```
/// use ada::cli::output::progress::create_spinner;
///
/// let spinner = create_spinner(true);
/// spinner.set_message("Planning...");
/// spinner.finish_with_message("Done");
/// ```
pub fn create_spinner(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_draw_target(ProgressDrawTarget::stderr());
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(SPINNER_CHARS),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Extension trait for `ProgressBar` to add common utility methods
pub trait ProgressBarExt {
    /// Finish with a success message (green checkmark)
    fn finish_success(&self, message: impl Into<String>);

    /// Finish with an error message (red X)
    fn finish_error(&self, message: impl Into<String>);

    /// Finish with a warning message (yellow !)
    fn finish_warning(&self, message: impl Into<String>);
}

impl ProgressBarExt for ProgressBar {
    fn finish_success(&self, message: impl Into<String>) {
        self.finish_with_message(format!("✓ {}", message.into()));
    }

    fn finish_error(&self, message: impl Into<String>) {
        self.finish_with_message(format!("✗ {}", message.into()));
    }

    fn finish_warning(&self, message: impl Into<String>) {
        self.finish_with_message(format!("! {}", message.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_spinner() {
        let spinner = create_spinner(true);
        assert!(spinner.is_hidden());
        spinner.finish_success("done");
        assert!(spinner.is_finished());
    }

    #[test]
    fn test_finish_messages() {
        let spinner = ProgressBar::hidden();
        spinner.finish_warning("partial");
        assert_eq!(spinner.message(), "! partial");
        let spinner = ProgressBar::hidden();
        spinner.finish_error("failed");
        assert_eq!(spinner.message(), "✗ failed");
    }
}
