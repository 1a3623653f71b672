//! Progress display for long-running key operations.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while primes are being searched for
pub struct KeygenProgress {
    bar: ProgressBar,
}

impl KeygenProgress {
    /// Start a spinner for a key of `bits` bits
    #[must_use]
    pub fn new(bits: u64) -> Self {
        let bar = ProgressBar::new_spinner();

        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
            bar.set_style(style);
        }

        bar.set_message(format!("Generating {bits}-bit RSA key pair..."));
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Finish with custom message
    pub fn finish_with_message(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }

    /// Abandon the spinner (for errors)
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

/// Format a duration in human-readable form
///
/// # Example
///
/// ```ignore
/// assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs == 0 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
