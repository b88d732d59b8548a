//! Terminal progress for a walk

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::Level;

use gitwalk::walker::{ExtractionSummary, TracingObserver, WalkError, WalkObserver};

/// Spinner that counts repositories while forwarding events to tracing.
///
/// Log lines are written with the spinner suspended so the two do not
/// interleave on stderr. The spinner hides itself when stderr is not a
/// terminal, and when debug logging is on, since per-entity lines are
/// emitted from the walker where the spinner cannot suspend them.
pub struct ProgressObserver {
    spinner: ProgressBar,
    found: AtomicUsize,
    done: AtomicUsize,
    inner: TracingObserver,
}

impl ProgressObserver {
    pub fn new() -> Self {
        let spinner = if show_spinner() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("Discovering repositories...");
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self {
            spinner,
            found: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
            inner: TracingObserver,
        }
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }

    fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let found = self.found.load(Ordering::Relaxed);
        self.spinner.set_message(format!(
            "Ingesting repositories {}/{}",
            style(done).cyan(),
            style(found).cyan()
        ));
    }
}

/// Whether the active log level leaves stderr quiet enough for a spinner
fn show_spinner() -> bool {
    !tracing::enabled!(Level::DEBUG)
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl WalkObserver for ProgressObserver {
    fn repository_found(&self, path: &Path) {
        let found = self.found.fetch_add(1, Ordering::Relaxed) + 1;
        self.spinner
            .set_message(format!("Discovering repositories... {}", style(found).cyan()));
        self.inner.repository_found(path);
    }

    fn extraction_completed(&self, summary: &ExtractionSummary) {
        self.spinner
            .suspend(|| self.inner.extraction_completed(summary));
        self.tick();
    }

    fn extraction_failed(&self, path: &Path, error: &WalkError) {
        self.spinner
            .suspend(|| self.inner.extraction_failed(path, error));
        self.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::subscriber::with_default;

    fn subscriber(level: Level) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::sink)
            .finish()
    }

    #[test]
    fn test_spinner_hidden_at_debug_level() {
        assert!(with_default(subscriber(Level::INFO), show_spinner));
        assert!(!with_default(subscriber(Level::DEBUG), show_spinner));
        assert!(!with_default(subscriber(Level::TRACE), show_spinner));
    }

    #[test]
    fn test_debug_observer_spinner_is_hidden() {
        let observer = with_default(subscriber(Level::DEBUG), ProgressObserver::new);
        assert!(observer.spinner.is_hidden());
        observer.finish();
    }
}
