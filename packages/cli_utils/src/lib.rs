#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal output for the `road_severity` binary.
//!
//! [`init_logger`] routes `log` records through `indicatif-log-bridge` so
//! stage messages print above the training bar instead of through it.
//! [`TrainingProgress`] renders forest training as a per-tree bar.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use road_severity_accident_models::progress::ProgressCallback;

pub use indicatif::MultiProgress;

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg}";
const TREES_TEMPLATE: &str = "  {msg} {wide_bar:.cyan/dim} {pos}/{len} trees [{elapsed}<{eta}]";

/// Forest training progress drawn with `indicatif`.
///
/// Spins with a message until the tree count arrives through
/// [`ProgressCallback::set_total`], then counts trees. The final message
/// carries the wall time since that point.
pub struct TrainingProgress {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl TrainingProgress {
    /// Adds a spinner showing `message` to `multi`.
    #[must_use]
    pub fn new(multi: &MultiProgress, message: &str) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::with_template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_message(message.to_string());

        Self {
            bar,
            started: Mutex::new(None),
        }
    }

    fn elapsed(&self) -> Option<Duration> {
        self.started
            .lock()
            .ok()
            .and_then(|started| started.map(|t| t.elapsed()))
    }
}

impl ProgressCallback for TrainingProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.reset();
        self.bar.set_style(
            ProgressStyle::with_template(TREES_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        let msg = match self.elapsed() {
            Some(elapsed) => format!("{msg} in {:.1}s", elapsed.as_secs_f64()),
            None => msg,
        };
        self.bar.finish_with_message(msg);
    }
}

/// Installs `pretty_env_logger` behind `indicatif-log-bridge`.
///
/// Logs at `info` unless `RUST_LOG` says otherwise. Returns the
/// [`MultiProgress`] every bar must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // Fails if a logger is already installed.
    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}
