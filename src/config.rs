use std::time::Duration;

use tracing::warn;

use crate::pipeline::analysis::thresholds::{MAX_UPLOAD_BYTES, MIN_REMOTE_CONFIDENCE};

/// Application-level constants
pub const APP_NAME: &str = "Leafcheck";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_REMOTE_URL: &str = "LEAFCHECK_REMOTE_URL";
pub const ENV_REMOTE_TIMEOUT_SECS: &str = "LEAFCHECK_REMOTE_TIMEOUT_SECS";
pub const ENV_READ_TIMEOUT_SECS: &str = "LEAFCHECK_READ_TIMEOUT_SECS";
pub const ENV_MIN_REMOTE_CONFIDENCE: &str = "LEAFCHECK_MIN_REMOTE_CONFIDENCE";

const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "leafcheck_lib=info,leafcheck=info"
}

/// Runtime settings for one orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisConfig {
    /// Remote classification endpoint. `None` means local analysis only.
    pub remote_url: Option<String>,
    /// Upper bound on the whole remote call, connect included.
    pub remote_timeout: Duration,
    /// Upper bound on reading the image from disk.
    pub read_timeout: Duration,
    /// Remote results at or below this confidence are discarded.
    pub min_remote_confidence: f32,
    pub max_upload_bytes: u64,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            min_remote_confidence: MIN_REMOTE_CONFIDENCE,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl DiagnosisConfig {
    /// Defaults overridden by `LEAFCHECK_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    ///
    /// Unparseable or out-of-range values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_REMOTE_URL) {
            let url = url.trim();
            if !url.is_empty() {
                config.remote_url = Some(url.to_string());
            }
        }

        if let Some(secs) = parse_secs(&lookup, ENV_REMOTE_TIMEOUT_SECS) {
            config.remote_timeout = secs;
        }
        if let Some(secs) = parse_secs(&lookup, ENV_READ_TIMEOUT_SECS) {
            config.read_timeout = secs;
        }

        if let Some(raw) = lookup(ENV_MIN_REMOTE_CONFIDENCE) {
            match raw.trim().parse::<f32>() {
                Ok(v) if (0.0..=1.0).contains(&v) => config.min_remote_confidence = v,
                _ => warn!(
                    key = ENV_MIN_REMOTE_CONFIDENCE,
                    value = %raw,
                    "Ignoring invalid confidence, expected 0..=1"
                ),
            }
        }

        config
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            warn!(key, value = %raw, "Ignoring invalid timeout, expected positive seconds");
            None
        }
    }
}
