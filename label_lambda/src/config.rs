use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_MAX_LABELS: i32 = 10;
/// Rekognition's limit for images passed inline as bytes.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_DEADLINE_MARGIN_MS: u64 = 500;

const MAX_LABELS_VAR: &str = "LABELS_MAX_RESULTS";
const MAX_IMAGE_BYTES_VAR: &str = "LABELS_MAX_IMAGE_BYTES";
const DEADLINE_MARGIN_VAR: &str = "LABELS_DEADLINE_MARGIN_MS";

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerConfig {
    /// Labels requested from, and kept from, each detection call.
    pub max_labels: i32,
    pub max_image_bytes: usize,
    /// Time reserved before the invocation deadline for reporting.
    pub deadline_margin: Duration,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            max_labels: DEFAULT_MAX_LABELS,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            deadline_margin: Duration::from_millis(DEFAULT_DEADLINE_MARGIN_MS),
        }
    }
}

impl HandlerConfig {
    /// Load configuration from the function's environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_labels = read_u64(&lookup, MAX_LABELS_VAR, 1)?
            .map(|v| {
                i32::try_from(v).map_err(|_| ConfigError::NotANumber {
                    var: MAX_LABELS_VAR,
                    value: v.to_string(),
                })
            })
            .transpose()?
            .unwrap_or(defaults.max_labels);
        let max_image_bytes = read_u64(&lookup, MAX_IMAGE_BYTES_VAR, 1)?
            .map(|v| v as usize)
            .unwrap_or(defaults.max_image_bytes);
        let deadline_margin = read_u64(&lookup, DEADLINE_MARGIN_VAR, 0)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.deadline_margin);

        Ok(Self {
            max_labels,
            max_image_bytes,
            deadline_margin,
        })
    }
}

fn read_u64<F>(lookup: &F, var: &'static str, min: u64) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    let value: u64 = raw.trim().parse().map_err(|_| ConfigError::NotANumber {
        var,
        value: raw.clone(),
    })?;
    if value < min {
        return Err(ConfigError::OutOfRange { var, value, min });
    }
    Ok(Some(value))
}
