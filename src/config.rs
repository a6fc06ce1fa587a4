//! Environment-driven configuration helpers and server-level settings.

use rocket::data::{Limits, ToByteUnit};
use rocket::figment::Figment;
use std::env;
use std::time::Duration;

pub(crate) fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn env_string(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

pub(crate) fn env_u16(key: &str, default: u16) -> u16 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_duration_millis(key: &str, default_millis: u64) -> Duration {
    Duration::from_millis(env_u64(key, default_millis))
}

const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
/// Headroom for multipart boundaries and part headers around the file.
const FORM_OVERHEAD_BYTES: u64 = 64 * 1024;

/// HTTP server settings layered on top of Rocket's own configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_upload_bytes: u64,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            max_upload_bytes: env_u64("MAILER_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        }
    }

    pub fn limits(&self) -> Limits {
        Limits::default()
            .limit("file", self.max_upload_bytes.bytes())
            .limit(
                "data-form",
                (self.max_upload_bytes + FORM_OVERHEAD_BYTES).bytes(),
            )
    }

    /// Rocket's default figment with the upload limits applied.
    pub fn figment(&self) -> Figment {
        rocket::Config::figment().merge(("limits", self.limits()))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_cover_file_and_form() {
        let config = ServerConfig {
            max_upload_bytes: 1024,
        };
        let limits = config.limits();
        assert_eq!(limits.get("file"), Some(1024.bytes()));
        assert_eq!(limits.get("data-form"), Some((1024 + FORM_OVERHEAD_BYTES).bytes()));
    }
}
