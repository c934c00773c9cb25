use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Result};
use log::{info, warn};

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_DATA_DIR: &str = ".gtsf-intake";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub data_dir: PathBuf,
    /// Unset means a submission waits for the backend indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let timeout_secs: Option<u64> = try_load_optional("GTSF_REQUEST_TIMEOUT_SECS")?;

        Ok(Self {
            api_base: try_load("GTSF_API_URL", DEFAULT_API_URL)?,
            data_dir: try_load("GTSF_DATA_DIR", DEFAULT_DATA_DIR)?,
            request_timeout: timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("session.sqlite3")
    }

    pub fn export_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_URL.into(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            request_timeout: None,
        }
    }
}

pub fn debug_enabled() -> bool {
    var("GTSF_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|err| anyhow!("invalid {key} value '{raw}': {err}"))
}

fn try_load_optional<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw.parse().map(Some).map_err(|err| {
            warn!("Invalid {key} value: {err}");
            anyhow!("invalid {key} value '{raw}': {err}")
        }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = Config::default();
        assert_eq!(config.api_base, "http://localhost:8000/api");
        assert_eq!(config.request_timeout, None);
        assert_eq!(
            config.storage_path(),
            PathBuf::from(".gtsf-intake").join("session.sqlite3")
        );
    }

    #[test]
    fn env_values_are_parsed() {
        env::set_var("GTSF_TEST_TIMEOUT", "15");
        env::set_var("GTSF_TEST_BAD_TIMEOUT", "soon");

        assert_eq!(
            try_load_optional::<u64>("GTSF_TEST_TIMEOUT").unwrap(),
            Some(15)
        );
        assert!(try_load_optional::<u64>("GTSF_TEST_BAD_TIMEOUT").is_err());
        assert_eq!(try_load_optional::<u64>("GTSF_TEST_UNSET").unwrap(), None);
        assert_eq!(
            try_load::<String>("GTSF_TEST_UNSET", "fallback").unwrap(),
            "fallback"
        );
    }
}
