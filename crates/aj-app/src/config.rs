use std::env;
use std::num::{NonZeroU32, NonZeroU64};
use std::path::PathBuf;
use std::time::Duration;
use aj_core::backend::ApiConfig;
use aj_core::PollPolicy;
use crate::error::AppError;

const BASE_URL_VAR: &str = "ARTJOB_API_BASE_URL";
const TOKEN_VAR: &str = "ARTJOB_API_TOKEN";
const DATA_DIR_VAR: &str = "ARTJOB_DATA_DIR";
const POLL_INTERVAL_VAR: &str = "ARTJOB_POLL_INTERVAL_SECS";
const MAX_POLLS_VAR: &str = "ARTJOB_MAX_POLLS";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub data_dir: PathBuf,
    pub poll_policy: PollPolicy,
}

impl AppConfig {
    /// Read settings from the environment, after an optional `.env` file.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let data_dir = lookup(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./outputs"));

        let mut poll_policy = PollPolicy::default();
        if let Some(value) = lookup(POLL_INTERVAL_VAR) {
            let secs = value.trim().parse::<NonZeroU64>().map_err(|_| AppError::InvalidSetting {
                name: POLL_INTERVAL_VAR,
                value: value.clone(),
            })?;
            poll_policy.interval = Duration::from_secs(secs.get());
        }
        if let Some(value) = lookup(MAX_POLLS_VAR) {
            let max = value.trim().parse::<NonZeroU32>().map_err(|_| AppError::InvalidSetting {
                name: MAX_POLLS_VAR,
                value: value.clone(),
            })?;
            poll_policy.max_attempts = Some(max.get());
        }

        Ok(Self {
            base_url: lookup(BASE_URL_VAR).filter(|v| !v.trim().is_empty()),
            token: lookup(TOKEN_VAR),
            data_dir,
            poll_policy,
        })
    }

    /// Connection settings, required only by commands that talk to the API.
    pub fn api(&self) -> Result<ApiConfig, AppError> {
        let base_url = self.base_url.as_deref().ok_or(AppError::MissingSetting(BASE_URL_VAR))?;
        let token = self.token.as_deref().ok_or(AppError::MissingSetting(TOKEN_VAR))?;

        Ok(ApiConfig::new(base_url, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./outputs"));
        assert_eq!(config.poll_policy, PollPolicy::default());
        assert!(matches!(config.api(), Err(AppError::MissingSetting(BASE_URL_VAR))));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            (BASE_URL_VAR, "https://api.test/"),
            (TOKEN_VAR, "secret"),
            (DATA_DIR_VAR, "/tmp/art"),
            (POLL_INTERVAL_VAR, "2"),
            (MAX_POLLS_VAR, "30"),
        ])
        .unwrap();

        assert_eq!(config.poll_policy.interval, Duration::from_secs(2));
        assert_eq!(config.poll_policy.max_attempts, Some(30));
        assert_eq!(config.api().unwrap(), ApiConfig::new("https://api.test", "secret"));
    }

    #[test]
    fn test_bad_interval() {
        let err = config_from(&[(POLL_INTERVAL_VAR, "soon")]).unwrap_err();
        assert!(matches!(err, AppError::InvalidSetting { name: POLL_INTERVAL_VAR, .. }));
    }

    #[test]
    fn test_zero_is_rejected() {
        let err = config_from(&[(POLL_INTERVAL_VAR, "0")]).unwrap_err();
        assert!(matches!(err, AppError::InvalidSetting { name: POLL_INTERVAL_VAR, .. }));

        let err = config_from(&[(MAX_POLLS_VAR, "0")]).unwrap_err();
        assert!(matches!(err, AppError::InvalidSetting { name: MAX_POLLS_VAR, .. }));
    }
}
