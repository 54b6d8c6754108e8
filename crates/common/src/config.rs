use serde::Deserialize;

pub const GOOGLE_WEBSUB_HUB: &str = "https://pubsubhubbub.appspot.com/subscribe";
pub const DEFAULT_VERIFY_TOKEN: &str = "asdkpoasdkpaoksdpako";

/// Hubs forget a subscription after its lease (five days for Google's hub),
/// so renew a day early.
pub const DEFAULT_LEASE_RENEW_SECS: i64 = 4 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub redis_url: String,
    pub hub: HubSettings,
    pub resub_batch_size: usize,
    pub lease_renew_secs: i64,
}

/// Everything the WebSub client needs to build a request.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HubSettings {
    pub hub_url: String,
    pub host: String,
    pub verify_token: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("YT_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let redis_url = lookup("YT_REDIS_URL")
            .or_else(|| lookup("REDIS_URL"))
            .ok_or(ConfigError::Missing("REDIS_URL"))?;
        let host = lookup("YT_HOST").ok_or(ConfigError::Missing("YT_HOST"))?;
        let verify_token =
            lookup("YT_VERIFY_TOKEN").unwrap_or_else(|| DEFAULT_VERIFY_TOKEN.to_string());
        let hub_url = lookup("YT_HUB_URL").unwrap_or_else(|| GOOGLE_WEBSUB_HUB.to_string());
        let resub_batch_size = lookup("YT_RESUB_BATCH_SIZE")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        let lease_renew_secs = lookup("YT_LEASE_RENEW_SECS")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_LEASE_RENEW_SECS);

        if verify_token == DEFAULT_VERIFY_TOKEN {
            tracing::warn!("YT_VERIFY_TOKEN is unset, using the placeholder token");
        }

        Ok(Self {
            database_url,
            redis_url,
            hub: HubSettings {
                hub_url,
                host,
                verify_token,
            },
            resub_batch_size,
            lease_renew_secs,
        })
    }
}
