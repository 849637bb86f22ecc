use crate::error::ConfigError;
use log::{info, warn};
use std::{env, path::PathBuf};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://myflixcf.herokuapp.com/";
const DEFAULT_SESSION_DIR: &str = ".myflix";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub session_dir: PathBuf,
    /// Refuse to send authenticated requests without a token. Off by default,
    /// such requests go out with no Authorization header.
    pub require_token: bool,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let api_url = try_load(&lookup, "MYFLIX_API_URL", DEFAULT_API_URL);
        let session_dir = try_load(&lookup, "MYFLIX_SESSION_DIR", DEFAULT_SESSION_DIR);
        let require_token = try_load(&lookup, "MYFLIX_REQUIRE_TOKEN", "false");
        Ok(Self {
            api_url: parse_api_url(&api_url)?,
            session_dir: PathBuf::from(session_dir),
            require_token: parse_bool("MYFLIX_REQUIRE_TOKEN", &require_token)?,
        })
    }

    pub fn with_api_url(mut self, api_url: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_api_url(api_url)?;
        Ok(self)
    }
}

fn try_load<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| {
        info!("{} not set, using default: {}", key, default);
        default.to_owned()
    })
}

/// Paths are joined onto the base, so it has to end in a slash.
pub fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    if raw.ends_with('/') {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("{}/", raw))?)
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => {
            warn!("Invalid {} value: {}", key, value);
            Err(ConfigError::Invalid {
                key,
                value: value.to_owned(),
            })
        }
    }
}
