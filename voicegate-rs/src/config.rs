use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub telephony: TelephonyConfig,
    pub voice: VoiceConfig,
    pub redemption: RedemptionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Externally reachable base URL (scheme + host). When unset, callback
    /// and audio URLs are derived from the incoming request's Host header.
    pub public_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub database_url: String,
    pub seed_path: String,
    pub audio_dir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelephonyConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VoiceConfig {
    /// Language tag passed to the provider's speech synthesis.
    pub language: String,
    /// Number of DTMF digits gathered on the inbound call.
    pub gather_digits: u32,
    /// Seconds to wait for caller input.
    pub gather_timeout_secs: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedemptionConfig {
    /// When true, the fulfillment call records the use before any audio is
    /// played and withholds the audio if the quota is already exhausted.
    /// When false, audio plays unconditionally and a failed consume is only
    /// logged.
    pub consume_before_play: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::GateError::Config(e.to_string()))?;

        toml::from_str(&content)
            .map_err(|e| crate::error::GateError::Config(e.to_string()))
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig {
                listen_addr: "0.0.0.0:5000".to_string(),
                public_url: None,
            },
            storage: StorageConfig {
                database_url: "sqlite://voicegate.db".to_string(),
                seed_path: "serial_codes.json".to_string(),
                audio_dir: "audio".to_string(),
            },
            telephony: TelephonyConfig {
                account_sid: None,
                auth_token: None,
                from_number: None,
                api_base: "https://api.twilio.com".to_string(),
            },
            voice: VoiceConfig {
                language: "ja-JP".to_string(),
                gather_digits: 4,
                gather_timeout_secs: 10,
            },
            redemption: RedemptionConfig {
                consume_before_play: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    /// Environment variables win over the config file, matching how the
    /// service is deployed (platform-injected database URL and provider
    /// credentials).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.storage.database_url = url;
        }
        if let Ok(sid) = std::env::var("TWILIO_ACCOUNT_SID") {
            self.telephony.account_sid = Some(sid);
        }
        if let Ok(token) = std::env::var("TWILIO_AUTH_TOKEN") {
            self.telephony.auth_token = Some(token);
        }
        if let Ok(number) = std::env::var("TWILIO_PHONE_NUMBER") {
            self.telephony.from_number = Some(number);
        }
    }
}
