//! Twilio-backed outbound dialer
//!
//! Places calls through the provider's REST interface. When the call
//! connects, the provider fetches `callback_url` for TwiML to execute.

use super::{OutboundCall, OutboundDialer};
use crate::config::TelephonyConfig;
use crate::error::{GateError, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, warn};

pub struct TwilioDialer {
    http: reqwest::Client,
    api_base: String,
    account_sid: Option<String>,
    auth_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallResource {
    sid: String,
}

impl TwilioDialer {
    pub fn new(
        api_base: String,
        account_sid: Option<String>,
        auth_token: Option<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_base,
            account_sid,
            auth_token,
        }
    }

    pub fn from_config(config: &TelephonyConfig) -> Self {
        Self::new(
            config.api_base.clone(),
            config.account_sid.clone(),
            config.auth_token.clone(),
        )
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (self.account_sid.as_deref(), self.auth_token.as_deref()) {
            (Some(sid), Some(token)) if !sid.is_empty() && !token.is_empty() => Ok((sid, token)),
            _ => {
                error!("Twilio credentials are not configured");
                Err(GateError::ProviderMisconfigured)
            }
        }
    }
}

#[async_trait::async_trait]
impl OutboundDialer for TwilioDialer {
    async fn place_call(&self, call: &OutboundCall) -> Result<String> {
        let (sid, token) = self.credentials()?;

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.api_base.trim_end_matches('/'),
            sid
        );
        let params = [
            ("To", call.to.as_str()),
            ("From", call.from.as_str()),
            ("Url", call.callback_url.as_str()),
        ];

        info!("Placing outbound call to {} via Twilio", call.to);

        let response = self
            .http
            .post(&url)
            .basic_auth(sid, Some(token))
            .form(&params)
            .send()
            .await
            .map_err(|e| GateError::DispatchFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Twilio rejected the call: HTTP {} {}", status, body);
            return Err(GateError::DispatchFailed(format!(
                "provider returned HTTP {status}"
            )));
        }

        let created: CallResource = response
            .json()
            .await
            .map_err(|e| GateError::DispatchFailed(e.to_string()))?;

        info!("Outbound call accepted: {}", created.sid);
        Ok(created.sid)
    }

    fn provider_name(&self) -> &str {
        "twilio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_credentials_is_misconfigured() {
        let dialer = TwilioDialer::new("https://api.twilio.com".to_string(), None, None);

        let call = OutboundCall {
            to: "+819012345678".to_string(),
            from: "+815000000000".to_string(),
            callback_url: "https://voice.example.com/fulfill/1234".to_string(),
        };

        let err = dialer.place_call(&call).await.unwrap_err();
        assert!(matches!(err, GateError::ProviderMisconfigured));
    }

    #[tokio::test]
    async fn test_empty_credentials_is_misconfigured() {
        let dialer = TwilioDialer::new(
            "https://api.twilio.com".to_string(),
            Some(String::new()),
            Some("token".to_string()),
        );

        let call = OutboundCall {
            to: "+819012345678".to_string(),
            from: "+815000000000".to_string(),
            callback_url: "https://voice.example.com/fulfill/1234".to_string(),
        };

        let err = dialer.place_call(&call).await.unwrap_err();
        assert!(matches!(err, GateError::ProviderMisconfigured));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_dispatch_failed() {
        // Discard port on localhost, nothing listens there
        let dialer = TwilioDialer::new(
            "http://127.0.0.1:9".to_string(),
            Some("AC123".to_string()),
            Some("token".to_string()),
        );

        let call = OutboundCall {
            to: "+819012345678".to_string(),
            from: "+815000000000".to_string(),
            callback_url: "https://voice.example.com/fulfill/1234".to_string(),
        };

        let err = dialer.place_call(&call).await.unwrap_err();
        assert!(matches!(err, GateError::DispatchFailed(_)));
    }
}
