//! Audio reference resolution
//!
//! A code's `audio_url` is either an absolute URL (used verbatim) or a local
//! file name served from our own `/audio` route. Local names must be
//! resolved to an externally reachable address before they are handed to the
//! voice provider, preserving the scheme the caller's request arrived on.

use crate::error::{GateError, Result};

/// Scheme + host a request was addressed with, after honoring the
/// forwarding proxy's `X-Forwarded-Proto`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBase {
    pub scheme: String,
    pub host: String,
}

impl RequestBase {
    pub fn new(scheme: &str, host: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

/// Builds externally reachable URLs for locally hosted resources.
#[derive(Debug, Clone)]
pub struct AudioResolver {
    public_url: Option<String>,
}

impl AudioResolver {
    /// `public_url` is the configured base; when absent, the per-request
    /// base is used instead.
    pub fn new(public_url: Option<String>) -> Self {
        Self { public_url }
    }

    /// Absolute URL for a server-relative path such as `fulfill/1234`.
    pub fn external_url(&self, path: &str, base: Option<&RequestBase>) -> Result<String> {
        let root = if let Some(url) = &self.public_url {
            url.trim_end_matches('/').to_string()
        } else if let Some(base) = base {
            base.base_url()
        } else {
            return Err(GateError::ResourceResolutionFailed(format!(
                "no public host known for /{path}"
            )));
        };

        Ok(format!("{}/{}", root, path.trim_start_matches('/')))
    }

    /// Resolve a code's audio reference to a playable address.
    pub fn resolve(&self, audio_ref: &str, base: Option<&RequestBase>) -> Result<String> {
        if audio_ref.starts_with("http://") || audio_ref.starts_with("https://") {
            return Ok(audio_ref.to_string());
        }

        self.external_url(&format!("audio/{}", audio_ref.trim_start_matches('/')), base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url_passes_through() {
        let resolver = AudioResolver::new(None);
        let url = resolver
            .resolve("https://cdn.example.com/track.mp3", None)
            .unwrap();
        assert_eq!(url, "https://cdn.example.com/track.mp3");
    }

    #[test]
    fn test_local_name_uses_request_base() {
        let resolver = AudioResolver::new(None);
        let base = RequestBase::new("http", "voice.example.com");

        let url = resolver.resolve("hayase.wav", Some(&base)).unwrap();
        assert_eq!(url, "http://voice.example.com/audio/hayase.wav");
    }

    #[test]
    fn test_secure_proxy_scheme_is_preserved() {
        let resolver = AudioResolver::new(None);
        let base = RequestBase::new("https", "voice.example.com");

        let url = resolver.resolve("hayase.wav", Some(&base)).unwrap();
        assert_eq!(url, "https://voice.example.com/audio/hayase.wav");
    }

    #[test]
    fn test_public_url_wins_over_request_base() {
        let resolver = AudioResolver::new(Some("https://public.example.com/".to_string()));
        let base = RequestBase::new("http", "internal:5000");

        let url = resolver.resolve("hayase.wav", Some(&base)).unwrap();
        assert_eq!(url, "https://public.example.com/audio/hayase.wav");
    }

    #[test]
    fn test_no_host_available_is_an_error() {
        let resolver = AudioResolver::new(None);
        let err = resolver.resolve("hayase.wav", None).unwrap_err();
        assert!(matches!(err, GateError::ResourceResolutionFailed(_)));
    }

    #[test]
    fn test_external_url_for_callbacks() {
        let resolver = AudioResolver::new(None);
        let base = RequestBase::new("https", "voice.example.com");

        let url = resolver.external_url("fulfill/1234", Some(&base)).unwrap();
        assert_eq!(url, "https://voice.example.com/fulfill/1234");
    }
}
