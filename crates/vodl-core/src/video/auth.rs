//! Playback credentials handed to a job by the auth collaborator.

use serde::Deserialize;

use crate::error::ValidationError;

/// Opaque credential bundle consumed once per job when building playlist URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VodAuthInfo {
    /// URL-encoded access token.
    pub token: String,
    pub signature: String,
    pub privileged: bool,
    pub sub_only: bool,
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    privileged: bool,
    chansub: Option<ChansubClaims>,
}

#[derive(Debug, Deserialize)]
struct ChansubClaims {
    restricted_bitrates: Option<Vec<String>>,
}

impl VodAuthInfo {
    /// Builds auth info from a raw playback access token (a JSON document) and
    /// its signature.
    ///
    /// A privileged token is always sub-only; otherwise the video is sub-only
    /// when the token restricts any bitrate.
    pub fn from_access_token(value: &str, signature: &str) -> Result<Self, ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("VOD access token is empty"));
        }
        if signature.trim().is_empty() {
            return Err(ValidationError::new("VOD signature is empty"));
        }

        let claims: TokenClaims = serde_json::from_str(value)
            .map_err(|e| ValidationError::new(format!("VOD access token is not valid JSON: {}", e)))?;

        let sub_only = if claims.privileged {
            true
        } else {
            let chansub = claims
                .chansub
                .ok_or_else(|| ValidationError::new("token property 'chansub' is missing"))?;
            let restricted = chansub.restricted_bitrates.ok_or_else(|| {
                ValidationError::new("token property 'chansub -> restricted_bitrates' is missing")
            })?;
            !restricted.is_empty()
        };

        Ok(Self {
            token: url::form_urlencoded::byte_serialize(value.as_bytes()).collect(),
            signature: signature.to_string(),
            privileged: claims.privileged,
            sub_only,
        })
    }

    /// Credentials for public videos that need no token.
    pub fn anonymous() -> Self {
        Self {
            token: String::new(),
            signature: String::new(),
            privileged: false,
            sub_only: false,
        }
    }
}
