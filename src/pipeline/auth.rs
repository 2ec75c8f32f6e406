//! Service-account authentication for Google Cloud APIs.
//!
//! Implements the OAuth2 JWT-bearer grant: an RS256 assertion signed with the
//! key file's private key is exchanged at `token_uri` for a short-lived access
//! token. Tokens are cached until shortly before they expire so a long-lived
//! recognizer does not log in again for every image.

use crate::error::Notes2PdfError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// OAuth2 scope for Cloud Vision.
pub const VISION_SCOPE: &str = "https://www.googleapis.com/auth/cloud-vision";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertion lifetime; Google caps it at one hour.
const ASSERTION_TTL_SECS: i64 = 3600;

/// Refresh this many seconds before the token actually expires.
const EXPIRY_SKEW_SECS: i64 = 60;

/// The fields of a service-account key file this crate needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_TTL_SECS
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl ServiceAccountKey {
    /// Load and parse a key file.
    pub fn from_file(path: &Path) -> Result<Self, Notes2PdfError> {
        let invalid = |detail: String| Notes2PdfError::InvalidCredentials {
            path: path.to_path_buf(),
            detail,
        };
        let json = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        Self::from_json(&json).map_err(|e| match e {
            Notes2PdfError::InvalidCredentials { detail, .. } => invalid(detail),
            other => other,
        })
    }

    /// Parse a key from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, Notes2PdfError> {
        let key: ServiceAccountKey =
            serde_json::from_str(json).map_err(|e| Notes2PdfError::InvalidCredentials {
                path: PathBuf::new(),
                detail: e.to_string(),
            })?;
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(Notes2PdfError::InvalidCredentials {
                path: PathBuf::new(),
                detail: "client_email and private_key must be set".into(),
            });
        }
        Ok(key)
    }

    /// Build the signed JWT-bearer assertion, issued at `now` (unix seconds).
    pub fn assertion(&self, now: i64) -> Result<String, Notes2PdfError> {
        let claims = Claims {
            iss: &self.client_email,
            scope: VISION_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes()).map_err(|e| {
            Notes2PdfError::Authentication {
                detail: format!("invalid private key: {e}"),
            }
        })?;
        encode(&header, &claims, &key).map_err(|e| Notes2PdfError::Authentication {
            detail: format!("failed to sign assertion: {e}"),
        })
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Hands out access tokens for one service account.
#[derive(Debug)]
pub struct TokenSource {
    key: ServiceAccountKey,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            cached: Mutex::new(None),
        }
    }

    /// Return a valid access token, fetching a new one when needed.
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String, Notes2PdfError> {
        let now = chrono::Utc::now().timestamp();
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at - EXPIRY_SKEW_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let token = self.exchange(client, now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn exchange(
        &self,
        client: &reqwest::Client,
        now: i64,
    ) -> Result<CachedToken, Notes2PdfError> {
        let assertion = self.key.assertion(now)?;
        debug!("Exchanging assertion for {} at {}", self.key.client_email, self.key.token_uri);

        let response = client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| Notes2PdfError::Authentication {
                detail: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Notes2PdfError::Authentication {
                detail: e.to_string(),
            })?;

        parse_token_response(status, &body, now)
    }
}

fn parse_token_response(
    status: reqwest::StatusCode,
    body: &str,
    now: i64,
) -> Result<CachedToken, Notes2PdfError> {
    if !status.is_success() {
        let detail = match serde_json::from_str::<TokenError>(body) {
            Ok(err) => match err.error_description {
                Some(desc) => format!("{}: {}", err.error, desc),
                None => err.error,
            },
            Err(_) => format!("HTTP {status}"),
        };
        return Err(Notes2PdfError::Authentication { detail });
    }

    let token: TokenResponse =
        serde_json::from_str(body).map_err(|e| Notes2PdfError::Authentication {
            detail: format!("unexpected token response: {e}"),
        })?;
    Ok(CachedToken {
        value: token.access_token,
        expires_at: now + token.expires_in,
    })
}
