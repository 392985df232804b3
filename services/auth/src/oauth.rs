//! Google identity verification for federated sign-in
//!
//! The client performs the Google sign-in flow and posts the resulting ID
//! token. When a Google client id is configured the token is checked with
//! Google's tokeninfo endpoint; without one the profile sent by the client is
//! trusted as is.

use anyhow::Result;
use serde::Deserialize;
use tracing::info;

const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Google sign-in configuration
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth client id the ID tokens must be issued for
    pub client_id: Option<String>,
    /// Token introspection endpoint
    pub tokeninfo_url: String,
}

impl GoogleConfig {
    /// Create a new GoogleConfig from environment variables
    ///
    /// # Environment Variables
    /// - `GOOGLE_CLIENT_ID`: Expected `aud` of ID tokens (optional)
    /// - `GOOGLE_TOKENINFO_URL`: Tokeninfo endpoint (default: Google's)
    pub fn from_env() -> Self {
        let client_id = std::env::var("GOOGLE_CLIENT_ID")
            .ok()
            .filter(|id| !id.trim().is_empty());
        let tokeninfo_url = std::env::var("GOOGLE_TOKENINFO_URL")
            .unwrap_or_else(|_| DEFAULT_TOKENINFO_URL.to_string());

        Self {
            client_id,
            tokeninfo_url,
        }
    }
}

/// Profile extracted from a verified ID token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Tokeninfo response; Google encodes booleans as strings here
#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    email: Option<String>,
    email_verified: Option<serde_json::Value>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Clone)]
pub struct GoogleVerifier {
    config: GoogleConfig,
    client: reqwest::Client,
}

impl GoogleVerifier {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Whether ID tokens are required and verified
    pub fn is_enforced(&self) -> bool {
        self.config.client_id.is_some()
    }

    /// Verify an ID token and return the identity it asserts
    pub async fn verify_id_token(&self, id_token: &str) -> Result<GoogleIdentity> {
        let client_id = self
            .config
            .client_id
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Google sign-in is not configured"))?;

        let response = self
            .client
            .get(&self.config.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Google rejected the ID token: {}",
                response.status()
            ));
        }

        let info: TokenInfo = response.json().await?;
        let identity = check_token_info(info, client_id)?;
        info!("Verified Google identity for {}", identity.email);
        Ok(identity)
    }
}

fn check_token_info(info: TokenInfo, client_id: &str) -> Result<GoogleIdentity> {
    if info.aud != client_id {
        return Err(anyhow::anyhow!("ID token was issued for another client"));
    }

    let verified = match &info.email_verified {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => s == "true",
        _ => false,
    };
    if !verified {
        return Err(anyhow::anyhow!("Google account email is not verified"));
    }

    let email = info
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| anyhow::anyhow!("ID token carries no email"))?;

    Ok(GoogleIdentity {
        email,
        name: info.name,
        picture: info.picture,
    })
}
