use super::{endpoint, ClientError};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::{Debug, Formatter};
use url::Url;

/// A bearer token, valid at the time it was handed out.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    expires_in: Option<u64>,
}

impl AccessToken {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self {
            token: token.into(),
            expires_in: None,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Seconds until the token expires, as reported by the identity provider.
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"***")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Hands out a currently valid token.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch_token(&self) -> Result<AccessToken, ClientError>;
}

/// The OAuth grant used to acquire a token.
#[derive(Clone, PartialEq, Eq)]
pub enum Grant {
    /// Resource owner password credentials.
    Password { username: String, password: String },
    /// Exchange a long lived refresh token.
    RefreshToken(String),
}

impl Grant {
    fn form(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::Password { username, password } => vec![
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
            ],
            Self::RefreshToken(token) => {
                vec![("grant_type", "refresh_token"), ("refresh_token", token)]
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Password { .. } => "password",
            Self::RefreshToken(_) => "refresh_token",
        }
    }
}

impl Debug for Grant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Self::RefreshToken(_) => f.debug_tuple("RefreshToken").field(&"***").finish(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Fetch tokens from a UAA instance.
pub struct UaaTokenFetcher {
    client: reqwest::Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    grant: Grant,
}

impl UaaTokenFetcher {
    pub fn new(
        client: reqwest::Client,
        uaa_url: &Url,
        client_id: String,
        client_secret: String,
        grant: Grant,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client,
            token_url: endpoint(uaa_url, "/oauth/token")?,
            client_id,
            client_secret,
            grant,
        })
    }
}

#[async_trait]
impl TokenFetcher for UaaTokenFetcher {
    async fn fetch_token(&self) -> Result<AccessToken, ClientError> {
        log::debug!(
            "Requesting token: {} (grant: {})",
            self.token_url,
            self.grant.name()
        );

        let res = self
            .client
            .post(self.token_url.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&self.grant.form())
            .send()
            .await
            .map_err(ClientError::auth)?;

        let status = res.status();
        if !status.is_success() {
            let info = res.text().await.unwrap_or_default();
            return Err(ClientError::Auth(format!(
                "Identity provider rejected request: {}: {}",
                status, info
            )));
        }

        let response: TokenResponse = res.json().await.map_err(ClientError::auth)?;

        if response.access_token.is_empty() {
            return Err(ClientError::auth("Identity provider returned an empty token"));
        }

        Ok(AccessToken {
            token: response.access_token,
            expires_in: response.expires_in,
        })
    }
}
