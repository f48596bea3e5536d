use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The identity provider rejected the credentials, or could not be reached.
    #[error("Failed to acquire token: {0}")]
    Auth(String),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Request failed: {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("Failed to build request: {0}")]
    Request(String),
}

impl ClientError {
    pub fn auth<S: ToString>(s: S) -> Self {
        Self::Auth(s.to_string())
    }

    pub fn decode<S: ToString>(s: S) -> Self {
        Self::Decode(s.to_string())
    }

    pub fn request<S: ToString>(s: S) -> Self {
        Self::Request(s.to_string())
    }

    /// A stable code, identifying the kind of error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "AuthError",
            Self::Transport(_) => "TransportError",
            Self::Api { .. } => "APIError",
            Self::Decode(_) => "DecodeError",
            Self::Request(_) => "RequestError",
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err)
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::request(err)
    }
}
