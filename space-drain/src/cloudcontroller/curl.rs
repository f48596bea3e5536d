use super::{AccessToken, ClientError};
use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder};
use serde_json::Value;
use url::Url;

/// Invoke an endpoint of the cloud controller, returning the raw response body.
#[async_trait]
pub trait Curler: Send + Sync {
    async fn curl(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: &AccessToken,
    ) -> Result<Vec<u8>, ClientError>;
}

trait TokenInjector {
    fn inject_token(self, token: &AccessToken) -> Self;
}

impl TokenInjector for RequestBuilder {
    fn inject_token(self, token: &AccessToken) -> Self {
        self.bearer_auth(token.token())
    }
}

/// A [`Curler`] on top of a shared HTTP client.
pub struct HttpCurlClient {
    client: reqwest::Client,
    api_url: Url,
}

impl HttpCurlClient {
    pub fn new(client: reqwest::Client, api_url: Url) -> Self {
        Self { client, api_url }
    }
}

#[async_trait]
impl Curler for HttpCurlClient {
    async fn curl(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: &AccessToken,
    ) -> Result<Vec<u8>, ClientError> {
        let url = endpoint(&self.api_url, path)?;

        log::debug!("{} {}", method, url);

        let mut req = self
            .client
            .request(method, url)
            .inject_token(token)
            .header(header::ACCEPT, "application/json");

        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await?;
        let status = res.status();

        if status.is_success() {
            Ok(res.bytes().await?.to_vec())
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(ClientError::Api { status, body })
        }
    }
}

/// Append an absolute path, which may carry a query, to a base URL.
///
/// Unlike [`Url::join`] this keeps the path of the base, so a controller served below a
/// prefix (`https://host/cf`) is reached at `https://host/cf/v2/...`.
pub fn endpoint(base: &Url, path: &str) -> Result<Url, ClientError> {
    let mut base = base.clone();
    base.set_query(None);
    base.set_fragment(None);

    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');

    Ok(Url::parse(&format!("{}/{}", base, path))?)
}

/// Build an absolute path from its segments, encoding each of them.
pub fn path(segments: &[&str]) -> Result<String, ClientError> {
    let mut url = Url::parse("http://localhost")?;
    url.path_segments_mut()
        .map_err(|_| ClientError::request("Failed to modify path"))?
        .clear()
        .extend(segments);
    Ok(url.path().to_string())
}
