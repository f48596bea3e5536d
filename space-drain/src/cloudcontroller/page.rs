use super::{AccessToken, ClientError, Curler};
use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize};

#[derive(Clone, Debug, Deserialize)]
pub struct Metadata {
    pub guid: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Resource<T> {
    pub metadata: Metadata,
    pub entity: T,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default)]
    next_url: Option<String>,
    #[serde(default = "Vec::new")]
    resources: Vec<Resource<T>>,
}

/// Retrieve all resources of a paged listing, following `next_url` until the last page.
pub async fn list_all<T, C>(
    curler: &C,
    path: String,
    token: &AccessToken,
) -> Result<Vec<Resource<T>>, ClientError>
where
    T: DeserializeOwned,
    C: Curler + ?Sized,
{
    let mut result = Vec::new();
    let mut next = Some(path);

    while let Some(path) = next {
        let body = curler.curl(Method::GET, &path, None, token).await?;
        let page: Page<T> = serde_json::from_slice(&body)?;

        result.extend(page.resources);
        next = page.next_url.filter(|url| !url.is_empty());
    }

    Ok(result)
}
