use super::{
    curl::path,
    page::{list_all, Resource},
    AccessToken, ClientError, Curler,
};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use url::Url;

const DRAIN_TYPE_PARAM: &str = "drain-type";
const DEFAULT_DRAIN_TYPE: &str = "logs";

/// A drain, as currently known by the cloud controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Drain {
    pub guid: String,
    pub name: String,
    pub url: String,
    pub drain_type: String,
    pub space_guid: String,
    pub app_guids: Vec<String>,
}

#[async_trait]
pub trait DrainLister: Send + Sync {
    /// List all drains of a space, including the apps bound to them.
    async fn list_drains(
        &self,
        space_guid: &str,
        token: &AccessToken,
    ) -> Result<Vec<Drain>, ClientError>;
}

#[async_trait]
pub trait DrainCreator: Send + Sync {
    /// Create a new drain. This does not check for an existing drain of the same name.
    async fn create_drain(
        &self,
        name: &str,
        url: &str,
        space_guid: &str,
        drain_type: &str,
        token: &AccessToken,
    ) -> Result<(), ClientError>;
}

#[derive(Debug, Deserialize)]
struct ServiceInstance {
    name: String,
    #[serde(default)]
    syslog_drain_url: Option<String>,
    #[serde(default)]
    space_guid: Option<String>,
    service_bindings_url: String,
}

#[derive(Debug, Deserialize)]
struct ServiceBinding {
    app_guid: String,
}

pub struct ListDrainsClient {
    curler: Arc<dyn Curler>,
}

impl ListDrainsClient {
    pub fn new(curler: Arc<dyn Curler>) -> Self {
        Self { curler }
    }

    async fn bound_apps(
        &self,
        bindings_url: String,
        token: &AccessToken,
    ) -> Result<Vec<String>, ClientError> {
        Ok(
            list_all::<ServiceBinding, _>(self.curler.as_ref(), bindings_url, token)
                .await?
                .into_iter()
                .map(|binding| binding.entity.app_guid)
                .collect(),
        )
    }
}

#[async_trait]
impl DrainLister for ListDrainsClient {
    async fn list_drains(
        &self,
        space_guid: &str,
        token: &AccessToken,
    ) -> Result<Vec<Drain>, ClientError> {
        let instances: Vec<Resource<ServiceInstance>> = list_all(
            self.curler.as_ref(),
            path(&["v2", "spaces", space_guid, "user_provided_service_instances"])?,
            token,
        )
        .await?;

        let mut drains = Vec::new();

        for instance in instances {
            let url = match instance.entity.syslog_drain_url {
                Some(url) if !url.is_empty() => url,
                // not a drain
                _ => continue,
            };

            let app_guids = self
                .bound_apps(instance.entity.service_bindings_url, token)
                .await?;

            drains.push(Drain {
                guid: instance.metadata.guid,
                name: instance.entity.name,
                drain_type: drain_type(&url),
                url,
                space_guid: instance
                    .entity
                    .space_guid
                    .unwrap_or_else(|| space_guid.to_string()),
                app_guids,
            });
        }

        Ok(drains)
    }
}

pub struct CreateDrainClient {
    curler: Arc<dyn Curler>,
}

impl CreateDrainClient {
    pub fn new(curler: Arc<dyn Curler>) -> Self {
        Self { curler }
    }
}

#[async_trait]
impl DrainCreator for CreateDrainClient {
    async fn create_drain(
        &self,
        name: &str,
        url: &str,
        space_guid: &str,
        drain_type: &str,
        token: &AccessToken,
    ) -> Result<(), ClientError> {
        let create = json!({
            "name": name,
            "space_guid": space_guid,
            "syslog_drain_url": with_drain_type(url, drain_type)?,
        });

        log::debug!("New drain: {}", create);

        self.curler
            .curl(
                Method::POST,
                "/v2/user_provided_service_instances",
                Some(&create),
                token,
            )
            .await?;

        Ok(())
    }
}

/// Extract the drain type from a syslog drain URL.
pub fn drain_type(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == DRAIN_TYPE_PARAM)
                .map(|(_, v)| v.into_owned())
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_DRAIN_TYPE.to_string())
}

/// Encode the drain type into a syslog drain URL, replacing an existing one.
///
/// The URL is stored in its normalized form, an empty path of a special scheme becomes `/`
/// (`https://sink.example` is stored as `https://sink.example/?drain-type=all`).
pub fn with_drain_type(url: &str, drain_type: &str) -> Result<String, ClientError> {
    if drain_type.is_empty() {
        return Ok(url.to_string());
    }

    let mut url = Url::parse(url)?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != DRAIN_TYPE_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.set_query(None);
    url.query_pairs_mut()
        .extend_pairs(pairs)
        .append_pair(DRAIN_TYPE_PARAM, drain_type);

    Ok(url.into())
}
