use super::{page::list_all, AccessToken, ClientError, Curler};
use async_trait::async_trait;
use serde::de::IgnoredAny;
use std::sync::Arc;
use url::form_urlencoded;

#[async_trait]
pub trait AppLister: Send + Sync {
    /// List the GUIDs of all apps in a space, regardless of their state.
    async fn list_apps(
        &self,
        space_guid: &str,
        token: &AccessToken,
    ) -> Result<Vec<String>, ClientError>;
}

pub struct AppListerClient {
    curler: Arc<dyn Curler>,
}

impl AppListerClient {
    pub fn new(curler: Arc<dyn Curler>) -> Self {
        Self { curler }
    }
}

#[async_trait]
impl AppLister for AppListerClient {
    async fn list_apps(
        &self,
        space_guid: &str,
        token: &AccessToken,
    ) -> Result<Vec<String>, ClientError> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("q", &format!("space_guid:{}", space_guid))
            .finish();

        Ok(
            list_all::<IgnoredAny, _>(self.curler.as_ref(), format!("/v2/apps?{}", query), token)
                .await?
                .into_iter()
                .map(|app| app.metadata.guid)
                .collect(),
        )
    }
}
