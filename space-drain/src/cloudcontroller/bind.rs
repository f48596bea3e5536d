use super::{AccessToken, ClientError, Curler};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

#[async_trait]
pub trait DrainBinder: Send + Sync {
    /// Bind a single app to a drain. Binding an already bound app is an error.
    async fn bind_drain(
        &self,
        app_guid: &str,
        drain_guid: &str,
        token: &AccessToken,
    ) -> Result<(), ClientError>;
}

pub struct BindDrainClient {
    curler: Arc<dyn Curler>,
}

impl BindDrainClient {
    pub fn new(curler: Arc<dyn Curler>) -> Self {
        Self { curler }
    }
}

#[async_trait]
impl DrainBinder for BindDrainClient {
    async fn bind_drain(
        &self,
        app_guid: &str,
        drain_guid: &str,
        token: &AccessToken,
    ) -> Result<(), ClientError> {
        let bind = json!({
            "service_instance_guid": drain_guid,
            "app_guid": app_guid,
        });

        self.curler
            .curl(Method::POST, "/v2/service_bindings", Some(&bind), token)
            .await?;

        Ok(())
    }
}
