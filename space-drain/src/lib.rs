pub mod cloudcontroller;
pub mod manager;
pub mod mock;

use crate::{
    cloudcontroller::{
        with_drain_type, AppListerClient, BindDrainClient, CreateDrainClient, Curler, Grant,
        HttpCurlClient, ListDrainsClient, UaaTokenFetcher,
    },
    manager::{DesiredDrain, SpaceManager},
};
use anyhow::{bail, Context};
use serde::Deserialize;
use space_drain_service_common::{
    client::{ClientConfig, ClientFactory},
    defaults,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use url::Url;

#[derive(Clone, Deserialize)]
pub struct Config {
    pub space_id: String,

    pub api_addr: Url,
    pub uaa_addr: Url,

    #[serde(default = "defaults::client_id")]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,

    pub drain_name: String,
    pub drain_url: String,
    #[serde(default = "defaults::drain_type")]
    pub drain_type: String,

    #[serde(default = "defaults::skip_cert_verify")]
    pub skip_cert_verify: bool,
    #[serde(default)]
    pub ca_certificate: Option<PathBuf>,

    /// Period of the reconciliation cycle.
    #[serde(default = "defaults::interval", with = "humantime_serde")]
    pub interval: Duration,
    /// Timeout of a single request.
    #[serde(default = "defaults::timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("space_id", &self.space_id)
            .field("api_addr", &self.api_addr.as_str())
            .field("uaa_addr", &self.uaa_addr.as_str())
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("drain_name", &self.drain_name)
            .field("drain_url", &self.drain_url)
            .field("drain_type", &self.drain_type)
            .field("skip_cert_verify", &self.skip_cert_verify)
            .field("ca_certificate", &self.ca_certificate)
            .field("interval", &humantime::format_duration(self.interval).to_string())
            .field("timeout", &humantime::format_duration(self.timeout).to_string())
            .finish_non_exhaustive()
    }
}

impl Config {
    /// The grant to use: password credentials if present, a refresh token otherwise.
    pub fn grant(&self) -> anyhow::Result<Grant> {
        match (&self.username, &self.password, &self.refresh_token) {
            (Some(username), Some(password), _) => Ok(Grant::Password {
                username: username.clone(),
                password: password.clone(),
            }),
            (_, _, Some(token)) => Ok(Grant::RefreshToken(token.clone())),
            _ => bail!("Missing credentials: requires USERNAME and PASSWORD, or REFRESH_TOKEN"),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            skip_cert_verify: self.skip_cert_verify,
            ca_certificate: self.ca_certificate.clone(),
            timeout: self.timeout,
        }
    }

    pub fn desired_drain(&self) -> DesiredDrain {
        DesiredDrain {
            name: self.drain_name.clone(),
            url: self.drain_url.clone(),
            drain_type: self.drain_type.clone(),
        }
    }

    /// Check for problems which would prevent the manager from ever succeeding.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.space_id.is_empty() {
            bail!("Missing space ID");
        }
        if self.drain_name.is_empty() {
            bail!("Missing drain name");
        }
        if self.drain_url.is_empty() {
            bail!("Missing drain URL");
        }
        with_drain_type(&self.drain_url, &self.drain_type)
            .with_context(|| format!("Invalid drain URL: {}", self.drain_url))?;
        if self.interval.is_zero() {
            bail!("The interval must not be zero");
        }
        self.grant()?;
        Ok(())
    }
}

/// Create a manager talking to the cloud controller.
pub fn space_manager(config: Config) -> anyhow::Result<SpaceManager> {
    config.validate()?;

    let grant = config.grant()?;
    let drain = config.desired_drain();

    let client = ClientFactory::from_config(&config.client_config())
        .build()
        .context("Failed to create HTTP client")?;

    let token_fetcher = UaaTokenFetcher::new(
        client.clone(),
        &config.uaa_addr,
        config.client_id,
        config.client_secret,
        grant,
    )?;

    let curler: Arc<dyn Curler> = Arc::new(HttpCurlClient::new(client, config.api_addr));

    Ok(SpaceManager {
        interval: config.interval,
        space_guid: config.space_id,
        drain,
        token_fetcher: Arc::new(token_fetcher),
        drain_lister: Arc::new(ListDrainsClient::new(curler.clone())),
        drain_creator: Arc::new(CreateDrainClient::new(curler.clone())),
        app_lister: Arc::new(AppListerClient::new(curler.clone())),
        drain_binder: Arc::new(BindDrainClient::new(curler)),
    })
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    log::info!("Configuration: {:?}", config);

    let manager = space_manager(config)?;

    log::info!("Starting space drain ...");

    manager
        .run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                log::warn!("Failed to wait for shutdown signal: {}", err);
                futures::future::pending::<()>().await;
            }
        })
        .await;

    log::info!("Space drain closing ...");

    Ok(())
}
