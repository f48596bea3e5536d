//! Building the HTTP client shared by all outbound calls.

use crate::defaults;
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

/// Configuration of the outbound HTTP client.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Disable TLS verification. Only for self-signed deployments, never on by default.
    #[serde(default = "defaults::skip_cert_verify")]
    pub skip_cert_verify: bool,

    /// An additional PEM file with root certificates to trust.
    #[serde(default)]
    pub ca_certificate: Option<PathBuf>,

    /// Timeout of a single request.
    #[serde(default = "defaults::timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            skip_cert_verify: defaults::skip_cert_verify(),
            ca_certificate: None,
            timeout: defaults::timeout(),
        }
    }
}

/// Creates a [`reqwest::Client`], applying the TLS policy and timeout.
pub struct ClientFactory {
    client: reqwest::ClientBuilder,
    ca_certificates: Vec<PathBuf>,
    insecure: bool,
}

impl Default for ClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientFactory {
    pub fn new() -> Self {
        Self {
            client: reqwest::ClientBuilder::new().use_rustls_tls(),
            ca_certificates: Vec::new(),
            insecure: false,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let mut factory = Self::new().timeout(config.timeout);

        if config.skip_cert_verify {
            factory = factory.make_insecure();
        }

        if let Some(cert) = &config.ca_certificate {
            factory = factory.add_ca_cert(cert.clone());
        }

        factory
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.timeout(timeout);
        self
    }

    pub fn make_insecure(mut self) -> Self {
        self.insecure = true;
        self
    }

    pub fn add_ca_cert<P: Into<PathBuf>>(mut self, cert: P) -> Self {
        self.ca_certificates.push(cert.into());
        self
    }

    pub fn build(self) -> anyhow::Result<reqwest::Client> {
        let mut client = self.client;

        for cert in self.ca_certificates {
            client = add_ca_cert(client, &cert)?;
        }

        if self.insecure {
            client = make_insecure(client);
        }

        Ok(client.build()?)
    }
}

fn add_ca_cert(
    mut client: reqwest::ClientBuilder,
    cert: &std::path::Path,
) -> anyhow::Result<reqwest::ClientBuilder> {
    log::info!("Adding root certificates: {:?}", cert);

    let buf = std::fs::read(cert)?;
    let pems = pem::parse_many(buf)?;

    log::info!("Found {} certificates", pems.len());

    for pem in pems {
        let cert = reqwest::Certificate::from_pem(pem::encode(&pem).as_bytes())?;
        client = client.add_root_certificate(cert);
    }

    Ok(client)
}

fn make_insecure(client: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
    log::warn!("Disabling TLS verification for client. Do not use this in production!");
    // with rustls this also skips the hostname check
    client.danger_accept_invalid_certs(true)
}
