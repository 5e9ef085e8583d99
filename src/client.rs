// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # RabbitMQ Management API Client
//!
//! This module defines the `ManagementApi` seam used by the data sources and its
//! HTTP implementation. A single `HttpManagementClient` is built from the provider
//! configuration when the provider is configured, then shared by every operation.
//!
//! Requests are plain `async fn`s: dropping the returned future aborts the request
//! in flight, which is how host-side cancellation and deadlines are honoured.

use crate::{binding::BindingInfo, configs::ManagementConfigs, errors::ManagementError, otel};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use opentelemetry::Context;
use reqwest::{
    header::{HeaderValue, ACCEPT},
    Certificate, Identity, Proxy, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize};
use std::{fs, time::Duration};
use tracing::{debug, error};
use url::Url;

/// Content type requested from the management API
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Operations the provider needs from the RabbitMQ management API.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// Lists every binding declared in `vhost`, in the order the broker returns them.
    ///
    /// Fails with a 404 `ResponseError` when the vhost does not exist.
    async fn list_bindings_in(&self, vhost: &str) -> Result<Vec<BindingInfo>, ManagementError>;
}

/// HTTP implementation of [`ManagementApi`].
pub struct HttpManagementClient {
    http: reqwest::Client,
    endpoint: Url,
    username: String,
    password: String,
}

impl HttpManagementClient {
    /// Builds a client from the provider configuration.
    ///
    /// Certificate and key files are read once, here. The returned client owns a
    /// connection pool and is meant to be shared for the lifetime of the process.
    ///
    /// # Parameters
    /// * `cfg` - Resolved management configuration
    ///
    /// # Returns
    /// The client, or an `InvalidEndpointError`/`ClientBuildError`
    pub fn new(cfg: &ManagementConfigs) -> Result<Self, ManagementError> {
        let endpoint = Url::parse(&cfg.endpoint).map_err(|err| {
            error!(error = err.to_string(), endpoint = cfg.endpoint, "invalid endpoint");
            ManagementError::InvalidEndpointError(cfg.endpoint.clone())
        })?;

        if endpoint.cannot_be_a_base() {
            return Err(ManagementError::InvalidEndpointError(cfg.endpoint.clone()));
        }

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .danger_accept_invalid_certs(cfg.insecure);

        if let Some(path) = &cfg.cacert_file {
            let pem = read_pem(path)?;
            let cert = Certificate::from_pem(&pem).map_err(|err| {
                error!(error = err.to_string(), path, "invalid ca certificate");
                ManagementError::ClientBuildError(err.to_string())
            })?;
            builder = builder.add_root_certificate(cert);
        }

        if let (Some(cert_path), Some(key_path)) = (&cfg.clientcert_file, &cfg.clientkey_file) {
            let mut pem = read_pem(cert_path)?;
            pem.extend(read_pem(key_path)?);
            let identity = Identity::from_pem(&pem).map_err(|err| {
                error!(error = err.to_string(), "invalid client certificate or key");
                ManagementError::ClientBuildError(err.to_string())
            })?;
            builder = builder.identity(identity);
        }

        if let Some(proxy) = &cfg.proxy {
            let proxy = Proxy::all(proxy.as_str()).map_err(|err| {
                error!(error = err.to_string(), "invalid proxy");
                ManagementError::ClientBuildError(err.to_string())
            })?;
            builder = builder.proxy(proxy);
        }

        let http = builder.build().map_err(|err| {
            error!(error = err.to_string(), "failure to build the http client");
            ManagementError::ClientBuildError(err.to_string())
        })?;

        debug!(endpoint = endpoint.as_str(), "management client created");

        Ok(HttpManagementClient {
            http,
            endpoint,
            username: cfg.username.clone(),
            password: cfg.password.clone(),
        })
    }

    /// URL of the bindings collection of `vhost`.
    ///
    /// The vhost is one path segment, so `/` is sent as `%2F`. Empty and dot
    /// vhosts are rejected: URL normalisation would turn them into the
    /// collection of every vhost.
    pub(crate) fn bindings_url(&self, vhost: &str) -> Result<Url, ManagementError> {
        if !is_addressable_vhost(vhost) {
            error!(vhost, "vhost cannot be addressed");
            return Err(ManagementError::InvalidVhostError(vhost.to_owned()));
        }

        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ManagementError::InvalidEndpointError(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(["api", "bindings", vhost]);

        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ManagementError> {
        debug!(url = url.as_str(), "management api request");

        let resp = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .headers(otel::trace_headers(&Context::current()))
            .header(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE))
            .send()
            .await
            .map_err(|err| {
                error!(error = err.to_string(), "management api request failed");
                ManagementError::TransportError(err.to_string())
            })?;

        decode_response(resp).await
    }
}

#[async_trait]
impl ManagementApi for HttpManagementClient {
    async fn list_bindings_in(&self, vhost: &str) -> Result<Vec<BindingInfo>, ManagementError> {
        let url = self.bindings_url(vhost)?;
        self.get(url).await
    }
}

/// Returns true when `vhost` survives as its own path segment.
pub(crate) fn is_addressable_vhost(vhost: &str) -> bool {
    !matches!(vhost, "" | "." | "..")
}

fn read_pem(path: &str) -> Result<Vec<u8>, ManagementError> {
    fs::read(path).map_err(|err| {
        error!(error = err.to_string(), path, "failure to read pem file");
        ManagementError::ClientBuildError(format!("{path}: {err}"))
    })
}

async fn decode_response<T: DeserializeOwned>(resp: Response) -> Result<T, ManagementError> {
    let status = resp.status();

    let body = resp.bytes().await.map_err(|err| {
        error!(error = err.to_string(), "failure to read the response body");
        ManagementError::TransportError(err.to_string())
    })?;

    if !status.is_success() {
        let err = response_error(status, &body);
        error!(error = err.to_string(), "management api returned an error");
        return Err(err);
    }

    serde_json::from_slice(&body).map_err(|err| {
        error!(error = err.to_string(), "failure to decode the response body");
        ManagementError::DecodeError(err.to_string())
    })
}

/// Maps a non-success response to a `ResponseError`.
///
/// The broker describes failures as `{"error": "...", "reason": "..."}`; when the
/// body is something else the canonical status text stands in for `error`.
pub(crate) fn response_error(status: StatusCode, body: &[u8]) -> ManagementError {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        error: String,
        #[serde(default)]
        reason: String,
    }

    let canonical = status.canonical_reason().unwrap_or("Unknown Status").to_owned();

    let (error, reason) = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(b) if !b.error.is_empty() => (b.error, b.reason),
        Ok(b) => (canonical, b.reason),
        Err(_) => (canonical, String::from_utf8_lossy(body).trim().to_owned()),
    };

    ManagementError::ResponseError(status.as_u16(), error, reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> HttpManagementClient {
        HttpManagementClient::new(&ManagementConfigs {
            endpoint: endpoint.to_owned(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn encodes_default_vhost_as_one_segment() {
        let url = client("http://localhost:15672").bindings_url("/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:15672/api/bindings/%2F");
    }

    #[test]
    fn rejects_vhosts_that_collapse_into_the_collection() {
        let client = client("http://localhost:15672");

        for vhost in ["", ".", ".."] {
            assert_eq!(
                client.bindings_url(vhost).err(),
                Some(ManagementError::InvalidVhostError(vhost.to_owned()))
            );
        }

        let url = client.bindings_url("...").unwrap();
        assert_eq!(url.as_str(), "http://localhost:15672/api/bindings/...");
    }

    #[test]
    fn keeps_endpoint_path_prefix() {
        let url = client("https://proxy.local/rabbitmq/")
            .bindings_url("orders/eu")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://proxy.local/rabbitmq/api/bindings/orders%2Feu"
        );
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let err = HttpManagementClient::new(&ManagementConfigs {
            endpoint: "not a url".to_owned(),
            ..Default::default()
        })
        .err();

        assert_eq!(
            err,
            Some(ManagementError::InvalidEndpointError("not a url".to_owned()))
        );
    }

    #[test]
    fn missing_ca_file_fails_the_build() {
        let err = HttpManagementClient::new(&ManagementConfigs {
            cacert_file: Some("/nonexistent/ca.pem".to_owned()),
            ..Default::default()
        })
        .err();

        assert!(matches!(err, Some(ManagementError::ClientBuildError(_))));
    }

    #[test]
    fn maps_broker_error_body() {
        let err = response_error(
            StatusCode::NOT_FOUND,
            br#"{"error":"Object Not Found","reason":"Not Found"}"#,
        );

        assert_eq!(
            err,
            ManagementError::ResponseError(
                404,
                "Object Not Found".to_owned(),
                "Not Found".to_owned()
            )
        );
    }

    #[test]
    fn falls_back_to_status_text() {
        let err = response_error(StatusCode::UNAUTHORIZED, b"");

        assert_eq!(
            err,
            ManagementError::ResponseError(401, "Unauthorized".to_owned(), String::new())
        );
    }
}
