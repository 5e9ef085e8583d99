// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Error Types for the RabbitMQ Provider
//!
//! This module provides the error types surfaced by the provider. `ManagementError`
//! covers every failure of the outbound management API call, and `ProviderError`
//! covers the host-facing layer that decodes configuration and routes requests to
//! data sources.

use thiserror::Error;

/// Represents errors returned while talking to the RabbitMQ management API.
///
/// These are surfaced to the caller unmodified: the data sources never retry and
/// never return partial results when one of them occurs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManagementError {
    /// The broker answered with a non-success status.
    /// Carries the status code, the broker's `error` and its `reason`.
    #[error("error {0} ({1}): {2}")]
    ResponseError(u16, String, String),

    /// The request could not be completed (connect, TLS, timeout)
    #[error("failure to reach the management api `{0}`")]
    TransportError(String),

    /// The broker answered with a body that could not be decoded
    #[error("failure to decode the management api response `{0}`")]
    DecodeError(String),

    /// The vhost cannot be sent as a single path segment
    #[error("invalid vhost `{0}`")]
    InvalidVhostError(String),

    /// The configured endpoint is not a valid base URL
    #[error("invalid management endpoint `{0}`")]
    InvalidEndpointError(String),

    /// The HTTP client could not be built from the configuration
    #[error("failure to build the management client `{0}`")]
    ClientBuildError(String),

    /// The provider configuration could not be resolved
    #[error("failure to load configuration `{0}`")]
    ConfigError(String),
}

impl ManagementError {
    /// Returns true when the broker reported the requested object as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ManagementError::ResponseError(404, _, _))
    }
}

/// Represents errors returned to the host by the provider entry points.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error(transparent)]
    Management(#[from] ManagementError),

    /// The configuration object handed over by the host is not acceptable
    #[error("invalid configuration `{0}`")]
    InvalidConfig(String),

    /// No data source is registered under the requested type name
    #[error("unknown data source `{0}`")]
    UnknownDataSource(String),

    /// The computed state could not be serialized for the host
    #[error("failure to serialize state `{0}`")]
    SerializationError(String),
}
