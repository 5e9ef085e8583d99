// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Provider Configuration
//!
//! This module resolves the settings used to reach the RabbitMQ management API.
//! Values come from three layers, lowest precedence first:
//!
//! 1. built-in defaults (a local broker with the `guest` account)
//! 2. `RABBITMQ_*` environment variables, e.g. `RABBITMQ_ENDPOINT`
//! 3. explicit values from the provider block handed over by the host

use crate::errors::ManagementError;
use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};

/// Prefix of the environment variables read by [`ManagementConfigs::load`]
pub const ENV_PREFIX: &str = "rabbitmq";

/// Connection settings for the RabbitMQ management API.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ManagementConfigs {
    /// Base URL of the management plugin, e.g. `http://localhost:15672`
    #[serde(default = "ManagementConfigs::endpoint_default")]
    pub endpoint: String,

    #[serde(default = "ManagementConfigs::username_default")]
    pub username: String,

    #[serde(default = "ManagementConfigs::password_default")]
    pub password: String,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,

    /// PEM file with an extra CA certificate to trust
    #[serde(default)]
    pub cacert_file: Option<String>,

    /// PEM file with the client certificate for mutual TLS
    #[serde(default)]
    pub clientcert_file: Option<String>,

    /// PEM file with the private key matching `clientcert_file`
    #[serde(default)]
    pub clientkey_file: Option<String>,

    /// Proxy URL applied to every request
    #[serde(default)]
    pub proxy: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "ManagementConfigs::timeout_secs_default")]
    pub timeout_secs: u64,
}

impl Default for ManagementConfigs {
    fn default() -> Self {
        ManagementConfigs {
            endpoint: Self::endpoint_default(),
            username: Self::username_default(),
            password: Self::password_default(),
            insecure: false,
            cacert_file: None,
            clientcert_file: None,
            clientkey_file: None,
            proxy: None,
            timeout_secs: Self::timeout_secs_default(),
        }
    }
}

impl ManagementConfigs {
    fn endpoint_default() -> String {
        "http://localhost:15672".to_owned()
    }

    fn username_default() -> String {
        "guest".to_owned()
    }

    fn password_default() -> String {
        "guest".to_owned()
    }

    fn timeout_secs_default() -> u64 {
        30
    }

    /// Resolves the configuration from the process environment only.
    pub fn from_env() -> Result<Self, ManagementError> {
        Self::load(&Map::new())
    }

    /// Resolves the configuration from the environment, overridden by the
    /// explicit provider values supplied by the host.
    ///
    /// # Parameters
    /// * `explicit` - The provider block as a JSON object; `null` members are ignored
    ///
    /// # Returns
    /// The resolved configuration or a `ConfigError`
    pub fn load(explicit: &Map<String, Value>) -> Result<Self, ManagementError> {
        Self::load_from(Environment::with_prefix(ENV_PREFIX), explicit)
    }

    pub(crate) fn load_from(
        env: Environment,
        explicit: &Map<String, Value>,
    ) -> Result<Self, ManagementError> {
        // no try_parsing: `RABBITMQ_PASSWORD=007` must stay `007`
        let mut builder = Config::builder().add_source(env);

        for (key, value) in explicit {
            if let Some(value) = Self::override_value(key, value)? {
                builder = builder
                    .set_override(key.as_str(), value)
                    .map_err(|err| ManagementError::ConfigError(err.to_string()))?;
            }
        }

        let cfg: ManagementConfigs = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|err| {
                error!(error = err.to_string(), "failure to resolve the configuration");
                ManagementError::ConfigError(err.to_string())
            })?;

        cfg.validate()?;
        debug!(endpoint = cfg.endpoint, "management configuration resolved");

        Ok(cfg)
    }

    fn override_value(key: &str, value: &Value) -> Result<Option<config::Value>, ManagementError> {
        match value {
            Value::Null => Ok(None),
            Value::String(v) => Ok(Some(config::Value::from(v.as_str()))),
            Value::Bool(v) => Ok(Some(config::Value::from(*v))),
            Value::Number(v) => match v.as_i64() {
                Some(n) => Ok(Some(config::Value::from(n))),
                None => Err(ManagementError::ConfigError(format!(
                    "`{key}` must be an integer"
                ))),
            },
            _ => Err(ManagementError::ConfigError(format!(
                "`{key}` must be a string, a boolean or an integer"
            ))),
        }
    }

    fn validate(&self) -> Result<(), ManagementError> {
        if self.endpoint.is_empty() {
            return Err(ManagementError::ConfigError(
                "`endpoint` must not be empty".to_owned(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ManagementError::ConfigError(
                "`timeout_secs` must be greater than zero".to_owned(),
            ));
        }

        if self.clientcert_file.is_some() != self.clientkey_file.is_some() {
            return Err(ManagementError::ConfigError(
                "`clientcert_file` and `clientkey_file` must be set together".to_owned(),
            ));
        }

        Ok(())
    }
}
