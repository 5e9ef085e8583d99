// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Bindings Data Source
//!
//! The `rabbitmq_bindings` data source lists the bindings declared in a vhost.
//! Bindings from the unnamed default exchange are implicit (every queue has one)
//! and are left out; the others are returned in the order the broker reports them.

use crate::{
    binding::BindingInfo,
    client::is_addressable_vhost,
    errors::{ManagementError, ProviderError},
    provider::{DataSource, ProviderContext},
    schema::{Attribute, AttributeKind, Block},
};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, error};

/// Type name of the data source
pub const TYPE_NAME: &str = "rabbitmq_bindings";

/// Vhost used when the configuration does not name one
pub const DEFAULT_VHOST: &str = "/";

/// Configuration accepted by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BindingsConfig {
    /// An omitted or `null` vhost falls back to [`DEFAULT_VHOST`]
    #[serde(
        default = "BindingsConfig::vhost_default",
        deserialize_with = "BindingsConfig::deserialize_vhost"
    )]
    pub vhost: String,
}

impl BindingsConfig {
    fn vhost_default() -> String {
        DEFAULT_VHOST.to_owned()
    }

    fn deserialize_vhost<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(Self::vhost_default))
    }
}

impl Default for BindingsConfig {
    fn default() -> Self {
        BindingsConfig {
            vhost: Self::vhost_default(),
        }
    }
}

/// One element of the `bindings` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BindingDescriptor {
    pub source: String,
    pub destination: String,
    pub destination_type: String,
    pub routing_key: String,
    pub properties_key: String,
    pub arguments: BTreeMap<String, String>,
}

impl From<BindingInfo> for BindingDescriptor {
    fn from(info: BindingInfo) -> Self {
        BindingDescriptor {
            destination_type: info.destination_type.to_string(),
            arguments: info
                .arguments
                .into_iter()
                .map(|(key, value)| (key, argument_string(value)))
                .collect(),
            source: info.source,
            destination: info.destination,
            routing_key: info.routing_key,
            properties_key: info.properties_key,
        }
    }
}

/// Strings are kept as-is, anything else is rendered as JSON text.
fn argument_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// State produced by a read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BindingsState {
    /// Identity of the result set, always the vhost
    pub id: String,
    pub vhost: String,
    pub bindings: Vec<BindingDescriptor>,
}

/// The `rabbitmq_bindings` data source.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindingsLister;

impl BindingsLister {
    pub fn new() -> BindingsLister {
        BindingsLister
    }

    /// Lists the bindings of `vhost`, without default-exchange bindings.
    ///
    /// The management API is called exactly once. Its error, if any, is returned
    /// as is and no partial state is produced.
    ///
    /// # Parameters
    /// * `ctx` - Provider context holding the shared management client
    /// * `vhost` - The vhost to list bindings in
    ///
    /// # Returns
    /// The state identified by `vhost`, or the management API error
    pub async fn read(
        &self,
        ctx: &ProviderContext,
        vhost: &str,
    ) -> Result<BindingsState, ManagementError> {
        debug!(vhost, "listing bindings");

        let received = ctx.client().list_bindings_in(vhost).await.map_err(|err| {
            error!(error = err.to_string(), vhost, "failure to list bindings");
            err
        })?;

        let total = received.len();
        let bindings = received
            .into_iter()
            .filter(|b| !b.is_default_exchange())
            .map(BindingDescriptor::from)
            .collect::<Vec<_>>();

        debug!(vhost, total, kept = bindings.len(), "bindings listed");

        Ok(BindingsState {
            id: vhost.to_owned(),
            vhost: vhost.to_owned(),
            bindings,
        })
    }

    fn decode_config(config: Value) -> Result<BindingsConfig, ProviderError> {
        let cfg = match config {
            Value::Null => BindingsConfig::default(),
            config => serde_json::from_value::<BindingsConfig>(config)
                .map_err(|err| ProviderError::InvalidConfig(err.to_string()))?,
        };

        if !is_addressable_vhost(&cfg.vhost) {
            return Err(ProviderError::InvalidConfig(format!(
                "`vhost` must not be empty, `.` or `..`, got `{}`",
                cfg.vhost
            )));
        }

        Ok(cfg)
    }
}

#[async_trait]
impl DataSource for BindingsLister {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Block {
        let binding = Block::new("A binding declared in the vhost.")
            .attribute(Attribute::computed_string(
                "source",
                "The source exchange of the binding.",
            ))
            .attribute(Attribute::computed_string(
                "destination",
                "The destination exchange or queue of the binding.",
            ))
            .attribute(Attribute::computed_string(
                "destination_type",
                "The type of the destination (exchange or queue).",
            ))
            .attribute(Attribute::computed_string(
                "routing_key",
                "The routing key for the binding.",
            ))
            .attribute(Attribute::computed_string(
                "properties_key",
                "The properties key for the binding.",
            ))
            .attribute(
                Attribute::new("arguments", AttributeKind::StringMap)
                    .description("The arguments for the binding.")
                    .computed(),
            );

        Block::new("Retrieve list of all bindings in a given vhost.")
            .attribute(
                Attribute::new("vhost", AttributeKind::String)
                    .description("The vhost to list bindings in.")
                    .default_value(DEFAULT_VHOST),
            )
            .attribute(
                Attribute::new("bindings", AttributeKind::List(binding))
                    .description("List of all bindings in the given vhost.")
                    .computed(),
            )
    }

    async fn read_json(&self, ctx: &ProviderContext, config: Value) -> Result<Value, ProviderError> {
        let cfg = Self::decode_config(config)?;
        let state = self.read(ctx, &cfg.vhost).await?;

        serde_json::to_value(state).map_err(|err| {
            error!(error = err.to_string(), "failure to serialize bindings state");
            ProviderError::SerializationError(err.to_string())
        })
    }
}
