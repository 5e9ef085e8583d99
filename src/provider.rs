// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # RabbitMQ Provider
//!
//! This module holds the provider entry points used by the host orchestration
//! engine. The provider is configured once per process: it builds a single
//! management client and hands it, through a typed [`ProviderContext`], to every
//! data source read.
//!
//! The main components are:
//! - `ProviderContext`: shared handle on the management client
//! - `DataSource` trait: interface implemented by every data source
//! - `RabbitMQProvider`: data source registry and request routing

use crate::{
    bindings::BindingsLister,
    client::{HttpManagementClient, ManagementApi},
    configs::ManagementConfigs,
    errors::ProviderError,
    schema::Block,
};
use async_trait::async_trait;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, error};

/// Context handed to each operation.
///
/// Cloning is cheap; all clones share the same client.
#[derive(Clone)]
pub struct ProviderContext {
    client: Arc<dyn ManagementApi>,
}

impl ProviderContext {
    pub fn new(client: Arc<dyn ManagementApi>) -> ProviderContext {
        ProviderContext { client }
    }

    pub fn client(&self) -> &dyn ManagementApi {
        self.client.as_ref()
    }
}

/// Interface implemented by the provider's data sources.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Type name under which the host addresses the data source.
    fn type_name(&self) -> &'static str;

    /// Describes the configuration and computed attributes.
    fn schema(&self) -> Block;

    /// Reads the data source.
    ///
    /// # Parameters
    /// * `ctx` - Shared provider context
    /// * `config` - The data source configuration object, as sent by the host
    ///
    /// # Returns
    /// The computed state as a JSON object, or the error to show the user
    async fn read_json(&self, ctx: &ProviderContext, config: Value) -> Result<Value, ProviderError>;
}

/// The RabbitMQ provider.
pub struct RabbitMQProvider {
    ctx: ProviderContext,
    data_sources: HashMap<&'static str, Arc<dyn DataSource>>,
}

impl RabbitMQProvider {
    /// Creates a provider around an existing management client.
    pub fn new(client: Arc<dyn ManagementApi>) -> RabbitMQProvider {
        RabbitMQProvider {
            ctx: ProviderContext::new(client),
            data_sources: HashMap::default(),
        }
        .data_source(Arc::new(BindingsLister::new()))
    }

    /// Builds the HTTP management client from `cfg` and creates the provider.
    pub fn configure(cfg: &ManagementConfigs) -> Result<RabbitMQProvider, ProviderError> {
        debug!(endpoint = cfg.endpoint, "configuring provider");
        let client = HttpManagementClient::new(cfg)?;
        Ok(RabbitMQProvider::new(Arc::new(client)))
    }

    /// Resolves the configuration from the host's provider block and the
    /// environment, then configures the provider.
    pub fn configure_json(config: &Value) -> Result<RabbitMQProvider, ProviderError> {
        let explicit = match config {
            Value::Null => serde_json::Map::new(),
            Value::Object(map) => map.clone(),
            _ => {
                return Err(ProviderError::InvalidConfig(
                    "provider configuration must be an object".to_owned(),
                ))
            }
        };

        let cfg = ManagementConfigs::load(&explicit)?;
        Self::configure(&cfg)
    }

    /// Registers a data source under its type name.
    pub fn data_source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.data_sources.insert(source.type_name(), source);
        self
    }

    pub fn context(&self) -> &ProviderContext {
        &self.ctx
    }

    /// Type names of the registered data sources, sorted.
    pub fn data_source_names(&self) -> Vec<&'static str> {
        let mut names = self.data_sources.keys().copied().collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn data_source_schema(&self, type_name: &str) -> Result<Block, ProviderError> {
        Ok(self.lookup(type_name)?.schema())
    }

    /// Reads the data source registered as `type_name`.
    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let source = self.lookup(type_name)?;
        debug!(data_source = type_name, "reading data source");
        source.read_json(&self.ctx, config).await
    }

    fn lookup(&self, type_name: &str) -> Result<&Arc<dyn DataSource>, ProviderError> {
        self.data_sources.get(type_name).ok_or_else(|| {
            error!(data_source = type_name, "unknown data source");
            ProviderError::UnknownDataSource(type_name.to_owned())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        binding::{BindingInfo, DestinationType},
        client::MockManagementApi,
        errors::ManagementError,
    };
    use serde_json::json;

    fn provider(mock: MockManagementApi) -> RabbitMQProvider {
        RabbitMQProvider::new(Arc::new(mock))
    }

    #[test]
    fn registers_bindings_data_source() {
        let provider = provider(MockManagementApi::new());

        assert_eq!(provider.data_source_names(), vec!["rabbitmq_bindings"]);
        assert!(provider.data_source_schema("rabbitmq_bindings").is_ok());
    }

    #[test]
    fn unknown_data_source_is_rejected() {
        let provider = provider(MockManagementApi::new());

        assert_eq!(
            provider.data_source_schema("rabbitmq_queues").err(),
            Some(ProviderError::UnknownDataSource("rabbitmq_queues".to_owned()))
        );
    }

    #[tokio::test]
    async fn routes_read_to_the_shared_client() {
        let mut mock = MockManagementApi::new();
        mock.expect_list_bindings_in()
            .withf(|vhost| vhost == "orders")
            .times(1)
            .returning(|_| {
                Ok(vec![BindingInfo {
                    source: "events".to_owned(),
                    destination: "orders".to_owned(),
                    destination_type: DestinationType::Queue,
                    routing_key: "order.created".to_owned(),
                    properties_key: "order.created".to_owned(),
                    ..Default::default()
                }])
            });

        let state = provider(mock)
            .read_data_source("rabbitmq_bindings", json!({ "vhost": "orders" }))
            .await
            .unwrap();

        assert_eq!(state["id"], "orders");
        assert_eq!(state["bindings"][0]["source"], "events");
    }

    #[tokio::test]
    async fn read_surfaces_broker_error_unchanged() {
        let mut mock = MockManagementApi::new();
        mock.expect_list_bindings_in().returning(|_| {
            Err(ManagementError::ResponseError(
                404,
                "Object Not Found".to_owned(),
                "Not Found".to_owned(),
            ))
        });

        let err = provider(mock)
            .read_data_source("rabbitmq_bindings", json!({ "vhost": "missing" }))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "error 404 (Object Not Found): Not Found");
    }

    #[test]
    fn configure_json_requires_an_object() {
        let err = RabbitMQProvider::configure_json(&json!("http://localhost:15672")).err();

        assert!(matches!(err, Some(ProviderError::InvalidConfig(_))));
    }
}
