// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Binding Records
//!
//! Types describing bindings as the RabbitMQ management API reports them.
//! A binding links a source exchange to a destination exchange or queue through a
//! routing key and optional arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt};

/// Kind of object a binding routes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationType {
    #[default]
    Queue,
    Exchange,
}

impl DestinationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationType::Queue => "queue",
            DestinationType::Exchange => "exchange",
        }
    }
}

impl fmt::Display for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A binding as returned by `GET /api/bindings/{vhost}`.
///
/// An empty `source` denotes the unnamed default exchange, to which every queue
/// is implicitly bound.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BindingInfo {
    #[serde(default)]
    pub source: String,
    pub destination: String,
    pub destination_type: DestinationType,
    #[serde(default)]
    pub routing_key: String,
    #[serde(default)]
    pub properties_key: String,
    /// Binding arguments, kept as the broker sent them
    #[serde(default)]
    pub arguments: BTreeMap<String, Value>,
}

impl BindingInfo {
    /// Returns true for the implicit binding of a queue to the default exchange.
    pub fn is_default_exchange(&self) -> bool {
        self.source.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_broker_record() {
        let info: BindingInfo = serde_json::from_value(json!({
            "source": "events",
            "vhost": "/",
            "destination": "orders",
            "destination_type": "queue",
            "routing_key": "order.*",
            "arguments": { "x-match": "all", "x-priority": 10 },
            "properties_key": "order.*~Gj3k"
        }))
        .unwrap();

        assert_eq!(info.source, "events");
        assert_eq!(info.destination_type, DestinationType::Queue);
        assert_eq!(info.arguments.get("x-priority"), Some(&json!(10)));
        assert!(!info.is_default_exchange());
    }

    #[test]
    fn default_exchange_binding_has_empty_source() {
        let info: BindingInfo = serde_json::from_value(json!({
            "source": "",
            "destination": "orders",
            "destination_type": "queue",
            "routing_key": "orders",
            "arguments": {},
            "properties_key": "orders"
        }))
        .unwrap();

        assert!(info.is_default_exchange());
    }

    #[test]
    fn destination_type_renders_lowercase() {
        assert_eq!(DestinationType::Exchange.to_string(), "exchange");
        assert_eq!(DestinationType::Queue.as_str(), "queue");
    }
}
