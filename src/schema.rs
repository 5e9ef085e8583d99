// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Schema Descriptions
//!
//! Builder types used by data sources to describe their configuration and
//! computed attributes to the host. The host owns validation and diffing; these
//! types only describe the shape.

use serde::Serialize;

/// Type of a schema attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "elem")]
pub enum AttributeKind {
    String,
    /// Map from string keys to string values
    StringMap,
    /// Ordered list of nested blocks
    List(Block),
}

/// Definition of a single attribute.
///
/// Attributes are built with chained setters, starting from a required,
/// non-computed attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub(crate) name: &'static str,
    pub(crate) kind: AttributeKind,
    pub(crate) description: &'static str,
    pub(crate) optional: bool,
    pub(crate) computed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) default: Option<&'static str>,
}

impl Attribute {
    pub fn new(name: &'static str, kind: AttributeKind) -> Attribute {
        Attribute {
            name,
            kind,
            description: "",
            optional: false,
            computed: false,
            default: None,
        }
    }

    /// Shorthand for a computed string attribute.
    pub fn computed_string(name: &'static str, description: &'static str) -> Attribute {
        Attribute::new(name, AttributeKind::String)
            .description(description)
            .computed()
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Marks the attribute as filled in by the provider.
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Sets the value used when the configuration omits the attribute.
    /// Implies `optional`.
    pub fn default_value(mut self, value: &'static str) -> Self {
        self.optional = true;
        self.default = Some(value);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_computed(&self) -> bool {
        self.computed
    }

    pub fn default(&self) -> Option<&'static str> {
        self.default
    }
}

/// A described set of attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Block {
    pub(crate) description: &'static str,
    pub(crate) attributes: Vec<Attribute>,
}

impl Block {
    pub fn new(description: &'static str) -> Block {
        Block {
            description,
            attributes: vec![],
        }
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Looks up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_value_makes_attribute_optional() {
        let attr = Attribute::new("vhost", AttributeKind::String).default_value("/");

        assert!(attr.is_optional());
        assert!(!attr.is_computed());
        assert_eq!(attr.default(), Some("/"));
    }

    #[test]
    fn serializes_nested_blocks() {
        let block = Block::new("outer").attribute(
            Attribute::new(
                "items",
                AttributeKind::List(
                    Block::new("inner").attribute(Attribute::computed_string("name", "a name")),
                ),
            )
            .computed(),
        );

        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "description": "outer",
                "attributes": [{
                    "name": "items",
                    "kind": {
                        "type": "list",
                        "elem": {
                            "description": "inner",
                            "attributes": [{
                                "name": "name",
                                "kind": { "type": "string" },
                                "description": "a name",
                                "optional": false,
                                "computed": true
                            }]
                        }
                    },
                    "description": "",
                    "optional": false,
                    "computed": true
                }]
            })
        );
    }
}
