// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The normalized tree representation of an API response.
//!
//! The Twitter API has historically answered in several encodings with
//! inconsistent shapes between them. Before anything is materialized into a
//! domain entity, a response body is parsed into one canonical shape: a
//! [`WireNode`] tree. A node carries a tag name (the wire type name, e.g.
//! `"status"`) and an ordered list of fields, each of which is either a leaf
//! string or another node. Leaf values are always strings; typed coercion is
//! the materializer's job, driven by the entity schemas.
//!
//! [`node_from_json`] builds such a tree from a JSON document. A tree is
//! transient: it is produced per API call, handed to
//! [`Materializer::materialize`][super::entity::Materializer::materialize],
//! and discarded.

use serde_json::Value;

use crate::error::{Error, Result};

/// A field value inside a [`WireNode`]: either a leaf string or a sub-tree.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    /// A scalar value, always carried as a string.
    Leaf(String),
    /// A nested sub-tree.
    Node(WireNode),
}

/// A normalized response tree node.
///
/// Field order mirrors source order; collection consumers rely on element 0
/// being the first element the API delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct WireNode {
    tag: String,
    fields: Vec<(String, WireValue)>,
}

impl WireNode {
    /// Creates an empty node with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        WireNode {
            tag: tag.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a leaf field, builder-style.
    pub fn leaf(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), WireValue::Leaf(value.into())));
        self
    }

    /// Appends a sub-tree field named after the child's tag, builder-style.
    pub fn child(mut self, node: WireNode) -> Self {
        self.fields.push((node.tag.clone(), WireValue::Node(node)));
        self
    }

    /// The wire type name of this node.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The fields of this node, in source order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &WireValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Whether this node carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Normalizes a parsed JSON document into a [`WireNode`] tagged with the
/// given wire type name.
///
/// JSON objects become sub-trees, arrays become collection nodes whose
/// elements carry the singularized tag, and scalars become leaf strings.
/// `null` members are dropped entirely, leaving the corresponding entity
/// field at its default. The root must be an object or an array.
pub fn node_from_json(tag: &str, value: &Value) -> Result<WireNode> {
    match value {
        Value::Object(_) | Value::Array(_) => json_value(tag, value),
        _ => Err(Error::InvalidResponse(
            "expected an object or array at the response root",
            Some(value.to_string()),
        )),
    }
}

fn json_value(tag: &str, value: &Value) -> Result<WireNode> {
    let mut node = WireNode::new(tag);
    match value {
        Value::Object(map) => {
            for (name, member) in map {
                match member {
                    Value::Null => continue,
                    Value::Object(_) | Value::Array(_) => {
                        node.fields
                            .push((name.clone(), WireValue::Node(json_value(name, member)?)));
                    }
                    _ => {
                        node.fields
                            .push((name.clone(), WireValue::Leaf(json_leaf(member))));
                    }
                }
            }
        }
        Value::Array(elements) => {
            let tag = element_tag(tag);
            for element in elements {
                match element {
                    Value::Object(_) | Value::Array(_) => {
                        node.fields
                            .push((tag.to_string(), WireValue::Node(json_value(tag, element)?)));
                    }
                    Value::Null => continue,
                    _ => {
                        node.fields
                            .push((tag.to_string(), WireValue::Leaf(json_leaf(element))));
                    }
                }
            }
        }
        _ => {
            return Err(Error::InvalidResponse(
                "expected an object or array",
                Some(value.to_string()),
            ));
        }
    }
    Ok(node)
}

/// Renders a scalar JSON value as the string form the coercion layer expects.
pub(crate) fn json_leaf(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Derives the tag carried by elements of a collection node.
fn element_tag(tag: &str) -> &str {
    match tag {
        "statuses" => "status",
        "users" => "user",
        "direct_messages" => "direct_message",
        "direct-messages" => "direct-message",
        other => other.strip_suffix('s').unwrap_or(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_becomes_node_with_leaves() {
        let json: Value = serde_json::from_str(r#"{"id": 42, "text": "hi", "truncated": false}"#)
            .unwrap();
        let node = node_from_json("status", &json).unwrap();

        assert_eq!(node.tag(), "status");
        let fields: Vec<_> = node.fields().collect();
        assert!(fields.contains(&("id", &WireValue::Leaf("42".to_string()))));
        assert!(fields.contains(&("text", &WireValue::Leaf("hi".to_string()))));
        assert!(fields.contains(&("truncated", &WireValue::Leaf("false".to_string()))));
    }

    #[test]
    fn null_members_are_dropped() {
        let json: Value = serde_json::from_str(r#"{"id": 1, "in_reply_to_status_id": null}"#)
            .unwrap();
        let node = node_from_json("status", &json).unwrap();
        assert!(node.fields().all(|(name, _)| name != "in_reply_to_status_id"));
    }

    #[test]
    fn nested_object_becomes_subtree() {
        let json: Value =
            serde_json::from_str(r#"{"text": "hi", "user": {"screen_name": "bob"}}"#).unwrap();
        let node = node_from_json("status", &json).unwrap();
        let (_, user) = node.fields().find(|(name, _)| *name == "user").unwrap();
        match user {
            WireValue::Node(sub) => {
                assert_eq!(sub.tag(), "user");
                assert_eq!(
                    sub.fields().next(),
                    Some(("screen_name", &WireValue::Leaf("bob".to_string())))
                );
            }
            WireValue::Leaf(_) => panic!("user normalized as a leaf"),
        }
    }

    #[test]
    fn array_elements_get_singular_tags_in_order() {
        let json: Value =
            serde_json::from_str(r#"[{"id": 1}, {"id": 2}, {"id": 3}]"#).unwrap();
        let node = node_from_json("statuses", &json).unwrap();

        let ids: Vec<String> = node
            .fields()
            .map(|(name, value)| {
                assert_eq!(name, "status");
                match value {
                    WireValue::Node(sub) => match sub.fields().next() {
                        Some((_, WireValue::Leaf(id))) => id.clone(),
                        other => panic!("unexpected element shape: {:?}", other),
                    },
                    WireValue::Leaf(_) => panic!("element normalized as a leaf"),
                }
            })
            .collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn scalar_root_is_rejected() {
        let json: Value = serde_json::from_str("42").unwrap();
        match node_from_json("status", &json) {
            Err(Error::InvalidResponse(..)) => (),
            other => panic!("expected InvalidResponse, got {:?}", other),
        }
    }

    #[test]
    fn singular_tags() {
        assert_eq!(element_tag("statuses"), "status");
        assert_eq!(element_tag("direct_messages"), "direct_message");
        assert_eq!(element_tag("users"), "user");
        assert_eq!(element_tag("results"), "result");
    }
}
