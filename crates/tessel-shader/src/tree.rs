// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The node tree wire model.
//!
//! A tree arrives as JSON:
//!
//! ```json
//! {
//!   "nodes": [
//!     { "id": "a", "type": "value", "outputs": { "out": "float" }, "properties": { "value": 0.5 } },
//!     { "id": "b", "type": "math", "inputs": { "value": { "link": { "node": "a", "socket": "out" } } } }
//!   ],
//!   "links": [ { "from": { "node": "a", "socket": "out" }, "to": { "node": "b", "socket": "value_001" } } ]
//! }
//! ```
//!
//! `nodes` may also be an object keyed by node id. An input is either a
//! literal, `{ "value": literal }`, or a link written inline. Socket names
//! are normalized with [`socket_key`], so `"Emission Strength"` and
//! `"emission_strength"` name the same socket.

use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::CompileError;
use crate::naming::socket_key;
use crate::types::SocketType;

/// One end of a link: a node id and one of its sockets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct SocketRef {
    /// The node id.
    pub node: String,
    /// The socket name.
    pub socket: String,
}

impl SocketRef {
    /// Creates a reference, normalizing the socket name.
    pub fn new(node: impl Into<String>, socket: &str) -> Self {
        Self {
            node: node.into(),
            socket: socket_key(socket),
        }
    }

    /// Parses `"node.socket"`. Node ids may themselves contain dots; the
    /// last one separates the socket.
    pub fn parse(path: &str) -> Option<Self> {
        let (node, socket) = path.rsplit_once('.')?;
        if node.is_empty() || socket.is_empty() {
            return None;
        }
        Some(Self::new(node, socket))
    }

    fn normalized(self) -> Self {
        Self::new(self.node, &self.socket)
    }
}

impl fmt::Display for SocketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.socket)
    }
}

/// A directed connection from an output socket to an input socket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Link {
    /// The producing output.
    pub from: SocketRef,
    /// The consuming input.
    pub to: SocketRef,
}

/// A node as authored: type, literal inputs, declared outputs and
/// free-form properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: String,
    kind: String,
    inputs: IndexMap<String, Value>,
    outputs: IndexMap<String, Option<SocketType>>,
    properties: Map<String, Value>,
}

impl Node {
    /// The node id, unique within its tree.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The type name as authored.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The literal value of an unlinked input, if one was authored.
    pub fn literal(&self, socket: &str) -> Option<&Value> {
        self.inputs.get(socket)
    }

    /// Names of the inputs carrying a literal.
    pub fn literal_inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }

    /// Declared outputs with their type, when one was given.
    pub fn outputs(&self) -> impl Iterator<Item = (&str, Option<SocketType>)> {
        self.outputs.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// A raw property.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// A string property.
    pub fn str_property(&self, name: &str) -> Option<&str> {
        self.property(name).and_then(Value::as_str)
    }

    /// A numeric property.
    pub fn f64_property(&self, name: &str) -> Option<f64> {
        self.property(name).and_then(Value::as_f64)
    }

    /// A boolean property.
    pub fn bool_property(&self, name: &str) -> Option<bool> {
        self.property(name).and_then(Value::as_bool)
    }
}

#[derive(Deserialize)]
struct RawNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    inputs: Map<String, Value>,
    #[serde(default)]
    outputs: Map<String, Value>,
    #[serde(default)]
    properties: Map<String, Value>,
}

/// A parsed node tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTree {
    nodes: IndexMap<String, Node>,
    links: Vec<Link>,
}

impl NodeTree {
    /// Parses a tree from JSON text.
    pub fn parse(text: &str) -> Result<NodeTree, CompileError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| CompileError::MalformedTree(e.to_string()))?;
        Self::from_json(&value)
    }

    /// Parses a tree from a JSON value. Fails on the first malformed node.
    pub fn from_json(value: &Value) -> Result<NodeTree, CompileError> {
        let object = value
            .as_object()
            .ok_or_else(|| CompileError::MalformedTree("expected an object".into()))?;

        let entries: Vec<(Option<String>, &Value)> = match object.get("nodes") {
            Some(Value::Array(nodes)) => nodes.iter().map(|n| (None, n)).collect(),
            Some(Value::Object(nodes)) => nodes.iter().map(|(id, n)| (Some(id.clone()), n)).collect(),
            Some(_) => return Err(CompileError::MalformedTree("'nodes' must be a list or a map".into())),
            None => return Err(CompileError::MalformedTree("missing 'nodes'".into())),
        };

        let mut tree = NodeTree::default();
        for (position, (key, entry)) in entries.into_iter().enumerate() {
            let label = key.clone().unwrap_or_else(|| format!("#{position}"));
            let raw = RawNode::deserialize(entry).map_err(|e| CompileError::MalformedNode {
                node: entry
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| label.clone()),
                reason: e.to_string(),
            })?;
            let id = match raw.id.clone().or(key) {
                Some(id) if !id.is_empty() => id,
                _ => {
                    return Err(CompileError::MalformedNode {
                        node: label,
                        reason: "missing id".into(),
                    })
                }
            };
            if tree.nodes.contains_key(&id) {
                return Err(CompileError::DuplicateNode(id));
            }
            let node = tree.read_node(id.clone(), raw)?;
            tree.nodes.insert(id, node);
        }

        if let Some(links) = object.get("links") {
            let links = links
                .as_array()
                .ok_or_else(|| CompileError::MalformedTree("'links' must be a list".into()))?;
            for (position, link) in links.iter().enumerate() {
                let link = Link::deserialize(link)
                    .map_err(|e| CompileError::MalformedTree(format!("link #{position}: {e}")))?;
                tree.links.push(Link {
                    from: link.from.normalized(),
                    to: link.to.normalized(),
                });
            }
        }

        log::debug!(
            "Parsed node tree with {} nodes and {} links.",
            tree.nodes.len(),
            tree.links.len()
        );
        Ok(tree)
    }

    fn read_node(&mut self, id: String, raw: RawNode) -> Result<Node, CompileError> {
        let malformed = |reason: String| CompileError::MalformedNode {
            node: id.clone(),
            reason,
        };

        let mut inputs = IndexMap::new();
        for (name, value) in raw.inputs {
            let socket = socket_key(&name);
            match inline_links(&value).map_err(&malformed)? {
                Some(sources) => {
                    for from in sources {
                        self.links.push(Link {
                            from: from.normalized(),
                            to: SocketRef::new(id.clone(), &socket),
                        });
                    }
                }
                None => {
                    let literal = match value {
                        Value::Object(mut o) if o.contains_key("value") => {
                            o.remove("value").unwrap_or(Value::Null)
                        }
                        other => other,
                    };
                    inputs.insert(socket, literal);
                }
            }
        }

        let mut outputs = IndexMap::new();
        for (name, value) in raw.outputs {
            let declared = match &value {
                Value::String(ty) => Some(ty.as_str()),
                Value::Object(o) => o.get("type").and_then(Value::as_str),
                _ => None,
            };
            let ty = match declared {
                Some("linked") | None => None,
                Some(ty) => Some(
                    SocketType::parse(ty)
                        .ok_or_else(|| malformed(format!("output '{name}' has unknown type '{ty}'")))?,
                ),
            };
            outputs.insert(socket_key(&name), ty);
        }

        Ok(Node {
            kind: raw.kind,
            inputs,
            outputs,
            properties: raw.properties,
            id,
        })
    }

    /// The nodes, in authored order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Looks a node up by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The node at `index` in authored order.
    pub fn node_at(&self, index: usize) -> Option<&Node> {
        self.nodes.get_index(index).map(|(_, node)| node)
    }

    /// The position of a node in authored order.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    /// Every link: the ones written inline on node inputs, in node order,
    /// then the ones listed under `links`.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Reads an inline link: `{"link": {...}}` or `{"type": "linked", "links": [...]}`.
fn inline_links(value: &Value) -> Result<Option<Vec<SocketRef>>, String> {
    let Value::Object(object) = value else {
        return Ok(None);
    };
    if let Some(link) = object.get("link") {
        let from = SocketRef::deserialize(link).map_err(|e| format!("bad link: {e}"))?;
        return Ok(Some(vec![from]));
    }
    if object.get("type").and_then(Value::as_str) == Some("linked") {
        let links = object.get("links").cloned().unwrap_or(Value::Array(Vec::new()));
        let sources = Vec::<SocketRef>::deserialize(&links).map_err(|e| format!("bad links: {e}"))?;
        return Ok(Some(sources));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_list_and_inline_links() {
        let tree = NodeTree::from_json(&json!({
            "nodes": [
                { "id": "a", "type": "value", "outputs": { "Value": "float" }, "properties": { "value": 2 } },
                { "id": "b", "type": "MATH", "inputs": {
                    "Value": { "link": { "node": "a", "socket": "Value" } },
                    "Value_001": { "value": 3 }
                } }
            ],
            "links": []
        }))
        .unwrap();

        assert_eq!(tree.len(), 2);
        let b = tree.node("b").unwrap();
        assert_eq!(b.kind(), "MATH");
        assert_eq!(b.literal("value_001"), Some(&json!(3)));
        assert_eq!(
            tree.links(),
            &[Link {
                from: SocketRef::new("a", "value"),
                to: SocketRef::new("b", "value"),
            }]
        );
        let a = tree.node("a").unwrap();
        assert_eq!(a.outputs().collect::<Vec<_>>(), vec![("value", Some(SocketType::Float))]);
        assert_eq!(a.f64_property("value"), Some(2.0));
    }

    #[test]
    fn test_inline_links_come_before_listed_links() {
        let tree = NodeTree::from_json(&json!({
            "nodes": [
                { "id": "a", "type": "value" },
                { "id": "b", "type": "math", "inputs": {
                    "Value": { "link": { "node": "a", "socket": "Value" } }
                } }
            ],
            "links": [
                { "from": { "node": "a", "socket": "Value" }, "to": { "node": "b", "socket": "Value_001" } }
            ]
        }))
        .unwrap();

        let targets: Vec<&str> = tree.links().iter().map(|link| link.to.socket.as_str()).collect();
        assert_eq!(targets, vec!["value", "value_001"]);
    }

    #[test]
    fn test_parse_keyed_nodes_use_their_key_as_id() {
        let tree = NodeTree::from_json(&json!({
            "nodes": { "Mix.001": { "type": "mix" } }
        }))
        .unwrap();
        assert_eq!(tree.index_of("Mix.001"), Some(0));
    }

    #[test]
    fn test_malformed_node_is_named() {
        let err = NodeTree::from_json(&json!({
            "nodes": [
                { "id": "ok", "type": "value" },
                { "id": "broken", "inputs": {} }
            ]
        }))
        .unwrap_err();
        assert!(
            matches!(&err, CompileError::MalformedNode { node, .. } if node == "broken"),
            "Unexpected error: {err}"
        );
    }

    #[test]
    fn test_unknown_output_type_is_malformed() {
        let err = NodeTree::from_json(&json!({
            "nodes": [{ "id": "a", "type": "value", "outputs": { "out": "matrix" } }]
        }))
        .unwrap_err();
        assert!(matches!(err, CompileError::MalformedNode { .. }));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let err = NodeTree::from_json(&json!({
            "nodes": [{ "id": "a", "type": "value" }, { "id": "a", "type": "rgb" }]
        }))
        .unwrap_err();
        assert_eq!(err, CompileError::DuplicateNode("a".into()));
    }

    #[test]
    fn test_not_a_tree() {
        assert!(matches!(NodeTree::parse("[1, 2]"), Err(CompileError::MalformedTree(_))));
        assert!(matches!(NodeTree::parse("{"), Err(CompileError::MalformedTree(_))));
    }

    #[test]
    fn test_socket_ref_parse_uses_last_dot() {
        assert_eq!(SocketRef::parse("Math.001.Value"), Some(SocketRef::new("Math.001", "value")));
        assert_eq!(SocketRef::parse("nodot"), None);
    }
}
