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

//! Errors produced while compiling a node tree.

use thiserror::Error;

use crate::compiler::RootTarget;
use crate::types::SocketType;

/// A compilation failure. No shader is produced when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The payload is not a node tree at all.
    #[error("Malformed node tree: {0}")]
    MalformedTree(String),
    /// A node entry could not be read.
    #[error("Malformed node '{node}': {reason}")]
    MalformedNode {
        /// The node id, or its position when the id itself is missing.
        node: String,
        /// What was wrong with it.
        reason: String,
    },
    /// Two nodes share an id.
    #[error("Node id '{0}' is used more than once")]
    DuplicateNode(String),
    /// No implementation is registered for a node type.
    #[error("Node '{node}' has unknown type '{kind}'")]
    UnknownNodeType {
        /// The node id.
        node: String,
        /// The type name as authored.
        kind: String,
    },
    /// A root or a link names a node that does not exist.
    #[error("Reference to unknown node '{0}'")]
    UnknownNode(String),
    /// A link or root names a socket the node does not have.
    #[error("Node '{node}' has no socket '{socket}'")]
    UnknownSocket {
        /// The node id.
        node: String,
        /// The socket name.
        socket: String,
    },
    /// A link points at a node that is not part of the tree.
    #[error("Link {from} -> {to} references a missing node")]
    DanglingLink {
        /// The link source, as `node.socket`.
        from: String,
        /// The link target, as `node.socket`.
        to: String,
    },
    /// Two links feed the same input socket.
    #[error("Input '{socket}' of node '{node}' is linked more than once")]
    DuplicateLink {
        /// The target node id.
        node: String,
        /// The target input socket.
        socket: String,
    },
    /// A value of one socket type cannot feed a socket of another, or a node
    /// declares an output with a type it does not produce.
    #[error("A {from} value does not fit '{node}.{socket}' ({to})")]
    TypeMismatch {
        /// The node owning the receiving or declared socket.
        node: String,
        /// The receiving or declared socket.
        socket: String,
        /// The type produced by the source.
        from: SocketType,
        /// The type expected by the receiver or declared by the tree.
        to: SocketType,
    },
    /// The links form a cycle.
    #[error("Cycle detected between nodes [{}]", .nodes.join(", "))]
    Cycle {
        /// The nodes sitting on the cycle.
        nodes: Vec<String>,
    },
    /// A node asked for a library fragment that is not registered.
    #[error("Unknown library fragment '{0}'")]
    UnknownLibrary(String),
    /// Nothing to compile: no explicit root and no connected material output.
    #[error("The node tree has no output root")]
    MissingRoot,
    /// The same output target was requested twice.
    #[error("Output target {0} is assigned more than once")]
    DuplicateRoot(RootTarget),
    /// A node property is missing or has an unusable value.
    #[error("Node '{node}': invalid property '{property}': {reason}")]
    InvalidProperty {
        /// The node id.
        node: String,
        /// The property name.
        property: String,
        /// What was wrong with it.
        reason: String,
    },
}
