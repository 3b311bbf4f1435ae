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

//! The wire messages sent by the authoring tool.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LinkError;

/// The kind of a [`LinkMessage`], used to route it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A material node tree.
    ShaderTree,
    /// A logic node tree.
    LogicTree,
    /// A change to the scene.
    SceneChange,
    /// A finished export.
    Export,
}

/// One message from the authoring tool.
///
/// On the wire: `{"type": "shaderTree", "name": "...", "data": {...}}`. The
/// name identifies the material or graph; a later message with the same name
/// replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LinkMessage {
    /// A material node tree.
    ShaderTree {
        /// Material name.
        name: String,
        /// The node tree.
        data: Value,
    },
    /// A logic node tree.
    LogicTree {
        /// Graph name.
        name: String,
        /// The node tree.
        data: Value,
    },
    /// A change to the scene.
    SceneChange {
        /// The scene.
        name: String,
        /// What changed.
        #[serde(default)]
        data: Value,
    },
    /// A finished export.
    Export {
        /// The exported asset.
        name: String,
        /// Export details.
        #[serde(default)]
        data: Value,
    },
}

impl LinkMessage {
    /// Parses one text frame.
    pub fn parse(text: &str) -> Result<Self, LinkError> {
        serde_json::from_str(text).map_err(|e| LinkError::Malformed(e.to_string()))
    }

    /// The kind of message.
    pub fn kind(&self) -> MessageKind {
        match self {
            LinkMessage::ShaderTree { .. } => MessageKind::ShaderTree,
            LinkMessage::LogicTree { .. } => MessageKind::LogicTree,
            LinkMessage::SceneChange { .. } => MessageKind::SceneChange,
            LinkMessage::Export { .. } => MessageKind::Export,
        }
    }

    /// The stable name the message refers to.
    pub fn name(&self) -> &str {
        match self {
            LinkMessage::ShaderTree { name, .. }
            | LinkMessage::LogicTree { name, .. }
            | LinkMessage::SceneChange { name, .. }
            | LinkMessage::Export { name, .. } => name,
        }
    }

    /// The payload.
    pub fn data(&self) -> &Value {
        match self {
            LinkMessage::ShaderTree { data, .. }
            | LinkMessage::LogicTree { data, .. }
            | LinkMessage::SceneChange { data, .. }
            | LinkMessage::Export { data, .. } => data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_shader_tree() {
        let message = LinkMessage::parse(
            r#"{"type": "shaderTree", "name": "Rock", "data": {"nodes": [], "links": []}}"#,
        )
        .unwrap();

        assert_eq!(message.kind(), MessageKind::ShaderTree);
        assert_eq!(message.name(), "Rock");
        assert_eq!(message.data(), &json!({"nodes": [], "links": []}));
    }

    #[test]
    fn test_scene_change_payload_is_optional() {
        let message = LinkMessage::parse(r#"{"type": "sceneChange", "name": "Level"}"#).unwrap();
        assert_eq!(message.kind(), MessageKind::SceneChange);
        assert!(message.data().is_null());
    }

    #[test]
    fn test_unknown_or_broken_frames_are_malformed() {
        for frame in [
            r#"{"type": "teleport", "name": "x", "data": {}}"#,
            r#"{"name": "x", "data": {}}"#,
            r#"{"type": "shaderTree", "data": {}}"#,
            "ping",
        ] {
            assert!(
                matches!(LinkMessage::parse(frame), Err(LinkError::Malformed(_))),
                "'{frame}' should be rejected"
            );
        }
    }
}
