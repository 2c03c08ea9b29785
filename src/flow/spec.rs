//! Authored flow documents: the execution-relevant node and edge data
//! consumed from the authoring collaborator.
//!
//! A [`FlowDocument`] is the JSON wire form a visual editor produces. Only
//! the fields the engine executes live here; node placement and sizing are
//! authoring-only metadata, modeled separately as [`NodeLayout`] and never
//! read by the engine. Geometry keys present on wire node objects are
//! tolerated and dropped during deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::action::MediaKind;

/// Unique identifier of a node within one flow.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Which kind of input field an input node presents.
///
/// The engine performs no format coercion: number and phone replies are
/// stored as their literal text. The kinds exist so the channel adapter can
/// render an appropriate input affordance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Number,
    Phone,
}

/// HTTP method for `http_request` nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// The typed, per-node-type payload of a flow step.
///
/// Serializes with the authoring tool's wire shape: a `type` discriminator
/// and a `data` object, e.g.
/// `{"type": "input_text", "data": {"placeholder": "...", "variable": "phone"}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NodePayload {
    /// Send an interpolated text message.
    Text { text: String },
    /// Send an image reference.
    Image { url: String },
    /// Send a video reference.
    Video { url: String },
    /// Send an audio reference.
    Audio { url: String },
    /// Prompt for free text and bind the reply to `variable`.
    InputText {
        #[serde(default)]
        placeholder: String,
        variable: String,
    },
    /// Prompt for a number; the reply is stored as literal text.
    InputNumber {
        #[serde(default)]
        placeholder: String,
        variable: String,
    },
    /// Prompt for a phone number; the reply is stored as literal text.
    InputPhone {
        #[serde(default)]
        placeholder: String,
        variable: String,
    },
    /// Bind `variable` to the interpolation of `text`, without emitting
    /// anything outbound.
    SetVariable { variable: String, text: String },
    /// Branch on a condition: true takes the primary ("configure") edge,
    /// false the else edge. The operator stays a string so an unknown
    /// operator is a runtime report, not a load failure.
    Condition {
        variable: String,
        operator: String,
        #[serde(default)]
        value: String,
    },
    /// Perform an interpolated HTTP call through the configured transport.
    HttpRequest {
        #[serde(default)]
        method: HttpMethod,
        url: String,
        #[serde(default)]
        headers: String,
        #[serde(default)]
        body: String,
    },
    /// Call the AI backend with an interpolated prompt and bind the answer.
    AiAssistant {
        prompt: String,
        #[serde(rename = "responseVariable")]
        response_variable: String,
    },
}

impl NodePayload {
    /// Stable name of the node type, matching the wire discriminator.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Video { .. } => "video",
            Self::Audio { .. } => "audio",
            Self::InputText { .. } => "input_text",
            Self::InputNumber { .. } => "input_number",
            Self::InputPhone { .. } => "input_phone",
            Self::SetVariable { .. } => "set_variable",
            Self::Condition { .. } => "condition",
            Self::HttpRequest { .. } => "http_request",
            Self::AiAssistant { .. } => "ai_assistant",
        }
    }

    /// Returns `true` for node types that suspend the session for a reply.
    #[must_use]
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Self::InputText { .. } | Self::InputNumber { .. } | Self::InputPhone { .. }
        )
    }

    #[must_use]
    pub fn is_condition(&self) -> bool {
        matches!(self, Self::Condition { .. })
    }

    /// Returns `true` for node types that may carry an else edge: conditions
    /// (false branch) and transport calls (failure fallback).
    #[must_use]
    pub fn may_branch(&self) -> bool {
        matches!(
            self,
            Self::Condition { .. } | Self::HttpRequest { .. } | Self::AiAssistant { .. }
        )
    }

    /// Media kind for the media node types, `None` otherwise.
    #[must_use]
    pub fn media_kind(&self) -> Option<MediaKind> {
        match self {
            Self::Image { .. } => Some(MediaKind::Image),
            Self::Video { .. } => Some(MediaKind::Video),
            Self::Audio { .. } => Some(MediaKind::Audio),
            _ => None,
        }
    }

    /// Input kind for the input node types, `None` otherwise.
    #[must_use]
    pub fn input_kind(&self) -> Option<InputKind> {
        match self {
            Self::InputText { .. } => Some(InputKind::Text),
            Self::InputNumber { .. } => Some(InputKind::Number),
            Self::InputPhone { .. } => Some(InputKind::Phone),
            _ => None,
        }
    }
}

/// One authored step of a flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    #[serde(flatten)]
    pub payload: NodePayload,
}

impl NodeSpec {
    #[must_use]
    pub fn new(id: impl Into<NodeId>, payload: NodePayload) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

/// Whether an edge is the node's primary continuation or its else branch.
///
/// Only condition nodes may carry an else edge: it is the false branch, a
/// first-class edge kind rather than an ad-hoc secondary connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    #[default]
    Primary,
    Else,
}

/// A directed connection between two nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    #[serde(rename = "sourceId")]
    pub source: NodeId,
    #[serde(rename = "targetId")]
    pub target: NodeId,
    #[serde(default)]
    pub kind: EdgeKind,
}

impl EdgeSpec {
    #[must_use]
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }

    /// Convenience constructor for the common primary edge.
    #[must_use]
    pub fn primary(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self::new(source, target, EdgeKind::Primary)
    }
}

/// The JSON-serializable flow definition consumed from the authoring
/// collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDocument {
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

impl FlowDocument {
    /// Parses a document from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Authoring-only geometry for one node.
///
/// Consumed exclusively by the editor collaborator; the engine never reads
/// it. Kept as a separate structure so runtime payloads and canvas metadata
/// cannot grow back together.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    pub position: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}
