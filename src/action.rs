use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of media referenced by a media node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// An outbound action produced by node execution and delivered to the
/// channel adapter.
///
/// Actions are the engine's only output surface: the adapter translates them
/// into real transport messages (WhatsApp, Instagram, a test harness). Within
/// one session, actions are emitted in the exact order the corresponding
/// nodes were visited.
///
/// # Serialization
///
/// Actions serialize with a `kind` tag so adapters can dispatch on a stable
/// wire form:
///
/// ```
/// use convoflow::action::OutboundAction;
///
/// let action = OutboundAction::text("Welcome!");
/// let json = serde_json::to_string(&action).unwrap();
/// assert!(json.contains("\"kind\":\"text\""));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundAction {
    /// Send a text message (already interpolated).
    Text { body: String },
    /// Send a media reference by URL (already interpolated).
    Media { media: MediaKind, url: String },
    /// Send an input prompt and wait for the user's reply.
    Prompt { placeholder: String },
}

impl OutboundAction {
    /// Creates a text action.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text { body: body.into() }
    }

    /// Creates a media action.
    #[must_use]
    pub fn media(media: MediaKind, url: impl Into<String>) -> Self {
        Self::Media {
            media,
            url: url.into(),
        }
    }

    /// Creates an input prompt action.
    #[must_use]
    pub fn prompt(placeholder: impl Into<String>) -> Self {
        Self::Prompt {
            placeholder: placeholder.into(),
        }
    }

    /// Returns `true` if this action expects the session to suspend for a
    /// user reply.
    #[must_use]
    pub fn is_prompt(&self) -> bool {
        matches!(self, Self::Prompt { .. })
    }
}

impl fmt::Display for OutboundAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { body } => write!(f, "text: {body}"),
            Self::Media { media, url } => write!(f, "{media}: {url}"),
            Self::Prompt { placeholder } => write!(f, "prompt: {placeholder}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// Verifies the convenience constructors populate the expected variants.
    fn test_constructors() {
        assert_eq!(
            OutboundAction::text("hi"),
            OutboundAction::Text { body: "hi".into() }
        );
        assert_eq!(
            OutboundAction::media(MediaKind::Video, "https://cdn/x.mp4"),
            OutboundAction::Media {
                media: MediaKind::Video,
                url: "https://cdn/x.mp4".into()
            }
        );
        assert!(OutboundAction::prompt("type here").is_prompt());
        assert!(!OutboundAction::text("hi").is_prompt());
    }

    #[test]
    /// Checks the adjacent-tag wire form adapters dispatch on.
    fn test_wire_form() {
        let json = serde_json::to_value(OutboundAction::media(MediaKind::Image, "u")).unwrap();
        assert_eq!(json["kind"], "media");
        assert_eq!(json["media"], "image");
        assert_eq!(json["url"], "u");

        let parsed: OutboundAction =
            serde_json::from_str(r#"{"kind":"prompt","placeholder":"name?"}"#).unwrap();
        assert_eq!(parsed, OutboundAction::prompt("name?"));
    }
}
