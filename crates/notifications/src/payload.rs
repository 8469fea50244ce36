//! Push payload interpretation.
//!
//! Pure domain logic: a JSON payload in, a screen to open out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How the payload reached the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryContext {
    /// Delivered in the launch options (the user tapped it while the app was not running).
    Launch,
    /// Arrived while the app was active.
    Foreground,
    /// Arrived while the app was backgrounded (user tapped the banner).
    Background,
}

impl DeliveryContext {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryContext::Launch => "launch",
            DeliveryContext::Foreground => "foreground",
            DeliveryContext::Background => "background",
        }
    }
}

/// Screen a payload should open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Destination {
    /// Comment thread of a post.
    Comment {
        blog_id: Option<u64>,
        post_id: u64,
        comment_id: Option<u64>,
    },
    /// Notifications list, optionally focused on one note.
    NotificationsList { note_id: Option<u64> },
    /// A post in the reader.
    ReaderPost { blog_id: u64, post_id: u64 },
    /// Generic landing screen for payloads we cannot interpret.
    Fallback,
}

impl Destination {
    pub fn label(&self) -> &'static str {
        match self {
            Destination::Comment { .. } => "comment",
            Destination::NotificationsList { .. } => "notifications",
            Destination::ReaderPost { .. } => "reader_post",
            Destination::Fallback => "fallback",
        }
    }

    /// Interpret a payload.
    ///
    /// Recognised shapes:
    /// - `{"type": "comment" | "c", "post_id", "blog_id"?, "comment_id"?}`
    /// - `{"type": "reader" | "post", "blog_id", "post_id"}`
    /// - any other object carrying `note_id` (likes, follows, ...)
    ///
    /// Ids may be numbers or numeric strings.
    pub fn parse(payload: &Value) -> Result<Destination, PayloadError> {
        let object = payload.as_object().ok_or(PayloadError::NotAnObject)?;
        let kind = object.get("type").and_then(Value::as_str);

        match kind {
            Some("comment") | Some("c") => Ok(Destination::Comment {
                blog_id: id_field(object, "blog_id")?,
                post_id: required(object, "post_id")?,
                comment_id: id_field(object, "comment_id")?,
            }),
            Some("reader") | Some("post") => Ok(Destination::ReaderPost {
                blog_id: required(object, "blog_id")?,
                post_id: required(object, "post_id")?,
            }),
            _ if object.contains_key("note_id") => Ok(Destination::NotificationsList {
                note_id: id_field(object, "note_id")?,
            }),
            Some(other) => Err(PayloadError::UnknownType(other.to_string())),
            None => Err(PayloadError::MissingField("type")),
        }
    }

    /// Like [`parse`](Self::parse), but malformed payloads go to [`Destination::Fallback`].
    pub fn from_payload(payload: &Value) -> Destination {
        Destination::parse(payload).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "malformed push payload, using fallback screen");
            Destination::Fallback
        })
    }
}

/// Why a payload could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` is not a valid id")]
    InvalidId(&'static str),

    #[error("unknown notification type `{0}`")]
    UnknownType(String),
}

fn id_field(object: &Map<String, Value>, key: &'static str) -> Result<Option<u64>, PayloadError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or(PayloadError::InvalidId(key)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| PayloadError::InvalidId(key)),
        Some(_) => Err(PayloadError::InvalidId(key)),
    }
}

fn required(object: &Map<String, Value>, key: &'static str) -> Result<u64, PayloadError> {
    id_field(object, key)?.ok_or(PayloadError::MissingField(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comment_payload() {
        let payload = json!({"type": "comment", "post_id": 42, "blog_id": "7", "aps": {"alert": "New comment"}});
        assert_eq!(
            Destination::parse(&payload),
            Ok(Destination::Comment {
                blog_id: Some(7),
                post_id: 42,
                comment_id: None
            })
        );
    }

    #[test]
    fn test_short_comment_type() {
        let payload = json!({"type": "c", "post_id": "42", "comment_id": 9});
        assert_eq!(
            Destination::parse(&payload).map(|d| d.label()),
            Ok("comment")
        );
    }

    #[test]
    fn test_reader_payload_requires_both_ids() {
        let payload = json!({"type": "reader", "post_id": 3});
        assert_eq!(
            Destination::parse(&payload),
            Err(PayloadError::MissingField("blog_id"))
        );
    }

    #[test]
    fn test_note_payload() {
        let payload = json!({"type": "like", "note_id": 1001});
        assert_eq!(
            Destination::parse(&payload),
            Ok(Destination::NotificationsList {
                note_id: Some(1001)
            })
        );
    }

    #[test]
    fn test_malformed_payloads_fall_back() {
        for payload in [
            json!("just a string"),
            json!({}),
            json!({"type": "mystery"}),
            json!({"type": "comment", "post_id": -1}),
            json!({"type": "comment", "post_id": {"nested": true}}),
        ] {
            assert_eq!(Destination::from_payload(&payload), Destination::Fallback);
        }
    }

    #[test]
    fn test_destination_serializes_with_screen_tag() {
        let json = serde_json::to_value(Destination::Fallback).unwrap();
        assert_eq!(json, json!({"screen": "fallback"}));
    }
}
