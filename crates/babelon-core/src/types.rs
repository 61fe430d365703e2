//! Core types for Babelon
//!
//! Group identifiers, the inbound message envelope and the resolved target
//! specification. The envelope parser never rejects input: a payload that is
//! not well-formed JSON is treated as plain text and routed with the
//! configured defaults.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical key for a private two-party conversation.
///
/// The pair is stored lexicographically sorted, so both participants map to
/// the same key regardless of which side initiated the chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    /// Build the canonical key for an unordered pair of user ids.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// The two participants, in canonical order.
    pub fn users(&self) -> (&str, &str) {
        (&self.first, &self.second)
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.second)
    }
}

/// Identifier for a broadcast group: either a named room or a private pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupId {
    /// A shared room, addressed by an arbitrary room id
    Room(String),
    /// A one-to-one conversation, addressed by its canonical pair key
    Private(PairKey),
}

impl GroupId {
    /// Group key for a shared room.
    pub fn room(room_id: impl Into<String>) -> Self {
        GroupId::Room(room_id.into())
    }

    /// Group key for a private conversation between two users.
    ///
    /// `private(a, b)` and `private(b, a)` resolve to the same key.
    pub fn private(a: &str, b: &str) -> Self {
        GroupId::Private(PairKey::new(a, b))
    }

    /// Stable string form used as the persistence key for this group.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupId::Room(room_id) => write!(f, "{room_id}"),
            GroupId::Private(pair) => write!(f, "private:{pair}"),
        }
    }
}

/// Default routing values applied when an inbound payload omits fields or is
/// not structured data at all. Derived from [`crate::Config`] at startup.
#[derive(Debug, Clone)]
pub struct EnvelopeDefaults {
    pub from_language: String,
    pub to_language: String,
    pub register: String,
}

impl Default for EnvelopeDefaults {
    fn default() -> Self {
        Self {
            from_language: "fr".to_string(),
            to_language: "en".to_string(),
            register: "courant".to_string(),
        }
    }
}

/// Wire form of an inbound chat payload. All fields optional so that a
/// partially structured message still parses and only the missing pieces
/// fall back to defaults.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    #[serde(default)]
    content: String,
    from_language: Option<String>,
    to_languages: Option<Vec<String>>,
    #[serde(alias = "targetUserID")]
    target_user_id: Option<String>,
    register: Option<String>,
}

/// A fully resolved inbound message, after the degrade-to-default parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEnvelope {
    pub content: String,
    pub from_language: String,
    pub to_languages: Option<Vec<String>>,
    pub target_user_id: Option<String>,
    pub register: String,
}

impl MessageEnvelope {
    /// Parse an inbound payload, degrading malformed input to defaults.
    ///
    /// A payload that is not a JSON object becomes a plain-text message with
    /// the default source language, target language and register. Malformed
    /// input is never rejected.
    pub fn parse(raw: &str, defaults: &EnvelopeDefaults) -> Self {
        match serde_json::from_str::<RawEnvelope>(raw) {
            Ok(envelope) => Self {
                content: envelope.content,
                from_language: envelope
                    .from_language
                    .unwrap_or_else(|| defaults.from_language.clone()),
                to_languages: envelope.to_languages,
                target_user_id: envelope.target_user_id,
                register: envelope
                    .register
                    .unwrap_or_else(|| defaults.register.clone()),
            },
            Err(_) => Self {
                content: raw.to_string(),
                from_language: defaults.from_language.clone(),
                to_languages: None,
                target_user_id: None,
                register: defaults.register.clone(),
            },
        }
    }

    /// The tagged target specification for this message.
    ///
    /// An explicit recipient wins over a language list; a message with
    /// neither is routed to the default target language.
    pub fn target_spec(&self, defaults: &EnvelopeDefaults) -> TargetSpec {
        if let Some(user_id) = &self.target_user_id {
            return TargetSpec::Recipient(user_id.clone());
        }
        match &self.to_languages {
            Some(languages) if !languages.is_empty() => {
                TargetSpec::Languages(languages.clone())
            }
            _ => TargetSpec::Languages(vec![defaults.to_language.clone()]),
        }
    }
}

/// Where a message should be delivered, resolved by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// Translate into this explicit set of languages
    Languages(Vec<String>),
    /// Translate into the stored preference of this user
    Recipient(String),
}

/// Stored language preference of a user, read-only to the relay core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePreference {
    pub default_language: String,
    pub register: String,
}

/// One persisted chat message, as returned by the history queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub sender: String,
    pub group: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}
