use chrono::Utc;
use serde::{ Serialize, Deserialize, Deserializer };
use std::fmt;

/// Turn count at which the special-event rules join the prompt.
pub const EVENT_TRIGGER: u32 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// The whole persisted game: ordered history plus the number of answered turns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<ChatMessage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub turns: u32,
}

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where D: Deserializer<'de>, T: Deserialize<'de> + Default
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Session {
    /// A fresh session whose only entry is the scenario greeting.
    pub fn seeded(greeting: &str) -> Self {
        Self {
            history: vec![ChatMessage::assistant(greeting)],
            turns: 0,
        }
    }

    pub fn with_user_message(mut self, content: &str) -> Self {
        self.history.push(ChatMessage::user(content));
        self
    }

    /// Appends the assistant side of an exchange and closes the turn.
    pub fn with_reply(mut self, content: &str) -> Self {
        self.history.push(ChatMessage::assistant(content));
        self.turns = self.turns.saturating_add(1);
        self
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.history.last()
    }

    pub fn awaiting_reply(&self) -> bool {
        matches!(self.last_message(), Some(msg) if msg.role == Role::User)
    }

    pub fn special_event_mode(&self) -> bool {
        self.turns >= EVENT_TRIGGER
    }

    /// True only on the turn the special-event mode switches on.
    pub fn event_banner(&self) -> bool {
        self.turns == EVENT_TRIGGER
    }
}
