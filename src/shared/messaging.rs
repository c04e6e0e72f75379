//! Conversation Wire Types
//!
//! A conversation is a per-user thread about one document. Messages are
//! appended in pairs: the user's message, then the generated assistant reply.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::SharedError;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Written by the conversation owner
    User,
    /// Produced by the reply generator
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(SharedError::unknown_variant("message role", s)),
        }
    }
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRead {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Conversation summary used by listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub document_id: Option<Uuid>,
    pub title: Option<String>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Conversation with its full message history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: ConversationResponse,
    pub messages: Vec<MessageRead>,
}

/// Request to start a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationCreateRequest {
    pub document_id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
}

/// Request to post a message
///
/// `role` defaults to `user`; callers may not post assistant messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreate {
    #[serde(default = "default_role")]
    pub role: Role,
    pub content: String,
}

fn default_role() -> Role {
    Role::User
}
