//! Chats and their messages.

use super::impl_record;
use crate::{Immutable, Resource};
use crate::error::ValidationError;
use crate::validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest accepted message body, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// A conversation between users, optionally attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Primary key; also the relay room name.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Group chat (vs. direct message).
    pub is_group: bool,
    /// Users allowed to read and post.
    pub participant_ids: Vec<Uuid>,
    /// Event this chat belongs to.
    pub event_id: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl_record!(Chat, "chats", "Chat");

impl Chat {
    /// Whether `user_id` may read and post.
    #[must_use]
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participant_ids.contains(&user_id)
    }
}

/// Create payload for [`Chat`].
#[derive(Debug, Clone, Deserialize)]
pub struct ChatDraft {
    /// Display name.
    pub name: String,
    /// Group chat; defaults to `participant_ids.len() > 2`.
    pub is_group: Option<bool>,
    /// Users allowed to read and post.
    #[serde(default)]
    pub participant_ids: Vec<Uuid>,
    /// Owning event.
    pub event_id: Option<Uuid>,
}

/// Update payload for [`Chat`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatPatch {
    /// New name.
    pub name: Option<String>,
    /// Replacement participant list.
    pub participant_ids: Option<Vec<Uuid>>,
}

fn dedupe(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

impl Resource for Chat {
    type Draft = ChatDraft;
    type Patch = ChatPatch;

    fn from_draft(id: Uuid, draft: ChatDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let participant_ids = dedupe(draft.participant_ids);
        Ok(Self {
            id,
            name: validate::required("name", draft.name)?,
            is_group: draft.is_group.unwrap_or(participant_ids.len() > 2),
            participant_ids,
            event_id: draft.event_id,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: ChatPatch, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(name) = patch.name {
            self.name = validate::required("name", name)?;
        }
        if let Some(participant_ids) = patch.participant_ids {
            self.participant_ids = dedupe(participant_ids);
        }
        self.updated_at = now;
        Ok(())
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Primary key.
    pub id: Uuid,
    /// Chat the message was posted to.
    pub chat_id: Uuid,
    /// Author.
    pub sender_id: Uuid,
    /// Body text.
    pub content: String,
    /// Post time.
    pub created_at: DateTime<Utc>,
    /// Same as `created_at`; messages are never edited.
    pub updated_at: DateTime<Utc>,
}

impl_record!(Message, "messages", "Message");

/// Create payload for [`Message`].
#[derive(Debug, Clone, Deserialize)]
pub struct MessageDraft {
    /// Chat to post to.
    pub chat_id: Uuid,
    /// Author.
    pub sender_id: Uuid,
    /// Body text.
    pub content: String,
}

fn content(value: String) -> Result<String, ValidationError> {
    let value = validate::required("content", value)?;
    if value.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ValidationError::Invalid {
            field: "content",
            reason: format!("must be at most {MAX_MESSAGE_CHARS} characters"),
        });
    }
    Ok(value)
}

impl Resource for Message {
    type Draft = MessageDraft;
    type Patch = Immutable;

    fn from_draft(id: Uuid, draft: MessageDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            chat_id: draft.chat_id,
            sender_id: draft.sender_id,
            content: content(draft.content)?,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: Immutable, _now: DateTime<Utc>) -> Result<(), ValidationError> {
        match patch {}
    }
}
