//! Platform users and their stored credentials.

use super::impl_record;
use crate::Resource;
use crate::error::ValidationError;
use crate::validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Which app surface a user may reach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Admin dashboard; full access.
    Admin,
    /// Event-manager dashboard.
    EventManager,
    /// Consumer app.
    #[default]
    User,
}

impl Role {
    /// Wire name, identical to the serde rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::EventManager => "event_manager",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "event_manager" => Ok(Self::EventManager),
            "user" => Ok(Self::User),
            other => Err(ValidationError::Invalid {
                field: "role",
                reason: format!("unknown role '{other}'"),
            }),
        }
    }
}

/// A platform account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Login email (unique, lower-case).
    pub email: String,
    /// Access role.
    pub role: Role,
    /// Profile picture.
    pub avatar_url: Option<String>,
    /// Short profile text.
    pub bio: Option<String>,
    /// Interest tags used for event discovery.
    #[serde(default)]
    pub interests: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl_record!(User, "users", "User");

/// Create payload for [`User`].
///
/// `password` is consumed by the account handlers to create a [`Credential`];
/// it never reaches the user document.
#[derive(Debug, Clone, Deserialize)]
pub struct UserDraft {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Access role; defaults to `user`.
    #[serde(default)]
    pub role: Role,
    /// Profile picture.
    pub avatar_url: Option<String>,
    /// Short profile text.
    pub bio: Option<String>,
    /// Interest tags.
    #[serde(default)]
    pub interests: Vec<String>,
    /// Initial password.
    pub password: Option<String>,
}

/// Update payload for [`User`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    /// New display name.
    pub name: Option<String>,
    /// New role.
    pub role: Option<Role>,
    /// New profile picture.
    pub avatar_url: Option<String>,
    /// New profile text.
    pub bio: Option<String>,
    /// Replacement interest tags.
    pub interests: Option<Vec<String>>,
}

impl Resource for User {
    type Draft = UserDraft;
    type Patch = UserPatch;

    fn from_draft(id: Uuid, draft: UserDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: validate::required("name", draft.name)?,
            email: validate::email("email", draft.email)?,
            role: draft.role,
            avatar_url: validate::optional(draft.avatar_url),
            bio: validate::optional(draft.bio),
            interests: validate::tags(draft.interests),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: UserPatch, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(name) = patch.name {
            self.name = validate::required("name", name)?;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if patch.avatar_url.is_some() {
            self.avatar_url = validate::optional(patch.avatar_url);
        }
        if patch.bio.is_some() {
            self.bio = validate::optional(patch.bio);
        }
        if let Some(interests) = patch.interests {
            self.interests = validate::tags(interests);
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Password hash for a user, stored apart from the user document so it is
/// never serialized into an API response. Shares the user's id.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Same as the owning [`User::id`].
    pub id: Uuid,
    /// Login email (unique, lower-case).
    pub email: String,
    /// bcrypt hash.
    pub password_hash: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last password change.
    pub updated_at: DateTime<Utc>,
}

impl_record!(Credential, "credentials", "Credential");

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn draft() -> UserDraft {
        UserDraft {
            name: " Ada ".into(),
            email: "ADA@example.com".into(),
            role: Role::User,
            avatar_url: Some("  ".into()),
            bio: None,
            interests: vec!["music".into(), "music".into()],
            password: Some("hunter22".into()),
        }
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::EventManager).ok(), Some("\"event_manager\"".into()));
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_from_draft_normalises() {
        let now = Utc::now();
        let user = User::from_draft(Uuid::new_v4(), draft(), now).expect("valid draft");
        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.avatar_url, None);
        assert_eq!(user.interests, vec!["music".to_string()]);
        assert_eq!(user.created_at, now);
    }

    #[test]
    fn test_draft_role_defaults_to_user() {
        let draft: UserDraft =
            serde_json::from_str(r#"{"name":"Bo","email":"bo@example.com"}"#).expect("parse");
        assert_eq!(draft.role, Role::User);
        assert!(draft.password.is_none());
    }

    #[test]
    fn test_patch_rejects_blank_name_without_touching_record() {
        let now = Utc::now();
        let user = User::from_draft(Uuid::new_v4(), draft(), now).expect("valid draft");
        let mut copy = user.clone();
        let err = copy.apply_patch(
            UserPatch {
                name: Some(" ".into()),
                ..UserPatch::default()
            },
            now,
        );
        assert_eq!(err, Err(ValidationError::Empty { field: "name" }));
        assert_eq!(user.name, "Ada");
    }

    #[test]
    fn test_credential_debug_redacts_hash() {
        let now = Utc::now();
        let credential = Credential {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            password_hash: "$2b$04$secret".into(),
            created_at: now,
            updated_at: now,
        };
        assert!(!format!("{credential:?}").contains("secret"));
    }
}
