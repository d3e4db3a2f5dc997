//! Player identity: a registered user id or an anonymous guest token.
use serde::{Deserialize, Serialize};

/// The unit that owns a guess history.
///
/// Guests are identified by an opaque token string provisioned by the caller
/// (stable across requests via a long-lived cookie); the engine never mints
/// identities itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    User(u64),
    Guest(String),
}

impl Identity {
    /// Stable identifier string, e.g. `user:42` or `guest:T1`.
    /// Used as the uniqueness key for clue-usage rows.
    #[must_use]
    pub fn tag(&self) -> String {
        match self {
            Self::User(id) => format!("user:{id}"),
            Self::Guest(token) => format!("guest:{token}"),
        }
    }

    /// Player kind label carried on analytics rows.
    #[must_use]
    pub const fn player_type(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Guest(_) => "guest",
        }
    }

    /// Registered user id, if this identity is a user.
    #[must_use]
    pub const fn user_id(&self) -> Option<u64> {
        match self {
            Self::User(id) => Some(*id),
            Self::Guest(_) => None,
        }
    }

    /// Guest token, if this identity is anonymous.
    #[must_use]
    pub fn guest_token(&self) -> Option<&str> {
        match self {
            Self::User(_) => None,
            Self::Guest(token) => Some(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_kind_prefixed() {
        assert_eq!(Identity::User(7).tag(), "user:7");
        assert_eq!(Identity::Guest("T1".into()).tag(), "guest:T1");
    }
}
