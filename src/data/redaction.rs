use chrono::{DateTime, Utc};

use super::changeset::UserId;

pub type RedactionId = i64;

/// Reason record attached to hidden historical versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    pub id: RedactionId,
    pub title: String,
    pub description: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}
