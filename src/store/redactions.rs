use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::data::{Redaction, RedactionId, UserId};

pub struct RedactionStore {
    redactions: RwLock<HashMap<RedactionId, Redaction>>,
}

impl RedactionStore {
    pub fn new() -> Self {
        RedactionStore {
            redactions: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(&self, title: String, description: String, user_id: UserId, now: DateTime<Utc>) -> Redaction {
        let mut redactions = self.redactions.write();
        let id = redactions.keys().max().copied().unwrap_or(0) + 1;
        let redaction = Redaction {
            id,
            title,
            description,
            user_id,
            created_at: now,
        };
        redactions.insert(id, redaction.clone());
        redaction
    }

    pub fn get(&self, id: RedactionId) -> Option<Redaction> {
        self.redactions.read().get(&id).cloned()
    }
}

impl Default for RedactionStore {
    fn default() -> Self {
        Self::new()
    }
}
