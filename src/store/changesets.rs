use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::auth::Authorizer;
use crate::config::Settings;
use crate::data::{Changeset, ChangesetId, Coord, Tags, UserId};
use crate::errors::{Error, ErrorKind, Result};

pub struct ChangesetStore {
    changesets: RwLock<HashMap<ChangesetId, Arc<Mutex<Changeset>>>>,
    next_id: AtomicI64,
}

fn missing() -> Error {
    Error::new(ErrorKind::ChangesetMissing, "You need to supply a changeset to be able to make a change")
}

fn closed_message(changeset: &Changeset) -> String {
    format!(
        "The changeset {} was closed at {}",
        changeset.id,
        changeset.closed_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Ownership first, then the open state.
fn check_writable(changeset: &Changeset, auth: &dyn Authorizer, now: DateTime<Utc>, settings: &Settings) -> Result<()> {
    if !auth.owns_changeset(changeset) {
        return Err(Error::new(ErrorKind::UserChangesetMismatch, "The user doesn't own that changeset"));
    }
    if !changeset.is_open(now, settings) {
        return Err(Error::new(ErrorKind::ChangesetAlreadyClosed, closed_message(changeset)));
    }
    Ok(())
}

impl ChangesetStore {
    pub fn new() -> Self {
        ChangesetStore {
            changesets: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn entry(&self, id: ChangesetId) -> Option<Arc<Mutex<Changeset>>> {
        self.changesets.read().get(&id).cloned()
    }

    pub fn open(&self, user_id: UserId, tags: Tags, now: DateTime<Utc>, settings: &Settings) -> Changeset {
        let id = self.next_id.fetch_add(1, Ordering::AcqRel);
        let mut changeset = Changeset::new(id, user_id, now, settings);
        changeset.tags = tags;
        self.changesets.write().insert(id, Arc::new(Mutex::new(changeset.clone())));
        changeset
    }

    /// Snapshot of a changeset.
    pub fn get(&self, id: ChangesetId) -> Option<Changeset> {
        self.entry(id).map(|c| c.lock().clone())
    }

    /// Checks that a write against `id` would currently be accepted, without
    /// recording anything.
    pub fn check(&self, id: Option<ChangesetId>, auth: &dyn Authorizer, now: DateTime<Utc>, settings: &Settings) -> Result<ChangesetId> {
        let id = id.ok_or_else(missing)?;
        let entry = self.entry(id).ok_or_else(missing)?;
        let changeset = entry.lock();
        check_writable(&changeset, auth, now, settings)?;
        Ok(id)
    }

    /// Folds one element write into the changeset. The checks are repeated
    /// under the changeset lock, so a close racing the write is honoured.
    pub fn record_edit(
        &self,
        id: ChangesetId,
        auth: &dyn Authorizer,
        touched: &[Coord],
        now: DateTime<Utc>,
        settings: &Settings,
    ) -> Result<Changeset> {
        let entry = self.entry(id).ok_or_else(missing)?;
        let mut changeset = entry.lock();
        check_writable(&changeset, auth, now, settings)?;
        changeset.update_bbox(touched);
        changeset.update_closed_at(now, settings);
        changeset.add_changes(1);
        if changeset.num_changes >= settings.max_changes_per_changeset {
            changeset.close(now);
        }
        Ok(changeset.clone())
    }

    pub fn close(&self, id: ChangesetId, auth: &dyn Authorizer, now: DateTime<Utc>, settings: &Settings) -> Result<Changeset> {
        let entry = self
            .entry(id)
            .ok_or_else(|| Error::not_found(format!("Changeset {} was not found", id)))?;
        let mut changeset = entry.lock();
        check_writable(&changeset, auth, now, settings)?;
        changeset.close(now);
        Ok(changeset.clone())
    }
}

impl Default for ChangesetStore {
    fn default() -> Self {
        Self::new()
    }
}
