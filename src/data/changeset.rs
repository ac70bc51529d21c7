use chrono::{DateTime, Utc};

use crate::config::Settings;

use super::geo::{BoundingBox, Coord};
use super::tags::Tags;

pub type ChangesetId = i64;
pub type UserId = i64;

/// Transaction container grouping element writes of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changeset {
    pub id: ChangesetId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub num_changes: u64,
    pub bbox: Option<BoundingBox>,
    pub tags: Tags,
}

impl Changeset {
    pub fn new(id: ChangesetId, user_id: UserId, now: DateTime<Utc>, settings: &Settings) -> Self {
        Changeset {
            id,
            user_id,
            created_at: now,
            closed_at: now + settings.idle_timeout(),
            num_changes: 0,
            bbox: None,
            tags: Tags::new(),
        }
    }

    pub fn is_open(&self, now: DateTime<Utc>, settings: &Settings) -> bool {
        now < self.closed_at && self.num_changes < settings.max_changes_per_changeset
    }

    pub fn min_lon(&self) -> Option<i64> {
        self.bbox.map(|b| b.min_lon)
    }

    pub fn min_lat(&self) -> Option<i64> {
        self.bbox.map(|b| b.min_lat)
    }

    pub fn max_lon(&self) -> Option<i64> {
        self.bbox.map(|b| b.max_lon)
    }

    pub fn max_lat(&self) -> Option<i64> {
        self.bbox.map(|b| b.max_lat)
    }

    /// Grows the box to cover `coords`. The box never shrinks.
    pub fn update_bbox(&mut self, coords: &[Coord]) {
        let Some(update) = BoundingBox::from_coords(coords) else {
            return;
        };
        self.bbox = Some(match self.bbox {
            Some(bbox) => bbox.union(&update),
            None => update,
        });
    }

    pub fn add_changes(&mut self, count: u64) {
        self.num_changes += count;
    }

    /// Pushes the closing deadline out by the idle timeout, capped at the
    /// maximum open time.
    pub fn update_closed_at(&mut self, now: DateTime<Utc>, settings: &Settings) {
        if !self.is_open(now, settings) {
            return;
        }
        let extended = now + settings.idle_timeout();
        let limit = self.created_at + settings.max_open_time();
        self.closed_at = extended.min(limit);
    }

    pub fn close(&mut self, now: DateTime<Utc>) {
        if now < self.closed_at {
            self.closed_at = now;
        }
    }
}
