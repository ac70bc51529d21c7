use std::sync::Arc;

use log::info;

use crate::auth::{require_moderator, Authorizer, Scope};
use crate::data::{Element, ElementKey, RedactionId};
use crate::errors::{Error, ErrorKind, Result};
use crate::store::{not_found, OsmDatabase};

/// A historical version as shown to one caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OldElement {
    pub element: Arc<Element>,
    pub redaction_id: Option<RedactionId>,
}

/// Redacted versions are visible only to moderators asking for them.
fn sees_redacted(viewer: &dyn Authorizer, show_redactions: bool) -> bool {
    show_redactions && viewer.is_moderator()
}

fn version_not_found(key: ElementKey, version: u64) -> Error {
    Error::not_found(format!("Version {} of {} was not found", version, key))
}

impl OsmDatabase {
    pub fn old_version(
        &self,
        key: ElementKey,
        version: u64,
        viewer: &dyn Authorizer,
        show_redactions: bool,
    ) -> Result<OldElement> {
        let history = self.elements.history(key).ok_or_else(|| not_found(key))?;
        let history = history.lock();
        let stored = history.get(version).ok_or_else(|| version_not_found(key, version))?;
        if stored.redaction_id.is_some() && !sees_redacted(viewer, show_redactions) {
            return Err(Error::forbidden(format!("Version {} of {} has been redacted", version, key)));
        }
        Ok(OldElement {
            element: Arc::clone(&stored.element),
            redaction_id: stored.redaction_id,
        })
    }

    /// Every version of an element the viewer may see, oldest first.
    pub fn history(&self, key: ElementKey, viewer: &dyn Authorizer, show_redactions: bool) -> Result<Vec<OldElement>> {
        let history = self.elements.history(key).ok_or_else(|| not_found(key))?;
        let history = history.lock();
        let sees_redacted = sees_redacted(viewer, show_redactions);
        Ok(history
            .versions()
            .iter()
            .filter(|stored| stored.redaction_id.is_none() || sees_redacted)
            .map(|stored| OldElement {
                element: Arc::clone(&stored.element),
                redaction_id: stored.redaction_id,
            })
            .collect())
    }

    /// Hides a historical version behind a redaction. The current version
    /// can never be redacted.
    pub fn redact(&self, key: ElementKey, version: u64, redaction_id: RedactionId, auth: &dyn Authorizer) -> Result<()> {
        let history = self.elements.history(key).ok_or_else(|| not_found(key))?;
        let mut history = history.lock();
        if history.get(version).is_none() {
            return Err(version_not_found(key, version));
        }
        if version == history.current_version() {
            return Err(Error::new(
                ErrorKind::BadRequest,
                "Cannot redact current version of element, only historical versions may be redacted.",
            ));
        }
        let user_id = require_moderator(auth, Scope::WriteRedactions)?;
        self.redaction(redaction_id)?;

        history.set_redaction(version, Some(redaction_id));
        let element = key.to_string();
        info!(element = element.as_str(), version = version, redaction = redaction_id, user = user_id; "Redacted version");
        Ok(())
    }

    pub fn unredact(&self, key: ElementKey, version: u64, auth: &dyn Authorizer) -> Result<()> {
        let history = self.elements.history(key).ok_or_else(|| not_found(key))?;
        let mut history = history.lock();
        if history.get(version).is_none() {
            return Err(version_not_found(key, version));
        }
        let user_id = require_moderator(auth, Scope::WriteRedactions)?;

        history.set_redaction(version, None);
        let element = key.to_string();
        info!(element = element.as_str(), version = version, user = user_id; "Unredacted version");
        Ok(())
    }
}
