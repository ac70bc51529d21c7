use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use log::info;
use parking_lot::RwLock;

use crate::auth::{require_moderator, require_writer, Authorizer, Scope};
use crate::config::Settings;
use crate::data::{Changeset, ChangesetId, Element, ElementKey, ElementType, OsmId, Redaction, RedactionId, Tags};
use crate::errors::{Error, ErrorKind, Result};

pub mod changesets;
pub mod elements;
pub mod redactions;

pub use self::changesets::ChangesetStore;
pub use self::elements::{ElementStore, History, StoredVersion};
pub use self::redactions::RedactionStore;

/// In-memory OSM database: element histories, changesets and redactions.
///
/// Writes to different elements proceed in parallel. Way and relation writes
/// share `referential`; deletes take it exclusively so a referrer can not
/// appear between the in-use check and the deletion.
pub struct OsmDatabase {
    pub(crate) settings: Settings,
    pub(crate) elements: ElementStore,
    pub(crate) changesets: ChangesetStore,
    pub(crate) redactions: RedactionStore,
    pub(crate) referential: RwLock<()>,
}

pub(crate) fn not_found(key: ElementKey) -> Error {
    Error::not_found(format!("Couldn't find {} with 'id'={}", key.element_type.class_name(), key.id))
}

pub(crate) fn gone(key: ElementKey) -> Error {
    Error::new(
        ErrorKind::Gone,
        format!("The {} with the id {} has already been deleted", key.element_type, key.id),
    )
}

impl OsmDatabase {
    pub fn new(settings: Settings) -> Self {
        OsmDatabase {
            settings,
            elements: ElementStore::new(),
            changesets: ChangesetStore::new(),
            redactions: RedactionStore::new(),
            referential: RwLock::new(()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Latest version of an element, deleted or not.
    pub fn current(&self, key: ElementKey) -> Result<Arc<Element>> {
        self.elements.current(key).ok_or_else(|| not_found(key))
    }

    /// Latest version of an element that has not been deleted.
    pub fn show(&self, key: ElementKey) -> Result<Arc<Element>> {
        let element = self.current(key)?;
        if !element.visible {
            return Err(gone(key));
        }
        Ok(element)
    }

    /// Current versions for a comma separated id list such as `"1,2,3"`.
    pub fn current_many(&self, element_type: ElementType, ids: Option<&str>) -> Result<Vec<Arc<Element>>> {
        let plural = element_type.plural();
        let ids = ids.ok_or_else(|| {
            Error::bad_user_input(format!(
                "The parameter {} is required, and must be of the form {}=id[,id[,id...]]",
                plural, plural
            ))
        })?;

        let mut seen = HashSet::new();
        let mut parsed: Vec<OsmId> = Vec::new();
        for id in ids.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let id: OsmId = id.parse()?;
            if seen.insert(id) {
                parsed.push(id);
            }
        }
        if parsed.is_empty() {
            return Err(Error::bad_user_input(format!("No {} were given to search for", plural)));
        }

        parsed.into_iter().map(|id| self.current(ElementKey::new(element_type, id))).collect()
    }

    pub fn ways_using_node(&self, node_id: OsmId) -> Vec<Arc<Element>> {
        self.elements.visible_where(ElementType::Way, |way| way.way_nodes().contains(&node_id))
    }

    pub fn containing_relations(&self, key: ElementKey) -> Vec<Arc<Element>> {
        self.elements.visible_where(ElementType::Relation, |relation| relation.references(key))
    }

    pub fn open_changeset(&self, auth: &dyn Authorizer, tags: Tags) -> Result<Changeset> {
        let user_id = require_writer(auth)?;
        tags.validate_changeset(self.settings.max_tag_length)?;
        let changeset = self.changesets.open(user_id, tags, Utc::now(), &self.settings);
        info!(changeset = changeset.id, user = user_id; "Opened changeset");
        Ok(changeset)
    }

    pub fn changeset(&self, id: ChangesetId) -> Result<Changeset> {
        self.changesets
            .get(id)
            .ok_or_else(|| Error::not_found(format!("Changeset {} was not found", id)))
    }

    pub fn close_changeset(&self, id: ChangesetId, auth: &dyn Authorizer) -> Result<Changeset> {
        require_writer(auth)?;
        let changeset = self.changesets.close(id, auth, Utc::now(), &self.settings)?;
        info!(changeset = id, num_changes = changeset.num_changes; "Closed changeset");
        Ok(changeset)
    }

    pub fn create_redaction(&self, title: &str, description: &str, auth: &dyn Authorizer) -> Result<Redaction> {
        let user_id = require_moderator(auth, Scope::WriteRedactions)?;
        if title.trim().is_empty() {
            return Err(Error::new(ErrorKind::Invalid, "Redaction title can't be blank"));
        }
        let redaction = self
            .redactions
            .create(title.to_string(), description.to_string(), user_id, Utc::now());
        info!(redaction = redaction.id, user = user_id; "Created redaction");
        Ok(redaction)
    }

    pub fn redaction(&self, id: RedactionId) -> Result<Redaction> {
        self.redactions
            .get(id)
            .ok_or_else(|| Error::not_found(format!("Redaction {} was not found", id)))
    }
}

impl Default for OsmDatabase {
    fn default() -> Self {
        OsmDatabase::new(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Session, User};

    #[test]
    fn test_current_many_parameter_errors() {
        let db = OsmDatabase::default();

        let err = db.current_many(ElementType::Node, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadUserInput);
        assert_eq!(
            err.message,
            "The parameter nodes is required, and must be of the form nodes=id[,id[,id...]]"
        );

        let err = db.current_many(ElementType::Way, Some("")).unwrap_err();
        assert_eq!(err.message, "No ways were given to search for");

        let err = db.current_many(ElementType::Relation, Some(" , ")).unwrap_err();
        assert_eq!(err.message, "No relations were given to search for");

        let err = db.current_many(ElementType::Node, Some("1,x")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadUserInput);

        let err = db.current_many(ElementType::Node, Some("1")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_changeset_lifecycle() {
        let db = OsmDatabase::default();
        let session = Session::new(User::new(4, "mapper"));

        assert_eq!(db.open_changeset(&Session::anonymous(), Tags::new()).unwrap_err().kind, ErrorKind::Unauthorized);

        let cs = db.open_changeset(&session, Tags::new().with("comment", "survey")).unwrap();
        assert_eq!(cs.user_id, 4);
        assert_eq!(db.changeset(cs.id).unwrap().tags.get("comment"), Some("survey"));

        let closed = db.close_changeset(cs.id, &session).unwrap();
        assert!(!closed.is_open(Utc::now(), db.settings()));
        assert_eq!(db.changeset(404).unwrap_err().kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_create_redaction_needs_moderator() {
        let db = OsmDatabase::default();
        let user = Session::new(User::new(1, "u"));
        let moderator = Session::new(User::new(2, "m").moderator());

        assert_eq!(db.create_redaction("t", "d", &user).unwrap_err().kind, ErrorKind::Forbidden);
        let redaction = db.create_redaction("Copyright", "Copied from a map", &moderator).unwrap();
        assert_eq!(db.redaction(redaction.id).unwrap().title, "Copyright");
        assert_eq!(db.create_redaction(" ", "d", &moderator).unwrap_err().kind, ErrorKind::Invalid);
    }
}
