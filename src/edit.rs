pub mod create;
pub mod delete;
pub mod members;
pub mod update;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info};

use crate::auth::{require_writer, Authorizer};
use crate::config::Settings;
use crate::data::{ChangesetId, Coord, Element, ElementKey, ElementType, OsmId};
use crate::errors::{Error, ErrorKind, Result};
use crate::store::{ElementStore, OsmDatabase};

pub use self::create::Create;
pub use self::delete::Delete;
pub use self::update::Update;

/// How an edit holds the database-wide referential lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceLock {
    None,
    Shared,
    Exclusive,
}

/// What an edit writes once every check has passed.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Coordinates the changeset bounding box must cover.
    pub touched: Vec<Coord>,
    /// Next version without its envelope (id, version, changeset, timestamp).
    pub next: Element,
}

/// One kind of element write, split into the stages the engine runs while
/// the element is locked.
pub trait ElementEdit {
    fn edit_name(&self) -> &'static str;

    /// The payload sent by the caller.
    fn request(&self) -> &Element;

    /// Element the edit supersedes, `None` for a create.
    fn target(&self) -> Option<OsmId>;

    fn reference_lock(&self) -> ReferenceLock;

    /// Checks that need no stored state.
    fn validate(&self, settings: &Settings) -> Result<()>;

    /// Compares the request with the stored current version.
    fn check_current(&self, current: Option<&Element>) -> Result<()>;

    /// Checks referenced elements and works out the next version.
    fn plan(&self, current: Option<&Element>, elements: &ElementStore) -> Result<Plan>;

    fn element_type(&self) -> ElementType {
        self.request().element_type()
    }
}

fn stamp(mut next: Element, id: OsmId, version: u64, changeset_id: ChangesetId, now: DateTime<Utc>) -> Element {
    next.id = Some(id);
    next.version = Some(version);
    next.changeset_id = Some(changeset_id);
    next.timestamp = Some(now);
    next
}

impl OsmDatabase {
    /// Writes a new element and returns its first version.
    pub fn create_element(&self, element: Element, auth: &dyn Authorizer) -> Result<Arc<Element>> {
        self.apply(&Create::new(element), auth)
    }

    /// Supersedes version `element.version` of element `id`.
    pub fn update_element(&self, id: OsmId, element: Element, auth: &dyn Authorizer) -> Result<Arc<Element>> {
        self.apply(&Update::new(id, element), auth)
    }

    /// Writes a deletion version of element `id`. Only the id, version and
    /// changeset of `element` are used. Any geometry, members or tags in the
    /// request are discarded and the stored deletion version is empty.
    pub fn delete_element(&self, id: OsmId, element: Element, auth: &dyn Authorizer) -> Result<Arc<Element>> {
        self.apply(&Delete::new(id, element), auth)
    }

    pub fn apply<E: ElementEdit>(&self, edit: &E, auth: &dyn Authorizer) -> Result<Arc<Element>> {
        let element_type = edit.element_type().as_str();
        info!(edit = edit.edit_name(), element_type = element_type; "Starting edit");
        match self.run(edit, auth) {
            Ok(written) => {
                info!(
                    edit = edit.edit_name(),
                    element_type = element_type,
                    id = written.id.unwrap_or_default(),
                    version = written.version.unwrap_or_default(),
                    changeset = written.changeset_id.unwrap_or_default();
                    "Edit committed"
                );
                Ok(written)
            }
            Err(err) => {
                error!(edit = edit.edit_name(), element_type = element_type, err = err.message.as_str(); "Edit failed with error");
                Err(err)
            }
        }
    }

    fn run<E: ElementEdit>(&self, edit: &E, auth: &dyn Authorizer) -> Result<Arc<Element>> {
        require_writer(auth)?;
        let lock = edit.reference_lock();
        let _shared = (lock == ReferenceLock::Shared).then(|| self.referential.read());
        let _exclusive = (lock == ReferenceLock::Exclusive).then(|| self.referential.write());
        match edit.target() {
            None => self.run_create(edit, auth),
            Some(id) => self.run_existing(edit, ElementKey::new(edit.element_type(), id), auth),
        }
    }

    fn run_create<E: ElementEdit>(&self, edit: &E, auth: &dyn Authorizer) -> Result<Arc<Element>> {
        let now = Utc::now();
        edit.check_current(None)?;
        let changeset_id = self.changesets.check(edit.request().changeset_id, auth, now, &self.settings)?;
        edit.validate(&self.settings)?;
        let plan = edit.plan(None, &self.elements)?;

        self.elements.insert_new(edit.element_type(), edit.request().id, |id| {
            self.changesets
                .record_edit(changeset_id, auth, &plan.touched, now, &self.settings)?;
            Ok(stamp(plan.next, id, 1, changeset_id, now))
        })
    }

    fn run_existing<E: ElementEdit>(&self, edit: &E, key: ElementKey, auth: &dyn Authorizer) -> Result<Arc<Element>> {
        let history = self.elements.history(key).ok_or_else(|| {
            Error::precondition_failed(format!("Cannot {} {}: it does not exist", edit.edit_name(), key))
        })?;
        let mut history = history.lock();
        let current = history
            .current()
            .cloned()
            .ok_or_else(|| Error::precondition_failed(format!("Cannot {} {}: it has no versions", edit.edit_name(), key)))?;

        edit.check_current(Some(&current))?;
        let now = Utc::now();
        let changeset_id = self.changesets.check(edit.request().changeset_id, auth, now, &self.settings)?;
        edit.validate(&self.settings)?;
        let plan = edit.plan(Some(&current), &self.elements)?;

        self.changesets
            .record_edit(changeset_id, auth, &plan.touched, now, &self.settings)?;
        let version = history.current_version() + 1;
        Ok(self.elements.append(&mut history, stamp(plan.next, key.id, version, changeset_id, now)))
    }
}

/// Version and id checks shared by update and delete.
pub(crate) fn check_supersedes(request: &Element, target: OsmId, current: &Element) -> Result<()> {
    let class_name = current.element_type().class_name();
    if request.id != Some(target) {
        return Err(Error::precondition_failed(format!(
            "New and old IDs don't match on {}. {} != {}.",
            class_name,
            target,
            request.id.map(|id| id.to_string()).unwrap_or_default()
        )));
    }
    let provided = request
        .version
        .ok_or_else(|| Error::bad_xml("Version is required when updating"))?;
    let server = current.version.unwrap_or_default();
    if provided != server {
        return Err(Error::new(
            ErrorKind::VersionMismatch,
            format!(
                "Version mismatch: Provided {}, server had: {} of {} {}",
                provided, server, class_name, target
            ),
        ));
    }
    Ok(())
}

/// Payload checks shared by create and update.
pub(crate) fn validate_payload(element: &Element, id: Option<OsmId>, verb: &str, settings: &Settings) -> Result<()> {
    let element_type = element.element_type();
    element.tags.validate(element_type, id, settings.max_tag_length)?;
    match element_type {
        ElementType::Node => {
            let coord = element
                .coord()
                .ok_or_else(|| Error::bad_xml("Cannot parse valid node: lat/lon missing"))?;
            if !coord.in_world() {
                return Err(Error::bad_user_input("The node is outside this world"));
            }
        }
        ElementType::Way => members::check_way_shape(element.way_nodes(), id, verb, settings)?,
        ElementType::Relation => members::check_relation_shape(element.members(), id, settings)?,
    }
    Ok(())
}
