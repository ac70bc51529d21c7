use crate::config::Settings;
use crate::data::{Element, ElementType, OsmId};
use crate::errors::{Error, Result};
use crate::store::ElementStore;

use super::members::{check_relation_members, check_way_nodes, touched_coords};
use super::{check_supersedes, validate_payload, ElementEdit, Plan, ReferenceLock};

/// Supersedes the current version of an existing element. Updating a deleted
/// element brings it back.
pub struct Update {
    id: OsmId,
    element: Element,
}

impl Update {
    pub fn new(id: OsmId, element: Element) -> Self {
        Update { id, element }
    }
}

impl ElementEdit for Update {
    fn edit_name(&self) -> &'static str {
        "update"
    }

    fn request(&self) -> &Element {
        &self.element
    }

    fn target(&self) -> Option<OsmId> {
        Some(self.id)
    }

    fn reference_lock(&self) -> ReferenceLock {
        match self.element.element_type() {
            ElementType::Node => ReferenceLock::None,
            ElementType::Way | ElementType::Relation => ReferenceLock::Shared,
        }
    }

    fn validate(&self, settings: &Settings) -> Result<()> {
        validate_payload(&self.element, Some(self.id), self.edit_name(), settings)
    }

    fn check_current(&self, current: Option<&Element>) -> Result<()> {
        let current = current.ok_or_else(|| Error::precondition_failed("Cannot update an element that does not exist"))?;
        check_supersedes(&self.element, self.id, current)
    }

    fn plan(&self, current: Option<&Element>, elements: &ElementStore) -> Result<Plan> {
        let current = current.ok_or_else(|| Error::precondition_failed("Cannot update an element that does not exist"))?;
        match self.element.element_type() {
            ElementType::Node => {}
            ElementType::Way => {
                check_way_nodes(self.element.way_nodes(), current.way_nodes(), Some(self.id), elements)?
            }
            ElementType::Relation => {
                check_relation_members(self.element.members(), current.members(), Some(self.id), elements)?
            }
        }

        let mut next = self.element.clone();
        next.visible = true;
        Ok(Plan {
            touched: touched_coords(Some(current), &next, elements),
            next,
        })
    }
}
