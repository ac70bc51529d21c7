use crate::config::Settings;
use crate::data::{Element, ElementType, OsmId};
use crate::errors::Result;
use crate::store::ElementStore;

use super::members::{check_relation_members, check_way_nodes, touched_coords};
use super::{validate_payload, ElementEdit, Plan, ReferenceLock};

/// Writes version 1 of a new element. A positive id on the request is kept,
/// anything else gets the next free id.
pub struct Create {
    element: Element,
}

impl Create {
    pub fn new(element: Element) -> Self {
        Create { element }
    }
}

impl ElementEdit for Create {
    fn edit_name(&self) -> &'static str {
        "create"
    }

    fn request(&self) -> &Element {
        &self.element
    }

    fn target(&self) -> Option<OsmId> {
        None
    }

    fn reference_lock(&self) -> ReferenceLock {
        match self.element.element_type() {
            ElementType::Node => ReferenceLock::None,
            ElementType::Way | ElementType::Relation => ReferenceLock::Shared,
        }
    }

    fn validate(&self, settings: &Settings) -> Result<()> {
        validate_payload(&self.element, None, self.edit_name(), settings)
    }

    fn check_current(&self, _current: Option<&Element>) -> Result<()> {
        Ok(())
    }

    fn plan(&self, _current: Option<&Element>, elements: &ElementStore) -> Result<Plan> {
        match self.element.element_type() {
            ElementType::Node => {}
            ElementType::Way => check_way_nodes(self.element.way_nodes(), &[], None, elements)?,
            ElementType::Relation => check_relation_members(self.element.members(), &[], None, elements)?,
        }

        let mut next = self.element.clone();
        next.visible = true;
        Ok(Plan {
            touched: touched_coords(None, &next, elements),
            next,
        })
    }
}
