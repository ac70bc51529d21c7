use crate::config::Settings;
use crate::data::{Element, ElementKey, ElementType, OsmId};
use crate::errors::{Error, Result};
use crate::store::{gone, ElementStore};

use super::members::deleted_coords;
use super::{check_supersedes, ElementEdit, Plan, ReferenceLock};

/// Writes a deletion version. The stored payload and tags are emptied.
pub struct Delete {
    id: OsmId,
    element: Element,
}

impl Delete {
    pub fn new(id: OsmId, element: Element) -> Self {
        Delete { id, element }
    }

    fn key(&self) -> ElementKey {
        ElementKey::new(self.element.element_type(), self.id)
    }

    fn check_unused(&self, elements: &ElementStore) -> Result<()> {
        let key = self.key();
        let ids = |found: Vec<std::sync::Arc<Element>>| {
            found
                .iter()
                .filter_map(|e| e.id)
                .filter(|id| key.element_type != ElementType::Relation || *id != key.id)
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
        };

        if key.element_type == ElementType::Node {
            let ways = ids(elements.visible_where(ElementType::Way, |way| way.references(key)));
            if !ways.is_empty() {
                return Err(Error::precondition_failed(format!(
                    "Node {} is still used by ways {}.",
                    key.id,
                    ways.join(",")
                )));
            }
        }

        let relations = ids(elements.visible_where(ElementType::Relation, |relation| relation.references(key)));
        if relations.is_empty() {
            return Ok(());
        }
        Err(Error::precondition_failed(match key.element_type {
            ElementType::Node => format!("Node {} is still used by relations {}.", key.id, relations.join(",")),
            ElementType::Way => format!("Way {} is still used by relations {}.", key.id, relations.join(",")),
            ElementType::Relation => format!("The relation {} is used in relation {}.", key.id, relations[0]),
        }))
    }
}

impl ElementEdit for Delete {
    fn edit_name(&self) -> &'static str {
        "delete"
    }

    fn request(&self) -> &Element {
        &self.element
    }

    fn target(&self) -> Option<OsmId> {
        Some(self.id)
    }

    fn reference_lock(&self) -> ReferenceLock {
        ReferenceLock::Exclusive
    }

    /// The request's payload is never stored, so there is nothing to check.
    fn validate(&self, _settings: &Settings) -> Result<()> {
        Ok(())
    }

    fn check_current(&self, current: Option<&Element>) -> Result<()> {
        let current = current.ok_or_else(|| Error::precondition_failed("Cannot delete an element that does not exist"))?;
        check_supersedes(&self.element, self.id, current)
    }

    fn plan(&self, current: Option<&Element>, elements: &ElementStore) -> Result<Plan> {
        let current = current.ok_or_else(|| Error::precondition_failed("Cannot delete an element that does not exist"))?;
        if !current.visible {
            return Err(gone(self.key()));
        }
        self.check_unused(elements)?;

        let mut next = Element::empty(self.element.element_type());
        next.visible = false;
        Ok(Plan {
            touched: deleted_coords(current, elements),
            next,
        })
    }
}
