use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};

use crate::errors::{Error, Result};

use super::changeset::ChangesetId;
use super::geo::Coord;
use super::tags::Tags;

pub type OsmId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    Node,
    Way,
    Relation,
}

impl ElementType {
    pub const ALL: [ElementType; 3] = [ElementType::Node, ElementType::Way, ElementType::Relation];

    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Node => "node",
            ElementType::Way => "way",
            ElementType::Relation => "relation",
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            ElementType::Node => "Node",
            ElementType::Way => "Way",
            ElementType::Relation => "Relation",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            ElementType::Node => "nodes",
            ElementType::Way => "ways",
            ElementType::Relation => "relations",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ElementType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s || ty.class_name() == s)
            .ok_or_else(|| Error::bad_user_input(format!("Unknown element type {}", s)))
    }
}

/// Identity of an element across all of its versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey {
    pub element_type: ElementType,
    pub id: OsmId,
}

impl ElementKey {
    pub fn new(element_type: ElementType, id: OsmId) -> Self {
        ElementKey { element_type, id }
    }

    pub fn node(id: OsmId) -> Self {
        ElementKey::new(ElementType::Node, id)
    }

    pub fn way(id: OsmId) -> Self {
        ElementKey::new(ElementType::Way, id)
    }

    pub fn relation(id: OsmId) -> Self {
        ElementKey::new(ElementType::Relation, id)
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.element_type, self.id)
    }
}

/// One entry of a relation's ordered member list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    pub member_type: ElementType,
    pub member_id: OsmId,
    pub role: String,
}

impl Member {
    pub fn new(member_type: ElementType, member_id: OsmId, role: impl Into<String>) -> Self {
        Member {
            member_type,
            member_id,
            role: role.into(),
        }
    }

    pub fn key(&self) -> ElementKey {
        ElementKey::new(self.member_type, self.member_id)
    }
}

/// Kind-specific payload: a location or an ordered member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementData {
    Node { coord: Option<Coord> },
    Way { nodes: Vec<OsmId> },
    Relation { members: Vec<Member> },
}

impl ElementData {
    pub fn empty(element_type: ElementType) -> Self {
        match element_type {
            ElementType::Node => ElementData::Node { coord: None },
            ElementType::Way => ElementData::Way { nodes: Vec::new() },
            ElementType::Relation => ElementData::Relation { members: Vec::new() },
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            ElementData::Node { .. } => ElementType::Node,
            ElementData::Way { .. } => ElementType::Way,
            ElementData::Relation { .. } => ElementType::Relation,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ElementData::Node { coord } => coord.is_none(),
            ElementData::Way { nodes } => nodes.is_empty(),
            ElementData::Relation { members } => members.is_empty(),
        }
    }
}

/// A node, way or relation version.
///
/// Stored versions always carry `id`, `version`, `changeset_id` and
/// `timestamp`. On a write request `version` is the version the caller
/// expects to supersede and `id` may be absent for a create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: Option<OsmId>,
    pub version: Option<u64>,
    pub changeset_id: Option<ChangesetId>,
    pub timestamp: Option<DateTime<Utc>>,
    pub visible: bool,
    pub tags: Tags,
    pub data: ElementData,
}

impl Element {
    pub fn new(data: ElementData) -> Self {
        Element {
            id: None,
            version: None,
            changeset_id: None,
            timestamp: None,
            visible: true,
            tags: Tags::new(),
            data,
        }
    }

    pub fn node(coord: Coord) -> Self {
        Element::new(ElementData::Node { coord: Some(coord) })
    }

    pub fn way(nodes: Vec<OsmId>) -> Self {
        Element::new(ElementData::Way { nodes })
    }

    pub fn relation(members: Vec<Member>) -> Self {
        Element::new(ElementData::Relation { members })
    }

    pub fn empty(element_type: ElementType) -> Self {
        Element::new(ElementData::empty(element_type))
    }

    pub fn with_id(mut self, id: OsmId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_changeset(mut self, changeset_id: ChangesetId) -> Self {
        self.changeset_id = Some(changeset_id);
        self
    }

    pub fn with_tag(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
        self.tags.insert(k, v);
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    pub fn key(&self) -> Option<ElementKey> {
        self.id.map(|id| ElementKey::new(self.element_type(), id))
    }

    pub fn coord(&self) -> Option<Coord> {
        match &self.data {
            ElementData::Node { coord } => *coord,
            _ => None,
        }
    }

    pub fn way_nodes(&self) -> &[OsmId] {
        match &self.data {
            ElementData::Way { nodes } => nodes,
            _ => &[],
        }
    }

    pub fn members(&self) -> &[Member] {
        match &self.data {
            ElementData::Relation { members } => members,
            _ => &[],
        }
    }

    /// Every element this version points at, in order, with repeats.
    pub fn referenced_keys(&self) -> Vec<ElementKey> {
        match &self.data {
            ElementData::Node { .. } => Vec::new(),
            ElementData::Way { nodes } => nodes.iter().map(|id| ElementKey::node(*id)).collect(),
            ElementData::Relation { members } => members.iter().map(Member::key).collect(),
        }
    }

    pub fn references(&self, key: ElementKey) -> bool {
        match &self.data {
            ElementData::Node { .. } => false,
            ElementData::Way { nodes } => key.element_type == ElementType::Node && nodes.contains(&key.id),
            ElementData::Relation { members } => members.iter().any(|m| m.key() == key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_parse() {
        assert_eq!("way".parse::<ElementType>().unwrap(), ElementType::Way);
        assert_eq!("Relation".parse::<ElementType>().unwrap(), ElementType::Relation);
        assert!("changeset".parse::<ElementType>().is_err());
    }

    #[test]
    fn test_references() {
        let relation = Element::relation(vec![
            Member::new(ElementType::Node, 1, "stop"),
            Member::new(ElementType::Way, 2, ""),
            Member::new(ElementType::Node, 1, "platform"),
        ]);
        assert!(relation.references(ElementKey::node(1)));
        assert!(relation.references(ElementKey::way(2)));
        assert!(!relation.references(ElementKey::node(2)));
        assert_eq!(relation.referenced_keys().len(), 3);

        let way = Element::way(vec![4, 5, 4]);
        assert!(way.references(ElementKey::node(5)));
        assert!(!way.references(ElementKey::way(5)));
    }

    #[test]
    fn test_empty_payloads() {
        for ty in ElementType::ALL {
            let element = Element::empty(ty);
            assert_eq!(element.element_type(), ty);
            assert!(element.data.is_empty());
        }
        assert_eq!(ElementKey::way(9).to_string(), "way/9");
    }
}
