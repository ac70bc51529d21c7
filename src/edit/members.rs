//! Membership rules for ways and relations and the geometry an edit touches.

use std::collections::BTreeSet;

use crate::config::Settings;
use crate::data::{Coord, Element, ElementKey, ElementType, Member, OsmId};
use crate::errors::{Error, ErrorKind, Result};
use crate::store::ElementStore;

fn join_ids(ids: impl IntoIterator<Item = OsmId>) -> String {
    ids.into_iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}

fn id_or_blank(id: Option<OsmId>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

pub fn check_way_shape(nodes: &[OsmId], way_id: Option<OsmId>, verb: &str, settings: &Settings) -> Result<()> {
    if nodes.is_empty() {
        return Err(Error::precondition_failed(match way_id {
            Some(id) => format!("Cannot {} way {}: data is invalid.", verb, id),
            None => format!("Cannot {} way: data is invalid.", verb),
        }));
    }
    if nodes.len() > settings.max_number_of_way_nodes {
        return Err(Error::new(
            ErrorKind::TooManyWayNodes,
            format!(
                "You tried to add {} nodes to way {}, however only {} are allowed",
                nodes.len(),
                id_or_blank(way_id),
                settings.max_number_of_way_nodes
            ),
        ));
    }
    Ok(())
}

pub fn check_relation_shape(members: &[Member], relation_id: Option<OsmId>, settings: &Settings) -> Result<()> {
    if members.len() > settings.max_number_of_relation_members {
        return Err(Error::new(
            ErrorKind::TooManyRelationMembers,
            format!(
                "You tried to add {} members to relation {}, however only {} are allowed",
                members.len(),
                id_or_blank(relation_id),
                settings.max_number_of_relation_members
            ),
        ));
    }
    Ok(())
}

/// Nodes a way version adds must exist and be visible. Nodes kept from the
/// previous version are not re-checked.
pub fn check_way_nodes(nodes: &[OsmId], previous: &[OsmId], way_id: Option<OsmId>, elements: &ElementStore) -> Result<()> {
    let missing: BTreeSet<OsmId> = nodes
        .iter()
        .filter(|id| !previous.contains(id))
        .filter(|id| elements.visible(ElementKey::node(**id)).is_none())
        .copied()
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(Error::precondition_failed(format!(
        "Way {} requires the nodes with id in ({}), which either do not exist, or are not visible.",
        id_or_blank(way_id),
        join_ids(missing)
    )))
}

/// Members a relation version adds must exist and be visible.
pub fn check_relation_members(
    members: &[Member],
    previous: &[Member],
    relation_id: Option<OsmId>,
    elements: &ElementStore,
) -> Result<()> {
    let previous: BTreeSet<ElementKey> = previous.iter().map(Member::key).collect();
    for member in members {
        let key = member.key();
        if previous.contains(&key) || elements.visible(key).is_some() {
            continue;
        }
        return Err(Error::precondition_failed(format!(
            "Relation with id {} cannot be saved due to {} with id {}",
            id_or_blank(relation_id),
            member.member_type.class_name(),
            member.member_id
        )));
    }
    Ok(())
}

/// Entries that differ position by position between two ordered lists,
/// taken from both sides. Trailing entries of the longer list all count.
pub fn changed_positions<'a, T: PartialEq>(old: &'a [T], new: &'a [T]) -> Vec<&'a T> {
    let mut changed = Vec::new();
    for i in 0..old.len().max(new.len()) {
        match (old.get(i), new.get(i)) {
            (Some(a), Some(b)) if a == b => {}
            (a, b) => {
                changed.extend(a);
                changed.extend(b);
            }
        }
    }
    changed
}

/// Current coordinates of the given elements: a node gives its position, a
/// way the positions of its nodes. Relations and missing elements give
/// nothing.
pub fn resolve_coords(keys: &BTreeSet<ElementKey>, elements: &ElementStore) -> Vec<Coord> {
    let mut coords = Vec::new();
    for key in keys {
        let Some(element) = elements.visible(*key) else {
            continue;
        };
        match key.element_type {
            ElementType::Node => coords.extend(element.coord()),
            ElementType::Way => {
                for node_id in element.way_nodes() {
                    if let Some(node) = elements.visible(ElementKey::node(*node_id)) {
                        coords.extend(node.coord());
                    }
                }
            }
            ElementType::Relation => {}
        }
    }
    coords
}

fn non_relation_keys<'a, I: IntoIterator<Item = &'a Member>>(members: I) -> Vec<ElementKey> {
    members
        .into_iter()
        .filter(|m| m.member_type != ElementType::Relation)
        .map(Member::key)
        .collect()
}

/// Geometry a write from `old` to `new` touches.
///
/// With `old` absent (a create) or changed tags, every member of `new`
/// counts. Otherwise only members whose position changed. A relation that
/// gains or loses a relation member counts all its other members.
pub fn touched_coords(old: Option<&Element>, new: &Element, elements: &ElementStore) -> Vec<Coord> {
    let whole = match old {
        None => true,
        Some(old) => old.tags != new.tags,
    };
    let empty = Element::empty(new.element_type());
    let old = old.unwrap_or(&empty);

    match new.element_type() {
        ElementType::Node => old.coord().into_iter().chain(new.coord()).collect(),
        ElementType::Way => {
            let mut keys: BTreeSet<ElementKey> = changed_positions(old.way_nodes(), new.way_nodes())
                .into_iter()
                .map(|id| ElementKey::node(*id))
                .collect();
            if whole {
                keys.extend(new.way_nodes().iter().map(|id| ElementKey::node(*id)));
            }
            resolve_coords(&keys, elements)
        }
        ElementType::Relation => {
            let changed = changed_positions(old.members(), new.members());
            let any_relation = changed.iter().any(|m| m.member_type == ElementType::Relation);
            let mut keys: BTreeSet<ElementKey> = non_relation_keys(changed).into_iter().collect();
            if whole || any_relation {
                keys.extend(non_relation_keys(new.members()));
            }
            resolve_coords(&keys, elements)
        }
    }
}

/// Geometry an element covered before its deletion.
pub fn deleted_coords(old: &Element, elements: &ElementStore) -> Vec<Coord> {
    match old.element_type() {
        ElementType::Node => old.coord().into_iter().collect(),
        ElementType::Way => {
            let keys = old.way_nodes().iter().map(|id| ElementKey::node(*id)).collect();
            resolve_coords(&keys, elements)
        }
        ElementType::Relation => resolve_coords(&non_relation_keys(old.members()).into_iter().collect(), elements),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_positions() {
        assert!(changed_positions(&[1, 2, 3], &[1, 2, 3]).is_empty());
        assert_eq!(changed_positions(&[1, 2, 3], &[1, 4, 3]), vec![&2, &4]);
        assert_eq!(changed_positions(&[1, 2], &[1, 2, 5, 6]), vec![&5, &6]);
        assert_eq!(changed_positions(&[7, 8], &[]), vec![&7, &8]);
        // a reorder touches both ends
        assert_eq!(changed_positions(&[1, 2], &[2, 1]), vec![&1, &2, &2, &1]);
    }

    #[test]
    fn test_way_shape() {
        let settings = Settings { max_number_of_way_nodes: 3, ..Settings::default() };
        let err = check_way_shape(&[], None, "create", &settings).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PreconditionFailed);
        assert_eq!(err.message, "Cannot create way: data is invalid.");

        let err = check_way_shape(&[1, 2, 3, 4], Some(5), "update", &settings).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TooManyWayNodes);
        assert_eq!(err.message, "You tried to add 4 nodes to way 5, however only 3 are allowed");

        assert!(check_way_shape(&[1, 2, 3], Some(5), "update", &settings).is_ok());
    }

    #[test]
    fn test_relation_shape() {
        let settings = Settings { max_number_of_relation_members: 20, ..Settings::default() };
        let members: Vec<Member> = (1..=21).map(|id| Member::new(ElementType::Node, id, "")).collect();
        let err = check_relation_shape(&members, Some(3), &settings).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TooManyRelationMembers);
        assert_eq!(err.message, "You tried to add 21 members to relation 3, however only 20 are allowed");
        assert!(check_relation_shape(&members[..20], Some(3), &settings).is_ok());
    }

    #[test]
    fn test_missing_members_are_reported() {
        let elements = ElementStore::new();
        let err = check_way_nodes(&[3, 1, 3], &[], Some(9), &elements).unwrap_err();
        assert_eq!(
            err.message,
            "Way 9 requires the nodes with id in (1,3), which either do not exist, or are not visible."
        );

        // kept nodes are not looked up again
        assert!(check_way_nodes(&[1], &[1], Some(9), &elements).is_ok());

        let members = [Member::new(ElementType::Way, 4, "outer")];
        let err = check_relation_members(&members, &[], None, &elements).unwrap_err();
        assert_eq!(err.message, "Relation with id  cannot be saved due to Way with id 4");
    }

    #[test]
    fn test_node_touches_old_and_new_position() {
        let elements = ElementStore::new();
        let old = Element::node(Coord::new(1, 2));
        let new = Element::node(Coord::new(3, 4));
        assert_eq!(touched_coords(Some(&old), &new, &elements), vec![Coord::new(1, 2), Coord::new(3, 4)]);
        assert_eq!(touched_coords(None, &new, &elements), vec![Coord::new(3, 4)]);
    }
}
