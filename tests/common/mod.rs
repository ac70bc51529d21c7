//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use osm_history::data::{ChangesetId, Coord, Element, ElementType, Member, OsmId, Tags};
use osm_history::{OsmDatabase, Session, Settings, User};

pub fn db() -> OsmDatabase {
    OsmDatabase::new(Settings::default())
}

pub fn db_with(settings: Settings) -> OsmDatabase {
    OsmDatabase::new(settings)
}

pub fn mapper(id: i64) -> Session {
    Session::new(User::new(id, format!("mapper {}", id)))
}

pub fn moderator(id: i64) -> Session {
    Session::new(User::new(id, format!("moderator {}", id)).moderator())
}

pub fn open_changeset(db: &OsmDatabase, session: &Session) -> ChangesetId {
    db.open_changeset(session, Tags::new()).unwrap().id
}

/// Node at the given scaled position.
pub fn create_node(db: &OsmDatabase, session: &Session, changeset: ChangesetId, lat: i64, lon: i64) -> Arc<Element> {
    db.create_element(Element::node(Coord::new(lat, lon)).with_changeset(changeset), session)
        .unwrap()
}

pub fn create_way(db: &OsmDatabase, session: &Session, changeset: ChangesetId, nodes: &[OsmId]) -> Arc<Element> {
    db.create_element(Element::way(nodes.to_vec()).with_changeset(changeset), session)
        .unwrap()
}

pub fn create_relation(db: &OsmDatabase, session: &Session, changeset: ChangesetId, members: Vec<Member>) -> Arc<Element> {
    db.create_element(Element::relation(members).with_changeset(changeset), session)
        .unwrap()
}

pub fn node_member(id: OsmId, role: &str) -> Member {
    Member::new(ElementType::Node, id, role)
}

pub fn way_member(id: OsmId, role: &str) -> Member {
    Member::new(ElementType::Way, id, role)
}

pub fn relation_member(id: OsmId, role: &str) -> Member {
    Member::new(ElementType::Relation, id, role)
}

/// The request that supersedes `current` with the same payload.
pub fn next_of(current: &Element, changeset: ChangesetId) -> Element {
    let mut next = current.clone();
    next.changeset_id = Some(changeset);
    next.timestamp = None;
    next
}
