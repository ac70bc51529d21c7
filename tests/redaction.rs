mod common;

use std::sync::Arc;

use osm_history::data::{Coord, Element, ElementKey, RedactionId};
use osm_history::xml::history_to_xml;
use osm_history::{ErrorKind, OsmDatabase, Scope, Session, User};

use common::*;

/// A node with four versions, the last being current.
fn node_with_history(db: &OsmDatabase) -> ElementKey {
    let session = mapper(1);
    let cs = open_changeset(db, &session);
    let mut current: Arc<Element> = create_node(db, &session, cs, 0, 0);
    let id = current.id.unwrap();
    for step in 1..4 {
        let mut next = next_of(&current, cs);
        next.data = Element::node(Coord::new(step * 100, step * 100)).data;
        current = db.update_element(id, next, &session).unwrap();
    }
    ElementKey::node(id)
}

fn redaction(db: &OsmDatabase) -> RedactionId {
    db.create_redaction("Copyright", "Copied from another map", &moderator(90)).unwrap().id
}

#[test]
fn test_redact_hides_version_from_everyone_but_asking_moderators() {
    let db = db();
    let key = node_with_history(&db);
    let redaction = redaction(&db);
    db.redact(key, 3, redaction, &moderator(90)).unwrap();

    let anonymous = Session::anonymous();
    let user = mapper(5);
    let moderator = moderator(91);

    assert_eq!(db.old_version(key, 3, &anonymous, false).unwrap_err().kind, ErrorKind::Forbidden);
    assert_eq!(db.old_version(key, 3, &user, true).unwrap_err().kind, ErrorKind::Forbidden);
    assert_eq!(db.old_version(key, 3, &moderator, false).unwrap_err().kind, ErrorKind::Forbidden);

    let shown = db.old_version(key, 3, &moderator, true).unwrap();
    assert_eq!(shown.redaction_id, Some(redaction));
    assert_eq!(shown.element.version, Some(3));

    // other versions are untouched
    assert_eq!(db.old_version(key, 2, &anonymous, false).unwrap().redaction_id, None);
    assert_eq!(db.current(key).unwrap().version, Some(4));
}

#[test]
fn test_history_omits_redacted_versions() {
    let db = db();
    let key = node_with_history(&db);
    db.redact(key, 3, redaction(&db), &moderator(90)).unwrap();

    let versions = |viewer: &Session, show: bool| -> Vec<u64> {
        db.history(key, viewer, show)
            .unwrap()
            .iter()
            .map(|old| old.element.version.unwrap())
            .collect()
    };
    assert_eq!(versions(&Session::anonymous(), false), vec![1, 2, 4]);
    assert_eq!(versions(&mapper(5), true), vec![1, 2, 4]);
    assert_eq!(versions(&moderator(91), false), vec![1, 2, 4]);
    assert_eq!(versions(&moderator(91), true), vec![1, 2, 3, 4]);

    let xml = history_to_xml(&db.history(key, &moderator(91), true).unwrap()).unwrap();
    assert_eq!(xml.matches("<node ").count(), 4);
    assert_eq!(xml.matches("redacted=").count(), 1);
}

#[test]
fn test_current_version_can_not_be_redacted() {
    let db = db();
    let key = node_with_history(&db);
    let redaction = redaction(&db);

    // refused whoever asks
    for session in [Session::anonymous(), mapper(5), moderator(91)] {
        let err = db.redact(key, 4, redaction, &session).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadRequest);
    }
    assert_eq!(db.history(key, &Session::anonymous(), false).unwrap().len(), 4);
}

#[test]
fn test_redact_requires_moderator_with_scope() {
    let db = db();
    let key = node_with_history(&db);
    let redaction = redaction(&db);

    assert_eq!(db.redact(key, 2, redaction, &Session::anonymous()).unwrap_err().kind, ErrorKind::Unauthorized);
    assert_eq!(db.redact(key, 2, redaction, &mapper(5)).unwrap_err().kind, ErrorKind::Forbidden);

    let without_scope = Session::with_scopes(User::new(92, "m").moderator(), [Scope::ReadPrefs, Scope::WriteApi]);
    assert_eq!(db.redact(key, 2, redaction, &without_scope).unwrap_err().kind, ErrorKind::Forbidden);

    let with_scope = Session::with_scopes(User::new(92, "m").moderator(), [Scope::WriteRedactions]);
    db.redact(key, 2, redaction, &with_scope).unwrap();
    assert_eq!(db.old_version(key, 2, &mapper(5), false).unwrap_err().kind, ErrorKind::Forbidden);
}

#[test]
fn test_redact_unknown_targets() {
    let db = db();
    let key = node_with_history(&db);
    let redaction = redaction(&db);

    assert_eq!(db.redact(key, 9, redaction, &moderator(90)).unwrap_err().kind, ErrorKind::NotFound);
    assert_eq!(
        db.redact(ElementKey::node(999), 1, redaction, &moderator(90)).unwrap_err().kind,
        ErrorKind::NotFound
    );
    assert_eq!(db.redact(key, 1, 555, &moderator(90)).unwrap_err().kind, ErrorKind::NotFound);
    assert_eq!(db.old_version(key, 9, &mapper(5), false).unwrap_err().kind, ErrorKind::NotFound);
}

#[test]
fn test_unredact_restores_visibility() {
    let db = db();
    let key = node_with_history(&db);
    db.redact(key, 3, redaction(&db), &moderator(90)).unwrap();

    assert_eq!(db.unredact(key, 3, &mapper(5)).unwrap_err().kind, ErrorKind::Forbidden);
    db.unredact(key, 3, &moderator(90)).unwrap();

    let old = db.old_version(key, 3, &Session::anonymous(), false).unwrap();
    assert_eq!(old.redaction_id, None);
    assert_eq!(old.element.coord(), Some(Coord::new(200, 200)));
}

#[test]
fn test_redaction_does_not_affect_writes() {
    let db = db();
    let key = node_with_history(&db);
    db.redact(key, 2, redaction(&db), &moderator(90)).unwrap();

    let session = mapper(1);
    let cs = open_changeset(&db, &session);
    let current = db.current(key).unwrap();
    let next = db.update_element(key.id, next_of(&current, cs), &session).unwrap();
    assert_eq!(next.version, Some(5));
}
