use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::data::{Element, ElementKey, ElementType, OsmId, RedactionId};
use crate::errors::{Error, ErrorKind, Result};

/// One entry of an element's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVersion {
    pub element: Arc<Element>,
    pub redaction_id: Option<RedactionId>,
}

/// Append-only version list of a single element. Index `n` holds version `n + 1`.
#[derive(Debug, Default)]
pub struct History {
    versions: Vec<StoredVersion>,
}

impl History {
    pub fn current(&self) -> Option<&Arc<Element>> {
        self.versions.last().map(|v| &v.element)
    }

    pub fn current_version(&self) -> u64 {
        self.versions.len() as u64
    }

    pub fn get(&self, version: u64) -> Option<&StoredVersion> {
        let index = usize::try_from(version).ok()?.checked_sub(1)?;
        self.versions.get(index)
    }

    pub fn versions(&self) -> &[StoredVersion] {
        &self.versions
    }

    /// Redaction bookkeeping is the only mutation a written version allows.
    pub(crate) fn set_redaction(&mut self, version: u64, redaction_id: Option<RedactionId>) -> bool {
        let Some(index) = usize::try_from(version).ok().and_then(|v| v.checked_sub(1)) else {
            return false;
        };
        match self.versions.get_mut(index) {
            Some(stored) => {
                stored.redaction_id = redaction_id;
                true
            }
            None => false,
        }
    }
}

/// Histories of every element, plus an index of current versions for
/// lock-free snapshot reads by other writers.
///
/// A writer holds the element's history mutex from the version check until
/// the append, so exactly one writer wins per expected version. Ids being
/// created sit in `reserved` until their first version is published.
pub struct ElementStore {
    histories: RwLock<HashMap<ElementKey, Arc<Mutex<History>>>>,
    reserved: Mutex<HashSet<ElementKey>>,
    current: RwLock<HashMap<ElementKey, Arc<Element>>>,
    next_ids: [AtomicI64; 3],
}

impl ElementStore {
    pub fn new() -> Self {
        ElementStore {
            histories: RwLock::new(HashMap::new()),
            reserved: Mutex::new(HashSet::new()),
            current: RwLock::new(HashMap::new()),
            next_ids: [AtomicI64::new(1), AtomicI64::new(1), AtomicI64::new(1)],
        }
    }

    fn next_id(&self, element_type: ElementType) -> &AtomicI64 {
        match element_type {
            ElementType::Node => &self.next_ids[0],
            ElementType::Way => &self.next_ids[1],
            ElementType::Relation => &self.next_ids[2],
        }
    }

    pub fn current(&self, key: ElementKey) -> Option<Arc<Element>> {
        self.current.read().get(&key).cloned()
    }

    /// Current version, if it is not a deletion.
    pub fn visible(&self, key: ElementKey) -> Option<Arc<Element>> {
        self.current(key).filter(|e| e.visible)
    }

    pub fn contains(&self, key: ElementKey) -> bool {
        self.current.read().contains_key(&key)
    }

    pub fn history(&self, key: ElementKey) -> Option<Arc<Mutex<History>>> {
        self.histories.read().get(&key).cloned()
    }

    /// Visible current elements of one type matching `filter`, ordered by id.
    pub fn visible_where(&self, element_type: ElementType, filter: impl Fn(&Element) -> bool) -> Vec<Arc<Element>> {
        let mut found: Vec<Arc<Element>> = self
            .current
            .read()
            .iter()
            .filter(|(key, element)| key.element_type == element_type && element.visible && filter(element))
            .map(|(_, element)| Arc::clone(element))
            .collect();
        found.sort_by_key(|e| e.id);
        found
    }

    /// Writes version 1 of a new element.
    ///
    /// The id is reserved first (a positive `requested_id` is honoured when
    /// free), then `commit` builds the version with no store lock held. An
    /// error from `commit` releases the reservation and leaves the store
    /// untouched.
    pub(crate) fn insert_new<F>(&self, element_type: ElementType, requested_id: Option<OsmId>, commit: F) -> Result<Arc<Element>>
    where
        F: FnOnce(OsmId) -> Result<Element>,
    {
        let key = self.reserve(element_type, requested_id)?;
        let element = match commit(key.id) {
            Ok(element) => Arc::new(element),
            Err(err) => {
                self.reserved.lock().remove(&key);
                return Err(err);
            }
        };
        let history = Arc::new(Mutex::new(History {
            versions: vec![StoredVersion {
                element: Arc::clone(&element),
                redaction_id: None,
            }],
        }));
        // updates of the new element wait here until the current index is set
        let _published = history.lock();
        self.histories.write().insert(key, Arc::clone(&history));
        self.current.write().insert(key, Arc::clone(&element));
        self.reserved.lock().remove(&key);
        Ok(element)
    }

    fn reserve(&self, element_type: ElementType, requested_id: Option<OsmId>) -> Result<ElementKey> {
        let mut reserved = self.reserved.lock();
        let taken = |key: &ElementKey| reserved.contains(key) || self.histories.read().contains_key(key);
        let counter = self.next_id(element_type);

        let key = match requested_id.filter(|id| *id > 0) {
            Some(id) => {
                let key = ElementKey::new(element_type, id);
                if taken(&key) {
                    return Err(Error::precondition_failed(format!(
                        "Cannot create {}: {} {} already exists",
                        element_type, element_type, id
                    )));
                }
                counter.fetch_max(id.saturating_add(1), Ordering::AcqRel);
                key
            }
            None => loop {
                let id = counter
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| next.checked_add(1))
                    .map_err(|_| Error::new(ErrorKind::Internal, format!("No free {} ids left", element_type)))?;
                let key = ElementKey::new(element_type, id);
                if !taken(&key) {
                    break key;
                }
            },
        };
        reserved.insert(key);
        Ok(key)
    }

    /// Appends the next version to a locked history and publishes it as current.
    pub(crate) fn append(&self, history: &mut History, element: Element) -> Arc<Element> {
        debug_assert_eq!(element.version, Some(history.current_version() + 1));
        let element = Arc::new(element);
        history.versions.push(StoredVersion {
            element: Arc::clone(&element),
            redaction_id: None,
        });
        if let Some(key) = element.key() {
            self.current.write().insert(key, Arc::clone(&element));
        }
        element
    }
}

impl Default for ElementStore {
    fn default() -> Self {
        Self::new()
    }
}
