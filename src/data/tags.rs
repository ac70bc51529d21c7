use std::{collections::BTreeMap, fmt, sync::OnceLock};

use regex::Regex;

use crate::errors::{Error, ErrorKind, Result};

use super::osm::{ElementType, OsmId};

/// Control characters (tab, newline and carriage return excepted), DEL and the
/// two BMP non-characters.
fn invalid_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F\x{FFFE}\x{FFFF}]").expect("static pattern")
    })
}

pub fn has_invalid_chars(text: &str) -> bool {
    invalid_chars().is_match(text)
}

/// Key/value pairs of one element version. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(BTreeMap<String, String>);

struct ElementRef(ElementType, Option<OsmId>);

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            Some(id) => write!(f, "{}/{}", self.0, id),
            None => write!(f, "{}/", self.0),
        }
    }
}

impl Tags {
    pub fn new() -> Self {
        Tags(BTreeMap::new())
    }

    /// Builds a tag set from parsed pairs, rejecting a repeated key.
    pub fn from_pairs<I, K, V>(element_type: ElementType, id: Option<OsmId>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut tags = Tags::new();
        for (k, v) in pairs {
            tags.insert_unique(element_type, id, k.into(), v.into())?;
        }
        Ok(tags)
    }

    pub fn insert_unique(&mut self, element_type: ElementType, id: Option<OsmId>, k: String, v: String) -> Result<()> {
        if self.0.contains_key(&k) {
            return Err(Error::new(
                ErrorKind::DuplicateTags,
                format!("Element {} has duplicate tags with key {}", ElementRef(element_type, id), k),
            ));
        }
        self.0.insert(k, v);
        Ok(())
    }

    pub fn insert(&mut self, k: impl Into<String>, v: impl Into<String>) -> Option<String> {
        self.0.insert(k.into(), v.into())
    }

    pub fn get(&self, k: &str) -> Option<&str> {
        self.0.get(k).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn with(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
        self.insert(k, v);
        self
    }

    pub fn validate(&self, element_type: ElementType, id: Option<OsmId>, max_length: usize) -> Result<()> {
        self.validate_owned_by(format!("Element {}", ElementRef(element_type, id)), max_length)
    }

    pub fn validate_changeset(&self, max_length: usize) -> Result<()> {
        self.validate_owned_by("Changeset".to_string(), max_length)
    }

    fn validate_owned_by(&self, owner: String, max_length: usize) -> Result<()> {
        for (k, v) in self.iter() {
            if k.is_empty() {
                return Err(Error::bad_xml("tag is missing key"));
            }
            if k.chars().count() > max_length {
                return Err(Error::new(
                    ErrorKind::Invalid,
                    format!("{} has a tag key longer than {} characters", owner, max_length),
                ));
            }
            if v.chars().count() > max_length {
                return Err(Error::new(
                    ErrorKind::Invalid,
                    format!("{} has a value for tag {} longer than {} characters", owner, k, max_length),
                ));
            }
            if has_invalid_chars(k) || has_invalid_chars(v) {
                return Err(Error::new(
                    ErrorKind::Invalid,
                    format!("{} has invalid characters in tag {}", owner, k),
                ));
            }
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Tags(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
