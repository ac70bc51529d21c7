use std::collections::HashMap;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::data::geo::parse_scaled;
use crate::data::{Coord, Element, ElementData, ElementType, Member, OsmId, Tags};
use crate::errors::{Error, ErrorKind, Result};

type Attributes = HashMap<String, String>;

#[derive(Clone, Copy)]
enum ParserState {
    Top,
    Osm,
    Element,
    Done,
}

/// Attribute maps of the first `osm/<type>` element and its children.
#[derive(Default)]
struct RawElement {
    attributes: Attributes,
    tags: Vec<Attributes>,
    nds: Vec<Attributes>,
    members: Vec<Attributes>,
}

fn attributes(el: &BytesStart) -> Result<Attributes> {
    let mut attributes = Attributes::new();
    for attribute in el.attributes() {
        let attribute = attribute?;
        let key = str::from_utf8(attribute.key.as_ref())?.to_string();
        let value = attribute.unescape_value()?.into_owned();
        attributes.insert(key, value);
    }
    Ok(attributes)
}

fn read_raw(xml: &str, element_type: ElementType) -> Result<Option<RawElement>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let type_name = element_type.as_str().as_bytes();
    let mut state = ParserState::Top;
    let mut raw: Option<RawElement> = None;
    // depth of elements we are skipping over inside the current state
    let mut skipped = 0usize;

    loop {
        let (el, empty) = match reader.read_event()? {
            Event::Eof => break,
            Event::Start(el) => (el, false),
            Event::Empty(el) => (el, true),
            Event::End(_) => {
                if skipped > 0 {
                    skipped -= 1;
                } else {
                    state = match state {
                        ParserState::Element => ParserState::Done,
                        ParserState::Osm => ParserState::Top,
                        other => other,
                    };
                }
                continue;
            }
            _ => continue,
        };

        if skipped > 0 {
            if !empty {
                skipped += 1;
            }
            continue;
        }

        match (state, el.name().as_ref()) {
            (ParserState::Top, b"osm") => {
                if !empty {
                    state = ParserState::Osm;
                }
            }
            (ParserState::Osm, name) if name == type_name => {
                raw = Some(RawElement {
                    attributes: attributes(&el)?,
                    ..RawElement::default()
                });
                state = if empty { ParserState::Done } else { ParserState::Element };
            }
            (ParserState::Element, name) => {
                if let Some(raw) = raw.as_mut() {
                    match name {
                        b"tag" => raw.tags.push(attributes(&el)?),
                        b"nd" => raw.nds.push(attributes(&el)?),
                        b"member" => raw.members.push(attributes(&el)?),
                        _ => (),
                    }
                }
                if !empty {
                    skipped += 1;
                }
            }
            _ => {
                if !empty {
                    skipped += 1;
                }
            }
        }

        if matches!(state, ParserState::Done) {
            break;
        }
    }
    Ok(raw)
}

/// Leading integer of `value`, `0` when there is none.
fn lenient_int(value: &str) -> i64 {
    let trimmed = value.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

fn lenient_version(value: &str) -> u64 {
    u64::try_from(lenient_int(value)).unwrap_or(0)
}

fn coordinate(attributes: &Attributes, name: &str) -> Result<i64> {
    let value = attributes
        .get(name)
        .ok_or_else(|| Error::bad_xml(format!("{} missing", name)))?;
    parse_scaled(value.trim()).map_err(|_| Error::bad_xml(format!("{} not a number", name)))
}

fn build(raw: RawElement, element_type: ElementType, create: bool) -> Result<Element> {
    let attrs = &raw.attributes;

    let coord = if element_type == ElementType::Node {
        if !attrs.contains_key("lat") {
            return Err(Error::bad_xml("lat missing"));
        }
        if !attrs.contains_key("lon") {
            return Err(Error::bad_xml("lon missing"));
        }
        Some(Coord::new(coordinate(attrs, "lat")?, coordinate(attrs, "lon")?))
    } else {
        None
    };

    if !create && !attrs.contains_key("version") {
        return Err(Error::bad_xml("Version is required when updating"));
    }
    let version = attrs.get("version").map(|v| lenient_version(v));

    let changeset_id = attrs
        .get("changeset")
        .map(|cs| lenient_int(cs))
        .ok_or_else(|| Error::bad_xml("Changeset id is missing"))?;

    let id: Option<OsmId> = if create {
        None
    } else {
        let raw_id = attrs
            .get("id")
            .ok_or_else(|| Error::bad_xml("ID is required when updating"))?;
        let id = lenient_int(raw_id);
        if id == 0 {
            return Err(Error::bad_user_input(format!(
                "ID of {} cannot be zero when updating.",
                element_type
            )));
        }
        Some(id)
    };

    if let Some(coord) = coord {
        if !coord.in_world() {
            return Err(Error::bad_user_input("The node is outside this world"));
        }
    }

    let mut tags = Tags::new();
    for tag in raw.tags {
        let k = tag.get("k").ok_or_else(|| Error::bad_xml("tag is missing key"))?;
        let v = tag.get("v").ok_or_else(|| Error::bad_xml("tag is missing value"))?;
        tags.insert_unique(element_type, id, k.clone(), v.clone())?;
    }

    let data = match element_type {
        ElementType::Node => ElementData::Node { coord },
        ElementType::Way => ElementData::Way {
            nodes: raw
                .nds
                .iter()
                .map(|nd| nd.get("ref").map(|r| lenient_int(r)).unwrap_or(0))
                .collect(),
        },
        ElementType::Relation => {
            let mut members = Vec::with_capacity(raw.members.len());
            for member in raw.members {
                let member_type = member.get("type").map(String::as_str).unwrap_or_default();
                let member_type = match member_type {
                    "node" | "way" | "relation" => member_type.parse::<ElementType>()?,
                    other => {
                        return Err(Error::bad_xml(format!(
                            "The {} is not allowed only, [\"node\", \"way\", \"relation\"] allowed",
                            other
                        )))
                    }
                };
                let member_id = member.get("ref").map(|r| lenient_int(r)).unwrap_or(0);
                let role = member.get("role").cloned().unwrap_or_default();
                members.push(Member::new(member_type, member_id, role));
            }
            ElementData::Relation { members }
        }
    };

    Ok(Element {
        id,
        version,
        changeset_id: Some(changeset_id),
        timestamp: None,
        visible: true,
        tags,
        data,
    })
}

/// Parses a single element out of an `<osm>` document.
///
/// With `create` set, `id` is ignored and `version` is optional. Structural
/// problems come back as `BadXml` with the document quoted.
pub fn element_from_xml(xml: &str, element_type: ElementType, create: bool) -> Result<Element> {
    let wrap = |err: Error| {
        if err.kind != ErrorKind::BadXml {
            return err;
        }
        Error::bad_xml(format!(
            "Cannot parse valid {} from xml string {}. {}",
            element_type, xml, err.message
        ))
    };

    if xml.trim().is_empty() {
        return Err(wrap(Error::bad_xml("Must specify a string with one or more characters")));
    }
    let raw = read_raw(xml, element_type)
        .map_err(|err| Error::bad_xml(err.message))
        .map_err(wrap)?
        .ok_or_else(|| wrap(Error::bad_xml(format!("XML doesn't contain an osm/{} element.", element_type))))?;
    build(raw, element_type, create).map_err(wrap)
}
