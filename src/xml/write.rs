use chrono::SecondsFormat;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::writer::Writer;

use crate::data::geo::format_scaled;
use crate::data::{Element, ElementData, RedactionId};
use crate::errors::Result;
use crate::history::OldElement;

pub const GENERATOR: &str = "osm_history";

fn write_document<F>(body: F) -> Result<String>
where
    F: FnOnce(&mut Writer<Vec<u8>>) -> Result<()>,
{
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut osm = BytesStart::new("osm");
    osm.push_attribute(("version", "0.6"));
    osm.push_attribute(("generator", GENERATOR));
    writer.write_event(Event::Start(osm))?;
    body(&mut writer)?;
    writer.write_event(Event::End(BytesEnd::new("osm")))?;

    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element, redaction_id: Option<RedactionId>) -> Result<()> {
    let name = element.element_type().as_str();
    let mut attributes: Vec<(&str, String)> = Vec::new();
    if let Some(id) = element.id {
        attributes.push(("id", id.to_string()));
    }
    attributes.push(("visible", element.visible.to_string()));
    if let Some(version) = element.version {
        attributes.push(("version", version.to_string()));
    }
    if let Some(changeset_id) = element.changeset_id {
        attributes.push(("changeset", changeset_id.to_string()));
    }
    if let Some(timestamp) = element.timestamp {
        attributes.push(("timestamp", timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }
    if let Some(redaction_id) = redaction_id {
        attributes.push(("redacted", redaction_id.to_string()));
    }
    if let Some(coord) = element.coord() {
        attributes.push(("lat", format_scaled(coord.lat)));
        attributes.push(("lon", format_scaled(coord.lon)));
    }

    let mut start = BytesStart::new(name);
    for (key, value) in &attributes {
        start.push_attribute((*key, value.as_str()));
    }

    let has_children = !element.tags.is_empty() || element.way_nodes().len() + element.members().len() > 0;
    if !has_children {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    match &element.data {
        ElementData::Node { .. } => (),
        ElementData::Way { nodes } => {
            for node_id in nodes {
                let mut nd = BytesStart::new("nd");
                nd.push_attribute(("ref", node_id.to_string().as_str()));
                writer.write_event(Event::Empty(nd))?;
            }
        }
        ElementData::Relation { members } => {
            for member in members {
                let mut el = BytesStart::new("member");
                el.push_attribute(("type", member.member_type.as_str()));
                el.push_attribute(("ref", member.member_id.to_string().as_str()));
                el.push_attribute(("role", member.role.as_str()));
                writer.write_event(Event::Empty(el))?;
            }
        }
    }
    for (k, v) in element.tags.iter() {
        let mut tag = BytesStart::new("tag");
        tag.push_attribute(("k", k));
        tag.push_attribute(("v", v));
        writer.write_event(Event::Empty(tag))?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub fn element_to_xml(element: &Element) -> Result<String> {
    write_document(|writer| write_element(writer, element, None))
}

/// Renders versions as returned by a history or old-version read. Redacted
/// versions carry a `redacted` attribute.
pub fn history_to_xml(versions: &[OldElement]) -> Result<String> {
    write_document(|writer| {
        for old in versions {
            write_element(writer, &old.element, old.redaction_id)?;
        }
        Ok(())
    })
}
