//! OSM XML payloads: one element in, elements and histories out.

pub mod parse;
pub mod write;

pub use self::parse::element_from_xml;
pub use self::write::{element_to_xml, history_to_xml, GENERATOR};
