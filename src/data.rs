pub mod changeset;
pub mod geo;
pub mod osm;
pub mod redaction;
pub mod tags;

pub use self::changeset::{Changeset, ChangesetId, UserId};
pub use self::geo::{BoundingBox, Coord, SCALE};
pub use self::osm::{Element, ElementData, ElementKey, ElementType, Member, OsmId};
pub use self::redaction::{Redaction, RedactionId};
pub use self::tags::Tags;
