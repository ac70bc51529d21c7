//! Versioned storage for OSM nodes, ways and relations.
//!
//! Every write creates a new immutable version of an element, guarded by an
//! optimistic version check, attributed to an open changeset and folded into
//! that changeset's bounding box. Historical versions can be hidden behind
//! redactions.

pub mod auth;
pub mod config;
pub mod data;
pub mod edit;
pub mod errors;
pub mod history;
pub mod logging;
pub mod store;
pub mod xml;

pub use crate::auth::{Authorizer, Scope, Session, User};
pub use crate::config::{load_settings, Settings};
pub use crate::edit::{ElementEdit, Plan};
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::history::OldElement;
pub use crate::store::OsmDatabase;
