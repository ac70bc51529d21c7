use std::collections::BTreeSet;

use crate::data::{Changeset, UserId};
use crate::errors::{Error, ErrorKind, Result};

/// Token scopes a request may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    ReadPrefs,
    WriteApi,
    WriteRedactions,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::ReadPrefs => "read_prefs",
            Scope::WriteApi => "write_api",
            Scope::WriteRedactions => "write_redactions",
        }
    }
}

/// Per-request capability predicates. The policy behind them lives with the
/// caller; the engine only asks.
pub trait Authorizer {
    fn user_id(&self) -> Option<UserId>;
    fn is_moderator(&self) -> bool;
    fn has_scope(&self, scope: Scope) -> bool;
    fn data_public(&self) -> bool;

    fn owns_changeset(&self, changeset: &Changeset) -> bool {
        self.user_id() == Some(changeset.user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub data_public: bool,
    pub moderator: bool,
}

impl User {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        User {
            id,
            display_name: display_name.into(),
            data_public: true,
            moderator: false,
        }
    }

    pub fn moderator(mut self) -> Self {
        self.moderator = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.data_public = false;
        self
    }
}

/// An authenticated (or anonymous) caller together with its granted scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: Option<User>,
    scopes: BTreeSet<Scope>,
}

impl Session {
    pub fn anonymous() -> Self {
        Session {
            user: None,
            scopes: BTreeSet::new(),
        }
    }

    /// A session holding every scope.
    pub fn new(user: User) -> Self {
        Session::with_scopes(user, [Scope::ReadPrefs, Scope::WriteApi, Scope::WriteRedactions])
    }

    pub fn with_scopes(user: User, scopes: impl IntoIterator<Item = Scope>) -> Self {
        Session {
            user: Some(user),
            scopes: scopes.into_iter().collect(),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

impl Authorizer for Session {
    fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }

    fn is_moderator(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.moderator)
    }

    fn has_scope(&self, scope: Scope) -> bool {
        self.user.is_some() && self.scopes.contains(&scope)
    }

    fn data_public(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.data_public)
    }
}

/// The acting user of an element or changeset write.
pub fn require_writer(auth: &dyn Authorizer) -> Result<UserId> {
    let user_id = auth
        .user_id()
        .ok_or_else(|| Error::new(ErrorKind::Unauthorized, "Couldn't authenticate you"))?;
    if !auth.has_scope(Scope::WriteApi) {
        return Err(Error::forbidden("The write_api scope is required to modify map data"));
    }
    if !auth.data_public() {
        return Err(Error::forbidden("You must make your edits public to upload new data"));
    }
    Ok(user_id)
}

pub fn require_moderator(auth: &dyn Authorizer, scope: Scope) -> Result<UserId> {
    let user_id = auth
        .user_id()
        .ok_or_else(|| Error::new(ErrorKind::Unauthorized, "Couldn't authenticate you"))?;
    if !auth.is_moderator() {
        return Err(Error::forbidden("You need to be a moderator to perform this action"));
    }
    if !auth.has_scope(scope) {
        return Err(Error::forbidden(format!("The {} scope is required for this action", scope.as_str())));
    }
    Ok(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_cannot_write() {
        let err = require_writer(&Session::anonymous()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[test]
    fn test_private_user_cannot_write() {
        let err = require_writer(&Session::new(User::new(1, "private").private())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
        assert!(err.message.contains("make your edits public"));
    }

    #[test]
    fn test_write_needs_scope() {
        let session = Session::with_scopes(User::new(1, "u"), [Scope::ReadPrefs]);
        assert_eq!(require_writer(&session).unwrap_err().kind, ErrorKind::Forbidden);
        assert_eq!(require_writer(&Session::new(User::new(1, "u"))).unwrap(), 1);
    }

    #[test]
    fn test_redaction_needs_moderator_and_scope() {
        let regular = Session::with_scopes(User::new(1, "u"), [Scope::WriteRedactions]);
        assert_eq!(require_moderator(&regular, Scope::WriteRedactions).unwrap_err().kind, ErrorKind::Forbidden);

        let moderator_without_scope = Session::with_scopes(User::new(2, "m").moderator(), [Scope::ReadPrefs, Scope::WriteApi]);
        assert_eq!(
            require_moderator(&moderator_without_scope, Scope::WriteRedactions).unwrap_err().kind,
            ErrorKind::Forbidden
        );

        let moderator = Session::with_scopes(User::new(2, "m").moderator(), [Scope::WriteRedactions]);
        assert_eq!(require_moderator(&moderator, Scope::WriteRedactions).unwrap(), 2);
    }
}
