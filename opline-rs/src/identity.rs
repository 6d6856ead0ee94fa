//! Principal identities.
//!
//! The dispatcher only ever sees a [`PrincipalId`]. Applications with a richer
//! notion of "user" implement [`Identity`] and go through
//! [`Registry::execute_as`](crate::Registry::execute_as).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable key of an interactive principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub u64);

impl From<u64> for PrincipalId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Adapter from an application identity to the normalized key.
pub trait Identity {
    fn principal_id(&self) -> PrincipalId;

    /// Name shown by [`Executor::name`](crate::context::Executor::name).
    fn display_name(&self) -> Option<&str> {
        None
    }
}

impl Identity for PrincipalId {
    fn principal_id(&self) -> PrincipalId {
        *self
    }
}

/// Identity with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Principal {
    pub fn new(id: impl Into<PrincipalId>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

impl Identity for Principal {
    fn principal_id(&self) -> PrincipalId {
        self.id
    }

    fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

impl From<&Principal> for PrincipalId {
    fn from(principal: &Principal) -> Self {
        principal.id
    }
}
