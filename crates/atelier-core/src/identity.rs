//! Identity readiness as reported by the external authentication collaborator.

use serde::{Deserialize, Serialize};

/// Opaque identity value scoping per-user data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityId(String);

impl IdentityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Readiness signal: whether authentication has settled, and who (if anyone)
/// is signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySignal {
    pub ready: bool,
    pub identity: Option<IdentityId>,
}

impl IdentitySignal {
    /// Authentication has not settled yet.
    pub fn unready() -> Self {
        Self::default()
    }

    /// Authentication settled without a signed-in identity.
    pub fn anonymous() -> Self {
        Self {
            ready: true,
            identity: None,
        }
    }

    /// Authentication settled with `identity` signed in.
    pub fn signed_in(identity: impl Into<String>) -> Self {
        Self {
            ready: true,
            identity: Some(IdentityId::new(identity)),
        }
    }
}
