//! Identity boundary for the admin editor.
//!
//! Sign-in itself happens elsewhere; this side only asks "is there a signed-in
//! principal for these credentials?".

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Principal {
    pub id: String,
}

pub trait IdentityProvider: Send + Sync {
    /// The signed-in principal for `credentials`, or `None` when signed out.
    fn principal(&self, credentials: Option<&str>) -> Option<Principal>;
}

/// Accepts a single pre-shared admin token.
pub struct StaticTokenIdentity {
    token: String,
    principal: Principal,
}

impl StaticTokenIdentity {
    pub fn new(token: impl Into<String>, principal_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            principal: Principal { id: principal_id.into() },
        }
    }
}

impl IdentityProvider for StaticTokenIdentity {
    fn principal(&self, credentials: Option<&str>) -> Option<Principal> {
        let supplied = credentials?.trim();
        if !self.token.is_empty() && constant_time_eq(supplied.as_bytes(), self.token.as_bytes()) {
            Some(self.principal.clone())
        } else {
            None
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
