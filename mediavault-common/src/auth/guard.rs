//! Authorization policy
//!
//! The policy is deliberately binary: operations are either administrative
//! or open to any authenticated caller. Keeping the check a pure function
//! lets it be tested without HTTP plumbing; the API layer composes it with
//! token extraction.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Principal role, derived at login and embedded in the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Role::Admin),
            "guest" => Ok(Role::Guest),
            _ => Err(Error::InvalidToken),
        }
    }
}

/// What an operation requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Administrative operations (every mutation in the catalog).
    AdminOnly,
    /// Open to any authenticated role.
    Any,
}

/// Check a decoded role against a required capability.
pub fn authorize(role: Role, capability: Capability) -> Result<()> {
    match capability {
        Capability::Any => Ok(()),
        Capability::AdminOnly => {
            if role == Role::Admin {
                Ok(())
            } else {
                Err(Error::Forbidden("administrator role required".to_string()))
            }
        }
    }
}
