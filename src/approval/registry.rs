//! Owner identities and their principal roles
//!
//! The registry answers two questions during evaluation: is this identity an
//! owner, and is it a human or an AI agent.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Opaque principal identifier (typically a base58 public key)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of principal behind an owner identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Human signer
    #[serde(rename = "human")]
    Human,
    /// Automated AI agent signer
    #[serde(rename = "ai", alias = "ai_agent")]
    AiAgent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Human => "human",
            Role::AiAgent => "ai",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(Role::Human),
            "ai" | "ai_agent" => Ok(Role::AiAgent),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// An owner entry as supplied by configuration or the admin API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerEntry {
    pub identity: Identity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Owner set plus identity -> role labels
///
/// Roles may be assigned to identities that are not owners; such labels are
/// inert because only owners are ever counted.
#[derive(Debug, Clone, Default)]
pub struct OwnerRegistry {
    owners: HashSet<Identity>,
    roles: HashMap<Identity, Role>,
}

impl OwnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from owner entries, labelling those that carry a role
    pub fn from_entries(entries: impl IntoIterator<Item = OwnerEntry>) -> Self {
        let mut registry = Self::new();
        for entry in entries {
            if let Some(role) = entry.role {
                registry.roles.insert(entry.identity.clone(), role);
            }
            registry.owners.insert(entry.identity);
        }
        registry
    }

    /// Replace the owner set. Role labels are left untouched.
    pub fn set_owners(&mut self, identities: impl IntoIterator<Item = Identity>) {
        self.owners = identities.into_iter().collect();
    }

    /// Assign (or reassign) the role of an identity
    pub fn set_role(&mut self, identity: Identity, role: Role) {
        self.roles.insert(identity, role);
    }

    /// Remove the role label of an identity, making it unknown
    pub fn clear_role(&mut self, identity: &Identity) -> Option<Role> {
        self.roles.remove(identity)
    }

    /// Replace owners and roles in one step
    pub fn configure(
        &mut self,
        owners: impl IntoIterator<Item = Identity>,
        roles: impl IntoIterator<Item = (Identity, Role)>,
    ) {
        self.owners = owners.into_iter().collect();
        self.roles = roles.into_iter().collect();
    }

    pub fn role_of(&self, identity: &Identity) -> Option<Role> {
        self.roles.get(identity).copied()
    }

    pub fn is_owner(&self, identity: &Identity) -> bool {
        self.owners.contains(identity)
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Owners with their roles, sorted by identity for stable output
    pub fn entries(&self) -> Vec<OwnerEntry> {
        let mut entries: Vec<OwnerEntry> = self
            .owners
            .iter()
            .map(|identity| OwnerEntry {
                identity: identity.clone(),
                role: self.role_of(identity),
            })
            .collect();
        entries.sort_by(|a, b| a.identity.cmp(&b.identity));
        entries
    }
}
