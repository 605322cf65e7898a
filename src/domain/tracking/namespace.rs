//! The four logical channels connections are segmented into.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Role, ValidationError};

/// An isolated channel grouping connections by actor role.
///
/// Each namespace is an output port on the hub: rooms with the same name in
/// two namespaces are distinct, and cross-namespace fan-out always names the
/// destination namespace explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Customer,
    Restaurant,
    Delivery,
    Admin,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [
        Namespace::Customer,
        Namespace::Restaurant,
        Namespace::Delivery,
        Namespace::Admin,
    ];

    /// Roles admitted to this namespace at handshake.
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Namespace::Customer => &[Role::Customer, Role::Admin],
            Namespace::Restaurant => &[Role::Restaurant, Role::Admin],
            Namespace::Delivery => &[Role::Delivery, Role::Admin],
            Namespace::Admin => &[Role::Admin],
        }
    }

    /// Presence bucket that connections in this namespace are counted under.
    pub fn presence_role(&self) -> Role {
        match self {
            Namespace::Customer => Role::Customer,
            Namespace::Restaurant => Role::Restaurant,
            Namespace::Delivery => Role::Delivery,
            Namespace::Admin => Role::Admin,
        }
    }

    pub fn admits(&self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }

    pub fn as_str(&self) -> &'static str {
        self.presence_role().as_str()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Namespace::Customer),
            "restaurant" => Ok(Namespace::Restaurant),
            "delivery" => Ok(Namespace::Delivery),
            "admin" => Ok(Namespace::Admin),
            other => Err(ValidationError::invalid_format(
                "namespace",
                format!("unknown namespace '{}'", other),
            )),
        }
    }
}
