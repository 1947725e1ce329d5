use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A function on the team that a member can fill.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Driver,
    Programmer,
    Electronics,
    MechanicsDesigner,
}

impl Role {
    /// Every role, in role table order.
    pub const ALL: [Role; 4] = [
        Role::Driver,
        Role::Programmer,
        Role::Electronics,
        Role::MechanicsDesigner,
    ];

    /// The wire name of this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Driver => "driver",
            Role::Programmer => "programmer",
            Role::Electronics => "electronics",
            Role::MechanicsDesigner => "mechanics_designer",
        }
    }

    /// The role table entry for this role.
    pub fn spec(self) -> &'static RoleSpec {
        // The table is laid out in declaration order.
        &ROLE_TABLE[self as usize]
    }

    /// Maximum permitted occupancy.
    pub fn cap(self) -> usize {
        self.spec().cap
    }

    /// Must a registrable team have at least one member in this role?
    pub fn required(self) -> bool {
        self.spec().required
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// A role string that is not in the role table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

/// One row of the role table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSpec {
    pub role: Role,
    pub cap: usize,
    pub required: bool,
}

/// The single source of truth for roles, their caps, and whether they are required.
pub static ROLE_TABLE: [RoleSpec; 4] = [
    RoleSpec {
        role: Role::Driver,
        cap: 1,
        required: true,
    },
    RoleSpec {
        role: Role::Programmer,
        cap: 1,
        required: true,
    },
    RoleSpec {
        role: Role::Electronics,
        cap: 1,
        required: true,
    },
    RoleSpec {
        role: Role::MechanicsDesigner,
        cap: 2,
        required: true,
    },
];

/// Smallest registrable team.
pub const MIN_TEAM_SIZE: usize = 4;

/// Largest registrable team.
pub const MAX_TEAM_SIZE: usize = 5;

/// The inclusive range of registrable team sizes.
pub fn team_size_bounds() -> RangeInclusive<usize> {
    MIN_TEAM_SIZE..=MAX_TEAM_SIZE
}

/// The role string carried by a membership.
///
/// Stored memberships may predate the current role table, so anything that
/// doesn't parse is kept verbatim rather than rejected.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleTag {
    Known(Role),
    Unrecognised(String),
}

impl RoleTag {
    /// The recognised role, if any.
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleTag::Known(role) => Some(*role),
            RoleTag::Unrecognised(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RoleTag::Known(role) => role.as_str(),
            RoleTag::Unrecognised(tag) => tag,
        }
    }
}

impl From<Role> for RoleTag {
    fn from(role: Role) -> Self {
        RoleTag::Known(role)
    }
}

impl From<String> for RoleTag {
    fn from(tag: String) -> Self {
        match tag.parse::<Role>() {
            Ok(role) => RoleTag::Known(role),
            Err(_) => RoleTag::Unrecognised(tag),
        }
    }
}

impl From<&str> for RoleTag {
    fn from(tag: &str) -> Self {
        tag.to_string().into()
    }
}

impl From<RoleTag> for String {
    fn from(tag: RoleTag) -> Self {
        match tag {
            RoleTag::Known(role) => role.as_str().to_string(),
            RoleTag::Unrecognised(tag) => tag,
        }
    }
}

impl Display for RoleTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
