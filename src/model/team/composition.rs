//! Role-composition validation.
//!
//! Everything here is a pure function of a membership set: nothing is cached,
//! nothing is mutated, and the order of the input never matters. Callers decide
//! what to do with the result (e.g. refuse a registration).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{
    membership::Membership,
    role::{team_size_bounds, Role, MAX_TEAM_SIZE, MIN_TEAM_SIZE},
};

/// Per-role occupancy of a team, plus its total size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupancy {
    counts: BTreeMap<Role, usize>,
    size: usize,
    unrecognised: usize,
}

impl Occupancy {
    /// Tally the given memberships.
    ///
    /// Unrecognised role tags count towards the team size but not towards any role.
    pub fn of(memberships: &[Membership]) -> Self {
        let mut counts: BTreeMap<Role, usize> = Role::ALL.into_iter().map(|r| (r, 0)).collect();
        let mut unrecognised = 0;
        for membership in memberships {
            match membership.role.role() {
                Some(role) => *counts.entry(role).or_default() += 1,
                None => unrecognised += 1,
            }
        }
        Self {
            counts,
            size: memberships.len(),
            unrecognised,
        }
    }

    /// Number of members holding the given role.
    pub fn count(&self, role: Role) -> usize {
        self.counts.get(&role).copied().unwrap_or_default()
    }

    /// Total team size, including members with unrecognised roles.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of members whose role tag is not in the role table.
    pub fn unrecognised(&self) -> usize {
        self.unrecognised
    }

    /// Occupancy of every role in the table, empty roles included.
    pub fn counts(&self) -> &BTreeMap<Role, usize> {
        &self.counts
    }

    pub fn is_full(&self, role: Role) -> bool {
        self.count(role) >= role.cap()
    }

    pub fn is_exceeded(&self, role: Role) -> bool {
        self.count(role) > role.cap()
    }

    /// Required roles with nobody in them.
    pub fn missing_required(&self) -> BTreeSet<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| role.required() && self.count(*role) == 0)
            .collect()
    }

    /// Roles occupied beyond their cap.
    pub fn exceeded(&self) -> BTreeSet<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.is_exceeded(*role))
            .collect()
    }

    pub fn size_in_bounds(&self) -> bool {
        team_size_bounds().contains(&self.size)
    }

    pub fn is_registrable(&self) -> bool {
        self.missing_required().is_empty() && self.exceeded().is_empty() && self.size_in_bounds()
    }

    /// Everything wrong with this composition, in reporting order:
    /// team size, then missing roles, then exceeded roles.
    pub fn findings(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        if self.size < MIN_TEAM_SIZE {
            findings.push(Finding::TeamTooSmall {
                size: self.size,
                min: MIN_TEAM_SIZE,
            });
        } else if self.size > MAX_TEAM_SIZE {
            findings.push(Finding::TeamTooLarge {
                size: self.size,
                max: MAX_TEAM_SIZE,
            });
        }

        let missing = self.missing_required();
        if !missing.is_empty() {
            findings.push(Finding::MissingRequiredRoles {
                roles: missing.into_iter().collect(),
            });
        }

        let exceeded = self.exceeded();
        if !exceeded.is_empty() {
            findings.push(Finding::RolesExceeded {
                roles: exceeded
                    .into_iter()
                    .map(|role| RoleExcess {
                        role,
                        count: self.count(role),
                        cap: role.cap(),
                    })
                    .collect(),
            });
        }

        findings
    }
}

/// A structured reason why a team cannot register.
/// These are rendered by the client; no user-facing text is produced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Finding {
    TeamTooSmall { size: usize, min: usize },
    TeamTooLarge { size: usize, max: usize },
    MissingRequiredRoles { roles: Vec<Role> },
    RolesExceeded { roles: Vec<RoleExcess> },
}

/// A role holding more members than it allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleExcess {
    pub role: Role,
    pub count: usize,
    pub cap: usize,
}

/// The state of a single role within a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleStatus {
    pub role: Role,
    pub count: usize,
    pub cap: usize,
    pub required: bool,
    pub full: bool,
    pub exceeded: bool,
}

/// Everything the client needs to render a team's composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionReport {
    pub size: usize,
    pub unrecognised: usize,
    pub roles: Vec<RoleStatus>,
    pub missing: Vec<Role>,
    pub registrable: bool,
    pub findings: Vec<Finding>,
}

impl CompositionReport {
    pub fn evaluate(memberships: &[Membership]) -> Self {
        Occupancy::of(memberships).into()
    }
}

impl From<Occupancy> for CompositionReport {
    fn from(occupancy: Occupancy) -> Self {
        let roles = Role::ALL
            .into_iter()
            .map(|role| RoleStatus {
                role,
                count: occupancy.count(role),
                cap: role.cap(),
                required: role.required(),
                full: occupancy.is_full(role),
                exceeded: occupancy.is_exceeded(role),
            })
            .collect();
        Self {
            size: occupancy.size(),
            unrecognised: occupancy.unrecognised(),
            roles,
            missing: occupancy.missing_required().into_iter().collect(),
            registrable: occupancy.is_registrable(),
            findings: occupancy.findings(),
        }
    }
}

/// Count the members in each role table role.
pub fn occupancy_by_role(memberships: &[Membership]) -> BTreeMap<Role, usize> {
    Occupancy::of(memberships).counts().clone()
}

pub fn is_role_full(role: Role, memberships: &[Membership]) -> bool {
    Occupancy::of(memberships).is_full(role)
}

pub fn is_role_exceeded(role: Role, memberships: &[Membership]) -> bool {
    Occupancy::of(memberships).is_exceeded(role)
}

pub fn missing_required_roles(memberships: &[Membership]) -> BTreeSet<Role> {
    Occupancy::of(memberships).missing_required()
}

pub fn is_registrable(memberships: &[Membership]) -> bool {
    Occupancy::of(memberships).is_registrable()
}

pub fn validation_errors(memberships: &[Membership]) -> Vec<Finding> {
    Occupancy::of(memberships).findings()
}
