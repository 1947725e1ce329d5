use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::{serde_helpers::chrono_datetime_as_bson_datetime, to_bson, Bson};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

use super::membership::MemberId;

/// Longest permitted team name, in characters.
pub const MAX_TEAM_NAME_LENGTH: usize = 64;

/// Where a team is in the registration process.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Still forming; membership may change.
    Draft,
    /// Handed in for review; membership is frozen.
    Submitted {
        #[serde(with = "chrono_datetime_as_bson_datetime")]
        submitted_at: DateTime<Utc>,
    },
}

impl RegistrationStatus {
    pub fn is_submitted(&self) -> bool {
        matches!(self, RegistrationStatus::Submitted { .. })
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            RegistrationStatus::Draft => None,
            RegistrationStatus::Submitted { submitted_at } => Some(*submitted_at),
        }
    }
}

/// The organisers' verdict on a submitted team.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceStatus {
    Pending,
    Accepted,
    Rejected,
}

impl AcceptanceStatus {
    /// Human-readable state label.
    pub fn label(self) -> &'static str {
        match self {
            AcceptanceStatus::Pending => "Pending review",
            AcceptanceStatus::Accepted => "Accepted",
            AcceptanceStatus::Rejected => "Rejected",
        }
    }
}

impl From<AcceptanceStatus> for Bson {
    fn from(status: AcceptanceStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

/// Core team data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamCore {
    pub name: String,
    /// Lowercased name, used to keep names unique regardless of case.
    pub name_key: String,
    pub leader: MemberId,
    pub registration: RegistrationStatus,
    pub acceptance: AcceptanceStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl TeamCore {
    /// Create a fresh draft team. The name must already be validated.
    pub fn new(name: String, leader: MemberId) -> Self {
        Self {
            name_key: name_key(&name),
            name,
            leader,
            registration: RegistrationStatus::Draft,
            acceptance: AcceptanceStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn is_leader(&self, member: &MemberId) -> bool {
        self.leader == *member
    }

    pub fn is_submitted(&self) -> bool {
        self.registration.is_submitted()
    }

    pub fn is_accepted(&self) -> bool {
        self.is_submitted() && self.acceptance == AcceptanceStatus::Accepted
    }
}

/// A team without an ID.
pub type NewTeam = TeamCore;

/// A team from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub team: TeamCore,
}

impl Team {
    pub fn new(id: Id, team: TeamCore) -> Self {
        Self { id, team }
    }
}

impl Deref for Team {
    type Target = TeamCore;

    fn deref(&self) -> &Self::Target {
        &self.team
    }
}

impl DerefMut for Team {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.team
    }
}

/// Trim a requested team name and check it is acceptable.
pub fn validate_team_name(name: &str) -> Option<String> {
    let name = name.trim();
    let length = name.chars().count();
    if length == 0 || length > MAX_TEAM_NAME_LENGTH {
        None
    } else {
        Some(name.to_string())
    }
}

/// The uniqueness key for a team name.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_names_are_trimmed_and_bounded() {
        assert_eq!(
            validate_team_name("  Gear Grinders "),
            Some("Gear Grinders".to_string())
        );
        assert_eq!(validate_team_name("   "), None);
        assert_eq!(validate_team_name(&"x".repeat(MAX_TEAM_NAME_LENGTH)).map(|n| n.len()), Some(64));
        assert_eq!(validate_team_name(&"x".repeat(MAX_TEAM_NAME_LENGTH + 1)), None);
        assert_eq!(name_key(" Gear GRINDERS"), "gear grinders");
    }

    #[test]
    fn acceptance_needs_submission() {
        let mut team = TeamCore::example();
        team.acceptance = AcceptanceStatus::Accepted;
        assert!(!team.is_accepted());
        team.registration = RegistrationStatus::Submitted {
            submitted_at: Utc::now(),
        };
        assert!(team.is_accepted());
        assert_eq!(team.acceptance.label(), "Accepted");
        assert_eq!(AcceptanceStatus::Pending.label(), "Pending review");
    }
}
