use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    mongodb::Id,
    team::{
        AcceptanceStatus, CompositionReport, MemberId, Membership, Role, RoleTag, Team,
        TeamMembership,
    },
};

/// A request to found a new team, with the founder's own role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    pub role: Role,
}

/// A new role for an existing member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChange {
    pub role: Role,
}

/// A change to a submitted team's acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceChange {
    pub status: AcceptanceStatus,
}

/// The registration and acceptance state of a team, with display labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDescription {
    pub submitted: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    pub acceptance: AcceptanceStatus,
    pub acceptance_label: String,
}

impl From<&Team> for StatusDescription {
    fn from(team: &Team) -> Self {
        Self {
            submitted: team.is_submitted(),
            submitted_at: team.registration.submitted_at(),
            acceptance: team.acceptance,
            acceptance_label: team.acceptance.label().to_string(),
        }
    }
}

/// A team as listed publicly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    #[serde(with = "crate::model::mongodb::hex_id")]
    pub id: Id,
    pub name: String,
    pub size: usize,
    pub status: StatusDescription,
}

impl TeamSummary {
    pub fn new(team: &Team, size: usize) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
            size,
            status: team.into(),
        }
    }
}

/// A team member as shown on the team page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDescription {
    pub member_id: MemberId,
    pub role: RoleTag,
    pub leader: bool,
    pub joined_at: DateTime<Utc>,
}

/// Everything about a team, including its composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDescription {
    #[serde(with = "crate::model::mongodb::hex_id")]
    pub id: Id,
    pub name: String,
    pub leader: MemberId,
    pub created_at: DateTime<Utc>,
    pub status: StatusDescription,
    pub members: Vec<MemberDescription>,
    pub composition: CompositionReport,
}

impl TeamDescription {
    pub fn new(team: &Team, memberships: Vec<TeamMembership>) -> Self {
        let composition = CompositionReport::evaluate(
            &memberships.iter().map(Membership::from).collect::<Vec<_>>(),
        );
        let members = memberships
            .into_iter()
            .map(|m| MemberDescription {
                leader: team.is_leader(&m.member_id),
                member_id: m.member_id,
                role: m.role,
                joined_at: m.joined_at,
            })
            .collect();
        Self {
            id: team.id,
            name: team.name.clone(),
            leader: team.leader.clone(),
            created_at: team.created_at,
            status: team.into(),
            members,
            composition,
        }
    }
}

/// A team plus its composition, for the admin overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamReview {
    #[serde(flatten)]
    pub summary: TeamSummary,
    pub composition: CompositionReport,
}
