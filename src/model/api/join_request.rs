use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    mongodb::Id,
    team::{JoinRequest, JoinRequestState, MemberId, Role},
};

/// A request to join a team in a particular role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequestSpec {
    pub role: Role,
}

/// An API-friendly join request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequestDescription {
    #[serde(with = "crate::model::mongodb::hex_id")]
    pub id: Id,
    #[serde(with = "crate::model::mongodb::hex_id")]
    pub team_id: Id,
    pub member_id: MemberId,
    pub role: Role,
    pub state: JoinRequestState,
    pub created_at: DateTime<Utc>,
}

impl From<JoinRequest> for JoinRequestDescription {
    fn from(request: JoinRequest) -> Self {
        Self {
            id: request.id,
            team_id: request.request.team_id,
            member_id: request.request.member_id,
            role: request.request.role,
            state: request.request.state,
            created_at: request.request.created_at,
        }
    }
}
