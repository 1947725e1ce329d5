use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::{serde_helpers::chrono_datetime_as_bson_datetime, to_bson, Bson};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

use super::{membership::MemberId, role::Role};

/// Lifecycle of a request to join a team.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinRequestState {
    Pending,
    Approved,
    Declined,
}

impl From<JoinRequestState> for Bson {
    fn from(state: JoinRequestState) -> Self {
        to_bson(&state).expect("Serialisation is infallible")
    }
}

/// Core join request data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequestCore {
    pub team_id: Id,
    pub member_id: MemberId,
    /// Only recognised roles may be requested.
    pub role: Role,
    pub state: JoinRequestState,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl JoinRequestCore {
    pub fn new(team_id: Id, member_id: MemberId, role: Role) -> Self {
        Self {
            team_id,
            member_id,
            role,
            state: JoinRequestState::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == JoinRequestState::Pending
    }
}

/// A join request without an ID.
pub type NewJoinRequest = JoinRequestCore;

/// A join request from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub request: JoinRequestCore,
}

impl Deref for JoinRequest {
    type Target = JoinRequestCore;

    fn deref(&self) -> &Self::Target {
        &self.request
    }
}
