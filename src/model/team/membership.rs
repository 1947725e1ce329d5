use std::fmt::{Display, Formatter};
use std::ops::Deref;

use chrono::{DateTime, Utc};
use rocket::{
    http::{
        impl_from_uri_param_identity,
        uri::fmt::{Path, UriDisplay},
    },
    request::FromParam,
};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

use super::role::RoleTag;

/// A member's identifier, as issued by the identity provider.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for MemberId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for MemberId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MemberId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'a> FromParam<'a> for MemberId {
    type Error = &'a str;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        if param.is_empty() {
            Err(param)
        } else {
            Ok(Self(param.to_string()))
        }
    }
}

impl UriDisplay<Path> for MemberId {
    fn fmt(&self, formatter: &mut rocket::http::uri::fmt::Formatter<'_, Path>) -> std::fmt::Result {
        formatter.write_value(&self.0)
    }
}

impl_from_uri_param_identity!([Path] MemberId);

/// One member holding one role. This is all the validator looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub member_id: MemberId,
    pub role: RoleTag,
}

impl Membership {
    pub fn new(member_id: impl Into<MemberId>, role: RoleTag) -> Self {
        Self {
            member_id: member_id.into(),
            role,
        }
    }
}

/// A stored membership record: which team, who, in what role, since when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMembership {
    pub team_id: Id,
    pub member_id: MemberId,
    pub role: RoleTag,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub joined_at: DateTime<Utc>,
}

impl TeamMembership {
    pub fn new(team_id: Id, member_id: MemberId, role: RoleTag) -> Self {
        Self {
            team_id,
            member_id,
            role,
            joined_at: Utc::now(),
        }
    }
}

impl From<TeamMembership> for Membership {
    fn from(record: TeamMembership) -> Self {
        Self {
            member_id: record.member_id,
            role: record.role,
        }
    }
}

impl From<&TeamMembership> for Membership {
    fn from(record: &TeamMembership) -> Self {
        Self {
            member_id: record.member_id.clone(),
            role: record.role.clone(),
        }
    }
}
