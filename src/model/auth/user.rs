use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// What a session is allowed to do. Assigned by the identity provider.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rights {
    Participant,
    Judge,
    Admin,
}

impl Display for Rights {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Participant => "participant",
                Self::Judge => "judge",
                Self::Admin => "admin",
            }
        )
    }
}

/// A kind of user, used to select the rights an [`super::AuthToken`] must carry.
pub trait User {
    const RIGHTS: Rights;
}

/// A competitor, who forms and joins teams.
pub struct Participant;

/// A judge, who scores accepted teams.
pub struct Judge;

/// An organiser.
pub struct Admin;

impl User for Participant {
    const RIGHTS: Rights = Rights::Participant;
}

impl User for Judge {
    const RIGHTS: Rights = Rights::Judge;
}

impl User for Admin {
    const RIGHTS: Rights = Rights::Admin;
}
