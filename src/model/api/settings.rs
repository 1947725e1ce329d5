use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    mongodb::Id,
    settings::Settings,
    team::{RoleSpec, MAX_TEAM_SIZE, MIN_TEAM_SIZE, ROLE_TABLE},
};

/// Competition settings as exchanged with clients, both ways.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSpec {
    pub registration_open: bool,
    #[serde(default)]
    pub registration_deadline: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::model::mongodb::option_hex_id")]
    pub judges_award: Option<Id>,
}

impl From<Settings> for SettingsSpec {
    fn from(settings: Settings) -> Self {
        Self {
            registration_open: settings.registration_open,
            registration_deadline: settings.registration_deadline,
            judges_award: settings.judges_award,
        }
    }
}

impl From<SettingsSpec> for Settings {
    fn from(spec: SettingsSpec) -> Self {
        Self {
            registration_open: spec.registration_open,
            registration_deadline: spec.registration_deadline,
            judges_award: spec.judges_award,
        }
    }
}

/// Public view of the settings: the raw values plus whether registration is open right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDescription {
    #[serde(flatten)]
    pub settings: SettingsSpec,
    pub registration_open_now: bool,
}

impl From<Settings> for SettingsDescription {
    fn from(settings: Settings) -> Self {
        Self {
            registration_open_now: settings.registration_open_now(),
            settings: settings.into(),
        }
    }
}

/// The role table and team size limits, for clients to render forms with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleTableDescription {
    pub roles: &'static [RoleSpec],
    pub min_team_size: usize,
    pub max_team_size: usize,
}

impl RoleTableDescription {
    pub fn new() -> Self {
        Self {
            roles: &ROLE_TABLE,
            min_team_size: MIN_TEAM_SIZE,
            max_team_size: MAX_TEAM_SIZE,
        }
    }
}

impl Default for RoleTableDescription {
    fn default() -> Self {
        Self::new()
    }
}
