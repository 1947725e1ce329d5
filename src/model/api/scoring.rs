use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    mongodb::Id,
    scoring::{Points, ScoreSheet, Standing},
};

/// Longest permitted judge's comment, in characters.
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// A judge's scores for one team. Every criterion must be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub points: Points,
    #[serde(default)]
    pub comment: Option<String>,
}

/// An API-friendly score sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSheetDescription {
    #[serde(with = "crate::model::mongodb::hex_id")]
    pub team_id: Id,
    pub points: Points,
    pub total: u32,
    pub comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<ScoreSheet> for ScoreSheetDescription {
    fn from(sheet: ScoreSheet) -> Self {
        Self {
            team_id: sheet.team_id,
            total: sheet.points.total(),
            points: sheet.points,
            comment: sheet.comment,
            updated_at: sheet.updated_at,
        }
    }
}

/// The team holding the judges' award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardDescription {
    #[serde(with = "crate::model::mongodb::hex_id")]
    pub team_id: Id,
    pub team_name: String,
}

/// The public leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub standings: Vec<Standing>,
    pub judges_award: Option<AwardDescription>,
}
