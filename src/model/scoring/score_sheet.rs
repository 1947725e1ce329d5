use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{mongodb::Id, team::MemberId};

/// Highest score a judge may award for one criterion.
pub const MAX_POINTS: u8 = 10;

/// The judged criteria.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Design,
    Performance,
    Innovation,
    Presentation,
}

/// Points for each criterion, `0..=MAX_POINTS`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Points {
    pub design: u8,
    pub performance: u8,
    pub innovation: u8,
    pub presentation: u8,
}

impl Points {
    fn each(&self) -> [(Criterion, u8); 4] {
        [
            (Criterion::Design, self.design),
            (Criterion::Performance, self.performance),
            (Criterion::Innovation, self.innovation),
            (Criterion::Presentation, self.presentation),
        ]
    }

    pub fn total(&self) -> u32 {
        self.each().iter().map(|(_, p)| u32::from(*p)).sum()
    }

    /// The criteria scored above [`MAX_POINTS`].
    pub fn out_of_range(&self) -> Vec<Criterion> {
        self.each()
            .into_iter()
            .filter(|(_, points)| *points > MAX_POINTS)
            .map(|(criterion, _)| criterion)
            .collect()
    }
}

/// One judge's scores for one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSheet {
    pub judge_id: MemberId,
    pub team_id: Id,
    pub points: Points,
    pub comment: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl ScoreSheet {
    pub fn new(judge_id: MemberId, team_id: Id, points: Points, comment: Option<String>) -> Self {
        Self {
            judge_id,
            team_id,
            points,
            comment,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl Points {
        pub fn example() -> Self {
            Self {
                design: 7,
                performance: 8,
                innovation: 6,
                presentation: 9,
            }
        }
    }
}
