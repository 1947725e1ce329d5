use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{mongodb::Id, team::Team};

use super::score_sheet::ScoreSheet;

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    /// Standard competition ranking: tied teams share a rank and the next rank is skipped.
    pub rank: usize,
    #[serde(with = "crate::model::mongodb::hex_id")]
    pub team_id: Id,
    pub team_name: String,
    pub sheets: usize,
    /// Mean of the judges' sheet totals, or zero if nobody has scored the team yet.
    pub mean_total: f64,
}

/// Rank every accepted team by its mean judged total, best first.
///
/// Ties on the mean are broken by name for display, but share a rank.
pub fn standings(teams: &[Team], scores: &[ScoreSheet]) -> Vec<Standing> {
    let mut totals: HashMap<Id, (u32, usize)> = HashMap::new();
    for sheet in scores {
        let entry = totals.entry(sheet.team_id).or_default();
        entry.0 += sheet.points.total();
        entry.1 += 1;
    }

    let mut rows: Vec<Standing> = teams
        .iter()
        .filter(|team| team.is_accepted())
        .map(|team| {
            let (sum, sheets) = totals.get(&team.id).copied().unwrap_or_default();
            let mean_total = if sheets == 0 {
                0.0
            } else {
                f64::from(sum) / sheets as f64
            };
            Standing {
                rank: 0,
                team_id: team.id,
                team_name: team.name.clone(),
                sheets,
                mean_total,
            }
        })
        .collect();

    rows.sort_by(|a, b| match b.mean_total.total_cmp(&a.mean_total) {
        Ordering::Equal => a.team_name.cmp(&b.team_name),
        other => other,
    });

    let mut previous: Option<f64> = None;
    let mut rank = 0;
    for (position, row) in rows.iter_mut().enumerate() {
        if previous != Some(row.mean_total) {
            rank = position + 1;
            previous = Some(row.mean_total);
        }
        row.rank = rank;
    }

    rows
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::{
        scoring::Points,
        team::{AcceptanceStatus, MemberId, RegistrationStatus, TeamCore},
    };

    fn accepted(name: &str) -> Team {
        let mut core = TeamCore::new(name.to_string(), MemberId::new(format!("{name}-lead")));
        core.registration = RegistrationStatus::Submitted {
            submitted_at: Utc::now(),
        };
        core.acceptance = AcceptanceStatus::Accepted;
        Team::new(Id::new(), core)
    }

    fn sheet(judge: &str, team: &Team, total: u8) -> ScoreSheet {
        // Spread the total over the criteria so each stays in range.
        let quarter = total / 4;
        let points = Points {
            design: quarter,
            performance: quarter,
            innovation: quarter,
            presentation: total - 3 * quarter,
        };
        ScoreSheet::new(MemberId::new(judge), team.id, points, None)
    }

    #[test]
    fn only_accepted_teams_are_ranked() {
        let alpha = accepted("Alpha");
        let mut pending = accepted("Pending");
        pending.acceptance = AcceptanceStatus::Pending;
        let mut draft = accepted("Draft");
        draft.registration = RegistrationStatus::Draft;

        let rows = standings(&[alpha.clone(), pending, draft], &[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team_id, alpha.id);
        assert_eq!(rows[0].sheets, 0);
        assert_eq!(rows[0].mean_total, 0.0);
    }

    #[test]
    fn ranked_by_mean_with_shared_ranks() {
        let alpha = accepted("Alpha");
        let bravo = accepted("Bravo");
        let charlie = accepted("Charlie");
        let delta = accepted("Delta");

        let scores = vec![
            sheet("j1", &alpha, 20),
            sheet("j2", &alpha, 30),
            sheet("j1", &bravo, 30),
            sheet("j1", &charlie, 25),
            sheet("j1", &delta, 10),
        ];
        let rows = standings(&[delta.clone(), charlie, bravo, alpha], &scores);

        let summary: Vec<(usize, &str, f64)> = rows
            .iter()
            .map(|r| (r.rank, r.team_name.as_str(), r.mean_total))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, "Bravo", 30.0),
                (2, "Alpha", 25.0),
                (2, "Charlie", 25.0),
                (4, "Delta", 10.0),
            ]
        );
        assert_eq!(rows[1].sheets, 2);
    }
}
