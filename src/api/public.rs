use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::{
            scoring::{AwardDescription, Leaderboard},
            settings::{RoleTableDescription, SettingsDescription},
        },
        scoring::standings,
    },
    store::Repo,
};

pub fn routes() -> Vec<Route> {
    routes![role_table, settings, leaderboard]
}

#[get("/roles")]
async fn role_table() -> Json<RoleTableDescription> {
    Json(RoleTableDescription::new())
}

#[get("/settings")]
async fn settings(repo: Repo) -> Result<Json<SettingsDescription>> {
    Ok(Json(repo.settings().await?.into()))
}

#[get("/leaderboard")]
async fn leaderboard(repo: Repo) -> Result<Json<Leaderboard>> {
    let teams = repo.teams().await?;
    let scores = repo.scores().await?;
    let award = repo.settings().await?.judges_award;

    // The award team may have been disbanded since.
    let judges_award = award.and_then(|team_id| {
        teams
            .iter()
            .find(|team| team.id == team_id)
            .map(|team| AwardDescription {
                team_id,
                team_name: team.name.clone(),
            })
    });

    Ok(Json(Leaderboard {
        standings: standings(&teams, &scores),
        judges_award,
    }))
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::asynchronous::Client};

    use super::*;
    use crate::model::{
        scoring::{Points, ScoreSheet},
        settings::Settings,
        team::{MemberId, Role, TeamCore, MAX_TEAM_SIZE, MIN_TEAM_SIZE},
    };
    use crate::store::{MemoryStore, Store};
    use crate::test_support::{accept, seed_team, FULL_LINEUP};

    #[backend_test]
    async fn role_table_is_public(client: Client) {
        let response = client.get(uri!(role_table)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let table: rocket::serde::json::Value = response.into_json().await.unwrap();
        assert_eq!(table["minTeamSize"], MIN_TEAM_SIZE);
        assert_eq!(table["maxTeamSize"], MAX_TEAM_SIZE);
        let roles = table["roles"].as_array().unwrap();
        assert_eq!(roles.len(), Role::ALL.len());
        assert_eq!(roles[3]["role"], "mechanics_designer");
        assert_eq!(roles[3]["cap"], 2);
    }

    #[backend_test(registration_open)]
    async fn settings_are_public(client: Client) {
        let response = client.get(uri!(settings)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let description: SettingsDescription = response.into_json().await.unwrap();
        assert!(description.settings.registration_open);
        assert!(description.registration_open_now);
        assert_eq!(description.settings.judges_award, None);
    }

    #[backend_test]
    async fn leaderboard_ranks_accepted_teams(client: Client, store: MemoryStore) {
        let first = seed_team(&store, TeamCore::example(), &FULL_LINEUP).await;
        let second = seed_team(&store, TeamCore::example2(), &[("leader-2", "driver")]).await;
        let unaccepted = seed_team(
            &store,
            TeamCore::new("Wheelies".to_string(), MemberId::new("leader-3")),
            &[("leader-3", "driver")],
        )
        .await;
        accept(&store, &first).await;
        accept(&store, &second).await;

        for (judge, team, design) in [("j1", &first, 10), ("j2", &first, 4), ("j1", &second, 1)] {
            store
                .upsert_score(ScoreSheet::new(
                    MemberId::new(judge),
                    team.id,
                    Points {
                        design,
                        ..Points::example()
                    },
                    None,
                ))
                .await
                .unwrap();
        }
        store
            .upsert_score(ScoreSheet::new(
                MemberId::new("j1"),
                unaccepted.id,
                Points::example(),
                None,
            ))
            .await
            .unwrap();
        store
            .put_settings(Settings {
                judges_award: Some(second.id),
                ..Settings::default()
            })
            .await
            .unwrap();

        let response = client.get(uri!(leaderboard)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let board: Leaderboard = response.into_json().await.unwrap();

        assert_eq!(board.standings.len(), 2);
        assert_eq!(board.standings[0].team_id, first.id);
        assert_eq!(board.standings[0].rank, 1);
        assert_eq!(board.standings[0].sheets, 2);
        assert_eq!(board.standings[0].mean_total, 30.0);
        assert_eq!(board.standings[1].team_id, second.id);
        assert_eq!(board.standings[1].rank, 2);
        assert_eq!(board.standings[1].mean_total, 24.0);

        let award = board.judges_award.unwrap();
        assert_eq!(award.team_id, second.id);
        assert_eq!(award.team_name, "Servo Squad");
    }
}
