use log::info;
use rocket::{
    serde::json::{self, Json},
    Route,
};

use crate::{
    error::{Error, Result},
    logging::RequestId,
    model::{
        api::scoring::{ScoreSheetDescription, ScoreSubmission, MAX_COMMENT_LENGTH},
        auth::{AuthToken, Judge},
        mongodb::Id,
        scoring::{ScoreSheet, MAX_POINTS},
    },
    store::Repo,
};

use super::common::get_team;

pub fn routes() -> Vec<Route> {
    routes![submit_score, my_scores]
}

/// Record this judge's scores for an accepted team, replacing any earlier sheet.
#[put("/teams/<team_id>/score", data = "<submission>", format = "json")]
async fn submit_score<'r>(
    token: AuthToken<Judge>,
    team_id: Id,
    submission: std::result::Result<Json<ScoreSubmission>, json::Error<'r>>,
    repo: Repo,
    request_id: &RequestId,
) -> Result<Json<ScoreSheetDescription>> {
    let team = get_team(&*repo, team_id).await?;
    if !team.is_accepted() {
        return Err(Error::conflict(format!(
            "Team {team_id} has not been accepted"
        )));
    }

    // Missing criteria and negative or oversized numbers never reach `Points`.
    let ScoreSubmission { points, comment } = submission
        .map_err(|e| Error::bad_request(format!("Malformed score sheet: {e}")))?
        .into_inner();
    let out_of_range = points.out_of_range();
    if !out_of_range.is_empty() {
        return Err(Error::bad_request(format!(
            "Points must be at most {MAX_POINTS}: {out_of_range:?}"
        )));
    }
    let comment = comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    if comment
        .as_ref()
        .map_or(false, |c| c.chars().count() > MAX_COMMENT_LENGTH)
    {
        return Err(Error::bad_request(format!(
            "Comments are limited to {MAX_COMMENT_LENGTH} characters"
        )));
    }

    let sheet = ScoreSheet::new(token.id.clone(), team_id, points, comment);
    repo.upsert_score(sheet.clone()).await?;
    info!(
        "{request_id}: judge {} scored team {team_id} at {}",
        token.id,
        points.total()
    );
    Ok(Json(sheet.into()))
}

#[get("/scores")]
async fn my_scores(
    token: AuthToken<Judge>,
    repo: Repo,
) -> Result<Json<Vec<ScoreSheetDescription>>> {
    let sheets = repo
        .scores_by_judge(&token.id)
        .await?
        .into_iter()
        .map(ScoreSheetDescription::from)
        .collect();
    Ok(Json(sheets))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Header, Status},
        local::asynchronous::{Client, LocalResponse},
    };

    use super::*;
    use crate::model::{
        auth::Participant,
        scoring::Points,
        team::{MemberId, TeamCore},
    };
    use crate::store::{MemoryStore, Store};
    use crate::test_support::{accept, bearer, judge, participant, seed_team, FULL_LINEUP};

    #[backend_test]
    async fn score_and_rescore(client: Client, store: MemoryStore) {
        let team = seed_team(&store, TeamCore::example(), &FULL_LINEUP).await;
        accept(&store, &team).await;

        let response = client
            .put(uri!(submit_score(team.id)))
            .cookie(judge("judy"))
            .json(&ScoreSubmission {
                points: Points::example(),
                comment: Some("  Tidy wiring ".to_string()),
            })
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let sheet: ScoreSheetDescription = response.into_json().await.unwrap();
        assert_eq!(sheet.total, 30);
        assert_eq!(sheet.comment.as_deref(), Some("Tidy wiring"));

        // A second submission replaces the first.
        let rescored = Points {
            design: 10,
            ..Points::example()
        };
        let response = client
            .put(uri!(submit_score(team.id)))
            .cookie(judge("judy"))
            .json(&ScoreSubmission {
                points: rescored,
                comment: None,
            })
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let response = client
            .get(uri!(my_scores))
            .cookie(judge("judy"))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let sheets: Vec<ScoreSheetDescription> = response.into_json().await.unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].points, rescored);
        assert_eq!(sheets[0].total, 33);
        assert_eq!(sheets[0].comment, None);

        // Other judges have their own sheets.
        let response = client
            .get(uri!(my_scores))
            .cookie(judge("jules"))
            .dispatch()
            .await;
        let sheets: Vec<ScoreSheetDescription> = response.into_json().await.unwrap();
        assert!(sheets.is_empty());
        assert_eq!(store.scores().await.unwrap().len(), 1);
    }

    #[backend_test]
    async fn bad_scores(client: Client, store: MemoryStore) {
        let draft = seed_team(&store, TeamCore::example(), &FULL_LINEUP).await;
        let accepted = seed_team(&store, TeamCore::example2(), &[("leader-2", "driver")]).await;
        accept(&store, &accepted).await;

        let score = |team_id: Id, points: Points| {
            client
                .put(uri!(submit_score(team_id)))
                .cookie(judge("judy"))
                .json(&ScoreSubmission {
                    points,
                    comment: None,
                })
                .dispatch()
        };

        // Only accepted teams are judged.
        assert_eq!(
            Status::Conflict,
            score(draft.id, Points::example()).await.status()
        );
        assert_eq!(
            Status::NotFound,
            score(Id::new(), Points::example()).await.status()
        );

        // Out of range.
        let too_high = Points {
            innovation: 11,
            ..Points::example()
        };
        assert_eq!(Status::BadRequest, score(accepted.id, too_high).await.status());

        // Participants can't score at all.
        let response = client
            .put(uri!(submit_score(accepted.id)))
            .cookie(participant("leader-2"))
            .json(&ScoreSubmission {
                points: Points::example(),
                comment: None,
            })
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());

        assert!(store.scores().await.unwrap().is_empty());
    }

    /// Number of sheets in a successful `GET /scores` response.
    async fn scores_for(response: LocalResponse<'_>) -> usize {
        assert_eq!(Status::Ok, response.status());
        response
            .into_json::<Vec<ScoreSheetDescription>>()
            .await
            .unwrap()
            .len()
    }

    #[backend_test]
    async fn bearer_sessions(client: Client, store: MemoryStore) {
        let team = seed_team(&store, TeamCore::example(), &FULL_LINEUP).await;
        store
            .upsert_score(ScoreSheet::new(
                MemberId::new("judy"),
                team.id,
                Points::example(),
                None,
            ))
            .await
            .unwrap();

        // Header only.
        let response = client
            .get(uri!(my_scores))
            .header(bearer::<Judge>("judy"))
            .dispatch()
            .await;
        assert_eq!(scores_for(response).await, 1);

        // The header wins over the cookie.
        let response = client
            .get(uri!(my_scores))
            .header(bearer::<Judge>("judy"))
            .cookie(participant("leader-1"))
            .dispatch()
            .await;
        assert_eq!(scores_for(response).await, 1);
        let response = client
            .get(uri!(my_scores))
            .header(bearer::<Participant>("leader-1"))
            .cookie(judge("judy"))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());

        // A broken bearer token is no session at all, whatever the cookie says.
        let response = client
            .get(uri!(my_scores))
            .header(Header::new("Authorization", "Bearer not.a.jwt"))
            .cookie(judge("judy"))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());

        // Other schemes are ignored in favour of the cookie.
        let response = client
            .get(uri!(my_scores))
            .header(Header::new("Authorization", "Basic anVkeTpodW50ZXIy"))
            .cookie(judge("judy"))
            .dispatch()
            .await;
        assert_eq!(scores_for(response).await, 1);
    }

    #[backend_test]
    async fn malformed_score_sheets_are_bad_requests(client: Client, store: MemoryStore) {
        let team = seed_team(&store, TeamCore::example(), &FULL_LINEUP).await;
        accept(&store, &team).await;

        for body in [
            r#"{"points":{"design":11,"performance":5,"innovation":5,"presentation":5}}"#,
            r#"{"points":{"design":300,"performance":5,"innovation":5,"presentation":5}}"#,
            r#"{"points":{"design":-1,"performance":5,"innovation":5,"presentation":5}}"#,
            r#"{"points":{"design":5,"performance":5,"innovation":5}}"#,
            r#"{"comment":"no points at all"}"#,
            "not json",
        ] {
            let response = client
                .put(uri!(submit_score(team.id)))
                .cookie(judge("judy"))
                .header(ContentType::JSON)
                .body(body)
                .dispatch()
                .await;
            assert_eq!(Status::BadRequest, response.status(), "{body}");
        }
        assert!(store.scores().await.unwrap().is_empty());

        // The same shape with every criterion in range is accepted.
        let response = client
            .put(uri!(submit_score(team.id)))
            .cookie(judge("judy"))
            .header(ContentType::JSON)
            .body(r#"{"points":{"design":0,"performance":10,"innovation":5,"presentation":5}}"#)
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let sheet: ScoreSheetDescription = response.into_json().await.unwrap();
        assert_eq!(sheet.total, 20);
    }
}
