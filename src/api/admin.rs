use std::collections::HashMap;

use log::info;
use rocket::{serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    logging::RequestId,
    model::{
        api::{
            settings::{SettingsDescription, SettingsSpec},
            team::{AcceptanceChange, RoleChange, TeamDescription, TeamReview, TeamSummary},
        },
        auth::{Admin, AuthToken},
        mongodb::Id,
        settings::Settings,
        team::{CompositionReport, MemberId, Membership},
    },
    store::Repo,
};

use super::common::get_team;
use super::teams::{change_role, describe};

pub fn routes() -> Vec<Route> {
    routes![update_settings, review_teams, set_acceptance, admin_reassign_role]
}

#[put("/admin/settings", data = "<spec>", format = "json")]
async fn update_settings(
    token: AuthToken<Admin>,
    spec: Json<SettingsSpec>,
    repo: Repo,
    request_id: &RequestId,
) -> Result<Json<SettingsDescription>> {
    let settings: Settings = spec.into_inner().into();
    if let Some(team_id) = settings.judges_award {
        // Only real teams can win.
        get_team(&*repo, team_id).await?;
    }

    repo.put_settings(settings.clone()).await?;
    info!(
        "{request_id}: {} updated settings: {settings:?}",
        token.id
    );
    Ok(Json(settings.into()))
}

/// Every team with its composition, for deciding acceptance.
#[get("/admin/teams")]
async fn review_teams(_token: AuthToken<Admin>, repo: Repo) -> Result<Json<Vec<TeamReview>>> {
    let mut by_team: HashMap<Id, Vec<Membership>> = HashMap::new();
    for membership in repo.all_memberships().await? {
        by_team
            .entry(membership.team_id)
            .or_default()
            .push(membership.into());
    }

    let reviews = repo
        .teams()
        .await?
        .iter()
        .map(|team| {
            let memberships = by_team.remove(&team.id).unwrap_or_default();
            TeamReview {
                summary: TeamSummary::new(team, memberships.len()),
                composition: CompositionReport::evaluate(&memberships),
            }
        })
        .collect();
    Ok(Json(reviews))
}

#[put("/admin/teams/<team_id>/acceptance", data = "<change>", format = "json")]
async fn set_acceptance(
    token: AuthToken<Admin>,
    team_id: Id,
    change: Json<AcceptanceChange>,
    repo: Repo,
    request_id: &RequestId,
) -> Result<Json<TeamDescription>> {
    let mut team = get_team(&*repo, team_id).await?;
    if !team.is_submitted() {
        return Err(Error::conflict(format!(
            "Team {team_id} has not submitted its registration"
        )));
    }

    team.acceptance = change.status;
    if !repo.replace_team(&team).await? {
        return Err(Error::not_found(format!("Team {team_id}")));
    }
    info!(
        "{request_id}: {} marked team {team_id} as {}",
        token.id,
        team.acceptance.label()
    );
    Ok(Json(describe(&*repo, &team).await?))
}

/// Organisers may fix up any draft team's roles, not just their own.
#[put(
    "/teams/<team_id>/members/<member_id>/role",
    data = "<change>",
    format = "json",
    rank = 1
)]
async fn admin_reassign_role(
    _token: AuthToken<Admin>,
    team_id: Id,
    member_id: MemberId,
    change: Json<RoleChange>,
    repo: Repo,
) -> Result<Json<TeamDescription>> {
    let team = get_team(&*repo, team_id).await?;
    Ok(Json(change_role(&*repo, &team, &member_id, change.role).await?))
}
