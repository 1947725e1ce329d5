use std::collections::HashMap;

use chrono::Utc;
use log::info;
use rocket::{serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    logging::RequestId,
    model::{
        api::team::{CreateTeamRequest, RoleChange, TeamDescription, TeamSummary},
        auth::{AuthToken, Participant},
        mongodb::Id,
        team::{
            composition, validate_team_name, AcceptanceStatus, CompositionReport, MemberId,
            NewTeam, RegistrationStatus, Role, Team, TeamMembership,
        },
    },
    store::{Repo, Store},
};

use super::common::{
    ensure_draft, ensure_leader, ensure_registration_open, ensure_role_available,
    ensure_teamless, get_team,
};

pub fn routes() -> Vec<Route> {
    routes![
        create_team,
        list_teams,
        team_detail,
        team_composition,
        my_team,
        reassign_role,
        remove_member,
        disband_team,
        submit_registration,
        withdraw_registration,
    ]
}

/// Describe a team as it is now.
pub(super) async fn describe(store: &dyn Store, team: &Team) -> Result<TeamDescription> {
    let memberships = store.memberships(team.id).await?;
    Ok(TeamDescription::new(team, memberships))
}

/// Move `member` into `role`, provided the team is still a draft and the role has room.
pub(super) async fn change_role(
    store: &dyn Store,
    team: &Team,
    member: &MemberId,
    role: Role,
) -> Result<TeamDescription> {
    ensure_draft(team)?;
    let memberships = store.team_memberships(team.id).await?;
    if !memberships.iter().any(|m| &m.member_id == member) {
        return Err(Error::not_found(format!(
            "Member {member} of team {}",
            team.id
        )));
    }
    ensure_role_available(&memberships, role, member)?;

    if !store.set_role(team.id, member, role.into()).await? {
        return Err(Error::not_found(format!(
            "Member {member} of team {}",
            team.id
        )));
    }
    describe(store, team).await
}

#[post("/teams", data = "<spec>", format = "json")]
async fn create_team(
    token: AuthToken<Participant>,
    spec: Json<CreateTeamRequest>,
    repo: Repo,
    request_id: &RequestId,
) -> Result<Json<TeamDescription>> {
    ensure_registration_open(&*repo).await?;
    let name = validate_team_name(&spec.name)
        .ok_or_else(|| Error::bad_request(format!("Illegal team name: {:?}", spec.name)))?;
    ensure_teamless(&*repo, &token.id).await?;

    let team = repo.insert_team(NewTeam::new(name, token.id.clone())).await?;
    let founder = TeamMembership::new(team.id, token.id.clone(), spec.role.into());
    if let Err(err) = repo.insert_membership(founder).await {
        // The founder joined another team in the meantime.
        repo.delete_team(team.id).await?;
        return Err(err);
    }

    info!(
        "{request_id}: {} founded team {} ({:?})",
        token.id, team.id, team.name
    );
    Ok(Json(describe(&*repo, &team).await?))
}

#[get("/teams")]
async fn list_teams(repo: Repo) -> Result<Json<Vec<TeamSummary>>> {
    let mut sizes: HashMap<Id, usize> = HashMap::new();
    for membership in repo.all_memberships().await? {
        *sizes.entry(membership.team_id).or_default() += 1;
    }

    let summaries = repo
        .teams()
        .await?
        .iter()
        .map(|team| TeamSummary::new(team, sizes.get(&team.id).copied().unwrap_or_default()))
        .collect();
    Ok(Json(summaries))
}

#[get("/teams/<team_id>")]
async fn team_detail(team_id: Id, repo: Repo) -> Result<Json<TeamDescription>> {
    let team = get_team(&*repo, team_id).await?;
    Ok(Json(describe(&*repo, &team).await?))
}

#[get("/teams/<team_id>/composition")]
async fn team_composition(team_id: Id, repo: Repo) -> Result<Json<CompositionReport>> {
    // 404 for unknown teams rather than an empty report.
    get_team(&*repo, team_id).await?;
    let memberships = repo.team_memberships(team_id).await?;
    Ok(Json(CompositionReport::evaluate(&memberships)))
}

#[get("/me/team")]
async fn my_team(token: AuthToken<Participant>, repo: Repo) -> Result<Json<TeamDescription>> {
    let membership = repo
        .membership_of(&token.id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Team for {}", token.id)))?;
    let team = get_team(&*repo, membership.team_id).await?;
    Ok(Json(describe(&*repo, &team).await?))
}

#[put(
    "/teams/<team_id>/members/<member_id>/role",
    data = "<change>",
    format = "json",
    rank = 2
)]
async fn reassign_role(
    token: AuthToken<Participant>,
    team_id: Id,
    member_id: MemberId,
    change: Json<RoleChange>,
    repo: Repo,
) -> Result<Json<TeamDescription>> {
    let team = get_team(&*repo, team_id).await?;
    ensure_leader(&team, &token)?;
    Ok(Json(change_role(&*repo, &team, &member_id, change.role).await?))
}

/// The leader removes a member, or a member leaves of their own accord.
#[delete("/teams/<team_id>/members/<member_id>")]
async fn remove_member(
    token: AuthToken<Participant>,
    team_id: Id,
    member_id: MemberId,
    repo: Repo,
    request_id: &RequestId,
) -> Result<()> {
    let team = get_team(&*repo, team_id).await?;
    if token.id != member_id {
        ensure_leader(&team, &token)?;
    }
    if team.is_leader(&member_id) {
        return Err(Error::conflict(
            "The team leader cannot leave; disband the team instead",
        ));
    }
    ensure_draft(&team)?;

    if !repo.remove_membership(team_id, &member_id).await? {
        return Err(Error::not_found(format!(
            "Member {member_id} of team {team_id}"
        )));
    }
    info!("{request_id}: {member_id} left team {team_id}");
    Ok(())
}

#[delete("/teams/<team_id>")]
async fn disband_team(
    token: AuthToken<Participant>,
    team_id: Id,
    repo: Repo,
    request_id: &RequestId,
) -> Result<()> {
    let team = get_team(&*repo, team_id).await?;
    ensure_leader(&team, &token)?;
    ensure_draft(&team)?;

    if !repo.delete_team(team_id).await? {
        return Err(Error::not_found(format!("Team {team_id}")));
    }
    info!("{request_id}: team {team_id} disbanded by {}", token.id);
    Ok(())
}

/// Submit the team for registration. Fails with the ordered findings if the
/// composition isn't registrable.
#[post("/teams/<team_id>/registration")]
async fn submit_registration(
    token: AuthToken<Participant>,
    team_id: Id,
    repo: Repo,
    request_id: &RequestId,
) -> Result<Json<TeamDescription>> {
    let mut team = get_team(&*repo, team_id).await?;
    ensure_leader(&team, &token)?;
    ensure_registration_open(&*repo).await?;
    if team.is_submitted() {
        return Err(Error::conflict(format!(
            "Team {team_id} has already submitted its registration"
        )));
    }

    let findings = composition::validation_errors(&repo.team_memberships(team_id).await?);
    if !findings.is_empty() {
        return Err(Error::Composition(findings));
    }

    team.registration = RegistrationStatus::Submitted {
        submitted_at: Utc::now(),
    };
    team.acceptance = AcceptanceStatus::Pending;
    if !repo.replace_team(&team).await? {
        return Err(Error::not_found(format!("Team {team_id}")));
    }
    info!("{request_id}: team {team_id} submitted its registration");
    Ok(Json(describe(&*repo, &team).await?))
}

/// Return a submitted team to draft, as long as nobody has reviewed it yet.
#[delete("/teams/<team_id>/registration")]
async fn withdraw_registration(
    token: AuthToken<Participant>,
    team_id: Id,
    repo: Repo,
) -> Result<Json<TeamDescription>> {
    let mut team = get_team(&*repo, team_id).await?;
    ensure_leader(&team, &token)?;
    if !team.is_submitted() {
        return Err(Error::conflict(format!(
            "Team {team_id} has not submitted its registration"
        )));
    }
    if team.acceptance != AcceptanceStatus::Pending {
        return Err(Error::conflict(format!(
            "Team {team_id} has already been reviewed"
        )));
    }

    team.registration = RegistrationStatus::Draft;
    if !repo.replace_team(&team).await? {
        return Err(Error::not_found(format!("Team {team_id}")));
    }
    Ok(Json(describe(&*repo, &team).await?))
}
