use log::info;
use rocket::{serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    logging::RequestId,
    model::{
        api::{
            join_request::{JoinRequestDescription, JoinRequestSpec},
            team::TeamDescription,
        },
        auth::{AuthToken, Participant},
        mongodb::Id,
        team::{JoinRequest, JoinRequestState, NewJoinRequest, Team, TeamMembership},
    },
    store::{Repo, Store},
};

use super::common::{
    ensure_draft, ensure_leader, ensure_registration_open, ensure_role_available,
    ensure_teamless, get_team,
};
use super::teams::describe;

pub fn routes() -> Vec<Route> {
    routes![
        request_to_join,
        pending_join_requests,
        approve_join_request,
        decline_join_request,
    ]
}

/// Fetch a join request addressed to this team.
async fn get_join_request(store: &dyn Store, team: &Team, join_id: Id) -> Result<JoinRequest> {
    store
        .join_request(join_id)
        .await?
        .filter(|request| request.team_id == team.id)
        .ok_or_else(|| Error::not_found(format!("Join request {join_id} for team {}", team.id)))
}

fn ensure_pending(request: &JoinRequest) -> Result<()> {
    if request.is_pending() {
        Ok(())
    } else {
        Err(Error::conflict(format!(
            "Join request {} is no longer pending",
            request.id
        )))
    }
}

#[post("/teams/<team_id>/join-requests", data = "<spec>", format = "json")]
async fn request_to_join(
    token: AuthToken<Participant>,
    team_id: Id,
    spec: Json<JoinRequestSpec>,
    repo: Repo,
    request_id: &RequestId,
) -> Result<Json<JoinRequestDescription>> {
    ensure_registration_open(&*repo).await?;
    let team = get_team(&*repo, team_id).await?;
    ensure_draft(&team)?;
    ensure_teamless(&*repo, &token.id).await?;
    if repo.pending_request(team_id, &token.id).await?.is_some() {
        return Err(Error::conflict(format!(
            "{} already has a pending request for team {team_id}",
            token.id
        )));
    }
    let memberships = repo.team_memberships(team_id).await?;
    ensure_role_available(&memberships, spec.role, &token.id)?;

    let request = repo
        .insert_join_request(NewJoinRequest::new(team_id, token.id.clone(), spec.role))
        .await?;
    info!(
        "{request_id}: {} asked to join team {team_id} as {}",
        token.id, spec.role
    );
    Ok(Json(request.into()))
}

#[get("/teams/<team_id>/join-requests")]
async fn pending_join_requests(
    token: AuthToken<Participant>,
    team_id: Id,
    repo: Repo,
) -> Result<Json<Vec<JoinRequestDescription>>> {
    let team = get_team(&*repo, team_id).await?;
    ensure_leader(&team, &token)?;
    let requests = repo
        .join_requests(team_id)
        .await?
        .into_iter()
        .map(JoinRequestDescription::from)
        .collect();
    Ok(Json(requests))
}

/// Admit the requester. Fullness and team membership are checked again, as
/// either may have changed since the request was made.
#[post("/teams/<team_id>/join-requests/<join_id>/approve")]
async fn approve_join_request(
    token: AuthToken<Participant>,
    team_id: Id,
    join_id: Id,
    repo: Repo,
    request_id: &RequestId,
) -> Result<Json<TeamDescription>> {
    let team = get_team(&*repo, team_id).await?;
    ensure_leader(&team, &token)?;
    let request = get_join_request(&*repo, &team, join_id).await?;
    ensure_pending(&request)?;
    ensure_draft(&team)?;
    ensure_teamless(&*repo, &request.member_id).await?;
    let memberships = repo.team_memberships(team_id).await?;
    ensure_role_available(&memberships, request.role, &request.member_id)?;

    repo.insert_membership(TeamMembership::new(
        team_id,
        request.member_id.clone(),
        request.role.into(),
    ))
    .await?;
    if !repo
        .set_join_request_state(join_id, JoinRequestState::Approved)
        .await?
    {
        // Resolved concurrently; undo so the request's outcome stands.
        repo.remove_membership(team_id, &request.member_id).await?;
        return Err(Error::conflict(format!(
            "Join request {join_id} is no longer pending"
        )));
    }

    info!(
        "{request_id}: {} joined team {team_id} as {}",
        request.member_id, request.role
    );
    Ok(Json(describe(&*repo, &team).await?))
}

#[post("/teams/<team_id>/join-requests/<join_id>/decline")]
async fn decline_join_request(
    token: AuthToken<Participant>,
    team_id: Id,
    join_id: Id,
    repo: Repo,
) -> Result<Json<JoinRequestDescription>> {
    let team = get_team(&*repo, team_id).await?;
    ensure_leader(&team, &token)?;
    let request = get_join_request(&*repo, &team, join_id).await?;
    ensure_pending(&request)?;

    if !repo
        .set_join_request_state(join_id, JoinRequestState::Declined)
        .await?
    {
        return Err(Error::conflict(format!(
            "Join request {join_id} is no longer pending"
        )));
    }
    let request = get_join_request(&*repo, &team, join_id).await?;
    Ok(Json(request.into()))
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::asynchronous::Client};

    use super::*;
    use crate::model::team::{MemberId, Role, TeamCore};
    use crate::store::MemoryStore;
    use crate::test_support::{participant, seed_team};

    #[backend_test(registration_open)]
    async fn join_and_approve(client: Client, store: MemoryStore) {
        let team = seed_team(&store, TeamCore::example(), &[("leader-1", "driver")]).await;

        let response = client
            .post(uri!(request_to_join(team.id)))
            .cookie(participant("newbie"))
            .json(&JoinRequestSpec {
                role: Role::Electronics,
            })
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let request: JoinRequestDescription = response.into_json().await.unwrap();
        assert_eq!(request.member_id, MemberId::new("newbie"));
        assert_eq!(request.state, JoinRequestState::Pending);

        // Asking twice is a conflict.
        let response = client
            .post(uri!(request_to_join(team.id)))
            .cookie(participant("newbie"))
            .json(&JoinRequestSpec {
                role: Role::Electronics,
            })
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());

        // Only the leader sees the queue.
        let response = client
            .get(uri!(pending_join_requests(team.id)))
            .cookie(participant("newbie"))
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
        let response = client
            .get(uri!(pending_join_requests(team.id)))
            .cookie(participant("leader-1"))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let pending: Vec<JoinRequestDescription> = response.into_json().await.unwrap();
        assert_eq!(pending, vec![request.clone()]);

        let response = client
            .post(uri!(approve_join_request(team.id, request.id)))
            .cookie(participant("leader-1"))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let description: TeamDescription = response.into_json().await.unwrap();
        assert_eq!(description.members.len(), 2);
        assert_eq!(description.composition.size, 2);

        // Resolved requests can't move again, and leave the queue.
        let response = client
            .post(uri!(decline_join_request(team.id, request.id)))
            .cookie(participant("leader-1"))
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());
        assert!(store.join_requests(team.id).await.unwrap().is_empty());
    }

    #[backend_test(registration_open)]
    async fn full_roles_refuse_requests(client: Client, store: MemoryStore) {
        let team = seed_team(&store, TeamCore::example(), &[("leader-1", "driver")]).await;

        let response = client
            .post(uri!(request_to_join(team.id)))
            .cookie(participant("newbie"))
            .json(&JoinRequestSpec { role: Role::Driver })
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());

        // A second mechanics designer still fits.
        for member in ["md-1", "md-2"] {
            let response = client
                .post(uri!(request_to_join(team.id)))
                .cookie(participant(member))
                .json(&JoinRequestSpec {
                    role: Role::MechanicsDesigner,
                })
                .dispatch()
                .await;
            assert_eq!(Status::Ok, response.status());
        }
    }

    #[backend_test(registration_open)]
    async fn approval_rechecks_the_role(client: Client, store: MemoryStore) {
        let team = seed_team(&store, TeamCore::example(), &[("leader-1", "driver")]).await;

        let mut requests = Vec::new();
        for member in ["p-1", "p-2"] {
            let request = store
                .insert_join_request(NewJoinRequest::new(
                    team.id,
                    MemberId::new(member),
                    Role::Programmer,
                ))
                .await
                .unwrap();
            requests.push(request);
        }

        let approve = |join_id: Id| {
            client
                .post(uri!(approve_join_request(team.id, join_id)))
                .cookie(participant("leader-1"))
                .dispatch()
        };
        assert_eq!(Status::Ok, approve(requests[0].id).await.status());
        assert_eq!(Status::Conflict, approve(requests[1].id).await.status());

        // The loser can still be declined.
        let response = client
            .post(uri!(decline_join_request(team.id, requests[1].id)))
            .cookie(participant("leader-1"))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let declined: JoinRequestDescription = response.into_json().await.unwrap();
        assert_eq!(declined.state, JoinRequestState::Declined);
    }

    #[backend_test(registration_open)]
    async fn members_cannot_request_another_team(client: Client, store: MemoryStore) {
        seed_team(&store, TeamCore::example(), &[("leader-1", "driver")]).await;
        let other = seed_team(&store, TeamCore::example2(), &[("leader-2", "driver")]).await;

        let response = client
            .post(uri!(request_to_join(other.id)))
            .cookie(participant("leader-1"))
            .json(&JoinRequestSpec {
                role: Role::Programmer,
            })
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());

        // Requests addressed to one team can't be resolved through another.
        let request = store
            .insert_join_request(NewJoinRequest::new(
                other.id,
                MemberId::new("newbie"),
                Role::Programmer,
            ))
            .await
            .unwrap();
        let response = client
            .post(uri!(approve_join_request(Id::new(), request.id)))
            .cookie(participant("leader-2"))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn closed_registration_refuses_requests(client: Client, store: MemoryStore) {
        let team = seed_team(&store, TeamCore::example(), &[("leader-1", "driver")]).await;

        let response = client
            .post(uri!(request_to_join(team.id)))
            .cookie(participant("newbie"))
            .json(&JoinRequestSpec {
                role: Role::Programmer,
            })
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
    }
}
