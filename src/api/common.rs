use crate::error::{Error, Result};
use crate::model::{
    auth::AuthToken,
    mongodb::Id,
    team::{composition, MemberId, Membership, Role, Team},
};
use crate::store::Store;

/// Fetch a team, or fail with `404 Not Found`.
pub async fn get_team(store: &dyn Store, team_id: Id) -> Result<Team> {
    store
        .team(team_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Team {team_id}")))
}

/// Ensure the token holder leads the given team.
pub fn ensure_leader<U>(team: &Team, token: &AuthToken<U>) -> Result<()> {
    if team.is_leader(&token.id) {
        Ok(())
    } else {
        Err(Error::forbidden(format!(
            "{} does not lead team {}",
            token.id, team.id
        )))
    }
}

/// Membership may only change while the team is still a draft.
pub fn ensure_draft(team: &Team) -> Result<()> {
    if team.is_submitted() {
        Err(Error::conflict(format!(
            "Team {} has submitted its registration; withdraw it first",
            team.id
        )))
    } else {
        Ok(())
    }
}

/// Registration must be open right now for teams to form or change.
pub async fn ensure_registration_open(store: &dyn Store) -> Result<()> {
    if store.settings().await?.registration_open_now() {
        Ok(())
    } else {
        Err(Error::forbidden("Registration is closed"))
    }
}

/// Ensure `member` could take `role` in a team with these memberships.
///
/// The member's own current membership is discounted, so keeping a role you
/// already hold is never refused.
pub fn ensure_role_available(
    memberships: &[Membership],
    role: Role,
    member: &MemberId,
) -> Result<()> {
    let others = memberships
        .iter()
        .filter(|m| &m.member_id != member)
        .cloned()
        .collect::<Vec<_>>();
    if composition::is_role_full(role, &others) {
        Err(Error::conflict(format!("Role {role} is already full")))
    } else {
        Ok(())
    }
}

/// Ensure the member doesn't already belong to a team.
pub async fn ensure_teamless(store: &dyn Store, member: &MemberId) -> Result<()> {
    match store.membership_of(member).await? {
        Some(existing) => Err(Error::conflict(format!(
            "{member} already belongs to team {}",
            existing.team_id
        ))),
        None => Ok(()),
    }
}
