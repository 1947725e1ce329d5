//! Persistence behind a narrow interface, so that handlers (and the validator
//! they feed) never talk to a concrete database.

use std::ops::Deref;
use std::sync::Arc;

use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::error::Result;
use crate::model::{
    mongodb::Id,
    scoring::ScoreSheet,
    settings::Settings,
    team::{
        JoinRequest, JoinRequestState, MemberId, Membership, NewJoinRequest, NewTeam, RoleTag,
        Team, TeamMembership,
    },
};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

mod memory;
mod mongo;

/// Everything the API needs from persistent storage.
///
/// Uniqueness rules (one team per member, unique team names, one score sheet
/// per judge and team) are enforced here and reported as `409 Conflict`.
#[rocket::async_trait]
pub trait Store: Send + Sync {
    async fn settings(&self) -> Result<Settings>;
    async fn put_settings(&self, settings: Settings) -> Result<()>;

    async fn insert_team(&self, team: NewTeam) -> Result<Team>;
    async fn team(&self, id: Id) -> Result<Option<Team>>;
    async fn teams(&self) -> Result<Vec<Team>>;
    /// Overwrite a team. Returns false if it no longer exists.
    async fn replace_team(&self, team: &Team) -> Result<bool>;
    /// Delete a team along with its memberships, join requests and score sheets.
    async fn delete_team(&self, id: Id) -> Result<bool>;

    async fn memberships(&self, team_id: Id) -> Result<Vec<TeamMembership>>;
    async fn all_memberships(&self) -> Result<Vec<TeamMembership>>;
    async fn membership_of(&self, member: &MemberId) -> Result<Option<TeamMembership>>;
    async fn insert_membership(&self, membership: TeamMembership) -> Result<()>;
    async fn set_role(&self, team_id: Id, member: &MemberId, role: RoleTag) -> Result<bool>;
    async fn remove_membership(&self, team_id: Id, member: &MemberId) -> Result<bool>;

    async fn insert_join_request(&self, request: NewJoinRequest) -> Result<JoinRequest>;
    async fn join_request(&self, id: Id) -> Result<Option<JoinRequest>>;
    /// Pending requests for a team, oldest first.
    async fn join_requests(&self, team_id: Id) -> Result<Vec<JoinRequest>>;
    async fn pending_request(&self, team_id: Id, member: &MemberId)
        -> Result<Option<JoinRequest>>;
    /// Move a pending request to a new state. Returns false if it was not pending.
    async fn set_join_request_state(&self, id: Id, state: JoinRequestState) -> Result<bool>;

    /// Insert or replace the sheet for this judge and team.
    async fn upsert_score(&self, sheet: ScoreSheet) -> Result<()>;
    async fn scores(&self) -> Result<Vec<ScoreSheet>>;
    async fn scores_by_judge(&self, judge: &MemberId) -> Result<Vec<ScoreSheet>>;

    /// The validator's view of a team: just who holds which role.
    async fn team_memberships(&self, team_id: Id) -> Result<Vec<Membership>> {
        Ok(self
            .memberships(team_id)
            .await?
            .into_iter()
            .map(Membership::from)
            .collect())
    }
}

/// A shared handle on the configured [`Store`], kept in managed state.
#[derive(Clone)]
pub struct Repo(Arc<dyn Store>);

impl Repo {
    pub fn new(store: impl Store + 'static) -> Self {
        Self(Arc::new(store))
    }
}

impl Deref for Repo {
    type Target = dyn Store;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Repo {
    type Error = ();

    /// Get the store from the managed state.
    ///
    /// Panics iff no [`Repo`] is managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let repo = req.guard::<&State<Repo>>().await.unwrap();
        request::Outcome::Success(repo.inner().clone())
    }
}
