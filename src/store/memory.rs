use std::collections::BTreeMap;
use std::sync::Arc;

use rocket::tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::model::{
    mongodb::Id,
    scoring::ScoreSheet,
    settings::Settings,
    team::{
        JoinRequest, JoinRequestState, MemberId, NewJoinRequest, NewTeam, RoleTag, Team,
        TeamMembership,
    },
};

use super::Store;

#[derive(Default)]
struct Tables {
    settings: Settings,
    teams: BTreeMap<Id, Team>,
    /// Keyed by member, as a member belongs to at most one team.
    memberships: BTreeMap<MemberId, TeamMembership>,
    join_requests: BTreeMap<Id, JoinRequest>,
    scores: BTreeMap<(MemberId, Id), ScoreSheet>,
}

/// A [`Store`] that lives entirely in memory.
///
/// Used by the test suite and for running the server without a database.
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn settings(&self) -> Result<Settings> {
        Ok(self.tables.read().await.settings.clone())
    }

    async fn put_settings(&self, settings: Settings) -> Result<()> {
        self.tables.write().await.settings = settings;
        Ok(())
    }

    async fn insert_team(&self, team: NewTeam) -> Result<Team> {
        let mut tables = self.tables.write().await;
        if tables.teams.values().any(|t| t.name_key == team.name_key) {
            return Err(Error::conflict(format!(
                "Team name already in use: {}",
                team.name
            )));
        }
        let team = Team::new(Id::new(), team);
        tables.teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn team(&self, id: Id) -> Result<Option<Team>> {
        Ok(self.tables.read().await.teams.get(&id).cloned())
    }

    async fn teams(&self) -> Result<Vec<Team>> {
        let tables = self.tables.read().await;
        let mut teams: Vec<Team> = tables.teams.values().cloned().collect();
        teams.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(teams)
    }

    async fn replace_team(&self, team: &Team) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.teams.get_mut(&team.id) {
            Some(existing) => {
                *existing = team.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_team(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.teams.remove(&id).is_none() {
            return Ok(false);
        }
        tables.memberships.retain(|_, m| m.team_id != id);
        tables.join_requests.retain(|_, r| r.team_id != id);
        tables.scores.retain(|_, s| s.team_id != id);
        Ok(true)
    }

    async fn memberships(&self, team_id: Id) -> Result<Vec<TeamMembership>> {
        let tables = self.tables.read().await;
        let mut members: Vec<TeamMembership> = tables
            .memberships
            .values()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(members)
    }

    async fn all_memberships(&self) -> Result<Vec<TeamMembership>> {
        Ok(self
            .tables
            .read()
            .await
            .memberships
            .values()
            .cloned()
            .collect())
    }

    async fn membership_of(&self, member: &MemberId) -> Result<Option<TeamMembership>> {
        Ok(self.tables.read().await.memberships.get(member).cloned())
    }

    async fn insert_membership(&self, membership: TeamMembership) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.memberships.contains_key(&membership.member_id) {
            return Err(Error::conflict(format!(
                "Member {} already belongs to a team",
                membership.member_id
            )));
        }
        tables
            .memberships
            .insert(membership.member_id.clone(), membership);
        Ok(())
    }

    async fn set_role(&self, team_id: Id, member: &MemberId, role: RoleTag) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.memberships.get_mut(member) {
            Some(membership) if membership.team_id == team_id => {
                membership.role = role;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_membership(&self, team_id: Id, member: &MemberId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let in_team = tables
            .memberships
            .get(member)
            .map_or(false, |membership| membership.team_id == team_id);
        if in_team {
            tables.memberships.remove(member);
        }
        Ok(in_team)
    }

    async fn insert_join_request(&self, request: NewJoinRequest) -> Result<JoinRequest> {
        let request = JoinRequest {
            id: Id::new(),
            request,
        };
        self.tables
            .write()
            .await
            .join_requests
            .insert(request.id, request.clone());
        Ok(request)
    }

    async fn join_request(&self, id: Id) -> Result<Option<JoinRequest>> {
        Ok(self.tables.read().await.join_requests.get(&id).cloned())
    }

    async fn join_requests(&self, team_id: Id) -> Result<Vec<JoinRequest>> {
        let tables = self.tables.read().await;
        let mut requests: Vec<JoinRequest> = tables
            .join_requests
            .values()
            .filter(|r| r.team_id == team_id && r.is_pending())
            .cloned()
            .collect();
        requests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(requests)
    }

    async fn pending_request(
        &self,
        team_id: Id,
        member: &MemberId,
    ) -> Result<Option<JoinRequest>> {
        let tables = self.tables.read().await;
        Ok(tables
            .join_requests
            .values()
            .find(|r| r.team_id == team_id && r.member_id == *member && r.is_pending())
            .cloned())
    }

    async fn set_join_request_state(&self, id: Id, state: JoinRequestState) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.join_requests.get_mut(&id) {
            Some(request) if request.is_pending() => {
                request.request.state = state;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn upsert_score(&self, sheet: ScoreSheet) -> Result<()> {
        let key = (sheet.judge_id.clone(), sheet.team_id);
        self.tables.write().await.scores.insert(key, sheet);
        Ok(())
    }

    async fn scores(&self) -> Result<Vec<ScoreSheet>> {
        Ok(self.tables.read().await.scores.values().cloned().collect())
    }

    async fn scores_by_judge(&self, judge: &MemberId) -> Result<Vec<ScoreSheet>> {
        let tables = self.tables.read().await;
        Ok(tables
            .scores
            .values()
            .filter(|s| s.judge_id == *judge)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        scoring::Points,
        team::{Role, TeamCore},
    };

    #[rocket::async_test]
    async fn team_names_are_unique_ignoring_case() {
        let store = MemoryStore::new();
        store.insert_team(TeamCore::example()).await.unwrap();

        let mut shouty = TeamCore::example2();
        shouty.name = "BOLT THROWERS".to_string();
        shouty.name_key = "bolt throwers".to_string();
        let err = store.insert_team(shouty).await.unwrap_err();
        assert_eq!(err.status(), rocket::http::Status::Conflict);
    }

    #[rocket::async_test]
    async fn one_team_per_member() {
        let store = MemoryStore::new();
        let first = store.insert_team(TeamCore::example()).await.unwrap();
        let second = store.insert_team(TeamCore::example2()).await.unwrap();
        let member = MemberId::new("pat");

        store
            .insert_membership(TeamMembership::new(
                first.id,
                member.clone(),
                Role::Driver.into(),
            ))
            .await
            .unwrap();
        let err = store
            .insert_membership(TeamMembership::new(
                second.id,
                member.clone(),
                Role::Programmer.into(),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.status(), rocket::http::Status::Conflict);

        // Membership is scoped to its team.
        assert!(!store.remove_membership(second.id, &member).await.unwrap());
        assert!(!store
            .set_role(second.id, &member, Role::Electronics.into())
            .await
            .unwrap());
        assert!(store
            .set_role(first.id, &member, Role::Electronics.into())
            .await
            .unwrap());
        assert_eq!(
            store.team_memberships(first.id).await.unwrap()[0].role,
            RoleTag::Known(Role::Electronics)
        );
    }

    #[rocket::async_test]
    async fn deleting_a_team_cascades() {
        let store = MemoryStore::new();
        let team = store.insert_team(TeamCore::example()).await.unwrap();
        let other = store.insert_team(TeamCore::example2()).await.unwrap();
        store
            .insert_membership(TeamMembership::new(
                team.id,
                MemberId::new("a"),
                Role::Driver.into(),
            ))
            .await
            .unwrap();
        store
            .insert_membership(TeamMembership::new(
                other.id,
                MemberId::new("b"),
                Role::Driver.into(),
            ))
            .await
            .unwrap();
        store
            .insert_join_request(NewJoinRequest::new(
                team.id,
                MemberId::new("c"),
                Role::Programmer,
            ))
            .await
            .unwrap();
        store
            .upsert_score(ScoreSheet::new(
                MemberId::new("judge"),
                team.id,
                Points::example(),
                None,
            ))
            .await
            .unwrap();

        assert!(store.delete_team(team.id).await.unwrap());
        assert!(!store.delete_team(team.id).await.unwrap());
        assert!(store.memberships(team.id).await.unwrap().is_empty());
        assert!(store.join_requests(team.id).await.unwrap().is_empty());
        assert!(store.scores().await.unwrap().is_empty());
        assert_eq!(store.all_memberships().await.unwrap().len(), 1);
    }

    #[rocket::async_test]
    async fn join_requests_only_leave_pending_once() {
        let store = MemoryStore::new();
        let team = store.insert_team(TeamCore::example()).await.unwrap();
        let member = MemberId::new("sam");
        let request = store
            .insert_join_request(NewJoinRequest::new(team.id, member.clone(), Role::Driver))
            .await
            .unwrap();
        assert_eq!(
            store.pending_request(team.id, &member).await.unwrap(),
            Some(request.clone())
        );

        assert!(store
            .set_join_request_state(request.id, JoinRequestState::Declined)
            .await
            .unwrap());
        assert!(!store
            .set_join_request_state(request.id, JoinRequestState::Approved)
            .await
            .unwrap());
        assert_eq!(store.pending_request(team.id, &member).await.unwrap(), None);
        assert_eq!(
            store.join_request(request.id).await.unwrap().unwrap().state,
            JoinRequestState::Declined
        );
    }

    #[rocket::async_test]
    async fn score_sheets_are_replaced_per_judge() {
        let store = MemoryStore::new();
        let team = Id::new();
        let judge = MemberId::new("judge");
        store
            .upsert_score(ScoreSheet::new(judge.clone(), team, Points::default(), None))
            .await
            .unwrap();
        store
            .upsert_score(ScoreSheet::new(
                judge.clone(),
                team,
                Points::example(),
                Some("Great turning radius".to_string()),
            ))
            .await
            .unwrap();
        store
            .upsert_score(ScoreSheet::new(
                MemberId::new("other"),
                team,
                Points::default(),
                None,
            ))
            .await
            .unwrap();

        let mine = store.scores_by_judge(&judge).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].points, Points::example());
        assert_eq!(store.scores().await.unwrap().len(), 2);
    }
}
