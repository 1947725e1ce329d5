use log::{debug, info};
use mongodb::{
    bson::{doc, Document},
    error::Error as DbError,
    options::{FindOptions, ReplaceOptions},
    results::InsertOneResult,
    Database,
};
use rocket::{futures::TryStreamExt, http::Status};

use crate::error::{Error, Result};
use crate::model::{
    mongodb::{ensure_indexes_exist, is_duplicate_key_error, Coll, Id, SettingsDocument},
    scoring::ScoreSheet,
    settings::{Settings, SETTINGS_ID},
    team::{
        JoinRequest, JoinRequestState, MemberId, NewJoinRequest, NewTeam, RoleTag, Team,
        TeamMembership,
    },
};

use super::Store;

/// A [`Store`] backed by MongoDB.
#[derive(Clone)]
pub struct MongoStore {
    settings: Coll<SettingsDocument>,
    new_teams: Coll<NewTeam>,
    teams: Coll<Team>,
    memberships: Coll<TeamMembership>,
    new_join_requests: Coll<NewJoinRequest>,
    join_requests: Coll<JoinRequest>,
    scores: Coll<ScoreSheet>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            settings: Coll::from_db(db),
            new_teams: Coll::from_db(db),
            teams: Coll::from_db(db),
            memberships: Coll::from_db(db),
            new_join_requests: Coll::from_db(db),
            join_requests: Coll::from_db(db),
            scores: Coll::from_db(db),
        }
    }

    /// Create the indexes and the settings document if they don't exist yet.
    ///
    /// This operation is idempotent.
    pub async fn prepare(&self, db: &Database) -> std::result::Result<(), DbError> {
        ensure_indexes_exist(db).await?;

        let filter = doc! { "_id": SETTINGS_ID };
        if self.settings.find_one(filter, None).await?.is_none() {
            info!("No competition settings found, creating defaults (registration closed)");
            self.settings
                .insert_one(SettingsDocument::from(Settings::default()), None)
                .await?;
        }
        Ok(())
    }
}

/// Turn a unique index violation into a `409 Conflict`.
fn conflict_on_duplicate(err: DbError, what: impl FnOnce() -> String) -> Error {
    if is_duplicate_key_error(&err) {
        Error::conflict(what())
    } else {
        err.into()
    }
}

/// Extract the ID the database assigned to a fresh document.
fn inserted_id(result: InsertOneResult) -> Result<Id> {
    result.inserted_id.as_object_id().map(Id::from).ok_or_else(|| {
        Error::Status(
            Status::InternalServerError,
            "Database returned a non-ObjectId document ID".to_string(),
        )
    })
}

fn membership_filter(team_id: Id, member: &MemberId) -> Document {
    doc! {
        "team_id": team_id,
        "member_id": member.as_str(),
    }
}

fn oldest_first(field: &str) -> FindOptions {
    let mut sort = Document::new();
    sort.insert(field, 1);
    FindOptions::builder().sort(sort).build()
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn settings(&self) -> Result<Settings> {
        let settings = self
            .settings
            .find_one(doc! { "_id": SETTINGS_ID }, None)
            .await?
            .map(|document| document.settings)
            .unwrap_or_default();
        Ok(settings)
    }

    async fn put_settings(&self, settings: Settings) -> Result<()> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.settings
            .replace_one(
                doc! { "_id": SETTINGS_ID },
                SettingsDocument::from(settings),
                options,
            )
            .await?;
        Ok(())
    }

    async fn insert_team(&self, team: NewTeam) -> Result<Team> {
        let result = self
            .new_teams
            .insert_one(&team, None)
            .await
            .map_err(|e| {
                conflict_on_duplicate(e, || format!("Team name already in use: {}", team.name))
            })?;
        let id = inserted_id(result)?;
        debug!("Created team {id}");
        Ok(Team::new(id, team))
    }

    async fn team(&self, id: Id) -> Result<Option<Team>> {
        Ok(self.teams.find_one(id.as_doc(), None).await?)
    }

    async fn teams(&self) -> Result<Vec<Team>> {
        let teams = self
            .teams
            .find(None, oldest_first("created_at"))
            .await?
            .try_collect()
            .await?;
        Ok(teams)
    }

    async fn replace_team(&self, team: &Team) -> Result<bool> {
        let result = self
            .teams
            .replace_one(team.id.as_doc(), team, None)
            .await
            .map_err(|e| {
                conflict_on_duplicate(e, || format!("Team name already in use: {}", team.name))
            })?;
        Ok(result.matched_count == 1)
    }

    async fn delete_team(&self, id: Id) -> Result<bool> {
        let result = self.teams.delete_one(id.as_doc(), None).await?;
        if result.deleted_count == 0 {
            return Ok(false);
        }
        let by_team = doc! { "team_id": id };
        self.memberships.delete_many(by_team.clone(), None).await?;
        self.join_requests.delete_many(by_team.clone(), None).await?;
        self.scores.delete_many(by_team, None).await?;
        Ok(true)
    }

    async fn memberships(&self, team_id: Id) -> Result<Vec<TeamMembership>> {
        let members = self
            .memberships
            .find(doc! { "team_id": team_id }, oldest_first("joined_at"))
            .await?
            .try_collect()
            .await?;
        Ok(members)
    }

    async fn all_memberships(&self) -> Result<Vec<TeamMembership>> {
        let members = self
            .memberships
            .find(None, None)
            .await?
            .try_collect()
            .await?;
        Ok(members)
    }

    async fn membership_of(&self, member: &MemberId) -> Result<Option<TeamMembership>> {
        let filter = doc! { "member_id": member.as_str() };
        Ok(self.memberships.find_one(filter, None).await?)
    }

    async fn insert_membership(&self, membership: TeamMembership) -> Result<()> {
        self.memberships
            .insert_one(&membership, None)
            .await
            .map_err(|e| {
                conflict_on_duplicate(e, || {
                    format!("Member {} already belongs to a team", membership.member_id)
                })
            })?;
        Ok(())
    }

    async fn set_role(&self, team_id: Id, member: &MemberId, role: RoleTag) -> Result<bool> {
        let update = doc! {
            "$set": { "role": String::from(role) }
        };
        let result = self
            .memberships
            .update_one(membership_filter(team_id, member), update, None)
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn remove_membership(&self, team_id: Id, member: &MemberId) -> Result<bool> {
        let result = self
            .memberships
            .delete_one(membership_filter(team_id, member), None)
            .await?;
        Ok(result.deleted_count == 1)
    }

    async fn insert_join_request(&self, request: NewJoinRequest) -> Result<JoinRequest> {
        let result = self.new_join_requests.insert_one(&request, None).await?;
        Ok(JoinRequest {
            id: inserted_id(result)?,
            request,
        })
    }

    async fn join_request(&self, id: Id) -> Result<Option<JoinRequest>> {
        Ok(self.join_requests.find_one(id.as_doc(), None).await?)
    }

    async fn join_requests(&self, team_id: Id) -> Result<Vec<JoinRequest>> {
        let filter = doc! {
            "team_id": team_id,
            "state": JoinRequestState::Pending,
        };
        let requests = self
            .join_requests
            .find(filter, oldest_first("created_at"))
            .await?
            .try_collect()
            .await?;
        Ok(requests)
    }

    async fn pending_request(
        &self,
        team_id: Id,
        member: &MemberId,
    ) -> Result<Option<JoinRequest>> {
        let filter = doc! {
            "team_id": team_id,
            "member_id": member.as_str(),
            "state": JoinRequestState::Pending,
        };
        Ok(self.join_requests.find_one(filter, None).await?)
    }

    async fn set_join_request_state(&self, id: Id, state: JoinRequestState) -> Result<bool> {
        let filter = doc! {
            "_id": id,
            "state": JoinRequestState::Pending,
        };
        let update = doc! {
            "$set": { "state": state }
        };
        let result = self.join_requests.update_one(filter, update, None).await?;
        Ok(result.modified_count == 1)
    }

    async fn upsert_score(&self, sheet: ScoreSheet) -> Result<()> {
        let filter = doc! {
            "judge_id": sheet.judge_id.as_str(),
            "team_id": sheet.team_id,
        };
        let options = ReplaceOptions::builder().upsert(true).build();
        self.scores.replace_one(filter, &sheet, options).await?;
        Ok(())
    }

    async fn scores(&self) -> Result<Vec<ScoreSheet>> {
        let scores = self.scores.find(None, None).await?.try_collect().await?;
        Ok(scores)
    }

    async fn scores_by_judge(&self, judge: &MemberId) -> Result<Vec<ScoreSheet>> {
        let scores = self
            .scores
            .find(doc! { "judge_id": judge.as_str() }, None)
            .await?
            .try_collect()
            .await?;
        Ok(scores)
    }
}
