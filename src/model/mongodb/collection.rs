use std::ops::Deref;

use log::debug;
use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::{
    scoring::ScoreSheet,
    team::{JoinRequest, NewJoinRequest, NewTeam, Team, TeamMembership},
};

use super::SettingsDocument;

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Settings collection
impl MongoCollection for SettingsDocument {
    const NAME: &'static str = "settings";
}

// Team collections
const TEAMS: &str = "teams";
impl MongoCollection for Team {
    const NAME: &'static str = TEAMS;
}
impl MongoCollection for NewTeam {
    const NAME: &'static str = TEAMS;
}

// Membership collection
impl MongoCollection for TeamMembership {
    const NAME: &'static str = "memberships";
}

// Join request collections
const JOIN_REQUESTS: &str = "join_requests";
impl MongoCollection for JoinRequest {
    const NAME: &'static str = JOIN_REQUESTS;
}
impl MongoCollection for NewJoinRequest {
    const NAME: &'static str = JOIN_REQUESTS;
}

// Score sheet collection
impl MongoCollection for ScoreSheet {
    const NAME: &'static str = "scores";
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Team collection.
    let team_index = IndexModel::builder()
        .keys(doc! {"name_key": 1})
        .options(unique.clone())
        .build();
    Coll::<Team>::from_db(db)
        .create_index(team_index, None)
        .await?;

    // Membership collection: one team per member.
    let member_index = IndexModel::builder()
        .keys(doc! {"member_id": 1})
        .options(unique.clone())
        .build();
    Coll::<TeamMembership>::from_db(db)
        .create_index(member_index, None)
        .await?;
    let team_member_index = IndexModel::builder().keys(doc! {"team_id": 1}).build();
    Coll::<TeamMembership>::from_db(db)
        .create_index(team_member_index, None)
        .await?;

    // Join request collection.
    let request_index = IndexModel::builder()
        .keys(doc! {"team_id": 1, "member_id": 1, "state": 1})
        .build();
    Coll::<JoinRequest>::from_db(db)
        .create_index(request_index, None)
        .await?;

    // Score sheet collection: one sheet per judge per team.
    let score_index = IndexModel::builder()
        .keys(doc! {"judge_id": 1, "team_id": 1})
        .options(unique)
        .build();
    Coll::<ScoreSheet>::from_db(db)
        .create_index(score_index, None)
        .await?;

    Ok(())
}
