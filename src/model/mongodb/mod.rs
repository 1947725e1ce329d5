use serde::{Deserialize, Serialize};

use crate::model::settings::{Settings, SETTINGS_ID};

mod bson;
mod collection;
mod errors;

pub use bson::{hex_id, option_hex_id, Id};
pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use errors::is_duplicate_key_error;

/// The settings as stored: a single document with a fixed ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub settings: Settings,
}

impl From<Settings> for SettingsDocument {
    fn from(settings: Settings) -> Self {
        Self {
            id: SETTINGS_ID.to_string(),
            settings,
        }
    }
}
