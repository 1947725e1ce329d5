use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// The ID of the single settings document.
pub const SETTINGS_ID: &str = "competition";

/// Competition-wide configuration, managed by admins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Master switch for team formation and registration.
    pub registration_open: bool,
    /// If set, registration closes automatically at this time.
    #[serde(default, with = "optional_datetime")]
    pub registration_deadline: Option<DateTime<Utc>>,
    /// The team given the judges' award, once decided.
    #[serde(default)]
    pub judges_award: Option<Id>,
}

impl Settings {
    /// Is registration open at the given instant?
    pub fn registration_open_at(&self, now: DateTime<Utc>) -> bool {
        self.registration_open
            && self
                .registration_deadline
                .map_or(true, |deadline| now < deadline)
    }

    pub fn registration_open_now(&self) -> bool {
        self.registration_open_at(Utc::now())
    }
}

/// Store optional datetimes as BSON datetimes.
mod optional_datetime {
    use super::*;

    use mongodb::bson;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&bson::DateTime::from_chrono(*value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(Option::<bson::DateTime>::deserialize(deserializer)?.map(|value| value.to_chrono()))
    }
}
