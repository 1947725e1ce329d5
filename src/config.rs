use log::{error, info, warn};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{self, Fairing, Info, Kind},
    Build, Rocket,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::store::{MemoryStore, MongoStore, Repo};

/// Service configuration, read from `Rocket.toml` and `ROCKET_*` environment
/// variables, and kept in managed state for the request guards.
#[derive(Deserialize)]
pub struct Config {
    // secrets
    jwt_secret: String,
}

impl Config {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
        }
    }

    /// Key shared with the identity provider, used to check session JWTs.
    /// Configured via `ROCKET_JWT_SECRET`.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// Pull `T` out of the figment, logging a readable report on failure.
fn extract<T: DeserializeOwned>(rocket: &Rocket<Build>, what: &str) -> Option<T> {
    match rocket.figment().extract::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            error!("Failed to load {what} config");
            rocket::config::pretty_print_error(e);
            None
        }
    }
}

/// Loads [`Config`] into managed state, refusing to ignite without a usable secret.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> fairing::Result {
        let Some(config) = extract::<Config>(&rocket, "application") else {
            return Err(rocket);
        };
        if config.jwt_secret.is_empty() {
            error!("`jwt_secret` must not be empty");
            return Err(rocket);
        }
        Ok(rocket.manage(config))
    }
}

/// Database used when `db_name` isn't configured.
const DEFAULT_DATABASE: &str = "roborumble";

#[derive(Deserialize)]
struct StoreConfig {
    // secrets
    db_uri: Option<String>,
    // non-secrets
    db_name: Option<String>,
}

/// Chooses the storage backend and manages it as a [`Repo`].
///
/// Given a `db_uri`, connects to MongoDB and prepares its indexes and
/// settings document. Otherwise falls back to a [`MemoryStore`], which is
/// lost on shutdown.
pub struct StoreFairing;

impl StoreFairing {
    async fn connect(config: StoreConfig, db_uri: &str) -> Option<MongoStore> {
        let client = match MongoClient::with_uri_str(db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return None;
            }
        };
        let db_name = config.db_name.as_deref().unwrap_or(DEFAULT_DATABASE);
        let db = client.database(db_name);

        let store = MongoStore::new(&db);
        match store.prepare(&db).await {
            Ok(()) => {
                info!("Using MongoDB database {db_name}");
                Some(store)
            }
            Err(e) => {
                error!("Failed to prepare database {db_name}: {e}");
                None
            }
        }
    }
}

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> fairing::Result {
        let Some(mut config) = extract::<StoreConfig>(&rocket, "store") else {
            return Err(rocket);
        };

        match config.db_uri.take() {
            Some(db_uri) => match Self::connect(config, &db_uri).await {
                Some(store) => Ok(rocket.manage(Repo::new(store))),
                None => Err(rocket),
            },
            None => {
                warn!("No `db_uri` configured; using an in-memory store that will not persist");
                Ok(rocket.manage(Repo::new(MemoryStore::new())))
            }
        }
    }
}
