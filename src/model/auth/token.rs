use std::marker::PhantomData;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use log::debug;
use rocket::{
    http::{Cookie, SameSite},
    request::{FromRequest, Outcome},
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::model::team::MemberId;

use super::user::{Rights, User};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

const BEARER_PREFIX: &str = "Bearer ";

/// A verified session for a specific member with specific rights.
///
/// Sessions are issued by the identity provider; this service only checks them.
#[derive(Serialize, Deserialize)]
pub struct AuthToken<U> {
    #[serde(rename = "sub")]
    pub id: MemberId,
    #[serde(rename = "rgt")]
    pub rights: Rights,
    #[serde(skip)]
    phantom: PhantomData<U>,
}

impl<U> AuthToken<U> {
    /// Does this token permit the given rights?
    pub fn permits(&self, target: Rights) -> bool {
        self.rights == target
    }

    /// Sign this token, valid until `expire_at`.
    pub fn encode(self, config: &Config, expire_at: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            token: self,
            expire_at,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;
        Ok(token)
    }

    /// Sign this token and wrap it in a session cookie.
    pub fn into_cookie(self, config: &Config, expire_at: DateTime<Utc>) -> Result<Cookie<'static>> {
        let token = self.encode(config, expire_at)?;
        Ok(Cookie::build(AUTH_TOKEN_COOKIE, token)
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish())
    }

    /// Check a signed token and extract its contents.
    pub fn decode(token: &str, config: &Config) -> Result<Self> {
        let token = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims<U>>| claims.claims.token)?;
        Ok(token)
    }
}

impl<U> AuthToken<U>
where
    U: User,
{
    /// Create a new [`AuthToken`] for the given member, with the correct rights for this user type.
    pub fn new(id: MemberId) -> Self {
        Self {
            id,
            rights: U::RIGHTS,
            phantom: PhantomData,
        }
    }
}

/// Session claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims<U> {
    #[serde(flatten, bound = "")]
    token: AuthToken<U>,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r, U> FromRequest<'r> for AuthToken<U>
where
    U: User + Send,
{
    type Error = ();

    /// Get an [`AuthToken`] from the `Authorization` header or the session cookie,
    /// and verify that it has the correct rights for this user type.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let header = req
            .headers()
            .get_one("Authorization")
            .and_then(|value| value.strip_prefix(BEARER_PREFIX));
        let raw = match header {
            Some(token) => token.to_string(),
            // Forward to any routes that do not require an authentication token.
            None => match req.cookies().get(AUTH_TOKEN_COOKIE) {
                Some(cookie) => cookie.value().to_string(),
                None => return Outcome::Forward(()),
            },
        };

        let token = match Self::decode(&raw, config) {
            Ok(token) => token,
            Err(e) => {
                debug!("Rejected session token: {e}");
                return Outcome::Forward(());
            }
        };

        // Check it represents the correct rights.
        if !token.permits(U::RIGHTS) {
            return Outcome::Forward(());
        }

        Outcome::Success(token)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::model::auth::{Admin, Participant};

    #[test]
    fn tokens_round_trip_with_the_shared_secret() {
        let config = Config::example();
        let token = AuthToken::<Participant>::new(MemberId::new("pat"))
            .encode(&config, Utc::now() + Duration::minutes(5))
            .unwrap();

        let decoded = AuthToken::<Participant>::decode(&token, &config).unwrap();
        assert_eq!(decoded.id, MemberId::new("pat"));
        assert!(decoded.permits(Rights::Participant));
        assert!(!decoded.permits(Rights::Admin));

        let other = Config::new("a different secret");
        assert!(AuthToken::<Participant>::decode(&token, &other).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let config = Config::example();
        let token = AuthToken::<Admin>::new(MemberId::new("root"))
            .encode(&config, Utc::now() - Duration::hours(1))
            .unwrap();
        assert!(AuthToken::<Admin>::decode(&token, &config).is_err());
    }
}
