use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use log::{error, warn};
use mongodb::error::Error as DbError;
use rocket::{
    http::{Status, StatusClass},
    response::Responder,
    serde::json::Json,
    Request,
};
use thiserror::Error;

use crate::model::team::Finding;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error("{1}")]
    Status(Status, String),
    /// The team's composition does not allow the requested action.
    #[error("Team composition is not registrable: {0:?}")]
    Composition(Vec<Finding>),
}

impl Error {
    pub fn not_found(what: impl AsRef<str>) -> Self {
        Self::Status(Status::NotFound, format!("{} not found", what.as_ref()))
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Status(Status::Conflict, what.into())
    }

    pub fn bad_request(what: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, what.into())
    }

    pub fn forbidden(what: impl Into<String>) -> Self {
        Self::Status(Status::Forbidden, what.into())
    }

    /// The HTTP status this error responds with.
    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) => Status::InternalServerError,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
            Self::Status(status, _) => *status,
            Self::Composition(_) => Status::UnprocessableEntity,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        match status.class() {
            StatusClass::ServerError => error!("{status}: {self}"),
            _ => warn!("{status}: {self}"),
        }
        match self {
            // The client renders the findings, so send them back.
            Self::Composition(findings) => (status, Json(findings)).respond_to(req),
            _ => Err(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(Error::not_found("Team 42").status(), Status::NotFound);
        assert_eq!(Error::not_found("Team 42").to_string(), "Team 42 not found");
        assert_eq!(Error::conflict("taken").status(), Status::Conflict);
        assert_eq!(
            Error::Composition(Vec::new()).status(),
            Status::UnprocessableEntity
        );
        assert_eq!(
            Error::from(JwtError::from(JwtErrorKind::ExpiredSignature)).status(),
            Status::Unauthorized
        );
        assert_eq!(
            Error::from(JwtError::from(JwtErrorKind::InvalidToken)).status(),
            Status::BadRequest
        );
    }
}
