use rouille::Response;
use thiserror::Error;

use crate::{player::error::PlayerError, session::SessionError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl From<PlayerError> for ApiError {
    fn from(err: PlayerError) -> Self {
        match err {
            PlayerError::Invalid(e) => ApiError::BadRequest(e.to_string()),
            PlayerError::StoreUnavailable => ApiError::Unavailable(err.to_string()),
            PlayerError::Persistence(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Player(e) => e.into(),
            SessionError::Closed => ApiError::Unavailable(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Unavailable(_) => 503,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        Response::text(self.to_string()).with_status_code(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::error::ValidationError;

    #[test]
    fn player_errors_map_to_statuses() {
        let cases = [
            (PlayerError::Invalid(ValidationError::EmptyName), 400),
            (PlayerError::StoreUnavailable, 503),
            (PlayerError::Persistence("store song".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
        assert_eq!(ApiError::from(SessionError::Closed).status_code(), 503);
    }
}
