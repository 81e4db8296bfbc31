use actix_web::{error::BlockingError, http::StatusCode, HttpResponse, ResponseError};
use tracing::error;

use crate::protocol::SimpleResponse;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error kinds surfaced by the services. The first four are the booking
/// taxonomy; `Unauthenticated` belongs to the session layer and `Internal`
/// covers everything the caller cannot act on.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    SlotConflict(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found<S: ToString>(msg: S) -> Self {
        Self::NotFound(msg.to_string())
    }

    pub fn invalid<S: ToString>(msg: S) -> Self {
        Self::InvalidInput(msg.to_string())
    }

    pub fn unauthorized<S: ToString>(msg: S) -> Self {
        Self::Unauthorized(msg.to_string())
    }
}

impl From<diesel::result::Error> for ServiceError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Internal(anyhow::Error::new(err).context("DB error"))
    }
}

impl From<r2d2::Error> for ServiceError {
    fn from(err: r2d2::Error) -> Self {
        Self::Internal(anyhow::Error::new(err).context("DB connection"))
    }
}

impl From<BlockingError> for ServiceError {
    fn from(err: BlockingError) -> Self {
        Self::Internal(anyhow::anyhow!("blocking task failed: {}", err))
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::SlotConflict(_) => StatusCode::CONFLICT,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::Internal(err) => {
                error!(error = ?err, "request failed");
                SimpleResponse::err("Internal server error")
            }
            _ => SimpleResponse::err(self),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
