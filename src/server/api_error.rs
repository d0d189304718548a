//! Mapping of domain errors onto HTTP responses

use crate::error::PlayError;
use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, warn};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error carrying a [`PlayError`].
#[derive(Debug)]
pub struct ApiError(pub PlayError);

impl From<PlayError> for ApiError {
    fn from(err: PlayError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            PlayError::NotFound(_) => StatusCode::NOT_FOUND,
            PlayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PlayError::Conflict(_) => StatusCode::CONFLICT,
            PlayError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            PlayError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            PlayError::NotFound(m)
            | PlayError::InvalidInput(m)
            | PlayError::Conflict(m)
            | PlayError::TooLarge(m)
            | PlayError::Unavailable(m) => m.clone(),
        };
        if status == StatusCode::SERVICE_UNAVAILABLE {
            error!("Storage failure: {}", message);
        } else {
            warn!("Request failed with {}: {}", status, message);
        }
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// JSON body extractor whose every rejection is a 400 with an error body.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError(PlayError::InvalidInput(rejection.body_text()))),
        }
    }
}
