use crate::model::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pinhole_core::StoreError;
use pinhole_shortener::ShortenerError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// The `x-user-id` header is missing or unusable.
    MissingUserId,
    Shortener(ShortenerError),
}

impl From<ShortenerError> for AppError {
    fn from(value: ShortenerError) -> Self {
        Self::Shortener(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::MissingUserId => (
                StatusCode::UNAUTHORIZED,
                "x-user-id header is required".to_owned(),
            ),
            AppError::Shortener(err) => match &err {
                ShortenerError::EmptyUrl
                | ShortenerError::InvalidUrl(_)
                | ShortenerError::EmptyIdList
                | ShortenerError::EmptyBatch => (StatusCode::BAD_REQUEST, err.to_string()),
                ShortenerError::IdGeneration(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
                }
                // A generated id colliding with an existing record is a
                // failure of this service, not of the backend.
                ShortenerError::Storage(StoreError::Conflict(_)) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
                }
                ShortenerError::Storage(StoreError::Unavailable(_)) => {
                    (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
                }
                ShortenerError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            },
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
