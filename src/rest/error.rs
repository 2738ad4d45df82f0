use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::models::ErrorResponse;
use crate::types::{Conflict, StoreError};

pub const CODE_INVALID_INPUT: &str = "invalid_input";
pub const CODE_NOT_FOUND: &str = "not_found";
pub const CODE_CONFLICT: &str = "conflict";
pub const CODE_INTERNAL: &str = "internal_error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("store worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

fn conflict_message(conflict: &Conflict) -> &'static str {
    match conflict {
        Conflict::UserName(_) => "User with this name already exists.",
        Conflict::GroupName(_) => "Group with this name already exists.",
        Conflict::Membership { .. } => "This user is already a member of the group.",
    }
}

impl ApiError {
    fn status_and_body(&self) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = match self {
            ApiError::InvalidInput(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                CODE_INVALID_INPUT,
                message.clone(),
            ),
            ApiError::Store(StoreError::NotFound(resource)) => (
                StatusCode::NOT_FOUND,
                CODE_NOT_FOUND,
                format!("{} not found", resource.kind()),
            ),
            ApiError::Store(StoreError::DuplicateKey(conflict)) => (
                StatusCode::BAD_REQUEST,
                CODE_CONFLICT,
                conflict_message(conflict).to_string(),
            ),
            ApiError::Store(_) | ApiError::Worker(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                CODE_INTERNAL,
                "internal server error".to_string(),
            ),
        };
        (status, ErrorResponse::new(code, message))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        if status.is_server_error() {
            log::error!("request failed: {:#}", anyhow::Error::new(self));
        } else {
            log::debug!("request rejected ({}): {}", status, self);
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Resource;

    #[test]
    fn not_found_names_the_entity_kind() {
        let (status, body) =
            ApiError::from(StoreError::NotFound(Resource::User(3))).status_and_body();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, "not_found");
        assert_eq!(body.message, "User not found");
        assert_eq!(body.detail, "User not found");

        let (_, body) = ApiError::from(StoreError::NotFound(Resource::GroupNamed("eng".into())))
            .status_and_body();
        assert_eq!(body.message, "Group not found");
    }

    #[test]
    fn duplicate_key_is_a_bad_request_conflict() {
        let (status, body) = ApiError::from(StoreError::DuplicateKey(Conflict::Membership {
            group_id: 1,
            user_id: 1,
        }))
        .status_and_body();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "conflict");
        assert_eq!(body.message, "This user is already a member of the group.");
    }

    #[test]
    fn store_failures_do_not_leak_details() {
        let err = ApiError::from(StoreError::Sqlite(rusqlite::Error::InvalidQuery));
        let (status, body) = err.status_and_body();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "internal_error");
        assert_eq!(body.message, "internal server error");

        let err = ApiError::from(StoreError::InvalidData("column 2".into()));
        assert_eq!(err.status_and_body().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_input_is_unprocessable() {
        let (status, body) = ApiError::InvalidInput("name must not be empty".into()).status_and_body();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.code, "invalid_input");
        assert_eq!(body.message, "name must not be empty");
    }
}
