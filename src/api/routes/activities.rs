use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::activities::{ActivityMap, RegistryError};

use super::state::AppState;

/// Query string carried by the signup and unregister endpoints
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

/// Response structure for a successful roster change
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error response structure with user-friendly message
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// GET /activities
/// Returns every activity with its metadata and current participants
pub async fn list_activities(State(state): State<AppState>) -> Json<ActivityMap> {
    Json(state.registry.list_all())
}

/// POST /activities/{activity_name}/signup?email={email}
/// Adds a student to the end of an activity's roster
pub async fn signup_for_activity(
    State(state): State<AppState>,
    Path(activity_name): Path<String>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state
        .registry
        .signup(&activity_name, &query.email)
        .map_err(registry_error_response)?;

    info!("{}", message);

    Ok(Json(MessageResponse { message }))
}

/// POST /activities/{activity_name}/unregister?email={email}
/// Removes a student from an activity's roster
pub async fn unregister_from_activity(
    State(state): State<AppState>,
    Path(activity_name): Path<String>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state
        .registry
        .unregister(&activity_name, &query.email)
        .map_err(registry_error_response)?;

    info!("{}", message);

    Ok(Json(MessageResponse { message }))
}

/// Maps a registry failure to its HTTP status and `{"detail": ...}` body
fn registry_error_response(e: RegistryError) -> ApiError {
    let status_code = match &e {
        RegistryError::NotFound { activity } => {
            warn!("Request for unknown activity '{}'", activity);
            StatusCode::NOT_FOUND
        }
        RegistryError::AlreadyRegistered { activity, email } => {
            warn!("{} is already signed up for {}", email, activity);
            StatusCode::BAD_REQUEST
        }
        RegistryError::NotRegistered { activity, email } => {
            warn!("{} is not registered for {}", email, activity);
            StatusCode::BAD_REQUEST
        }
        // Seeds are validated at startup; reaching this from a request is a bug
        RegistryError::InvalidSeed(msg) => {
            error!("Unexpected seed error while handling request: {}", msg);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status_code,
        Json(ErrorResponse {
            detail: e.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_status_codes() {
        let cases = [
            (
                RegistryError::NotFound {
                    activity: "Ghost Club".to_string(),
                },
                StatusCode::NOT_FOUND,
                "not found",
            ),
            (
                RegistryError::AlreadyRegistered {
                    activity: "Chess Club".to_string(),
                    email: "a@x.edu".to_string(),
                },
                StatusCode::BAD_REQUEST,
                "already signed up",
            ),
            (
                RegistryError::NotRegistered {
                    activity: "Chess Club".to_string(),
                    email: "a@x.edu".to_string(),
                },
                StatusCode::BAD_REQUEST,
                "not registered",
            ),
        ];

        for (err, expected_status, expected_text) in cases {
            let (status, Json(body)) = registry_error_response(err);
            assert_eq!(status, expected_status);
            assert!(body.detail.contains(expected_text));
        }
    }

    #[test]
    fn test_invalid_seed_is_server_error() {
        let (status, _) = registry_error_response(RegistryError::InvalidSeed("bad".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
