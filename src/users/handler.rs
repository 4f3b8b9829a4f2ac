use axum::{http::StatusCode, Json};
use tracing::info;

use crate::{
    error::AppError,
    middleware::Session,
    users::model::{SessionResponse, SESSION_USER_KEY},
};

pub async fn get_session(session: Session) -> Json<SessionResponse> {
    Json(SessionResponse {
        active: session.is_active(),
        user_id: session.get::<String>(SESSION_USER_KEY),
    })
}

// Logout
pub async fn destroy_session(session: Session) -> Result<StatusCode, AppError> {
    if !session.is_active() {
        return Err(AppError::AuthError("No active session".into()));
    }

    let user_id = session.get::<String>(SESSION_USER_KEY);
    session.destroy();
    info!(user_id = ?user_id, "Session destroyed");

    Ok(StatusCode::NO_CONTENT)
}
