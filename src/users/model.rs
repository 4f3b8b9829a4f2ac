use serde::Serialize;

/// Session key holding the signed-in user's id. This crate only reads it;
/// the login flow that writes it lives outside this service.
pub const SESSION_USER_KEY: &str = "user_id";

// Session information sent to client
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub active: bool,
    pub user_id: Option<String>,
}
