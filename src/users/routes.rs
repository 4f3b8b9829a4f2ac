use axum::{routing::get, Router};

use crate::users::handler;

pub fn user_routes() -> Router {
    Router::new().route(
        "/session",
        get(handler::get_session).delete(handler::destroy_session),
    )
}
