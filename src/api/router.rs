use axum::{
  extract::DefaultBodyLimit,
  http::StatusCode,
  middleware,
  routing::get,
  Json, Router,
};
use serde_json::json;
use tower_http::{normalize_path::NormalizePath, trace::TraceLayer};

use crate::{
  api::cors::cors_layer,
  config::Config,
  db::MongoDb,
  error::AppError,
  ieo::routes::ieo_routes,
  middleware::{session_middleware, SessionLayerState, SessionStore},
  p2p::routes::p2p_routes,
  subscribers::routes::subscriber_routes,
  users::routes::user_routes,
  wallets::{routes::wallet_routes, service::WalletService},
};

pub const USERS_PREFIX: &str = "/api/users";
pub const WALLETS_PREFIX: &str = "/api/wallets";
pub const SUBSCRIBERS_PREFIX: &str = "/api/subscribers";
pub const IEO_PREFIX: &str = "/api/ieo";
pub const P2P_PREFIX: &str = "/api/p2p";
pub const HEALTH_PATH: &str = "/api/health";

/// The assembled application. Trailing slashes are trimmed before routing,
/// so `/api/ieo/` reaches the same handler as `/api/ieo`.
pub type App = NormalizePath<Router>;

pub struct RouteGroup {
  pub prefix: String,
  pub router: Router,
}

/// Route groups mounted by path prefix, in registration order. Requests that
/// match no prefix fall through to the `Endpoint Not Found` handler.
#[derive(Default)]
pub struct RouteTable {
  groups: Vec<RouteGroup>,
}

impl RouteTable {
  pub fn new() -> Self {
      Self::default()
  }

  /// Adds a group under `prefix`. A trailing slash is ignored. Prefixes must
  /// start with `/`, must not be the root and must not overlap an existing
  /// group, since one would shadow the other.
  pub fn mount(mut self, prefix: &str, router: Router) -> Result<Self, AppError> {
      let prefix = prefix.trim_end_matches('/');
      if !prefix.starts_with('/') {
          return Err(AppError::ConfigError(format!(
              "Route prefix '{}' must start with '/' and must not be the root",
              prefix
          )));
      }

      if let Some(existing) = self
          .groups
          .iter()
          .find(|group| overlaps(&group.prefix, prefix))
      {
          return Err(AppError::ConfigError(format!(
              "Route prefix '{}' overlaps '{}'",
              prefix, existing.prefix
          )));
      }

      self.groups.push(RouteGroup {
          prefix: prefix.to_string(),
          router,
      });
      Ok(self)
  }

  pub fn prefixes(&self) -> Vec<&str> {
      self.groups.iter().map(|group| group.prefix.as_str()).collect()
  }

  /// The five route groups served by the exchange backend.
  pub fn standard(db: MongoDb, wallet_service: WalletService) -> Result<Self, AppError> {
      RouteTable::new()
          .mount(USERS_PREFIX, user_routes())?
          .mount(WALLETS_PREFIX, wallet_routes(wallet_service))?
          .mount(SUBSCRIBERS_PREFIX, subscriber_routes(db.clone()))?
          .mount(IEO_PREFIX, ieo_routes(db.clone()))?
          .mount(P2P_PREFIX, p2p_routes(db))
  }

  pub fn into_router(self) -> Router {
      self.groups
          .into_iter()
          .fold(Router::new(), |app, group| app.nest(&group.prefix, group.router))
          .fallback(not_found)
  }
}

fn overlaps(a: &str, b: &str) -> bool {
  let is_under = |outer: &str, inner: &str| {
      inner == outer || inner.strip_prefix(outer).map_or(false, |rest| rest.starts_with('/'))
  };
  is_under(a, b) || is_under(b, a)
}

/// Assembles the middleware stack around the route table. Outermost first:
/// path normalization, request tracing, CORS, session, body limit.
pub fn build_app(config: &Config, routes: RouteTable, sessions: SessionStore) -> Result<App, AppError> {
  if let Some(prefix) = routes.prefixes().into_iter().find(|p| overlaps(p, HEALTH_PATH)) {
      return Err(AppError::ConfigError(format!(
          "Route prefix '{}' shadows {}",
          prefix, HEALTH_PATH
      )));
  }

  let cors = cors_layer(&config.cors)?;
  let session_state = SessionLayerState::new(sessions, &config.session);

  let app = routes
      .into_router()
      .route(HEALTH_PATH, get(health_check))
      .layer(DefaultBodyLimit::max(config.json_body_limit))
      .layer(middleware::from_fn_with_state(session_state, session_middleware))
      .layer(cors)
      .layer(TraceLayer::new_for_http());

  // Router::layer runs after routing, so the path has to be rewritten outside it
  Ok(NormalizePath::trim_trailing_slash(app))
}

async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
  (
      StatusCode::OK,
      Json(json!({
          "status": "success",
          "message": "Server is running"
      })),
  )
}

async fn not_found() -> AppError {
  AppError::RouteNotFound
}
