//! Cookie-backed sessions.
//!
//! The session id travels in a signed cookie (`user_sid` by default) and the
//! data lives server side in [`SessionStore`]. A request that arrives without
//! a valid cookie gets a fresh, unsaved session; it is only persisted (and the
//! cookie only issued) once a handler writes to it.

use std::{collections::HashMap, sync::Arc};

use axum::{
  async_trait,
  body::Body,
  extract::{FromRequestParts, State},
  http::{request::Parts, Request},
  middleware::Next,
  response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha512};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::{config::SessionConfig, error::AppError};

#[derive(Debug, Clone)]
struct SessionRecord {
  data: Map<String, Value>,
  expires_at: DateTime<Utc>,
}

/// In-memory session storage shared by every request.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
  inner: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl SessionStore {
  pub fn new() -> Self {
      Self::default()
  }

  /// Returns the session data, dropping the record if it has expired.
  pub fn load(&self, id: &str) -> Option<Map<String, Value>> {
      let now = Utc::now();
      {
          let sessions = self.inner.read();
          match sessions.get(id) {
              Some(record) if record.expires_at > now => return Some(record.data.clone()),
              Some(_) => {}
              None => return None,
          }
      }
      self.inner.write().remove(id);
      None
  }

  pub fn save(&self, id: &str, data: Map<String, Value>, ttl: Duration) {
      let expires_at = Utc::now()
          .checked_add_signed(ttl)
          .unwrap_or(DateTime::<Utc>::MAX_UTC);
      let record = SessionRecord { data, expires_at };
      self.inner.write().insert(id.to_string(), record);
  }

  pub fn remove(&self, id: &str) -> bool {
      self.inner.write().remove(id).is_some()
  }

  pub fn len(&self) -> usize {
      self.inner.read().len()
  }

  pub fn is_empty(&self) -> bool {
      self.len() == 0
  }

  pub fn purge_expired(&self) -> usize {
      let now = Utc::now();
      let mut sessions = self.inner.write();
      let before = sessions.len();
      sessions.retain(|_, record| record.expires_at > now);
      before - sessions.len()
  }

  /// Periodically drops expired sessions that were never requested again.
  pub fn spawn_purge(&self, every: std::time::Duration) -> JoinHandle<()> {
      let store = self.clone();
      tokio::spawn(async move {
          let mut ticker = tokio::time::interval(every);
          loop {
              ticker.tick().await;
              let purged = store.purge_expired();
              if purged > 0 {
                  debug!(purged, "Expired sessions purged");
              }
          }
      })
  }
}

#[derive(Debug)]
struct SessionState {
  id: String,
  data: Map<String, Value>,
  is_new: bool,
  modified: bool,
  destroyed: bool,
}

/// Handle to the current request's session. Cloning shares the same state.
#[derive(Debug, Clone)]
pub struct Session {
  state: Arc<Mutex<SessionState>>,
}

impl Session {
  fn fresh() -> Self {
      Self::from_state(Uuid::new_v4().to_string(), Map::new(), true)
  }

  fn existing(id: String, data: Map<String, Value>) -> Self {
      Self::from_state(id, data, false)
  }

  fn from_state(id: String, data: Map<String, Value>, is_new: bool) -> Self {
      Self {
          state: Arc::new(Mutex::new(SessionState {
              id,
              data,
              is_new,
              modified: false,
              destroyed: false,
          })),
      }
  }

  /// `true` when the session was loaded from the store rather than created
  /// for this request.
  pub fn is_active(&self) -> bool {
      let state = self.state.lock();
      !state.is_new && !state.destroyed
  }

  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
      let state = self.state.lock();
      state
          .data
          .get(key)
          .and_then(|value| serde_json::from_value(value.clone()).ok())
  }

  pub fn insert<T: Serialize>(&self, key: &str, value: T) -> Result<(), AppError> {
      let value = serde_json::to_value(value)
          .map_err(|e| AppError::InternalError(format!("Failed to serialize session value: {}", e)))?;
      let mut state = self.state.lock();
      state.data.insert(key.to_string(), value);
      state.modified = true;
      Ok(())
  }

  pub fn remove(&self, key: &str) -> Option<Value> {
      let mut state = self.state.lock();
      let removed = state.data.remove(key);
      if removed.is_some() {
          state.modified = true;
      }
      removed
  }

  pub fn destroy(&self) {
      let mut state = self.state.lock();
      state.data.clear();
      state.destroyed = true;
  }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
  S: Send + Sync,
{
  type Rejection = AppError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
      parts
          .extensions
          .get::<Session>()
          .cloned()
          .ok_or_else(|| AppError::InternalError("Session middleware is not installed".into()))
  }
}

/// State for [`session_middleware`].
#[derive(Clone)]
pub struct SessionLayerState {
  store: SessionStore,
  key: Key,
  config: SessionConfig,
}

impl SessionLayerState {
  pub fn new(store: SessionStore, config: &SessionConfig) -> Self {
      Self {
          store,
          key: derive_key(&config.secret),
          config: config.clone(),
      }
  }

  fn session_cookie(&self, id: String) -> Cookie<'static> {
      let max_age = time::Duration::seconds(self.config.ttl.num_seconds());
      Cookie::build((self.config.cookie_name.clone(), id))
          .path("/")
          .http_only(true)
          .secure(self.config.secure)
          .same_site(SameSite::Lax)
          .max_age(max_age)
          .build()
  }

  fn removal_cookie(&self) -> Cookie<'static> {
      Cookie::build(self.config.cookie_name.clone()).path("/").build()
  }
}

// Key::from needs 64 bytes of key material; any secret length is accepted.
fn derive_key(secret: &str) -> Key {
  let digest = Sha512::digest(secret.as_bytes());
  Key::from(digest.as_slice())
}

pub async fn session_middleware(
  State(state): State<SessionLayerState>,
  mut req: Request<Body>,
  next: Next,
) -> Response {
  let jar = SignedCookieJar::from_headers(req.headers(), state.key.clone());

  // Load the session referenced by the cookie, if it is still alive
  let session = jar
      .get(&state.config.cookie_name)
      .map(|cookie| cookie.value().to_string())
      .and_then(|id| state.store.load(&id).map(|data| Session::existing(id, data)))
      .unwrap_or_else(Session::fresh);

  req.extensions_mut().insert(session.clone());
  let response = next.run(req).await;

  let (id, data, is_new, modified, destroyed) = {
      let s = session.state.lock();
      (s.id.clone(), s.data.clone(), s.is_new, s.modified, s.destroyed)
  };

  if destroyed {
      state.store.remove(&id);
      if is_new {
          return response;
      }
      debug!("Session destroyed");
      return (jar.remove(state.removal_cookie()), response).into_response();
  }

  if !modified {
      return response;
  }

  if data.is_empty() {
      // An emptied session is never stored
      if is_new {
          return response;
      }
      state.store.remove(&id);
      return (jar.remove(state.removal_cookie()), response).into_response();
  }

  state.store.save(&id, data, state.config.ttl);
  (jar.add(state.session_cookie(id)), response).into_response()
}
