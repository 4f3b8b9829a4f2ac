pub mod session;

pub use session::{session_middleware, Session, SessionLayerState, SessionStore};
