pub mod cors;
pub mod extract;
pub mod router;
pub mod server;
