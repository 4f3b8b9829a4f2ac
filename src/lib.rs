pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod ieo;
pub mod market;
pub mod middleware;
pub mod p2p;
pub mod scheduler;
pub mod subscribers;
pub mod users;
pub mod wallets;

// Re-export common modules
pub use api::router;
pub use config::Config;
pub use db::MongoDb;
pub use error::AppError;
