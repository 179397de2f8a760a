//! HTTP server for Notary.
//!
//! A thin axum surface over [`notary_service::NotaryService`]: uploads are
//! streamed to staged temp files, hashed from disk, and released when the
//! request finishes.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::{NotaryConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::NotaryServer;
