//! # UniStay Backend Library
//!
//! Session/authentication core and post sharing for the UniStay service.
//!
//! ## Components
//!
//! - **Auth**: registration, email verification, login, token refresh,
//!   logout, and password reset, with Argon2 hashing and RS256 tokens
//! - **Posts**: housing post CRUD with bookmark back-references kept
//!   consistent between users and posts
//! - **Store**: SQLite persistence for users, sessions, and posts, with an
//!   in-memory variant for tests

pub mod auth;
pub mod db;
pub mod error;
pub mod logging;
pub mod posts;
pub mod state;

pub use auth::{AuthService, EmailSender, TokenCodec, TokenKeys};
pub use db::Database;
pub use error::{CoreError, CoreResult};
pub use posts::PostService;
pub use state::AppState;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
