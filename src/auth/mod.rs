//! Authentication module
//!
//! Provides the session/authentication core:
//! - User registration with email/password and email verification
//! - Password reset via emailed codes
//! - Argon2 password hashing
//! - RS256-signed access and refresh tokens
//! - Session records with explicit revocation

pub mod email;
pub mod middleware;
pub mod models;
pub mod password;
pub mod routes;
pub mod service;
pub mod token;

pub use email::EmailSender;
pub use models::*;
pub use routes::{auth_router, user_router};
pub use service::AuthService;
pub use token::{TokenCodec, TokenKeys};
