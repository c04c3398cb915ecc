//! Authentication data models

use serde::{Deserialize, Serialize};

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Stored lowercase; the store enforces uniqueness on this column.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
    pub status: String,
    pub bio: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Issued at registration, compared on email verification.
    #[serde(skip_serializing)]
    pub verification_code: String,
    /// None unless a password reset is pending.
    #[serde(skip_serializing)]
    pub password_reset_code: Option<String>,
    pub verified: bool,
    /// Post ids this user created. Written only by the post link maintainer.
    pub owned_posts: Vec<String>,
    /// Post ids this user bookmarked. Written only by the post link maintainer.
    pub saved_posts: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Projection of a user safe to show to anyone (and to embed in access
/// tokens). Password, verification codes, the verified flag, saved posts,
/// and email are not fields here, so they cannot leak by accident.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
    pub status: String,
    pub bio: String,
    pub owned_posts: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            avatar: user.avatar.clone(),
            status: user.status.clone(),
            bio: user.bio.clone(),
            owned_posts: user.owned_posts.clone(),
            created_at: user.created_at.clone(),
            updated_at: user.updated_at.clone(),
        }
    }
}

/// Projection of a user for the account owner: includes email and the saved
/// posts, still never the password hash or any pending codes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
    pub status: String,
    pub bio: String,
    pub owned_posts: Vec<String>,
    pub saved_posts: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            avatar: user.avatar.clone(),
            status: user.status.clone(),
            bio: user.bio.clone(),
            owned_posts: user.owned_posts.clone(),
            saved_posts: user.saved_posts.clone(),
            created_at: user.created_at.clone(),
            updated_at: user.updated_at.clone(),
        }
    }
}

/// One refresh-token lineage. Created at login, never reused across logins.
/// Once `valid` is false the session can never mint access tokens again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub valid: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Claims schema version embedded in every signed token. Bump when the
/// claims layout changes; tokens from another version fail verification.
pub const CLAIMS_SCHEMA_VERSION: u8 = 1;

/// Access token claims: the public projection of the user plus JWT
/// bookkeeping. Verified without a store lookup on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
    pub status: String,
    pub bio: String,
    pub owned_posts: Vec<String>,
    pub ver: u8,
    pub iat: usize,
    pub exp: usize,
}

/// Refresh token claims: only the session id, never user data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub session: String,
    pub ver: u8,
    pub iat: usize,
    pub exp: usize,
}

/// API request/response types
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProfileRequest {
    pub id: String,
    pub new_first_name: String,
    pub new_last_name: String,
    pub new_status: String,
    pub new_bio: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
