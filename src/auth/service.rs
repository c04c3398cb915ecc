//! Login, refresh, and account lifecycle orchestration
//!
//! Ties the credential store, password hasher, token codec, and session
//! store together. Every operation returns a `CoreResult`; token decode
//! failures collapse to `Unauthenticated` or "no identity", store failures
//! surface as `Store`.

use crate::db::{self, Database};
use crate::error::{CoreError, CoreResult};

use super::email::EmailSender;
use super::models::{
    AccessClaims, EditProfileRequest, PublicUser, RegisterRequest, TokenPair, User, UserProfile,
};
use super::password::{hash_password, verify_password};
use super::token::TokenCodec;

pub struct AuthService {
    db: Database,
    codec: TokenCodec,
    email: EmailSender,
}

impl AuthService {
    pub fn new(db: Database, codec: TokenCodec, email: EmailSender) -> Self {
        Self { db, codec, email }
    }

    /// Create an unverified account and mail it a verification code.
    ///
    /// The duplicate-email check is the store's unique index, not a prior
    /// lookup, so two concurrent registrations cannot both succeed.
    pub async fn register(&self, req: RegisterRequest) -> CoreResult<User> {
        let now = db::now_rfc3339();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: req.email.trim().to_lowercase(),
            first_name: req.first_name,
            last_name: req.last_name,
            avatar: String::new(),
            status: String::new(),
            bio: String::new(),
            password_hash: hash_password(&req.password).map_err(|e| {
                log::error!("password hashing failed: {}", e);
                CoreError::Hash
            })?,
            verification_code: generate_code(),
            password_reset_code: None,
            verified: false,
            owned_posts: vec![],
            saved_posts: vec![],
            created_at: now.clone(),
            updated_at: now,
        };

        if let Err(e) = self.db.create_user(&user) {
            if db::is_unique_violation(&e) {
                return Err(CoreError::Conflict);
            }
            return Err(CoreError::Store(e));
        }

        // Fire-and-forget: a lost email does not undo the registration.
        if let Err(e) = self
            .email
            .send_verification_email(&user.email, &user.id, &user.verification_code)
            .await
        {
            log::error!("failed to send verification email to {}: {}", user.email, e);
        }

        Ok(user)
    }

    /// Exchange credentials for an access/refresh token pair.
    ///
    /// "No such account" and "wrong password" produce the same generic
    /// failure; only the log knows which it was. An unverified account gets
    /// its own distinct answer, which does leak that the account exists.
    pub async fn login(&self, email: &str, password: &str) -> CoreResult<TokenPair> {
        let user = match self.db.find_user_by_email(&email.trim().to_lowercase())? {
            Some(user) => user,
            None => {
                log::info!("login failed: no account for the given email");
                return Err(CoreError::AuthFailure);
            }
        };

        if !user.verified {
            return Err(CoreError::Unverified);
        }

        if !verify_password(&user.password_hash, password) {
            log::info!("login failed: wrong password for user {}", user.id);
            return Err(CoreError::AuthFailure);
        }

        let session = self.db.create_session(&user.id)?;

        let access_token = self.codec.sign_access_token(&PublicUser::from(&user))?;
        let refresh_token = self.codec.sign_refresh_token(&session.id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// The user record is reloaded from the store, never taken from the
    /// token, so profile edits show up on the very next refresh. A revoked
    /// session never mints again.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> CoreResult<String> {
        let claims = self
            .codec
            .verify_refresh_token(refresh_token)
            .ok_or(CoreError::Unauthenticated)?;

        let session = self
            .db
            .find_session_by_id(&claims.session)?
            .ok_or(CoreError::Unauthenticated)?;

        if !session.valid {
            return Err(CoreError::Unauthenticated);
        }

        let user = self
            .db
            .find_user_by_id(&session.user_id)?
            .ok_or(CoreError::Unauthenticated)?;

        Ok(self.codec.sign_access_token(&PublicUser::from(&user))?)
    }

    /// Decode an access token into identity claims.
    ///
    /// A missing or bad token is simply "no identity"; whether that matters
    /// is the caller's (route guard's) decision.
    pub fn authenticate(&self, token: &str) -> Option<AccessClaims> {
        self.codec.verify_access_token(token)
    }

    /// Revoke the session behind a refresh token. Terminal: nothing ever
    /// sets a session back to valid.
    pub async fn logout(&self, refresh_token: &str) -> CoreResult<()> {
        let claims = self
            .codec
            .verify_refresh_token(refresh_token)
            .ok_or(CoreError::Unauthenticated)?;

        self.db
            .find_session_by_id(&claims.session)?
            .ok_or(CoreError::Unauthenticated)?;

        self.db.invalidate_session(&claims.session)?;
        Ok(())
    }

    /// Confirm an email address with the code sent at registration.
    /// Verifying an already-verified account succeeds quietly.
    pub async fn verify_email(&self, user_id: &str, code: &str) -> CoreResult<()> {
        let user = self
            .db
            .find_user_by_id(user_id)?
            .ok_or(CoreError::NotFound("could not verify user"))?;

        if user.verified {
            return Ok(());
        }

        if user.verification_code != code {
            log::info!("email verification failed: wrong code for user {}", user.id);
            return Err(CoreError::NotFound("could not verify user"));
        }

        self.db.set_user_verified(&user.id)?;
        Ok(())
    }

    /// Issue a password-reset code and mail it.
    ///
    /// Succeeds at the wire whether or not the email is registered, so the
    /// endpoint cannot be used to probe for accounts. Unverified accounts
    /// are skipped the same silent way.
    pub async fn request_password_reset(&self, email: &str) -> CoreResult<()> {
        let user = match self.db.find_user_by_email(&email.trim().to_lowercase())? {
            Some(user) => user,
            None => {
                log::info!("password reset requested for unknown email");
                return Ok(());
            }
        };

        if !user.verified {
            log::info!("password reset requested for unverified user {}", user.id);
            return Ok(());
        }

        let code = generate_code();
        self.db.set_password_reset_code(&user.id, Some(&code))?;

        if let Err(e) = self
            .email
            .send_password_reset_email(&user.email, &user.id, &code)
            .await
        {
            log::error!("failed to send reset email to {}: {}", user.email, e);
        }

        Ok(())
    }

    /// Set a new password using a pending reset code. The code is cleared
    /// with the same write that stores the new hash, so it is single-use.
    pub async fn reset_password(
        &self,
        user_id: &str,
        code: &str,
        new_password: &str,
    ) -> CoreResult<()> {
        let user = self
            .db
            .find_user_by_id(user_id)?
            .ok_or(CoreError::NotFound("could not reset user password"))?;

        match &user.password_reset_code {
            Some(pending) if pending == code => {}
            _ => {
                log::info!("password reset failed: no matching pending code for user {}", user.id);
                return Err(CoreError::NotFound("could not reset user password"));
            }
        }

        let hash = hash_password(new_password).map_err(|e| {
            log::error!("password hashing failed: {}", e);
            CoreError::Hash
        })?;
        self.db.update_password(&user.id, &hash)?;
        Ok(())
    }

    /// Update the editable profile fields of the requester's own account.
    pub async fn edit_profile(
        &self,
        requester_id: &str,
        req: EditProfileRequest,
    ) -> CoreResult<UserProfile> {
        if requester_id != req.id {
            return Err(CoreError::Forbidden);
        }

        let user = self
            .db
            .find_user_by_id(&req.id)?
            .ok_or(CoreError::NotFound("could not edit profile"))?;

        if !user.verified {
            return Err(CoreError::Unverified);
        }

        self.db.update_profile(
            &user.id,
            &req.new_first_name,
            &req.new_last_name,
            &req.new_status,
            &req.new_bio,
        )?;

        let updated = self
            .db
            .find_user_by_id(&user.id)?
            .ok_or(CoreError::NotFound("could not edit profile"))?;

        Ok(UserProfile::from(&updated))
    }

    /// Full profile of the account owner (includes email and saved posts).
    pub async fn get_profile(&self, user_id: &str) -> CoreResult<UserProfile> {
        let user = self
            .db
            .find_user_by_id(user_id)?
            .ok_or(CoreError::NotFound("could not get your profile"))?;
        Ok(UserProfile::from(&user))
    }

    /// Public projection of any user.
    pub async fn get_public_user(&self, user_id: &str) -> CoreResult<PublicUser> {
        let user = self
            .db
            .find_user_by_id(user_id)?
            .ok_or(CoreError::NotFound("this user doesn't exist"))?;
        Ok(PublicUser::from(&user))
    }
}

/// Generate a random verification / password-reset code.
fn generate_code() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes).expect("Failed to generate random bytes");
    URL_SAFE_NO_PAD.encode(bytes)
}
