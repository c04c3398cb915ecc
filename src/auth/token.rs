//! Signed bearer token codec (access and refresh tokens)

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::models::{AccessClaims, PublicUser, RefreshClaims, CLAIMS_SCHEMA_VERSION};

/// Access tokens are short-lived; clients exchange their refresh token for a
/// fresh one afterwards.
pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 45;

/// Refresh tokens live for a year; revocation happens through the session
/// validity flag, not through token expiry.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 365;

const DEV_ACCESS_PRIVATE_PEM: &str = include_str!("../../config/access_private.pem");
const DEV_ACCESS_PUBLIC_PEM: &str = include_str!("../../config/access_public.pem");
const DEV_REFRESH_PRIVATE_PEM: &str = include_str!("../../config/refresh_private.pem");
const DEV_REFRESH_PUBLIC_PEM: &str = include_str!("../../config/refresh_public.pem");

/// RSA key material for both token kinds, PEM-encoded.
pub struct TokenKeys {
    pub access_private_pem: String,
    pub access_public_pem: String,
    pub refresh_private_pem: String,
    pub refresh_public_pem: String,
}

impl TokenKeys {
    /// Load keys from the environment. Each variable holds a base64-encoded
    /// PEM so the multi-line key fits in one env value.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            access_private_pem: pem_from_env("ACCESS_TOKEN_PRIVATE_KEY")?,
            access_public_pem: pem_from_env("ACCESS_TOKEN_PUBLIC_KEY")?,
            refresh_private_pem: pem_from_env("REFRESH_TOKEN_PRIVATE_KEY")?,
            refresh_public_pem: pem_from_env("REFRESH_TOKEN_PUBLIC_KEY")?,
        })
    }

    /// Bundled development keypairs. Fine for local runs and tests, not for
    /// anything that faces the internet.
    pub fn development() -> Self {
        Self {
            access_private_pem: DEV_ACCESS_PRIVATE_PEM.to_string(),
            access_public_pem: DEV_ACCESS_PUBLIC_PEM.to_string(),
            refresh_private_pem: DEV_REFRESH_PRIVATE_PEM.to_string(),
            refresh_public_pem: DEV_REFRESH_PUBLIC_PEM.to_string(),
        }
    }
}

fn pem_from_env(name: &str) -> Option<String> {
    let encoded = std::env::var(name).ok()?;
    match STANDARD.decode(encoded.trim()) {
        Ok(bytes) => String::from_utf8(bytes).ok(),
        Err(e) => {
            log::error!("{} is not valid base64: {}", name, e);
            None
        }
    }
}

/// Stateless codec holding the parsed signing and verification keys.
/// Built once at startup and shared read-only across requests.
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(keys: &TokenKeys) -> Result<Self, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::RS256);
        // Expiry is exact: a token one second past its exp is dead.
        validation.leeway = 0;

        Ok(Self {
            access_encoding: EncodingKey::from_rsa_pem(keys.access_private_pem.as_bytes())?,
            access_decoding: DecodingKey::from_rsa_pem(keys.access_public_pem.as_bytes())?,
            refresh_encoding: EncodingKey::from_rsa_pem(keys.refresh_private_pem.as_bytes())?,
            refresh_decoding: DecodingKey::from_rsa_pem(keys.refresh_public_pem.as_bytes())?,
            validation,
        })
    }

    /// Sign an access token embedding the public projection of a user.
    pub fn sign_access_token(
        &self,
        user: &PublicUser,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.sign_access_token_with_ttl(user, Duration::minutes(ACCESS_TOKEN_TTL_MINUTES))
    }

    /// Sign an access token with an explicit TTL.
    pub fn sign_access_token_with_ttl(
        &self,
        user: &PublicUser,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let (iat, exp) = timestamps(ttl);
        let claims = AccessClaims {
            sub: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            avatar: user.avatar.clone(),
            status: user.status.clone(),
            bio: user.bio.clone(),
            owned_posts: user.owned_posts.clone(),
            ver: CLAIMS_SCHEMA_VERSION,
            iat,
            exp,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.access_encoding)
    }

    /// Sign a refresh token embedding a session id.
    pub fn sign_refresh_token(
        &self,
        session_id: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.sign_refresh_token_with_ttl(session_id, Duration::days(REFRESH_TOKEN_TTL_DAYS))
    }

    /// Sign a refresh token with an explicit TTL.
    pub fn sign_refresh_token_with_ttl(
        &self,
        session_id: &str,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let (iat, exp) = timestamps(ttl);
        let claims = RefreshClaims {
            session: session_id.to_string(),
            ver: CLAIMS_SCHEMA_VERSION,
            iat,
            exp,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.refresh_encoding)
    }

    /// Decode and verify an access token.
    ///
    /// Returns `None` for any failure (malformed, expired, wrong key, wrong
    /// claims version): callers treat that as "no identity", never as an
    /// error to surface.
    pub fn verify_access_token(&self, token: &str) -> Option<AccessClaims> {
        let data = decode::<AccessClaims>(token, &self.access_decoding, &self.validation).ok()?;
        if data.claims.ver != CLAIMS_SCHEMA_VERSION {
            return None;
        }
        Some(data.claims)
    }

    /// Decode and verify a refresh token. Same `None`-on-failure contract as
    /// [`verify_access_token`](Self::verify_access_token).
    pub fn verify_refresh_token(&self, token: &str) -> Option<RefreshClaims> {
        let data = decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation).ok()?;
        if data.claims.ver != CLAIMS_SCHEMA_VERSION {
            return None;
        }
        Some(data.claims)
    }
}

fn timestamps(ttl: Duration) -> (usize, usize) {
    let now = Utc::now();
    (now.timestamp() as usize, (now + ttl).timestamp() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec() -> TokenCodec {
        TokenCodec::new(&TokenKeys::development()).unwrap()
    }

    fn test_user() -> PublicUser {
        PublicUser {
            id: "user_123".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            avatar: String::new(),
            status: String::new(),
            bio: String::new(),
            owned_posts: vec!["post_1".to_string()],
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let codec = test_codec();
        let token = codec.sign_access_token(&test_user()).unwrap();

        let claims = codec.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.first_name, "Ada");
        assert_eq!(claims.owned_posts, vec!["post_1".to_string()]);
        assert_eq!(claims.ver, CLAIMS_SCHEMA_VERSION);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let codec = test_codec();
        let token = codec.sign_refresh_token("session_42").unwrap();

        let claims = codec.verify_refresh_token(&token).unwrap();
        assert_eq!(claims.session, "session_42");
    }

    #[test]
    fn test_garbage_token_yields_none() {
        let codec = test_codec();
        assert!(codec.verify_access_token("not.a.token").is_none());
        assert!(codec.verify_refresh_token("").is_none());
    }

    #[test]
    fn test_wrong_key_role_yields_none() {
        let codec = test_codec();

        // An access token must not verify against the refresh public key,
        // and vice versa: the keypairs are independent.
        let access = codec.sign_access_token(&test_user()).unwrap();
        assert!(codec.verify_refresh_token(&access).is_none());

        let refresh = codec.sign_refresh_token("session_42").unwrap();
        assert!(codec.verify_access_token(&refresh).is_none());
    }

    #[test]
    fn test_expired_token_yields_none() {
        let codec = test_codec();

        let expired = codec
            .sign_access_token_with_ttl(&test_user(), Duration::seconds(-5))
            .unwrap();
        assert!(codec.verify_access_token(&expired).is_none());

        let expired = codec
            .sign_refresh_token_with_ttl("session_42", Duration::seconds(-5))
            .unwrap();
        assert!(codec.verify_refresh_token(&expired).is_none());
    }

    #[test]
    fn test_token_inside_ttl_verifies() {
        let codec = test_codec();
        let token = codec
            .sign_access_token_with_ttl(&test_user(), Duration::seconds(60))
            .unwrap();
        assert!(codec.verify_access_token(&token).is_some());
    }

    #[test]
    fn test_stale_claims_version_yields_none() {
        let codec = test_codec();
        let (iat, exp) = timestamps(Duration::minutes(5));
        let old_claims = AccessClaims {
            sub: "user_123".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            avatar: String::new(),
            status: String::new(),
            bio: String::new(),
            owned_posts: vec![],
            ver: CLAIMS_SCHEMA_VERSION + 1,
            iat,
            exp,
        };
        let token = encode(
            &Header::new(Algorithm::RS256),
            &old_claims,
            &EncodingKey::from_rsa_pem(DEV_ACCESS_PRIVATE_PEM.as_bytes()).unwrap(),
        )
        .unwrap();

        assert!(codec.verify_access_token(&token).is_none());
    }
}
