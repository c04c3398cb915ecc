//! End-to-end authentication flows against the in-memory store

use assert_matches::assert_matches;
use unistay::auth::models::RegisterRequest;
use unistay::{AuthService, CoreError, Database, EmailSender, TokenCodec, TokenKeys};

fn test_setup() -> (AuthService, Database) {
    let db = Database::in_memory().unwrap();
    let codec = TokenCodec::new(&TokenKeys::development()).unwrap();
    let service = AuthService::new(db.clone(), codec, EmailSender::mock());
    (service, db)
}

fn register_request(email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_register_verify_login_flow() {
    let (service, db) = test_setup();

    let user = service
        .register(register_request("a@x.com", "secret1"))
        .await
        .unwrap();

    // The persisted record holds a hash, never the plaintext.
    let stored = db.find_user_by_id(&user.id).unwrap().unwrap();
    assert_ne!(stored.password_hash, "secret1");

    service
        .verify_email(&user.id, &user.verification_code)
        .await
        .unwrap();

    let pair = service.login("a@x.com", "secret1").await.unwrap();
    assert!(!pair.access_token.is_empty());
    assert!(!pair.refresh_token.is_empty());

    // The access token authenticates to the registered user without any
    // store lookup.
    let claims = service.authenticate(&pair.access_token).unwrap();
    assert_eq!(claims.sub, user.id);

    // Wrong password gets the same generic failure a missing account gets.
    let wrong = service.login("a@x.com", "wrong").await.unwrap_err();
    let missing = service.login("ghost@x.com", "secret1").await.unwrap_err();
    assert_matches!(wrong, CoreError::AuthFailure);
    assert_eq!(wrong.to_string(), missing.to_string());
}

#[tokio::test]
async fn test_email_is_case_normalized_and_unique() {
    let (service, _db) = test_setup();

    service
        .register(register_request("Ada@X.com", "secret1"))
        .await
        .unwrap();

    let err = service
        .register(register_request("ada@x.com", "other"))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict);
}

#[tokio::test]
async fn test_refresh_and_revocation_lineage() {
    let (service, _db) = test_setup();

    let user = service
        .register(register_request("a@x.com", "secret1"))
        .await
        .unwrap();
    service
        .verify_email(&user.id, &user.verification_code)
        .await
        .unwrap();

    let pair = service.login("a@x.com", "secret1").await.unwrap();

    // Any number of refreshes work while the session is alive.
    for _ in 0..3 {
        let access = service
            .refresh_access_token(&pair.refresh_token)
            .await
            .unwrap();
        assert_eq!(service.authenticate(&access).unwrap().sub, user.id);
    }

    service.logout(&pair.refresh_token).await.unwrap();

    // Revocation is terminal no matter how many refreshes preceded it.
    for _ in 0..3 {
        assert_matches!(
            service.refresh_access_token(&pair.refresh_token).await,
            Err(CoreError::Unauthenticated)
        );
    }
}

#[tokio::test]
async fn test_access_token_never_carries_secrets() {
    let (service, _db) = test_setup();

    let user = service
        .register(register_request("a@x.com", "secret1"))
        .await
        .unwrap();
    service
        .verify_email(&user.id, &user.verification_code)
        .await
        .unwrap();
    let pair = service.login("a@x.com", "secret1").await.unwrap();

    // Decode the payload segment directly: neither the email nor any
    // password/code material may appear in it.
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    let payload_b64 = pair.access_token.split('.').nth(1).unwrap();
    let payload = String::from_utf8(URL_SAFE_NO_PAD.decode(payload_b64).unwrap()).unwrap();

    assert!(!payload.contains("a@x.com"));
    assert!(!payload.contains("secret1"));
    assert!(!payload.contains(&user.verification_code));
    assert!(!payload.contains("password"));
    assert!(!payload.contains("verified"));
}

#[tokio::test]
async fn test_password_reset_end_to_end() {
    let (service, db) = test_setup();

    let user = service
        .register(register_request("a@x.com", "secret1"))
        .await
        .unwrap();
    service
        .verify_email(&user.id, &user.verification_code)
        .await
        .unwrap();

    // No pending code yet.
    assert!(db
        .find_user_by_id(&user.id)
        .unwrap()
        .unwrap()
        .password_reset_code
        .is_none());

    service.request_password_reset("a@x.com").await.unwrap();
    let code = db
        .find_user_by_id(&user.id)
        .unwrap()
        .unwrap()
        .password_reset_code
        .unwrap();

    service
        .reset_password(&user.id, &code, "brand-new-pass")
        .await
        .unwrap();

    assert_matches!(
        service.login("a@x.com", "secret1").await,
        Err(CoreError::AuthFailure)
    );
    service.login("a@x.com", "brand-new-pass").await.unwrap();

    // The code was cleared by the reset and cannot be replayed.
    assert_matches!(
        service.reset_password(&user.id, &code, "yet-another").await,
        Err(CoreError::NotFound(_))
    );
}
