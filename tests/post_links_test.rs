//! End-to-end post lifecycle: ownership, bookmarks, and deletion cleanup

use assert_matches::assert_matches;
use unistay::auth::models::RegisterRequest;
use unistay::posts::models::PostContent;
use unistay::{
    AuthService, CoreError, Database, EmailSender, PostService, TokenCodec, TokenKeys,
};

struct Setup {
    auth: AuthService,
    posts: PostService,
    db: Database,
}

fn test_setup() -> Setup {
    let db = Database::in_memory().unwrap();
    let codec = TokenCodec::new(&TokenKeys::development()).unwrap();
    Setup {
        auth: AuthService::new(db.clone(), codec, EmailSender::mock()),
        posts: PostService::new(db.clone()),
        db,
    }
}

async fn registered_user(setup: &Setup, email: &str) -> String {
    let user = setup
        .auth
        .register(RegisterRequest {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password: "secret1".to_string(),
        })
        .await
        .unwrap();
    setup
        .auth
        .verify_email(&user.id, &user.verification_code)
        .await
        .unwrap();
    user.id
}

fn room_in(city: &str) -> PostContent {
    PostContent {
        title: format!("Room in {}", city),
        city: city.to_string(),
        country: "Switzerland".to_string(),
        start_date: "2026-09-01".to_string(),
        end_date: "2027-01-31".to_string(),
        description: "Sunny room near campus".to_string(),
        price: "750".to_string(),
    }
}

#[tokio::test]
async fn test_create_save_delete_keeps_references_consistent() {
    let setup = test_setup();
    let alice = registered_user(&setup, "alice@x.com").await;
    let bob = registered_user(&setup, "bob@x.com").await;

    // Alice creates a post; it shows up in her owned set.
    let post = setup.posts.create_post(&alice, room_in("Lausanne")).await.unwrap();
    let alice_row = setup.db.find_user_by_id(&alice).unwrap().unwrap();
    assert_eq!(alice_row.owned_posts, vec![post.id.clone()]);

    // Bob saves it; both back-references appear.
    assert!(setup.posts.toggle_saved(&bob, &post.id).await.unwrap());
    let bob_row = setup.db.find_user_by_id(&bob).unwrap().unwrap();
    let post_row = setup.db.find_post_by_id(&post.id).unwrap().unwrap();
    assert_eq!(bob_row.saved_posts, vec![post.id.clone()]);
    assert_eq!(post_row.saved_by, vec![bob.clone()]);

    // Deleting the post scrubs it from Alice's owned set and Bob's saved set.
    setup.posts.delete_post(&alice, &post.id).await.unwrap();
    assert!(setup.db.find_post_by_id(&post.id).unwrap().is_none());
    let alice_row = setup.db.find_user_by_id(&alice).unwrap().unwrap();
    let bob_row = setup.db.find_user_by_id(&bob).unwrap().unwrap();
    assert!(alice_row.owned_posts.is_empty());
    assert!(bob_row.saved_posts.is_empty());
}

#[tokio::test]
async fn test_double_save_equals_single_save() {
    let setup = test_setup();
    let alice = registered_user(&setup, "alice@x.com").await;
    let bob = registered_user(&setup, "bob@x.com").await;

    let post = setup.posts.create_post(&alice, room_in("Geneva")).await.unwrap();

    // The toggle unsaves on the second call, so drive the maintainer
    // directly to check idempotence of the save itself.
    unistay::posts::links::on_post_saved(&setup.db, &bob, &post.id).unwrap();
    unistay::posts::links::on_post_saved(&setup.db, &bob, &post.id).unwrap();

    let bob_row = setup.db.find_user_by_id(&bob).unwrap().unwrap();
    let post_row = setup.db.find_post_by_id(&post.id).unwrap().unwrap();
    assert_eq!(bob_row.saved_posts.len(), 1);
    assert_eq!(post_row.saved_by.len(), 1);
}

#[tokio::test]
async fn test_only_the_owner_can_edit_or_delete() {
    let setup = test_setup();
    let alice = registered_user(&setup, "alice@x.com").await;
    let bob = registered_user(&setup, "bob@x.com").await;

    let post = setup.posts.create_post(&alice, room_in("Zurich")).await.unwrap();

    assert_matches!(
        setup.posts.edit_post(&bob, &post.id, room_in("Bern")).await,
        Err(CoreError::Forbidden)
    );
    assert_matches!(
        setup.posts.delete_post(&bob, &post.id).await,
        Err(CoreError::Forbidden)
    );

    // The post is untouched.
    let view = setup.posts.get_post(&post.id, None).await.unwrap();
    assert_eq!(view.post.city, "Zurich");
}

#[tokio::test]
async fn test_owned_and_saved_listings() {
    let setup = test_setup();
    let alice = registered_user(&setup, "alice@x.com").await;
    let bob = registered_user(&setup, "bob@x.com").await;

    let first = setup.posts.create_post(&alice, room_in("Lausanne")).await.unwrap();
    let second = setup.posts.create_post(&alice, room_in("Geneva")).await.unwrap();
    setup.posts.toggle_saved(&bob, &first.id).await.unwrap();

    let owned = setup.posts.owned_posts(&alice).await.unwrap();
    assert_eq!(owned.len(), 2);
    assert_eq!(owned[0].id, first.id);
    assert_eq!(owned[1].id, second.id);

    let saved = setup.posts.saved_posts(&bob).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, first.id);
}
