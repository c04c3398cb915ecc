//! Post CRUD built on the store and the link maintainer

use crate::db::{self, Database};
use crate::error::{CoreError, CoreResult};

use super::links;
use super::models::{Post, PostContent, PostPreview, PostView, PublicPost};

pub struct PostService {
    db: Database,
}

impl PostService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a post owned by `owner_id` and register it in the owner's
    /// owned-posts set.
    pub async fn create_post(&self, owner_id: &str, content: PostContent) -> CoreResult<Post> {
        self.db
            .find_user_by_id(owner_id)?
            .ok_or(CoreError::NotFound("this user doesn't exist"))?;

        let now = db::now_rfc3339();
        let post = Post {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: owner_id.to_string(),
            title: content.title,
            city: content.city,
            country: content.country,
            start_date: content.start_date,
            end_date: content.end_date,
            description: content.description,
            price: content.price,
            images: vec![],
            saved_by: vec![],
            share_link: String::new(),
            created_at: now.clone(),
            updated_at: now,
        };

        self.db.create_post(&post)?;
        links::on_post_created(&self.db, owner_id, &post.id)?;

        Ok(post)
    }

    /// Detail view of a post, with denormalized owner fields and whether
    /// the requesting user (if any) has it bookmarked.
    pub async fn get_post(&self, post_id: &str, requester: Option<&str>) -> CoreResult<PostView> {
        let post = self
            .db
            .find_post_by_id(post_id)?
            .ok_or(CoreError::NotFound("this post doesn't exist"))?;

        let owner = self
            .db
            .find_user_by_id(&post.user_id)?
            .ok_or(CoreError::NotFound("this user doesn't exist"))?;

        let saved = requester
            .map(|user_id| post.saved_by.iter().any(|id| id == user_id))
            .unwrap_or(false);

        Ok(PostView {
            post: PublicPost::from(&post),
            owner_first_name: owner.first_name,
            owner_last_name: owner.last_name,
            owner_avatar: owner.avatar,
            saved,
        })
    }

    /// Owner-only edit of the content fields.
    pub async fn edit_post(
        &self,
        requester_id: &str,
        post_id: &str,
        content: PostContent,
    ) -> CoreResult<()> {
        let post = self
            .db
            .find_post_by_id(post_id)?
            .ok_or(CoreError::NotFound("this post doesn't exist"))?;

        if post.user_id != requester_id {
            return Err(CoreError::Forbidden);
        }

        self.db.update_post(post_id, &content)?;
        Ok(())
    }

    /// Owner-only deletion; the link maintainer unwinds every reference
    /// before the row goes away.
    pub async fn delete_post(&self, requester_id: &str, post_id: &str) -> CoreResult<()> {
        let post = self
            .db
            .find_post_by_id(post_id)?
            .ok_or(CoreError::NotFound("this post doesn't exist"))?;

        if post.user_id != requester_id {
            return Err(CoreError::Forbidden);
        }

        links::on_post_deleted(&self.db, post_id)
    }

    /// Bookmark the post if the user hasn't, drop the bookmark if they
    /// have. Returns the new saved state.
    pub async fn toggle_saved(&self, user_id: &str, post_id: &str) -> CoreResult<bool> {
        let user = self
            .db
            .find_user_by_id(user_id)?
            .ok_or(CoreError::NotFound("this user doesn't exist"))?;

        if user.saved_posts.iter().any(|id| id == post_id) {
            links::on_post_unsaved(&self.db, user_id, post_id)?;
            Ok(false)
        } else {
            links::on_post_saved(&self.db, user_id, post_id)?;
            Ok(true)
        }
    }

    /// The home feed: every post as a compact preview, newest first.
    pub async fn home_posts(&self) -> CoreResult<Vec<PostPreview>> {
        let posts = self.db.all_posts()?;
        Ok(posts.iter().map(PostPreview::from).collect())
    }

    /// Previews of the posts a user owns, in the order they were created.
    pub async fn owned_posts(&self, user_id: &str) -> CoreResult<Vec<PostPreview>> {
        let user = self
            .db
            .find_user_by_id(user_id)?
            .ok_or(CoreError::NotFound("could not get owned posts"))?;

        self.collect_posts(&user.owned_posts)
            .map(|posts| posts.iter().map(PostPreview::from).collect())
    }

    /// The posts a user has bookmarked.
    pub async fn saved_posts(&self, user_id: &str) -> CoreResult<Vec<PublicPost>> {
        let user = self
            .db
            .find_user_by_id(user_id)?
            .ok_or(CoreError::NotFound("could not get saved posts"))?;

        self.collect_posts(&user.saved_posts)
            .map(|posts| posts.iter().map(PublicPost::from).collect())
    }

    fn collect_posts(&self, ids: &[String]) -> CoreResult<Vec<Post>> {
        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            match self.db.find_post_by_id(id)? {
                Some(post) => posts.push(post),
                // A dangling reference means a half-applied delete; skip it.
                None => log::warn!("dangling post reference {}, skipping", id),
            }
        }
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::User;
    use assert_matches::assert_matches;

    fn seed_user(db: &Database, id: &str) {
        let now = db::now_rfc3339();
        db.create_user(&User {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            avatar: String::new(),
            status: String::new(),
            bio: String::new(),
            password_hash: "hash".to_string(),
            verification_code: "code".to_string(),
            password_reset_code: None,
            verified: true,
            owned_posts: vec![],
            saved_posts: vec![],
            created_at: now.clone(),
            updated_at: now,
        })
        .unwrap();
    }

    fn content(title: &str) -> PostContent {
        PostContent {
            title: title.to_string(),
            city: "Lausanne".to_string(),
            country: "Switzerland".to_string(),
            start_date: "2026-09-01".to_string(),
            end_date: "2027-01-31".to_string(),
            description: "Sunny room near campus".to_string(),
            price: "750".to_string(),
        }
    }

    fn test_service() -> PostService {
        let db = Database::in_memory().unwrap();
        seed_user(&db, "alice");
        seed_user(&db, "bob");
        PostService::new(db)
    }

    #[tokio::test]
    async fn test_create_registers_ownership() {
        let service = test_service();
        let post = service.create_post("alice", content("Room")).await.unwrap();

        let alice = service.db.find_user_by_id("alice").unwrap().unwrap();
        assert_eq!(alice.owned_posts, vec![post.id.clone()]);

        let owned = service.owned_posts("alice").await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, post.id);
    }

    #[tokio::test]
    async fn test_edit_by_non_owner_is_forbidden() {
        let service = test_service();
        let post = service.create_post("alice", content("Room")).await.unwrap();

        let err = service
            .edit_post("bob", &post.id, content("Stolen"))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Forbidden);

        service
            .edit_post("alice", &post.id, content("Bigger room"))
            .await
            .unwrap();
        let view = service.get_post(&post.id, None).await.unwrap();
        assert_eq!(view.post.title, "Bigger room");
    }

    #[tokio::test]
    async fn test_toggle_save_round_trip() {
        let service = test_service();
        let post = service.create_post("alice", content("Room")).await.unwrap();

        assert!(service.toggle_saved("bob", &post.id).await.unwrap());
        let view = service.get_post(&post.id, Some("bob")).await.unwrap();
        assert!(view.saved);

        let saved = service.saved_posts("bob").await.unwrap();
        assert_eq!(saved.len(), 1);

        assert!(!service.toggle_saved("bob", &post.id).await.unwrap());
        assert!(service.saved_posts("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_is_forbidden() {
        let service = test_service();
        let post = service.create_post("alice", content("Room")).await.unwrap();

        assert_matches!(
            service.delete_post("bob", &post.id).await,
            Err(CoreError::Forbidden)
        );

        service.delete_post("alice", &post.id).await.unwrap();
        assert_matches!(
            service.get_post(&post.id, None).await,
            Err(CoreError::NotFound(_))
        );
        assert!(service.owned_posts("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_home_feed_lists_posts() {
        let service = test_service();
        service.create_post("alice", content("First")).await.unwrap();
        service.create_post("bob", content("Second")).await.unwrap();

        let home = service.home_posts().await.unwrap();
        assert_eq!(home.len(), 2);
    }
}
