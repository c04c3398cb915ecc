//! Back-reference maintenance between users and posts
//!
//! The owned-posts / saved-posts sets on users and the saved-by set on posts
//! are denormalized mirrors of each other. The functions here are the only
//! code allowed to write them.
//!
//! The two sides of each update are separate row writes with no transaction
//! around them; a crash between them leaves the sides out of sync. Every
//! function is idempotent, so re-running the same operation repairs a
//! half-applied one.

use crate::db::Database;
use crate::error::{CoreError, CoreResult};

/// Record a newly created post in its owner's owned-posts set.
pub fn on_post_created(db: &Database, user_id: &str, post_id: &str) -> CoreResult<()> {
    let user = db
        .find_user_by_id(user_id)?
        .ok_or(CoreError::NotFound("this user doesn't exist"))?;

    if !user.owned_posts.iter().any(|id| id == post_id) {
        let mut owned = user.owned_posts;
        owned.push(post_id.to_string());
        db.set_owned_posts(user_id, &owned)?;
    }

    Ok(())
}

/// Record a bookmark on both sides. Adding an already present entry is a
/// no-op on that side.
pub fn on_post_saved(db: &Database, user_id: &str, post_id: &str) -> CoreResult<()> {
    let user = db
        .find_user_by_id(user_id)?
        .ok_or(CoreError::NotFound("this user doesn't exist"))?;
    let post = db
        .find_post_by_id(post_id)?
        .ok_or(CoreError::NotFound("this post doesn't exist"))?;

    if !user.saved_posts.iter().any(|id| id == post_id) {
        let mut saved = user.saved_posts;
        saved.push(post_id.to_string());
        db.set_saved_posts(user_id, &saved)?;
    }

    if !post.saved_by.iter().any(|id| id == user_id) {
        let mut saved_by = post.saved_by;
        saved_by.push(user_id.to_string());
        db.set_post_saved_by(post_id, &saved_by)?;
    }

    Ok(())
}

/// Remove a bookmark from both sides, whether or not it was present.
pub fn on_post_unsaved(db: &Database, user_id: &str, post_id: &str) -> CoreResult<()> {
    let user = db
        .find_user_by_id(user_id)?
        .ok_or(CoreError::NotFound("this user doesn't exist"))?;
    let post = db
        .find_post_by_id(post_id)?
        .ok_or(CoreError::NotFound("this post doesn't exist"))?;

    let saved: Vec<String> = user
        .saved_posts
        .into_iter()
        .filter(|id| id != post_id)
        .collect();
    db.set_saved_posts(user_id, &saved)?;

    let saved_by: Vec<String> = post
        .saved_by
        .into_iter()
        .filter(|id| id != user_id)
        .collect();
    db.set_post_saved_by(post_id, &saved_by)?;

    Ok(())
}

/// Tear down every reference to a post, then the post itself.
///
/// The post row must stay readable until its saved-by list has been walked,
/// so the row deletion comes last.
pub fn on_post_deleted(db: &Database, post_id: &str) -> CoreResult<()> {
    let post = db
        .find_post_by_id(post_id)?
        .ok_or(CoreError::NotFound("this post doesn't exist"))?;

    if let Some(owner) = db.find_user_by_id(&post.user_id)? {
        let owned: Vec<String> = owner
            .owned_posts
            .into_iter()
            .filter(|id| id != post_id)
            .collect();
        db.set_owned_posts(&post.user_id, &owned)?;
    }

    for user_id in &post.saved_by {
        match db.find_user_by_id(user_id)? {
            Some(user) => {
                let saved: Vec<String> = user
                    .saved_posts
                    .into_iter()
                    .filter(|id| id != post_id)
                    .collect();
                db.set_saved_posts(user_id, &saved)?;
            }
            None => {
                log::warn!(
                    "post {} was saved by unknown user {}, skipping",
                    post_id,
                    user_id
                );
            }
        }
    }

    db.delete_post_row(post_id)?;
    Ok(())
}
