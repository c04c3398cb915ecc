//! Post data models

use serde::{Deserialize, Serialize};

/// A housing post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    /// Owner
    pub user_id: String,
    pub title: String,
    pub city: String,
    pub country: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub price: String,
    /// References to stored images, in display order.
    pub images: Vec<String>,
    /// User ids that bookmarked this post. Written only by the link
    /// maintainer, mirrored by each user's saved-posts set.
    pub saved_by: Vec<String>,
    pub share_link: String,
    pub created_at: String,
    pub updated_at: String,
}

/// The editable content fields, shared by the create and edit requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostContent {
    pub title: String,
    pub city: String,
    pub country: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub price: String,
}

/// Projection shown to clients: everything except who bookmarked it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPost {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub city: String,
    pub country: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub price: String,
    pub images: Vec<String>,
    pub share_link: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Post> for PublicPost {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            user_id: post.user_id.clone(),
            title: post.title.clone(),
            city: post.city.clone(),
            country: post.country.clone(),
            start_date: post.start_date.clone(),
            end_date: post.end_date.clone(),
            description: post.description.clone(),
            price: post.price.clone(),
            images: post.images.clone(),
            share_link: post.share_link.clone(),
            created_at: post.created_at.clone(),
            updated_at: post.updated_at.clone(),
        }
    }
}

/// Compact projection for feeds and listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPreview {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub city: String,
    pub country: String,
    pub start_date: String,
    pub end_date: String,
    pub price: String,
    pub images: Vec<String>,
    pub created_at: String,
}

impl From<&Post> for PostPreview {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            user_id: post.user_id.clone(),
            title: post.title.clone(),
            city: post.city.clone(),
            country: post.country.clone(),
            start_date: post.start_date.clone(),
            end_date: post.end_date.clone(),
            price: post.price.clone(),
            images: post.images.clone(),
            created_at: post.created_at.clone(),
        }
    }
}

/// A post as shown on its detail page: the public projection plus a few
/// denormalized owner fields and whether the requester bookmarked it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: PublicPost,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub owner_avatar: String,
    pub saved: bool,
}

#[derive(Debug, Serialize)]
pub struct SaveToggleResponse {
    pub saved: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UserIdRequest {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct PostCreatedResponse {
    pub message: String,
    pub post_id: String,
}
