//! Housing posts: CRUD, bookmarks, and the user/post back-references

pub mod links;
pub mod models;
pub mod routes;
pub mod service;

pub use models::*;
pub use routes::post_router;
pub use service::PostService;
