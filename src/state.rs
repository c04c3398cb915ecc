//! Shared application state handed to every request handler

use crate::auth::service::AuthService;
use crate::posts::service::PostService;

pub struct AppState {
    pub auth: AuthService,
    pub posts: PostService,
}
