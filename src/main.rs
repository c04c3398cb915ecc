use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use unistay::auth::{auth_router, middleware, user_router, AuthService, EmailSender, TokenCodec, TokenKeys};
use unistay::logging::setup_logging;
use unistay::posts::{post_router, PostService};
use unistay::{AppState, Database};

#[derive(Parser, Debug)]
#[command(name = "unistay")]
struct Config {
    /// Port for the HTTP API
    #[arg(short = 'p', long, default_value_t = 3000)]
    port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Path to the SQLite database
    #[arg(long, default_value = "data/unistay.db")]
    db_path: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let config = Config::parse();

    if let Some(dir) = std::path::Path::new(&config.db_path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let db = Database::new(&config.db_path)?;

    let keys = match TokenKeys::from_env() {
        Some(keys) => keys,
        None => {
            log::warn!("Token keys not configured in env, using bundled development keys");
            TokenKeys::development()
        }
    };
    let codec = TokenCodec::new(&keys)?;
    let email = EmailSender::from_env();

    let state = Arc::new(AppState {
        auth: AuthService::new(db.clone(), codec, email),
        posts: PostService::new(db),
    });

    let app = axum::Router::new()
        .nest("/auth", auth_router(Arc::clone(&state)))
        .nest("/users", user_router(Arc::clone(&state)))
        .nest("/posts", post_router(Arc::clone(&state)))
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::attach_identity,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    log::info!("UniStay API listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
