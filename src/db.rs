//! SQLite persistence for users, sessions, and posts
//!
//! One connection behind a mutex; every public method is a single statement,
//! so writes are atomic per row but never across rows. Multi-row invariants
//! (the owned/saved back-references) are maintained by `posts::links`, not
//! here.

use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

use crate::auth::models::{Session, User};
use crate::posts::models::{Post, PostContent};

/// Database connection wrapper
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path` and initialize tables.
    pub fn new(path: &str) -> SqliteResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_tables()?;
        Ok(db)
    }

    /// Create an in-memory database, the substitutable store for tests.
    pub fn in_memory() -> SqliteResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_tables()?;
        Ok(db)
    }

    fn init_tables(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                avatar TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT '',
                bio TEXT NOT NULL DEFAULT '',
                password_hash TEXT NOT NULL,
                verification_code TEXT NOT NULL,
                password_reset_code TEXT,
                verified INTEGER NOT NULL DEFAULT 0,
                owned_posts TEXT NOT NULL DEFAULT '[]',
                saved_posts TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                valid INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                city TEXT NOT NULL,
                country TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                description TEXT NOT NULL,
                price TEXT NOT NULL,
                images TEXT NOT NULL DEFAULT '[]',
                saved_by TEXT NOT NULL DEFAULT '[]',
                share_link TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
            CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_posts_user ON posts(user_id);
            "#,
        )?;

        Ok(())
    }

    // ==================== User Operations ====================

    /// Insert a new user. Fails with a constraint violation when the email
    /// is already taken; see [`is_unique_violation`].
    pub fn create_user(&self, user: &User) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (id, email, first_name, last_name, avatar, status, bio,
                                password_hash, verification_code, password_reset_code, verified,
                                owned_posts, saved_posts, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                user.id,
                user.email,
                user.first_name,
                user.last_name,
                user.avatar,
                user.status,
                user.bio,
                user.password_hash,
                user.verification_code,
                user.password_reset_code,
                user.verified as i32,
                encode_list(&user.owned_posts),
                encode_list(&user.saved_posts),
                user.created_at,
                user.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Find user by email. Callers pass the email already lowercased.
    pub fn find_user_by_email(&self, email: &str) -> SqliteResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE email = ?1",
            USER_COLUMNS
        ))?;

        let mut rows = stmt.query(params![email])?;
        match rows.next()? {
            Some(row) => Ok(Some(user_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Find user by ID
    pub fn find_user_by_id(&self, id: &str) -> SqliteResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))?;

        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(user_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Mark a user's email as confirmed.
    pub fn set_user_verified(&self, user_id: &str) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET verified = 1, updated_at = ?1 WHERE id = ?2",
            params![now_rfc3339(), user_id],
        )?;
        Ok(())
    }

    /// Set or clear the pending password-reset code.
    pub fn set_password_reset_code(&self, user_id: &str, code: Option<&str>) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET password_reset_code = ?1, updated_at = ?2 WHERE id = ?3",
            params![code, now_rfc3339(), user_id],
        )?;
        Ok(())
    }

    /// Store a new password hash and clear any pending reset code, so a used
    /// code can never reset the password twice.
    pub fn update_password(&self, user_id: &str, password_hash: &str) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET password_hash = ?1, password_reset_code = NULL, updated_at = ?2
             WHERE id = ?3",
            params![password_hash, now_rfc3339(), user_id],
        )?;
        Ok(())
    }

    /// Update the editable profile fields. Never touches the password.
    pub fn update_profile(
        &self,
        user_id: &str,
        first_name: &str,
        last_name: &str,
        status: &str,
        bio: &str,
    ) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET first_name = ?1, last_name = ?2, status = ?3, bio = ?4,
                              updated_at = ?5
             WHERE id = ?6",
            params![first_name, last_name, status, bio, now_rfc3339(), user_id],
        )?;
        Ok(())
    }

    /// Overwrite a user's owned-posts set. Only `posts::links` writes this.
    pub(crate) fn set_owned_posts(&self, user_id: &str, posts: &[String]) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET owned_posts = ?1, updated_at = ?2 WHERE id = ?3",
            params![encode_list(posts), now_rfc3339(), user_id],
        )?;
        Ok(())
    }

    /// Overwrite a user's saved-posts set. Only `posts::links` writes this.
    pub(crate) fn set_saved_posts(&self, user_id: &str, posts: &[String]) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET saved_posts = ?1, updated_at = ?2 WHERE id = ?3",
            params![encode_list(posts), now_rfc3339(), user_id],
        )?;
        Ok(())
    }

    // ==================== Session Operations ====================

    /// Create a new valid session for a user. Every login gets its own
    /// session record; concurrent sessions are independent.
    pub fn create_session(&self, user_id: &str) -> SqliteResult<Session> {
        let now = now_rfc3339();
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            valid: true,
            created_at: now.clone(),
            updated_at: now,
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sessions (id, user_id, valid, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.id,
                session.user_id,
                session.valid as i32,
                session.created_at,
                session.updated_at,
            ],
        )?;

        Ok(session)
    }

    /// Find session by ID
    pub fn find_session_by_id(&self, id: &str) -> SqliteResult<Option<Session>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, valid, created_at, updated_at FROM sessions WHERE id = ?1",
        )?;

        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(Session {
                id: row.get(0)?,
                user_id: row.get(1)?,
                valid: row.get::<_, i32>(2)? != 0,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })),
            None => Ok(None),
        }
    }

    /// Revoke a session. There is no operation that sets `valid` back to 1.
    pub fn invalidate_session(&self, session_id: &str) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE sessions SET valid = 0, updated_at = ?1 WHERE id = ?2",
            params![now_rfc3339(), session_id],
        )?;
        Ok(())
    }

    // ==================== Post Operations ====================

    /// Insert a new post
    pub fn create_post(&self, post: &Post) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO posts (id, user_id, title, city, country, start_date, end_date,
                                description, price, images, saved_by, share_link,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                post.id,
                post.user_id,
                post.title,
                post.city,
                post.country,
                post.start_date,
                post.end_date,
                post.description,
                post.price,
                encode_list(&post.images),
                encode_list(&post.saved_by),
                post.share_link,
                post.created_at,
                post.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Find post by ID
    pub fn find_post_by_id(&self, id: &str) -> SqliteResult<Option<Post>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS))?;

        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(post_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// All posts, newest first (the home feed).
    pub fn all_posts(&self) -> SqliteResult<Vec<Post>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM posts ORDER BY created_at DESC",
            POST_COLUMNS
        ))?;

        let rows = stmt.query_map([], post_from_row)?;
        rows.collect()
    }

    /// Update the editable content fields of a post.
    pub fn update_post(&self, post_id: &str, content: &PostContent) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE posts SET title = ?1, city = ?2, country = ?3, start_date = ?4,
                              end_date = ?5, description = ?6, price = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                content.title,
                content.city,
                content.country,
                content.start_date,
                content.end_date,
                content.description,
                content.price,
                now_rfc3339(),
                post_id,
            ],
        )?;
        Ok(())
    }

    /// Overwrite a post's saved-by set. Only `posts::links` writes this.
    pub(crate) fn set_post_saved_by(&self, post_id: &str, users: &[String]) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE posts SET saved_by = ?1, updated_at = ?2 WHERE id = ?3",
            params![encode_list(users), now_rfc3339(), post_id],
        )?;
        Ok(())
    }

    /// Remove the post row itself. Only `posts::links` calls this, after the
    /// back-references on users have been cleaned up.
    pub(crate) fn delete_post_row(&self, post_id: &str) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM posts WHERE id = ?1", params![post_id])?;
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

/// True when an insert failed on a UNIQUE constraint (duplicate email).
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

const USER_COLUMNS: &str = "id, email, first_name, last_name, avatar, status, bio, \
                            password_hash, verification_code, password_reset_code, verified, \
                            owned_posts, saved_posts, created_at, updated_at";

const POST_COLUMNS: &str = "id, user_id, title, city, country, start_date, end_date, \
                            description, price, images, saved_by, share_link, \
                            created_at, updated_at";

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        avatar: row.get(4)?,
        status: row.get(5)?,
        bio: row.get(6)?,
        password_hash: row.get(7)?,
        verification_code: row.get(8)?,
        password_reset_code: row.get(9)?,
        verified: row.get::<_, i32>(10)? != 0,
        owned_posts: parse_list(&row.get::<_, String>(11)?),
        saved_posts: parse_list(&row.get::<_, String>(12)?),
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

fn post_from_row(row: &Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        city: row.get(3)?,
        country: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        description: row.get(7)?,
        price: row.get(8)?,
        images: parse_list(&row.get::<_, String>(9)?),
        saved_by: parse_list(&row.get::<_, String>(10)?),
        share_link: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn encode_list(list: &[String]) -> String {
    serde_json::to_string(list).unwrap_or_else(|_| "[]".to_string())
}

fn parse_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        log::warn!("malformed reference list in store, treating as empty: {}", e);
        Vec::new()
    })
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
