use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Thread-safe SQLite store. Each resource maps to one table; set- and
/// list-valued fields (followers, likes, shares) live in JSON text columns.
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path
    pub fn new(db_path: &str) -> StoreResult<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store for testing
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = OFF;

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                mobile TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE,
                password_hash TEXT NOT NULL,
                profile_picture TEXT DEFAULT '',
                bio TEXT DEFAULT '',
                followers TEXT DEFAULT '[]',
                following TEXT DEFAULT '[]',
                is_suspended INTEGER DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reels (
                id TEXT PRIMARY KEY,
                user TEXT NOT NULL,
                video_url TEXT NOT NULL,
                thumbnail_url TEXT DEFAULT '',
                caption TEXT DEFAULT '',
                duration REAL DEFAULT 0,
                music TEXT,
                status TEXT DEFAULT 'Published',
                likes TEXT DEFAULT '[]',
                shares TEXT DEFAULT '[]',
                created_at TEXT NOT NULL,
                FOREIGN KEY (user) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                user TEXT NOT NULL,
                reel TEXT NOT NULL,
                text TEXT NOT NULL,
                likes TEXT DEFAULT '[]',
                parent_comment TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS music (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                artist TEXT DEFAULT '',
                url TEXT NOT NULL,
                duration REAL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS action_logs (
                id TEXT PRIMARY KEY,
                user TEXT NOT NULL,
                action TEXT NOT NULL,
                target_type TEXT NOT NULL,
                target_id TEXT NOT NULL,
                device TEXT DEFAULT '',
                ip TEXT DEFAULT '',
                country TEXT DEFAULT '',
                city TEXT DEFAULT '',
                pincode TEXT DEFAULT '',
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_reels_status ON reels(status);
            CREATE INDEX IF NOT EXISTS idx_comments_reel ON comments(reel);
            CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_comment);
            CREATE INDEX IF NOT EXISTS idx_action_logs_user ON action_logs(user);
            "#,
        )?;
        Ok(())
    }

    // ==================== User Operations ====================

    pub fn create_user(&self, user: &mut User) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        user.id = Uuid::new_v4().to_string();
        user.created_at = Utc::now();

        let followers_json = serde_json::to_string(&user.followers)?;
        let following_json = serde_json::to_string(&user.following)?;

        conn.execute(
            r#"INSERT INTO users (id, username, mobile, email, password_hash, profile_picture,
                bio, followers, following, is_suspended, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
            params![
                &user.id,
                &user.username,
                &user.mobile,
                &user.email,
                &user.password_hash,
                &user.profile_picture,
                &user.bio,
                &followers_json,
                &following_json,
                user.is_suspended,
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT * FROM users WHERE id = ?1", params![id], |row| {
            self.row_to_user(row)
        })
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("User {}", id)),
            _ => StoreError::Database(e),
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM users WHERE email = ?1",
            params![email],
            |row| self.row_to_user(row),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                StoreError::NotFound(format!("User {}", email))
            }
            _ => StoreError::Database(e),
        })
    }

    pub fn list_users(&self) -> StoreResult<Vec<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM users ORDER BY created_at DESC")?;
        let rows = stmt.query_map([], |row| self.row_to_user(row))?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    /// Persist all mutable fields of a user, the follow lists included.
    /// Whole-document save; the graph mutator issues one of these per side.
    pub fn update_user(&self, user: &User) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let followers_json = serde_json::to_string(&user.followers)?;
        let following_json = serde_json::to_string(&user.following)?;

        let rows = conn.execute(
            r#"UPDATE users SET username = ?1, mobile = ?2, email = ?3, password_hash = ?4,
               profile_picture = ?5, bio = ?6, followers = ?7, following = ?8, is_suspended = ?9
               WHERE id = ?10"#,
            params![
                &user.username,
                &user.mobile,
                &user.email,
                &user.password_hash,
                &user.profile_picture,
                &user.bio,
                &followers_json,
                &following_json,
                user.is_suspended,
                &user.id,
            ],
        )?;

        if rows == 0 {
            return Err(StoreError::NotFound(format!("User {}", user.id)));
        }
        Ok(())
    }

    pub fn delete_user(&self, id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("User {}", id)));
        }
        Ok(())
    }

    fn row_to_user(&self, row: &rusqlite::Row) -> rusqlite::Result<User> {
        let followers_json: String = row.get("followers")?;
        let following_json: String = row.get("following")?;

        Ok(User {
            id: row.get("id")?,
            username: row.get("username")?,
            mobile: row.get("mobile")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            profile_picture: row.get("profile_picture")?,
            bio: row.get("bio")?,
            followers: serde_json::from_str(&followers_json).unwrap_or_default(),
            following: serde_json::from_str(&following_json).unwrap_or_default(),
            is_suspended: row.get("is_suspended")?,
            created_at: parse_datetime(row.get::<_, String>("created_at")?),
        })
    }

    // ==================== Reel Operations ====================

    pub fn create_reel(&self, reel: &mut Reel) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        reel.id = Uuid::new_v4().to_string();
        reel.created_at = Utc::now();
        if reel.status.is_empty() {
            reel.status = "Published".to_string();
        }

        let likes_json = serde_json::to_string(&reel.likes)?;
        let shares_json = serde_json::to_string(&reel.shares)?;

        conn.execute(
            r#"INSERT INTO reels (id, user, video_url, thumbnail_url, caption, duration,
                music, status, likes, shares, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
            params![
                &reel.id,
                &reel.user,
                &reel.video_url,
                &reel.thumbnail_url,
                &reel.caption,
                reel.duration,
                &reel.music,
                &reel.status,
                &likes_json,
                &shares_json,
                reel.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_reel(&self, id: &str) -> StoreResult<Reel> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT * FROM reels WHERE id = ?1", params![id], |row| {
            self.row_to_reel(row)
        })
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("Reel {}", id)),
            _ => StoreError::Database(e),
        })
    }

    pub fn list_reels(&self) -> StoreResult<Vec<Reel>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM reels ORDER BY created_at DESC")?;
        let rows = stmt.query_map([], |row| self.row_to_reel(row))?;

        let mut reels = Vec::new();
        for row in rows {
            reels.push(row?);
        }
        Ok(reels)
    }

    pub fn update_reel(&self, reel: &Reel) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let likes_json = serde_json::to_string(&reel.likes)?;
        let shares_json = serde_json::to_string(&reel.shares)?;

        let rows = conn.execute(
            r#"UPDATE reels SET video_url = ?1, thumbnail_url = ?2, caption = ?3, duration = ?4,
               music = ?5, status = ?6, likes = ?7, shares = ?8 WHERE id = ?9"#,
            params![
                &reel.video_url,
                &reel.thumbnail_url,
                &reel.caption,
                reel.duration,
                &reel.music,
                &reel.status,
                &likes_json,
                &shares_json,
                &reel.id,
            ],
        )?;

        if rows == 0 {
            return Err(StoreError::NotFound(format!("Reel {}", reel.id)));
        }
        Ok(())
    }

    /// Hard delete. Comments on the reel are left in place.
    pub fn delete_reel(&self, id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute("DELETE FROM reels WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("Reel {}", id)));
        }
        Ok(())
    }

    pub fn count_reels_by_status(&self, status: &str) -> StoreResult<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM reels WHERE status = ?1",
            params![status],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Uniform random sample, without replacement, of published reels.
    pub fn sample_published(&self, limit: i64) -> StoreResult<Vec<Reel>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM reels WHERE status = 'Published' ORDER BY RANDOM() LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| self.row_to_reel(row))?;

        let mut reels = Vec::new();
        for row in rows {
            reels.push(row?);
        }
        Ok(reels)
    }

    fn row_to_reel(&self, row: &rusqlite::Row) -> rusqlite::Result<Reel> {
        let likes_json: String = row.get("likes")?;
        let shares_json: String = row.get("shares")?;

        Ok(Reel {
            id: row.get("id")?,
            user: row.get("user")?,
            video_url: row.get("video_url")?,
            thumbnail_url: row.get("thumbnail_url")?,
            caption: row.get("caption")?,
            duration: row.get("duration")?,
            music: row.get("music")?,
            status: row.get("status")?,
            likes: serde_json::from_str(&likes_json).unwrap_or_default(),
            shares: serde_json::from_str(&shares_json).unwrap_or_default(),
            created_at: parse_datetime(row.get::<_, String>("created_at")?),
        })
    }

    // ==================== Comment Operations ====================

    pub fn create_comment(&self, comment: &mut Comment) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        comment.id = Uuid::new_v4().to_string();
        comment.created_at = Utc::now();

        let likes_json = serde_json::to_string(&comment.likes)?;

        conn.execute(
            r#"INSERT INTO comments (id, user, reel, text, likes, parent_comment, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                &comment.id,
                &comment.user,
                &comment.reel,
                &comment.text,
                &likes_json,
                &comment.parent_comment,
                comment.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_comment(&self, id: &str) -> StoreResult<Comment> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM comments WHERE id = ?1",
            params![id],
            |row| self.row_to_comment(row),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                StoreError::NotFound(format!("Comment {}", id))
            }
            _ => StoreError::Database(e),
        })
    }

    pub fn list_comments(&self) -> StoreResult<Vec<Comment>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM comments ORDER BY created_at DESC")?;
        let rows = stmt.query_map([], |row| self.row_to_comment(row))?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    pub fn update_comment(&self, comment: &Comment) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let likes_json = serde_json::to_string(&comment.likes)?;

        let rows = conn.execute(
            "UPDATE comments SET text = ?1, likes = ?2 WHERE id = ?3",
            params![&comment.text, &likes_json, &comment.id],
        )?;

        if rows == 0 {
            return Err(StoreError::NotFound(format!("Comment {}", comment.id)));
        }
        Ok(())
    }

    /// Delete a comment and its direct replies. Two independent deletes,
    /// replies first; deeper descendants are not followed.
    pub fn delete_comment_cascade(&self, id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM comments WHERE parent_comment = ?1",
            params![id],
        )?;
        conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Top-level comments for a reel, newest first.
    pub fn list_top_level_comments(&self, reel_id: &str) -> StoreResult<Vec<Comment>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"SELECT * FROM comments WHERE reel = ?1 AND parent_comment IS NULL
               ORDER BY created_at DESC"#,
        )?;
        let rows = stmt.query_map(params![reel_id], |row| self.row_to_comment(row))?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    /// Direct replies to a comment, oldest first.
    pub fn list_replies(&self, parent_id: &str) -> StoreResult<Vec<Comment>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM comments WHERE parent_comment = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![parent_id], |row| self.row_to_comment(row))?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    fn row_to_comment(&self, row: &rusqlite::Row) -> rusqlite::Result<Comment> {
        let likes_json: String = row.get("likes")?;

        Ok(Comment {
            id: row.get("id")?,
            user: row.get("user")?,
            reel: row.get("reel")?,
            text: row.get("text")?,
            likes: serde_json::from_str(&likes_json).unwrap_or_default(),
            parent_comment: row.get("parent_comment")?,
            created_at: parse_datetime(row.get::<_, String>("created_at")?),
        })
    }

    // ==================== Music Operations ====================

    pub fn create_music(&self, music: &mut Music) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        music.id = Uuid::new_v4().to_string();
        music.created_at = Utc::now();

        conn.execute(
            r#"INSERT INTO music (id, title, artist, url, duration, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                &music.id,
                &music.title,
                &music.artist,
                &music.url,
                music.duration,
                music.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_music(&self, id: &str) -> StoreResult<Music> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT * FROM music WHERE id = ?1", params![id], |row| {
            Ok(Music {
                id: row.get("id")?,
                title: row.get("title")?,
                artist: row.get("artist")?,
                url: row.get("url")?,
                duration: row.get("duration")?,
                created_at: parse_datetime(row.get::<_, String>("created_at")?),
            })
        })
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("Music {}", id)),
            _ => StoreError::Database(e),
        })
    }

    pub fn list_music(&self) -> StoreResult<Vec<Music>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM music ORDER BY created_at DESC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Music {
                id: row.get("id")?,
                title: row.get("title")?,
                artist: row.get("artist")?,
                url: row.get("url")?,
                duration: row.get("duration")?,
                created_at: parse_datetime(row.get::<_, String>("created_at")?),
            })
        })?;

        let mut tracks = Vec::new();
        for row in rows {
            tracks.push(row?);
        }
        Ok(tracks)
    }

    pub fn delete_music(&self, id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute("DELETE FROM music WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("Music {}", id)));
        }
        Ok(())
    }

    // ==================== Action Log Operations ====================

    pub fn create_action_log(&self, entry: &mut ActionLog) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        entry.id = Uuid::new_v4().to_string();
        entry.created_at = Utc::now();

        conn.execute(
            r#"INSERT INTO action_logs (id, user, action, target_type, target_id, device,
                ip, country, city, pincode, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
            params![
                &entry.id,
                &entry.user,
                &entry.action,
                &entry.target_type,
                &entry.target_id,
                &entry.device,
                &entry.location.ip,
                &entry.location.country,
                &entry.location.city,
                &entry.location.pincode,
                entry.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn count_action_logs(&self, user_id: &str) -> StoreResult<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM action_logs WHERE user = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
