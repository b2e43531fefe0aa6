use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::MOUNT;
use crate::error::{AppError, Result};

/// Uploaded image files are served from here.
pub const MEDIA_URL: &str = "/media/";

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub profile_image_url: String,
    pub bio_text: String,
    pub join_date: NaiveDate,
}

impl Profile {
    const COLUMNS: &'static str =
        "p.id, p.username, p.display_name, p.profile_image_url, p.bio_text, p.join_date";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            display_name: row.get(2)?,
            profile_image_url: row.get(3)?,
            bio_text: row.get(4)?,
            join_date: row.get(5)?,
        })
    }

    pub fn url(&self) -> String {
        profile_url(self.id)
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.username)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub profile_id: i64,
    pub caption: String,
    pub timestamp: DateTime<Utc>,
}

impl Post {
    const COLUMNS: &'static str = "po.id, po.profile_id, po.caption, po.timestamp";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            profile_id: row.get(1)?,
            caption: row.get(2)?,
            timestamp: row.get(3)?,
        })
    }

    pub fn url(&self) -> String {
        post_url(self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub id: i64,
    pub post_id: i64,
    pub image_url: String,
    pub image_file: String,
    pub timestamp: DateTime<Utc>,
}

impl Photo {
    /// An uploaded file wins over a linked URL.
    pub fn display_url(&self) -> String {
        if self.image_file.is_empty() {
            self.image_url.clone()
        } else {
            format!("{MEDIA_URL}{}", self.image_file)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author: Profile,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub display_name: String,
    pub profile_image_url: String,
    pub bio_text: String,
}

pub fn profile_url(id: i64) -> String {
    format!("{MOUNT}/profile/{id}/")
}

pub fn post_url(id: i64) -> String {
    format!("{MOUNT}/post/{id}/")
}

// Profiles

pub fn all_profiles(conn: &Connection) -> Result<Vec<Profile>> {
    query_profiles(conn, "", params![])
}

pub fn get_profile(conn: &Connection, id: i64) -> Result<Option<Profile>> {
    let sql = format!("SELECT {} FROM insta_profiles p WHERE p.id = ?1", Profile::COLUMNS);
    Ok(conn.query_row(&sql, params![id], Profile::from_row).optional()?)
}

pub fn require_profile(conn: &Connection, id: i64) -> Result<Profile> {
    get_profile(conn, id)?.ok_or(AppError::NotFound("Profile"))
}

pub fn create_profile(
    conn: &Connection,
    username: &str,
    display_name: &str,
    bio_text: &str,
) -> Result<Profile> {
    if username.trim().is_empty() {
        return Err(AppError::invalid("username", "This field is required."));
    }
    conn.execute(
        "INSERT INTO insta_profiles (username, display_name, bio_text, join_date) VALUES (?1, ?2, ?3, ?4)",
        params![username, display_name, bio_text, Utc::now().date_naive()],
    )?;
    let id = conn.last_insert_rowid();
    info!("Created profile {} ({})", username, id);
    require_profile(conn, id)
}

pub fn update_profile(conn: &Connection, id: i64, changes: &ProfileChanges) -> Result<Profile> {
    let changed = conn.execute(
        "UPDATE insta_profiles SET display_name = ?1, profile_image_url = ?2, bio_text = ?3 WHERE id = ?4",
        params![changes.display_name, changes.profile_image_url, changes.bio_text, id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound("Profile"));
    }
    require_profile(conn, id)
}

fn query_profiles(
    conn: &Connection,
    tail: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Profile>> {
    let sql = format!("SELECT {} FROM insta_profiles p {tail}", Profile::COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, Profile::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// Posts

fn query_posts(conn: &Connection, tail: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Post>> {
    let sql = format!("SELECT {} FROM insta_posts po {tail}", Post::COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, Post::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn posts_by_profile(conn: &Connection, profile_id: i64) -> Result<Vec<Post>> {
    query_posts(
        conn,
        "WHERE po.profile_id = ?1 ORDER BY po.timestamp DESC, po.id DESC",
        params![profile_id],
    )
}

pub fn get_post(conn: &Connection, id: i64) -> Result<Option<Post>> {
    Ok(query_posts(conn, "WHERE po.id = ?1", params![id])?.into_iter().next())
}

pub fn require_post(conn: &Connection, id: i64) -> Result<Post> {
    get_post(conn, id)?.ok_or(AppError::NotFound("Post"))
}

/// Create a post, attaching a photo when an image URL was supplied.
pub fn create_post(
    conn: &mut Connection,
    profile_id: i64,
    caption: &str,
    image_url: Option<&str>,
) -> Result<Post> {
    let tx = conn.transaction()?;
    let now = Utc::now();
    tx.execute(
        "INSERT INTO insta_posts (profile_id, caption, timestamp) VALUES (?1, ?2, ?3)",
        params![profile_id, caption, now],
    )?;
    let post_id = tx.last_insert_rowid();
    if let Some(url) = image_url.map(str::trim).filter(|u| !u.is_empty()) {
        tx.execute(
            "INSERT INTO insta_photos (post_id, image_url, timestamp) VALUES (?1, ?2, ?3)",
            params![post_id, url, now],
        )?;
    }
    tx.commit()?;
    debug!("Created post {} for profile {}", post_id, profile_id);
    require_post(conn, post_id)
}

pub fn update_post_caption(conn: &Connection, id: i64, caption: &str) -> Result<Post> {
    let changed = conn.execute(
        "UPDATE insta_posts SET caption = ?1 WHERE id = ?2",
        params![caption, id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound("Post"));
    }
    require_post(conn, id)
}

/// Photos, comments and likes go with the post.
pub fn delete_post(conn: &Connection, id: i64) -> Result<bool> {
    let removed = conn.execute("DELETE FROM insta_posts WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}

pub fn photos_for_post(conn: &Connection, post_id: i64) -> Result<Vec<Photo>> {
    let mut stmt = conn.prepare(
        "SELECT id, post_id, image_url, image_file, timestamp FROM insta_photos
         WHERE post_id = ?1 ORDER BY timestamp, id",
    )?;
    let rows = stmt.query_map(params![post_id], |row| {
        Ok(Photo {
            id: row.get(0)?,
            post_id: row.get(1)?,
            image_url: row.get(2)?,
            image_file: row.get(3)?,
            timestamp: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// Comments

pub fn comments_for_post(conn: &Connection, post_id: i64) -> Result<Vec<Comment>> {
    let sql = format!(
        "SELECT c.id, c.post_id, c.text, c.timestamp, {} FROM insta_comments c
         JOIN insta_profiles p ON p.id = c.profile_id
         WHERE c.post_id = ?1 ORDER BY c.timestamp, c.id",
        Profile::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![post_id], |row| {
        let author = Profile {
            id: row.get(4)?,
            username: row.get(5)?,
            display_name: row.get(6)?,
            profile_image_url: row.get(7)?,
            bio_text: row.get(8)?,
            join_date: row.get(9)?,
        };
        Ok(Comment {
            id: row.get(0)?,
            post_id: row.get(1)?,
            text: row.get(2)?,
            timestamp: row.get(3)?,
            author,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn add_comment(conn: &Connection, post_id: i64, profile_id: i64, text: &str) -> Result<i64> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::invalid("text", "This field is required."));
    }
    conn.execute(
        "INSERT INTO insta_comments (post_id, profile_id, text, timestamp) VALUES (?1, ?2, ?3, ?4)",
        params![post_id, profile_id, text, Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

// Likes

/// Profiles that liked the post.
pub fn likes_for_post(conn: &Connection, post_id: i64) -> Result<Vec<Profile>> {
    query_profiles(
        conn,
        "JOIN insta_likes l ON l.profile_id = p.id WHERE l.post_id = ?1 ORDER BY l.timestamp, l.id",
        params![post_id],
    )
}

pub fn has_liked(conn: &Connection, profile_id: i64, post_id: i64) -> Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM insta_likes WHERE profile_id = ?1 AND post_id = ?2",
            params![profile_id, post_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

/// Returns false when the like already existed.
pub fn like(conn: &Connection, profile_id: i64, post: &Post) -> Result<bool> {
    if post.profile_id == profile_id {
        return Err(AppError::BadRequest("You cannot like your own post".into()));
    }
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO insta_likes (post_id, profile_id, timestamp) VALUES (?1, ?2, ?3)",
        params![post.id, profile_id, Utc::now()],
    )?;
    Ok(inserted > 0)
}

pub fn unlike(conn: &Connection, profile_id: i64, post_id: i64) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM insta_likes WHERE profile_id = ?1 AND post_id = ?2",
        params![profile_id, post_id],
    )?;
    Ok(removed > 0)
}

// Follows

/// Profiles following `profile_id`.
pub fn followers(conn: &Connection, profile_id: i64) -> Result<Vec<Profile>> {
    query_profiles(
        conn,
        "JOIN insta_follows f ON f.follower_profile_id = p.id WHERE f.profile_id = ?1 ORDER BY f.id",
        params![profile_id],
    )
}

/// Profiles that `profile_id` follows.
pub fn following(conn: &Connection, profile_id: i64) -> Result<Vec<Profile>> {
    query_profiles(
        conn,
        "JOIN insta_follows f ON f.profile_id = p.id WHERE f.follower_profile_id = ?1 ORDER BY f.id",
        params![profile_id],
    )
}

pub fn num_followers(conn: &Connection, profile_id: i64) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM insta_follows WHERE profile_id = ?1",
        params![profile_id],
        |row| row.get(0),
    )?)
}

pub fn num_following(conn: &Connection, profile_id: i64) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM insta_follows WHERE follower_profile_id = ?1",
        params![profile_id],
        |row| row.get(0),
    )?)
}

pub fn is_following(conn: &Connection, follower_id: i64, profile_id: i64) -> Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM insta_follows WHERE follower_profile_id = ?1 AND profile_id = ?2",
            params![follower_id, profile_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

/// Returns false when the follow edge already existed.
pub fn follow(conn: &Connection, follower_id: i64, profile_id: i64) -> Result<bool> {
    if follower_id == profile_id {
        return Err(AppError::BadRequest("You cannot follow yourself".into()));
    }
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO insta_follows (profile_id, follower_profile_id, timestamp) VALUES (?1, ?2, ?3)",
        params![profile_id, follower_id, Utc::now().date_naive()],
    )?;
    Ok(inserted > 0)
}

pub fn unfollow(conn: &Connection, follower_id: i64, profile_id: i64) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM insta_follows WHERE follower_profile_id = ?1 AND profile_id = ?2",
        params![follower_id, profile_id],
    )?;
    Ok(removed > 0)
}

/// Posts by every profile `profile_id` follows, newest first.
pub fn post_feed(conn: &Connection, profile_id: i64) -> Result<Vec<Post>> {
    query_posts(
        conn,
        "JOIN insta_follows f ON f.profile_id = po.profile_id
         WHERE f.follower_profile_id = ?1
         ORDER BY po.timestamp DESC, po.id DESC",
        params![profile_id],
    )
}

// Search

pub fn search_profiles(conn: &Connection, query: &str) -> Result<Vec<Profile>> {
    let pattern = like_pattern(query);
    query_profiles(
        conn,
        "WHERE p.username LIKE ?1 ESCAPE '\\' OR p.display_name LIKE ?1 ESCAPE '\\' OR p.bio_text LIKE ?1 ESCAPE '\\'
         ORDER BY p.username",
        params![pattern],
    )
}

pub fn search_posts(conn: &Connection, query: &str) -> Result<Vec<Post>> {
    let pattern = like_pattern(query);
    query_posts(
        conn,
        "WHERE po.caption LIKE ?1 ESCAPE '\\' ORDER BY po.timestamp DESC, po.id DESC",
        params![pattern],
    )
}

/// Case-insensitive substring pattern with LIKE wildcards escaped.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
