use crate::error::{AppError, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

const MIGRATIONS: &[(&str, &str)] = &[
    ("001_dadjokes", include_str!("../migrations/001_dadjokes.sql")),
    ("002_mini_insta", include_str!("../migrations/002_mini_insta.sql")),
    ("003_runtracker", include_str!("../migrations/003_runtracker.sql")),
    ("004_voter_analytics", include_str!("../migrations/004_voter_analytics.sql")),
];

/// Tables in child-to-parent order, so deletes never trip a foreign key.
const TABLES: &[&str] = &[
    "jokes",
    "pictures",
    "insta_likes",
    "insta_comments",
    "insta_follows",
    "insta_photos",
    "insta_posts",
    "insta_profiles",
    "badge_awards",
    "group_memberships",
    "run_groups",
    "runs",
    "user_profiles",
    "auth_tokens",
    "users",
    "voters",
];

/// Shared handle to the application's SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and bring its schema up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Lock the connection for the duration of one unit of work.
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| AppError::LockPoisoned)
    }

    /// Remove every row from every application table.
    pub fn clear_all_data(&self) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for table in TABLES {
            tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        tx.commit()?;
        // Badge definitions are reference data, not user data.
        run_migrations(&conn)?;
        info!("Cleared all data from database");
        Ok(())
    }
}

fn run_migrations(conn: &Connection) -> Result<()> {
    for (name, sql) in MIGRATIONS {
        conn.execute_batch(sql)?;
        tracing::debug!("Applied migration {}", name);
    }
    Ok(())
}
