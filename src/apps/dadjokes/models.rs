use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// A contributed item: a joke's text or a picture's URL, plus who sent it.
///
/// Both tables share the same shape, so the store functions below are written
/// once against this trait.
pub trait Contribution: Sized {
    const TABLE: &'static str;
    /// Column holding the main content (`text` or `image_url`).
    const BODY: &'static str;
    const LABEL: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Joke {
    pub id: i64,
    pub text: String,
    pub contributor: String,
    pub timestamp: DateTime<Utc>,
}

impl Contribution for Joke {
    const TABLE: &'static str = "jokes";
    const BODY: &'static str = "text";
    const LABEL: &'static str = "Joke";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            contributor: row.get(2)?,
            timestamp: row.get(3)?,
        })
    }
}

impl std::fmt::Display for Joke {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}'s Joke", self.contributor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Picture {
    pub id: i64,
    pub image_url: String,
    pub contributor: String,
    pub timestamp: DateTime<Utc>,
}

impl Contribution for Picture {
    const TABLE: &'static str = "pictures";
    const BODY: &'static str = "image_url";
    const LABEL: &'static str = "Picture";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            image_url: row.get(1)?,
            contributor: row.get(2)?,
            timestamp: row.get(3)?,
        })
    }
}

impl std::fmt::Display for Picture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}'s Photo", self.contributor)
    }
}

/// Store-level write for either kind. Absent fields keep their stored value
/// (or stay blank on create).
#[derive(Debug, Default, Clone)]
#[cfg_attr(test, derive(Deserialize))]
pub struct ContributionInput {
    pub body: Option<String>,
    pub contributor: Option<String>,
}

/// JSON body accepted by the joke endpoints.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JokeInput {
    pub text: Option<String>,
    pub contributor: Option<String>,
}

impl From<JokeInput> for ContributionInput {
    fn from(input: JokeInput) -> Self {
        Self {
            body: input.text,
            contributor: input.contributor,
        }
    }
}

/// JSON body accepted by the picture endpoints.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PictureInput {
    pub image_url: Option<String>,
    pub contributor: Option<String>,
}

impl From<PictureInput> for ContributionInput {
    fn from(input: PictureInput) -> Self {
        Self {
            body: input.image_url,
            contributor: input.contributor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Id,
    NewestFirst,
}

fn select_sql<T: Contribution>() -> String {
    format!(
        "SELECT id, {}, contributor, timestamp FROM {}",
        T::BODY,
        T::TABLE
    )
}

pub fn all<T: Contribution>(conn: &Connection, order: Order) -> Result<Vec<T>> {
    let order_by = match order {
        Order::Id => "id",
        Order::NewestFirst => "timestamp DESC, id DESC",
    };
    let mut stmt = conn.prepare(&format!("{} ORDER BY {order_by}", select_sql::<T>()))?;
    let rows = stmt.query_map([], |row| T::from_row(row))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get<T: Contribution>(conn: &Connection, id: i64) -> Result<Option<T>> {
    let item = conn
        .query_row(
            &format!("{} WHERE id = ?1", select_sql::<T>()),
            params![id],
            |row| T::from_row(row),
        )
        .optional()?;
    Ok(item)
}

pub fn create<T: Contribution>(conn: &Connection, input: ContributionInput) -> Result<T> {
    conn.execute(
        &format!(
            "INSERT INTO {} ({}, contributor, timestamp) VALUES (?1, ?2, ?3)",
            T::TABLE,
            T::BODY
        ),
        params![
            input.body.unwrap_or_default(),
            input.contributor.unwrap_or_default(),
            Utc::now()
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!("Created {} {}", T::LABEL, id);
    get(conn, id)?.ok_or(crate::error::AppError::NotFound(T::LABEL))
}

/// Apply the present fields of `input` and refresh the timestamp.
pub fn update<T: Contribution>(
    conn: &Connection,
    id: i64,
    input: ContributionInput,
) -> Result<Option<T>> {
    let changed = conn.execute(
        &format!(
            "UPDATE {} SET {body} = COALESCE(?1, {body}), contributor = COALESCE(?2, contributor), timestamp = ?3 WHERE id = ?4",
            T::TABLE,
            body = T::BODY
        ),
        params![input.body, input.contributor, Utc::now(), id],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    get(conn, id)
}

pub fn delete<T: Contribution>(conn: &Connection, id: i64) -> Result<bool> {
    let removed = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", T::TABLE),
        params![id],
    )?;
    Ok(removed > 0)
}

pub fn random<T: Contribution, R: Rng>(conn: &Connection, rng: &mut R) -> Result<Option<T>> {
    let mut items = all::<T>(conn, Order::Id)?;
    if items.is_empty() {
        return Ok(None);
    }
    let index = rng.gen_range(0..items.len());
    Ok(Some(items.swap_remove(index)))
}
