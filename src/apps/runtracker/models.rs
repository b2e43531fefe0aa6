use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::auth;
use super::badges::BadgeType;
use super::geo::{geodesic_distance, Coordinate};
use crate::error::{AppError, FieldErrors, Result};

// Users and tokens

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    const COLUMNS: &'static str = "u.id, u.username, u.email, u.date_joined";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            date_joined: row.get(3)?,
        })
    }
}

/// How a user appears nested inside other objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users u WHERE u.id = ?1", User::COLUMNS);
    Ok(conn.query_row(&sql, params![id], User::from_row).optional()?)
}

pub fn find_user(conn: &Connection, username: &str) -> Result<Option<User>> {
    let username = username.trim();
    let sql = format!("SELECT {} FROM users u WHERE u.username = ?1", User::COLUMNS);
    Ok(conn.query_row(&sql, params![username], User::from_row).optional()?)
}

/// Creates the user together with an empty run profile.
pub fn create_user(conn: &mut Connection, username: &str, password: &str, email: &str) -> Result<User> {
    let username = username.trim();
    let mut errors = FieldErrors::new();
    if username.is_empty() {
        errors.entry("username".into()).or_default().push("This field is required.".into());
    }
    if password.is_empty() {
        errors.entry("password".into()).or_default().push("This field is required.".into());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    if find_user(conn, username)?.is_some() {
        return Err(AppError::BadRequest("Username already exists".into()));
    }

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO users (username, email, password_hash, date_joined) VALUES (?1, ?2, ?3, ?4)",
        params![username, email, auth::hash_password(password), Utc::now()],
    )?;
    let id = tx.last_insert_rowid();
    ensure_profile(&tx, id)?;
    tx.commit()?;
    info!("Registered runner {} ({})", username, id);
    get_user(conn, id)?.ok_or(AppError::NotFound("User"))
}

pub fn authenticate(conn: &Connection, username: &str, password: &str) -> Result<Option<User>> {
    let username = username.trim();
    let stored: Option<(i64, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE username = ?1",
            params![username],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    match stored {
        Some((id, hash)) if auth::verify_password(password, &hash) => get_user(conn, id),
        _ => Ok(None),
    }
}

pub fn get_or_create_token(conn: &Connection, user_id: i64) -> Result<String> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT key FROM auth_tokens WHERE user_id = ?1",
            params![user_id],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(key) = existing {
        return Ok(key);
    }
    let key = auth::new_token_key();
    conn.execute(
        "INSERT INTO auth_tokens (key, user_id, created) VALUES (?1, ?2, ?3)",
        params![key, user_id, Utc::now()],
    )?;
    Ok(key)
}

pub fn user_for_token(conn: &Connection, key: &str) -> Result<Option<User>> {
    let sql = format!(
        "SELECT {} FROM auth_tokens t JOIN users u ON u.id = t.user_id WHERE t.key = ?1",
        User::COLUMNS
    );
    Ok(conn.query_row(&sql, params![key], User::from_row).optional()?)
}

// Runs

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub id: i64,
    pub user: UserSummary,
    pub distance_km: f64,
    pub duration_seconds: i64,
    pub center_lon: f64,
    pub center_lat: f64,
    pub start_time: DateTime<Utc>,
    pub route_data: Value,
}

impl Run {
    const SELECT: &'static str = "SELECT r.id, r.user_id, u.username, r.distance_km, r.duration_seconds, \
         r.center_lon, r.center_lat, r.start_time, r.route_data \
         FROM runs r JOIN users u ON u.id = r.user_id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user: UserSummary {
                id: row.get(1)?,
                username: row.get(2)?,
            },
            distance_km: row.get(3)?,
            duration_seconds: row.get(4)?,
            center_lon: row.get(5)?,
            center_lat: row.get(6)?,
            start_time: row.get(7)?,
            route_data: row.get(8)?,
        })
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.center_lat, self.center_lon)
    }
}

/// Writable run fields. `user_id` is accepted for compatibility but the
/// owner is always the authenticated caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunInput {
    pub distance_km: Option<f64>,
    pub duration_seconds: Option<i64>,
    pub center_lat: Option<f64>,
    pub center_lon: Option<f64>,
    pub route_data: Option<Value>,
    pub user_id: Option<i64>,
}

struct NewRun {
    distance_km: f64,
    duration_seconds: i64,
    center_lat: f64,
    center_lon: f64,
    route_data: Value,
}

impl RunInput {
    fn validate_new(self) -> Result<NewRun> {
        let mut errors = FieldErrors::new();
        let mut missing = |field: &str| {
            errors
                .entry(field.to_string())
                .or_default()
                .push("This field is required.".into());
        };
        if self.distance_km.is_none() {
            missing("distance_km");
        }
        if self.center_lat.is_none() {
            missing("center_lat");
        }
        if self.center_lon.is_none() {
            missing("center_lon");
        }
        if self.route_data.is_none() {
            missing("route_data");
        }
        self.check_ranges(&mut errors);
        match (self.distance_km, self.center_lat, self.center_lon, self.route_data) {
            (Some(distance_km), Some(center_lat), Some(center_lon), Some(route_data)) if errors.is_empty() => {
                Ok(NewRun {
                    distance_km,
                    duration_seconds: self.duration_seconds.unwrap_or(0),
                    center_lat,
                    center_lon,
                    route_data,
                })
            }
            _ => Err(AppError::Validation(errors)),
        }
    }

    fn check_ranges(&self, errors: &mut FieldErrors) {
        let mut push = |field: &str, msg: &str| {
            errors.entry(field.to_string()).or_default().push(msg.to_string());
        };
        if self.distance_km.is_some_and(|d| !d.is_finite() || d < 0.0) {
            push("distance_km", "Ensure this value is a non-negative number.");
        }
        if self.duration_seconds.is_some_and(|d| d < 0) {
            push("duration_seconds", "Ensure this value is greater than or equal to 0.");
        }
        if self.center_lat.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
            push("center_lat", "Latitude must be between -90 and 90.");
        }
        if self.center_lon.is_some_and(|lon| !(-180.0..=180.0).contains(&lon)) {
            push("center_lon", "Longitude must be between -180 and 180.");
        }
    }
}

pub fn get_run(conn: &Connection, id: i64) -> Result<Option<Run>> {
    let sql = format!("{} WHERE r.id = ?1", Run::SELECT);
    Ok(conn.query_row(&sql, params![id], Run::from_row).optional()?)
}

pub fn require_run(conn: &Connection, id: i64) -> Result<Run> {
    get_run(conn, id)?.ok_or(AppError::NotFound("Run"))
}

/// A user's runs, newest first.
pub fn runs_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Run>> {
    let sql = format!("{} WHERE r.user_id = ?1 ORDER BY r.start_time DESC, r.id DESC", Run::SELECT);
    let mut stmt = conn.prepare(&sql)?;
    let runs = stmt
        .query_map(params![user_id], Run::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(runs)
}

/// Outcome of recording a run.
#[derive(Debug)]
pub struct Recorded {
    pub run: Run,
    pub new_badges: Vec<BadgeType>,
}

/// Saves a run for `user_id` and folds it into the runner's profile.
///
/// The insert, the profile update and any badge awards commit together.
/// `IMMEDIATE` takes SQLite's write lock before the profile row is read.
pub fn record_run(conn: &mut Connection, user_id: i64, input: RunInput) -> Result<Recorded> {
    let new = input.validate_new()?;
    let tx = Transaction::new(conn, TransactionBehavior::Immediate)?;
    tx.execute(
        "INSERT INTO runs (user_id, distance_km, start_time, duration_seconds, center_lat, center_lon, route_data)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user_id,
            new.distance_km,
            Utc::now(),
            new.duration_seconds,
            new.center_lat,
            new.center_lon,
            new.route_data
        ],
    )?;
    let run_id = tx.last_insert_rowid();

    let (total, best) = ensure_profile(&tx, user_id)?;
    let total = total + new.distance_km;
    let best = best.max(new.distance_km);
    tx.execute(
        "UPDATE user_profiles SET total_distance_km = ?1, best_distance_km = ?2 WHERE user_id = ?3",
        params![total, best, user_id],
    )?;
    let new_badges = award_badges(&tx, user_id, best, total)?;
    tx.commit()?;

    if !new_badges.is_empty() {
        info!("User {} earned {:?}", user_id, new_badges);
    }
    Ok(Recorded {
        run: require_run(conn, run_id)?,
        new_badges,
    })
}

/// Applies the present fields of `input`; absent fields keep their values.
pub fn update_run(conn: &mut Connection, id: i64, input: RunInput) -> Result<Run> {
    let mut errors = FieldErrors::new();
    input.check_ranges(&mut errors);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let run = require_run(conn, id)?;
    let tx = Transaction::new(conn, TransactionBehavior::Immediate)?;
    tx.execute(
        "UPDATE runs SET
            distance_km = COALESCE(?1, distance_km),
            duration_seconds = COALESCE(?2, duration_seconds),
            center_lat = COALESCE(?3, center_lat),
            center_lon = COALESCE(?4, center_lon),
            route_data = COALESCE(?5, route_data)
         WHERE id = ?6",
        params![
            input.distance_km,
            input.duration_seconds,
            input.center_lat,
            input.center_lon,
            input.route_data,
            id
        ],
    )?;
    recompute_profile(&tx, run.user.id)?;
    tx.commit()?;
    require_run(conn, id)
}

pub fn delete_run(conn: &mut Connection, id: i64) -> Result<()> {
    let run = require_run(conn, id)?;
    let tx = Transaction::new(conn, TransactionBehavior::Immediate)?;
    tx.execute("DELETE FROM runs WHERE id = ?1", params![id])?;
    recompute_profile(&tx, run.user.id)?;
    tx.commit()?;
    debug!("Deleted run {}", id);
    Ok(())
}

// Profiles

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileStats {
    pub user: UserSummary,
    pub total_distance_km: f64,
    pub total_runs: i64,
    pub best_distance_km: f64,
}

/// Returns `(total, best)`, inserting a zeroed profile if the user has none.
fn ensure_profile(conn: &Connection, user_id: i64) -> Result<(f64, f64)> {
    conn.execute(
        "INSERT OR IGNORE INTO user_profiles (user_id, total_distance_km, best_distance_km) VALUES (?1, 0.0, 0.0)",
        params![user_id],
    )?;
    Ok(conn.query_row(
        "SELECT total_distance_km, best_distance_km FROM user_profiles WHERE user_id = ?1",
        params![user_id],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?)
}

/// Rebuilds totals from the runs that remain. Badges already earned stay.
fn recompute_profile(conn: &Connection, user_id: i64) -> Result<()> {
    ensure_profile(conn, user_id)?;
    conn.execute(
        "UPDATE user_profiles SET
            total_distance_km = (SELECT COALESCE(SUM(distance_km), 0.0) FROM runs WHERE user_id = ?1),
            best_distance_km = (SELECT COALESCE(MAX(distance_km), 0.0) FROM runs WHERE user_id = ?1)
         WHERE user_id = ?1",
        params![user_id],
    )?;
    Ok(())
}

pub fn profile_stats(conn: &Connection, user_id: i64) -> Result<Option<ProfileStats>> {
    Ok(conn
        .query_row(
            "SELECT u.id, u.username, p.total_distance_km, p.best_distance_km,
                    (SELECT COUNT(*) FROM runs WHERE user_id = u.id)
             FROM user_profiles p JOIN users u ON u.id = p.user_id
             WHERE u.id = ?1",
            params![user_id],
            |r| {
                Ok(ProfileStats {
                    user: UserSummary {
                        id: r.get(0)?,
                        username: r.get(1)?,
                    },
                    total_distance_km: r.get(2)?,
                    best_distance_km: r.get(3)?,
                    total_runs: r.get(4)?,
                })
            },
        )
        .optional()?)
}

// Proximity

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyRun {
    pub id: i64,
    pub user: String,
    pub distance_from_center_m: f64,
    pub run_distance: f64,
    pub run_time: i64,
}

/// Every other run whose center lies within `threshold_m` of run `run_id`'s center.
pub fn nearby_runs(conn: &Connection, run_id: i64, threshold_m: f64) -> Result<Vec<NearbyRun>> {
    let target = require_run(conn, run_id)?;
    let origin = target.center();

    let mut stmt = conn.prepare(
        "SELECT r.id, u.username, r.center_lat, r.center_lon, r.distance_km, r.duration_seconds
         FROM runs r JOIN users u ON u.id = r.user_id
         WHERE r.id != ?1
         ORDER BY r.start_time DESC, r.id DESC",
    )?;
    let rows = stmt.query_map(params![run_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            Coordinate::new(r.get(2)?, r.get(3)?),
            r.get::<_, f64>(4)?,
            r.get::<_, i64>(5)?,
        ))
    })?;

    let mut nearby = Vec::new();
    for row in rows {
        let (id, user, center, run_distance, run_time) = row?;
        let meters = geodesic_distance(origin, center);
        if meters <= threshold_m {
            nearby.push(NearbyRun {
                id,
                user,
                distance_from_center_m: (meters * 100.0).round() / 100.0,
                run_distance,
                run_time,
            });
        }
    }
    Ok(nearby)
}

// Badges

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub id: i64,
    pub badge_type: String,
    pub name: String,
    pub description: String,
    pub criteria_km: f64,
    pub earned_by: Vec<i64>,
}

fn badge_from_parts(conn: &Connection, id: i64, code: String) -> Result<Badge> {
    let kind: BadgeType = code.parse()?;
    let mut stmt =
        conn.prepare("SELECT user_id FROM badge_awards WHERE badge_id = ?1 ORDER BY user_id")?;
    let earned_by = stmt
        .query_map(params![id], |r| r.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(Badge {
        id,
        badge_type: code,
        name: kind.name(),
        description: kind.description(),
        criteria_km: kind.criteria_km(),
        earned_by,
    })
}

pub fn all_badges(conn: &Connection) -> Result<Vec<Badge>> {
    let mut stmt = conn.prepare("SELECT id, badge_type FROM badges ORDER BY id")?;
    let rows = stmt
        .query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter()
        .map(|(id, code)| badge_from_parts(conn, id, code))
        .collect()
}

pub fn get_badge(conn: &Connection, id: i64) -> Result<Option<Badge>> {
    let code: Option<String> = conn
        .query_row("SELECT badge_type FROM badges WHERE id = ?1", params![id], |r| r.get(0))
        .optional()?;
    code.map(|code| badge_from_parts(conn, id, code)).transpose()
}

/// Awards every badge the totals qualify for; returns the ones that are new.
pub fn award_badges(conn: &Connection, user_id: i64, best: f64, total: f64) -> Result<Vec<BadgeType>> {
    let mut awarded = Vec::new();
    for badge in BadgeType::earned(best, total) {
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO badge_awards (badge_id, user_id)
             SELECT id, ?2 FROM badges WHERE badge_type = ?1",
            params![badge.code(), user_id],
        )?;
        if inserted > 0 {
            awarded.push(badge);
        }
    }
    Ok(awarded)
}

#[cfg(test)]
pub(crate) fn badges_for_user(conn: &Connection, user_id: i64) -> Result<Vec<BadgeType>> {
    let mut stmt = conn.prepare(
        "SELECT b.badge_type FROM badge_awards a JOIN badges b ON b.id = a.badge_id
         WHERE a.user_id = ?1 ORDER BY b.id",
    )?;
    let codes = stmt
        .query_map(params![user_id], |r| r.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    codes.iter().map(|c| c.parse()).collect()
}

// Groups

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub creator: Option<i64>,
    /// Relative to the requesting user.
    pub is_creator: bool,
    pub is_member: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

const GROUP_NAME_MAX: usize = 100;

impl GroupInput {
    fn validate(&self, partial: bool) -> Result<()> {
        let mut errors = FieldErrors::new();
        for (field, value) in [("name", &self.name), ("description", &self.description)] {
            match value.as_deref().map(str::trim) {
                None if partial => {}
                None => errors
                    .entry(field.into())
                    .or_default()
                    .push("This field is required.".into()),
                Some("") => errors
                    .entry(field.into())
                    .or_default()
                    .push("This field may not be blank.".into()),
                Some(_) => {}
            }
        }
        if self.name.as_ref().is_some_and(|n| n.chars().count() > GROUP_NAME_MAX) {
            errors
                .entry("name".into())
                .or_default()
                .push(format!("Ensure this field has no more than {GROUP_NAME_MAX} characters."));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

const GROUP_SELECT: &str = "SELECT g.id, g.name, g.description, g.created_at, g.creator_id,
        EXISTS (SELECT 1 FROM group_memberships m WHERE m.group_id = g.id AND m.user_id = ?1)
     FROM run_groups g";

fn group_from_row(row: &Row<'_>, viewer: Option<i64>) -> rusqlite::Result<Group> {
    let creator: Option<i64> = row.get(4)?;
    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        is_creator: viewer.is_some() && creator == viewer,
        creator,
        is_member: row.get(5)?,
    })
}

pub fn all_groups(conn: &Connection, viewer: Option<i64>) -> Result<Vec<Group>> {
    let sql = format!("{GROUP_SELECT} ORDER BY g.id");
    let mut stmt = conn.prepare(&sql)?;
    let groups = stmt
        .query_map(params![viewer], |r| group_from_row(r, viewer))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(groups)
}

pub fn get_group(conn: &Connection, id: i64, viewer: Option<i64>) -> Result<Option<Group>> {
    let sql = format!("{GROUP_SELECT} WHERE g.id = ?2");
    Ok(conn
        .query_row(&sql, params![viewer, id], |r| group_from_row(r, viewer))
        .optional()?)
}

pub fn require_group(conn: &Connection, id: i64, viewer: Option<i64>) -> Result<Group> {
    get_group(conn, id, viewer)?.ok_or(AppError::NotFound("Group"))
}

/// Creates the group and enrolls its creator as the first member.
pub fn create_group(conn: &mut Connection, creator_id: i64, input: &GroupInput) -> Result<Group> {
    input.validate(false)?;
    let tx = conn.transaction()?;
    let now = Utc::now();
    tx.execute(
        "INSERT INTO run_groups (name, description, created_at, creator_id) VALUES (?1, ?2, ?3, ?4)",
        params![input.name, input.description, now, creator_id],
    )?;
    let id = tx.last_insert_rowid();
    tx.execute(
        "INSERT INTO group_memberships (user_id, group_id, joined_at) VALUES (?1, ?2, ?3)",
        params![creator_id, id, now],
    )?;
    tx.commit()?;
    info!("User {} created group {}", creator_id, id);
    require_group(conn, id, Some(creator_id))
}

pub fn find_group_by_name(conn: &Connection, name: &str, viewer: Option<i64>) -> Result<Option<Group>> {
    let sql = format!("{GROUP_SELECT} WHERE g.name = ?2 ORDER BY g.id LIMIT 1");
    Ok(conn
        .query_row(&sql, params![viewer, name], |r| group_from_row(r, viewer))
        .optional()?)
}

pub fn update_group(conn: &Connection, id: i64, input: &GroupInput, viewer: Option<i64>) -> Result<Group> {
    input.validate(true)?;
    conn.execute(
        "UPDATE run_groups SET name = COALESCE(?1, name), description = COALESCE(?2, description) WHERE id = ?3",
        params![input.name, input.description, id],
    )?;
    require_group(conn, id, viewer)
}

pub fn delete_group(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn.execute("DELETE FROM run_groups WHERE id = ?1", params![id])? > 0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Membership {
    pub id: i64,
    pub user: UserSummary,
    pub group: Group,
    pub joined_at: DateTime<Utc>,
}

/// Members of a group, most recently joined first.
pub fn members(conn: &Connection, group_id: i64, viewer: Option<i64>) -> Result<Vec<Membership>> {
    let group = require_group(conn, group_id, viewer)?;
    let mut stmt = conn.prepare(
        "SELECT m.id, u.id, u.username, m.joined_at
         FROM group_memberships m JOIN users u ON u.id = m.user_id
         WHERE m.group_id = ?1
         ORDER BY m.joined_at DESC, m.id DESC",
    )?;
    let members = stmt
        .query_map(params![group_id], |r| {
            Ok(Membership {
                id: r.get(0)?,
                user: UserSummary {
                    id: r.get(1)?,
                    username: r.get(2)?,
                },
                group: group.clone(),
                joined_at: r.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(members)
}

pub fn is_member(conn: &Connection, group_id: i64, user_id: i64) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM group_memberships WHERE group_id = ?1 AND user_id = ?2)",
        params![group_id, user_id],
        |r| r.get(0),
    )?)
}

/// Returns false when the user already belonged to the group.
pub fn add_member(conn: &Connection, group_id: i64, user_id: i64) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO group_memberships (user_id, group_id, joined_at) VALUES (?1, ?2, ?3)",
        params![user_id, group_id, Utc::now()],
    )?;
    Ok(inserted > 0)
}

pub fn remove_member(conn: &Connection, group_id: i64, user_id: i64) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM group_memberships WHERE group_id = ?1 AND user_id = ?2",
        params![group_id, user_id],
    )?;
    Ok(removed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use serde_json::json;

    fn run(distance_km: f64, lat: f64, lon: f64) -> RunInput {
        RunInput {
            distance_km: Some(distance_km),
            duration_seconds: Some(1800),
            center_lat: Some(lat),
            center_lon: Some(lon),
            route_data: Some(json!([[lat, lon]])),
            user_id: None,
        }
    }

    fn stats(conn: &Connection, user_id: i64) -> ProfileStats {
        profile_stats(conn, user_id).unwrap().unwrap()
    }

    #[test]
    fn registration_creates_profile_and_rejects_duplicates() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        let user = create_user(&mut conn, "runner", "pw", "r@example.com").unwrap();
        assert_eq!(stats(&conn, user.id).total_runs, 0);

        let err = create_user(&mut conn, "runner", "pw2", "").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Username already exists"));

        assert!(authenticate(&conn, "runner", "pw").unwrap().is_some());
        assert!(authenticate(&conn, "runner", "nope").unwrap().is_none());
        assert!(authenticate(&conn, "ghost", "pw").unwrap().is_none());
    }

    #[test]
    fn padded_usernames_log_in_after_registration() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        let user = create_user(&mut conn, " ana ", "pw", "").unwrap();
        assert_eq!(user.username, "ana");
        assert_eq!(authenticate(&conn, " ana ", "pw").unwrap().map(|u| u.id), Some(user.id));
        assert!(matches!(
            create_user(&mut conn, "ana  ", "pw", "").unwrap_err(),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn token_is_reused() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        let user = create_user(&mut conn, "runner", "pw", "").unwrap();
        let a = get_or_create_token(&conn, user.id).unwrap();
        let b = get_or_create_token(&conn, user.id).unwrap();
        assert_eq!(a, b);
        assert_eq!(user_for_token(&conn, &a).unwrap().unwrap().id, user.id);
        assert!(user_for_token(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn recording_runs_updates_totals_and_badges() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        let user = create_user(&mut conn, "runner", "pw", "").unwrap();

        let first = record_run(&mut conn, user.id, run(5.0, 42.35, -71.10)).unwrap();
        assert_eq!(
            first.new_badges,
            vec![BadgeType::OneK, BadgeType::TwoK, BadgeType::FiveK]
        );
        let second = record_run(&mut conn, user.id, run(3.0, 42.35, -71.10)).unwrap();
        assert!(second.new_badges.is_empty());

        let s = stats(&conn, user.id);
        assert_eq!(s.total_distance_km, 8.0);
        assert_eq!(s.best_distance_km, 5.0);
        assert_eq!(s.total_runs, 2);

        let runs = runs_for_user(&conn, user.id).unwrap();
        assert_eq!(runs[0].id, second.run.id);
    }

    #[test]
    fn cumulative_badge_needs_total() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        let user = create_user(&mut conn, "runner", "pw", "").unwrap();
        for _ in 0..10 {
            record_run(&mut conn, user.id, run(9.5, 0.0, 0.0)).unwrap();
        }
        assert!(!badges_for_user(&conn, user.id).unwrap().contains(&BadgeType::HundredK));
        let last = record_run(&mut conn, user.id, run(5.0, 0.0, 0.0)).unwrap();
        assert_eq!(last.new_badges, vec![BadgeType::HundredK]);
        assert!(!badges_for_user(&conn, user.id).unwrap().contains(&BadgeType::TenK));
    }

    #[test]
    fn missing_fields_are_reported() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        let user = create_user(&mut conn, "runner", "pw", "").unwrap();
        let err = record_run(&mut conn, user.id, RunInput::default()).unwrap_err();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert!(fields.contains_key("distance_km"));
        assert!(fields.contains_key("route_data"));
        assert!(!fields.contains_key("duration_seconds"));
    }

    #[test]
    fn edits_and_deletes_recompute_totals() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        let user = create_user(&mut conn, "runner", "pw", "").unwrap();
        let long = record_run(&mut conn, user.id, run(12.0, 0.0, 0.0)).unwrap().run;
        record_run(&mut conn, user.id, run(4.0, 0.0, 0.0)).unwrap();

        let patch = RunInput {
            distance_km: Some(6.0),
            ..Default::default()
        };
        let edited = update_run(&mut conn, long.id, patch).unwrap();
        assert_eq!(edited.distance_km, 6.0);
        assert_eq!(edited.duration_seconds, 1800);
        assert_eq!(stats(&conn, user.id).total_distance_km, 10.0);
        assert_eq!(stats(&conn, user.id).best_distance_km, 6.0);

        delete_run(&mut conn, long.id).unwrap();
        let s = stats(&conn, user.id);
        assert_eq!(s.total_distance_km, 4.0);
        assert_eq!(s.best_distance_km, 4.0);
        assert_eq!(s.total_runs, 1);
        // Earned badges survive.
        assert!(badges_for_user(&conn, user.id).unwrap().contains(&BadgeType::TenK));
    }

    #[test]
    fn nearby_uses_threshold_and_excludes_target() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        let a = create_user(&mut conn, "a", "pw", "").unwrap();
        let b = create_user(&mut conn, "b", "pw", "").unwrap();
        let target = record_run(&mut conn, a.id, run(5.0, 42.3505, -71.1054)).unwrap().run;
        let close = record_run(&mut conn, b.id, run(3.0, 42.3520, -71.1054)).unwrap().run;
        record_run(&mut conn, b.id, run(3.0, 42.3700, -71.1054)).unwrap();

        let found = nearby_runs(&conn, target.id, 500.0).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, close.id);
        assert_eq!(found[0].user, "b");
        assert!(found[0].distance_from_center_m > 150.0 && found[0].distance_from_center_m < 180.0);

        assert!(matches!(nearby_runs(&conn, 999, 500.0), Err(AppError::NotFound(_))));
    }

    #[test]
    fn groups_track_membership() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        let owner = create_user(&mut conn, "owner", "pw", "").unwrap();
        let other = create_user(&mut conn, "other", "pw", "").unwrap();
        let input = GroupInput {
            name: Some("Morning Crew".into()),
            description: Some("Early miles".into()),
        };
        let group = create_group(&mut conn, owner.id, &input).unwrap();
        assert!(group.is_creator && group.is_member);

        let seen_by_other = require_group(&conn, group.id, Some(other.id)).unwrap();
        assert!(!seen_by_other.is_creator && !seen_by_other.is_member);

        assert!(add_member(&conn, group.id, other.id).unwrap());
        assert!(!add_member(&conn, group.id, other.id).unwrap());
        assert_eq!(members(&conn, group.id, None).unwrap().len(), 2);

        assert!(remove_member(&conn, group.id, other.id).unwrap());
        assert!(!remove_member(&conn, group.id, other.id).unwrap());
        assert!(delete_group(&conn, group.id).unwrap());
        assert!(members(&conn, group.id, None).is_err());
    }

    #[test]
    fn blank_group_name_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        let owner = create_user(&mut conn, "owner", "pw", "").unwrap();
        let input = GroupInput {
            name: Some("  ".into()),
            description: None,
        };
        let AppError::Validation(fields) = create_group(&mut conn, owner.id, &input).unwrap_err() else {
            panic!("expected validation error");
        };
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("description"));
    }

    #[test]
    fn badges_list_earners() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();
        let user = create_user(&mut conn, "runner", "pw", "").unwrap();
        record_run(&mut conn, user.id, run(1.5, 0.0, 0.0)).unwrap();
        let badges = all_badges(&conn).unwrap();
        assert_eq!(badges.len(), 7);
        assert_eq!(badges[0].badge_type, "1k");
        assert_eq!(badges[0].earned_by, vec![user.id]);
        assert!(badges[1].earned_by.is_empty());
        assert!(get_badge(&conn, badges[6].id).unwrap().is_some());
        assert!(get_badge(&conn, 999).unwrap().is_none());
    }
}
