//! Sample runners, runs and groups around BU's campus.

use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::{params, Connection};
use serde_json::{json, Value};
use tracing::info;

use super::models::{self, GroupInput, RunInput, User};
use crate::error::Result;

const BASE_LAT: f64 = 42.3505;
const BASE_LON: f64 = -71.1054;
const SAMPLE_PASSWORD: &str = "password123";

const SAMPLE_GROUPS: [(&str, &str); 4] = [
    ("BU Morning Runners", "Early morning running group for BU students"),
    ("Charles River Crew", "Running along the Charles River path"),
    ("Weekend Warriors", "Casual weekend running group"),
    ("Marathon Training Squad", "Training for upcoming marathons"),
];

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PopulateSummary {
    pub users: i64,
    pub runs: i64,
    pub badges: i64,
    pub groups: i64,
    pub memberships: i64,
}

impl std::fmt::Display for PopulateSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  Users: {}", self.users)?;
        writeln!(f, "  Runs: {}", self.runs)?;
        writeln!(f, "  Badges: {}", self.badges)?;
        writeln!(f, "  Groups: {}", self.groups)?;
        write!(f, "  Group Memberships: {}", self.memberships)
    }
}

fn sample_runners(conn: &mut Connection) -> Result<Vec<User>> {
    let mut runners = Vec::new();
    for i in 1..=3 {
        let username = format!("runner{i}");
        let user = match models::find_user(conn, &username)? {
            Some(user) => user,
            None => {
                info!("Creating sample user {}", username);
                models::create_user(conn, &username, SAMPLE_PASSWORD, &format!("{username}@example.com"))?
            }
        };
        runners.push(user);
    }
    Ok(runners)
}

fn sample_route<R: Rng>(rng: &mut R, lat: f64, lon: f64) -> Value {
    let points: Vec<Value> = (0..rng.gen_range(5..=10))
        .map(|_| {
            let days_ago = rng.gen_range(0..=30);
            json!({
                "latitude": lat + rng.gen_range(-0.005..0.005),
                "longitude": lon + rng.gen_range(-0.005..0.005),
                "timestamp": (chrono::Utc::now() - chrono::Duration::days(days_ago)).to_rfc3339(),
            })
        })
        .collect();
    Value::Array(points)
}

fn sample_run<R: Rng>(rng: &mut R) -> RunInput {
    let lat = BASE_LAT + rng.gen_range(-0.01..0.01);
    let lon = BASE_LON + rng.gen_range(-0.01..0.01);
    let distance = (rng.gen_range(2.0..15.0_f64) * 100.0).round() / 100.0;
    let pace: i64 = rng.gen_range(300..=450);
    RunInput {
        distance_km: Some(distance),
        duration_seconds: Some((distance * pace as f64) as i64),
        center_lat: Some(lat),
        center_lon: Some(lon),
        route_data: Some(sample_route(rng, lat, lon)),
        user_id: None,
    }
}

/// Fills the run tracker with demo data. Safe to run repeatedly: users and
/// groups are reused by name, runs are always added.
pub fn populate<R: Rng>(conn: &mut Connection, rng: &mut R) -> Result<PopulateSummary> {
    let runners = sample_runners(conn)?;

    for runner in &runners {
        for _ in 0..rng.gen_range(3..=5) {
            let recorded = models::record_run(conn, runner.id, sample_run(rng))?;
            info!("Created run for {}: {}km", runner.username, recorded.run.distance_km);
        }
    }

    let group_count = rng.gen_range(3..=4);
    for (i, (name, description)) in SAMPLE_GROUPS.iter().take(group_count).enumerate() {
        if models::find_group_by_name(conn, name, None)?.is_some() {
            continue;
        }
        let creator = &runners[i % runners.len()];
        let input = GroupInput {
            name: Some(name.to_string()),
            description: Some(description.to_string()),
        };
        let group = models::create_group(conn, creator.id, &input)?;

        let others: Vec<&User> = runners.iter().filter(|u| u.id != creator.id).collect();
        let wanted = rng.gen_range(2..=others.len().min(3).max(2));
        for member in others.choose_multiple(rng, wanted) {
            models::add_member(conn, group.id, member.id)?;
        }
        info!("Created group {}", group.name);
    }

    summarize(conn)
}

fn count(conn: &Connection, table: &str) -> Result<i64> {
    Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), params![], |r| r.get(0))?)
}

fn summarize(conn: &Connection) -> Result<PopulateSummary> {
    Ok(PopulateSummary {
        users: count(conn, "users")?,
        runs: count(conn, "runs")?,
        badges: count(conn, "badges")?,
        groups: count(conn, "run_groups")?,
        memberships: count(conn, "group_memberships")?,
    })
}
