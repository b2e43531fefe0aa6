use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::filter::{VoterFilter, ELECTIONS};
use super::pagination::Page;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Voter {
    pub id: i64,
    pub last_name: String,
    pub first_name: String,
    pub residence_address_street_number: String,
    pub residence_address_street_name: String,
    pub residence_address_apt_number: String,
    pub residence_address_zip: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_registration: Option<NaiveDate>,
    pub party_affiliation: String,
    pub precinct_number: String,
    pub v20state: bool,
    pub v21town: bool,
    pub v21primary: bool,
    pub v22general: bool,
    pub v23town: bool,
    pub voter_score: i64,
}

const COLUMNS: &str = "id, last_name, first_name, residence_address_street_number, \
    residence_address_street_name, residence_address_apt_number, residence_address_zip, \
    date_of_birth, date_of_registration, party_affiliation, precinct_number, \
    v20state, v21town, v21primary, v22general, v23town, voter_score";

impl Voter {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            last_name: row.get(1)?,
            first_name: row.get(2)?,
            residence_address_street_number: row.get(3)?,
            residence_address_street_name: row.get(4)?,
            residence_address_apt_number: row.get(5)?,
            residence_address_zip: row.get(6)?,
            date_of_birth: row.get(7)?,
            date_of_registration: row.get(8)?,
            party_affiliation: row.get(9)?,
            precinct_number: row.get(10)?,
            v20state: row.get(11)?,
            v21town: row.get(12)?,
            v21primary: row.get(13)?,
            v22general: row.get(14)?,
            v23town: row.get(15)?,
            voter_score: row.get(16)?,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn address(&self) -> String {
        let mut out = format!(
            "{} {}",
            self.residence_address_street_number, self.residence_address_street_name
        );
        if !self.residence_address_apt_number.is_empty() {
            out.push_str(&format!(", Apt {}", self.residence_address_apt_number));
        }
        out
    }

    /// Google Maps search link for the residence.
    pub fn map_url(&self) -> String {
        let query = format!("{}, Newton, MA {}", self.address(), self.residence_address_zip);
        let encoded = serde_urlencoded::to_string(vec![("api", "1"), ("query", query.as_str())]).unwrap_or_default();
        format!("https://www.google.com/maps/search/?{encoded}")
    }

    /// Each election in display order with whether this voter took part.
    pub fn participation(&self) -> Vec<Participation> {
        let flags = [
            self.v20state,
            self.v21town,
            self.v21primary,
            self.v22general,
            self.v23town,
        ];
        ELECTIONS
            .iter()
            .zip(flags)
            .map(|(&(_, label), voted)| Participation { label, voted })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Participation {
    pub label: &'static str,
    pub voted: bool,
}

impl std::fmt::Display for Voter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} - {} {}, Apt {}, ZIP {}",
            self.first_name,
            self.last_name,
            self.residence_address_street_number,
            self.residence_address_street_name,
            self.residence_address_apt_number,
            self.residence_address_zip
        )
    }
}

/// Fields of a voter before it has an id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewVoter {
    pub last_name: String,
    pub first_name: String,
    pub residence_address_street_number: String,
    pub residence_address_street_name: String,
    pub residence_address_apt_number: String,
    pub residence_address_zip: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_registration: Option<NaiveDate>,
    pub party_affiliation: String,
    pub precinct_number: String,
    pub v20state: bool,
    pub v21town: bool,
    pub v21primary: bool,
    pub v22general: bool,
    pub v23town: bool,
    pub voter_score: i64,
}

pub fn insert_voter(conn: &Connection, v: &NewVoter) -> Result<i64> {
    conn.execute(
        "INSERT INTO voters (last_name, first_name, residence_address_street_number,
            residence_address_street_name, residence_address_apt_number, residence_address_zip,
            date_of_birth, date_of_registration, party_affiliation, precinct_number,
            v20state, v21town, v21primary, v22general, v23town, voter_score)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            v.last_name,
            v.first_name,
            v.residence_address_street_number,
            v.residence_address_street_name,
            v.residence_address_apt_number,
            v.residence_address_zip,
            v.date_of_birth,
            v.date_of_registration,
            v.party_affiliation,
            v.precinct_number,
            v.v20state,
            v.v21town,
            v.v21primary,
            v.v22general,
            v.v23town,
            v.voter_score
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_voter(conn: &Connection, id: i64) -> Result<Option<Voter>> {
    let sql = format!("SELECT {COLUMNS} FROM voters WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], Voter::from_row).optional()?)
}

pub fn require_voter(conn: &Connection, id: i64) -> Result<Voter> {
    get_voter(conn, id)?.ok_or(AppError::NotFound("Voter"))
}

pub fn count_voters(conn: &Connection, filter: &VoterFilter) -> Result<usize> {
    let c = filter.conditions();
    let sql = format!("SELECT COUNT(*) FROM voters {}", c.where_clause());
    let n: i64 = conn.query_row(&sql, params_from_iter(c.params.iter()), |r| r.get(0))?;
    Ok(n as usize)
}

/// The voters on `page`, in id order.
pub fn voters_page(conn: &Connection, filter: &VoterFilter, page: &Page) -> Result<Vec<Voter>> {
    let c = filter.conditions();
    let sql = format!(
        "SELECT {COLUMNS} FROM voters {} ORDER BY id LIMIT {} OFFSET {}",
        c.where_clause(),
        page.per_page,
        page.offset()
    );
    let mut stmt = conn.prepare(&sql)?;
    let voters = stmt
        .query_map(params_from_iter(c.params.iter()), Voter::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(voters)
}

/// Distinct non-blank party codes, trimmed and sorted.
pub fn party_choices(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT TRIM(party_affiliation) AS party FROM voters
         WHERE TRIM(party_affiliation) != '' ORDER BY party",
    )?;
    let parties = stmt
        .query_map([], |r| r.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(parties)
}

/// `(year, count)` for voters with a known birth date, oldest year first.
pub fn birth_year_counts(conn: &Connection, filter: &VoterFilter) -> Result<Vec<(i32, i64)>> {
    let c = filter.conditions().and("date_of_birth IS NOT NULL");
    let sql = format!(
        "SELECT CAST(strftime('%Y', date_of_birth) AS INTEGER) AS year, COUNT(*) FROM voters {}
         GROUP BY year ORDER BY year",
        c.where_clause()
    );
    let mut stmt = conn.prepare(&sql)?;
    let counts = stmt
        .query_map(params_from_iter(c.params.iter()), |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(counts)
}

/// `(party, count)` in order of each party's first appearance.
pub fn party_counts(conn: &Connection, filter: &VoterFilter) -> Result<Vec<(String, i64)>> {
    let c = filter.conditions();
    let sql = format!(
        "SELECT TRIM(party_affiliation) AS party, COUNT(*) FROM voters {}
         GROUP BY party ORDER BY MIN(id)",
        c.where_clause()
    );
    let mut stmt = conn.prepare(&sql)?;
    let counts = stmt
        .query_map(params_from_iter(c.params.iter()), |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(counts)
}

/// `(column, voters who took part)` for each election.
pub fn participation_counts(conn: &Connection, filter: &VoterFilter) -> Result<Vec<(&'static str, i64)>> {
    let c = filter.conditions();
    let sums: Vec<String> = ELECTIONS
        .iter()
        .map(|(column, _)| format!("COALESCE(SUM({column}), 0)"))
        .collect();
    let sql = format!("SELECT {} FROM voters {}", sums.join(", "), c.where_clause());
    let totals = conn.query_row(&sql, params_from_iter(c.params.iter()), |r| {
        (0..ELECTIONS.len())
            .map(|i| r.get::<_, i64>(i))
            .collect::<rusqlite::Result<Vec<_>>>()
    })?;
    Ok(ELECTIONS.iter().map(|(column, _)| *column).zip(totals).collect())
}
