//! Bulk load of the Newton voter CSV export.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::{info, warn};

use super::models::{insert_voter, NewVoter};
use crate::error::Result;

/// Columns 1..=16 are used; column 0 is the registration id.
const MIN_FIELDS: usize = 17;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub loaded: usize,
    pub skipped: usize,
}

/// Parses one data line. Fields are split on bare commas; quoting is not supported.
pub fn parse_line(line: &str) -> std::result::Result<NewVoter, String> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() < MIN_FIELDS {
        return Err(format!("expected {MIN_FIELDS} fields, found {}", fields.len()));
    }
    let date = |i: usize| -> std::result::Result<Option<NaiveDate>, String> {
        let raw = fields[i].trim();
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| format!("bad date '{raw}' in column {i}: {e}"))
    };
    let flag = |i: usize| fields[i].trim() == "TRUE";

    Ok(NewVoter {
        last_name: fields[1].to_string(),
        first_name: fields[2].to_string(),
        residence_address_street_number: fields[3].to_string(),
        residence_address_street_name: fields[4].to_string(),
        residence_address_apt_number: fields[5].to_string(),
        residence_address_zip: fields[6].to_string(),
        date_of_birth: date(7)?,
        date_of_registration: date(8)?,
        party_affiliation: fields[9].trim().to_string(),
        precinct_number: fields[10].to_string(),
        v20state: flag(11),
        v21town: flag(12),
        v21primary: flag(13),
        v22general: flag(14),
        v23town: flag(15),
        voter_score: fields[16]
            .trim()
            .parse()
            .map_err(|e| format!("bad voter score '{}': {e}", fields[16]))?,
    })
}

/// Reads every data row after the header, inserting the good ones in one transaction.
pub fn load_voters<R: BufRead>(conn: &mut Connection, reader: R) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    let tx = conn.transaction()?;
    for (index, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(voter) => {
                insert_voter(&tx, &voter)?;
                summary.loaded += 1;
            }
            Err(reason) => {
                warn!("Skipping line {} due to error: {}", index + 1, reason);
                summary.skipped += 1;
            }
        }
    }
    tx.commit()?;
    info!(
        "Loaded {} voters ({} skipped)",
        summary.loaded, summary.skipped
    );
    Ok(summary)
}

pub fn load_voters_from_path(conn: &mut Connection, path: impl AsRef<Path>) -> Result<ImportSummary> {
    let path = path.as_ref();
    info!("Loading voters from {}", path.display());
    load_voters(conn, BufReader::new(File::open(path)?))
}
