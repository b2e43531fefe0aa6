//! Query-string filter shared by the voter list and the graphs page.

use rusqlite::types::Value;
use serde::Deserialize;

/// Election participation columns, in display order.
pub const ELECTIONS: [(&str, &str); 5] = [
    ("v20state", "2020 State Election"),
    ("v21town", "2021 Town Election"),
    ("v21primary", "2021 Primary Election"),
    ("v22general", "2022 General Election"),
    ("v23town", "2023 Town Election"),
];

pub const VOTER_SCORES: std::ops::Range<i64> = 0..6;

/// Raw query parameters. Every field is optional and kept as text so a bad
/// number is ignored instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoterFilter {
    pub party_affiliation: Option<String>,
    pub min_birth_year: Option<String>,
    pub max_birth_year: Option<String>,
    pub voter_score: Option<String>,
    pub v20state: Option<String>,
    pub v21town: Option<String>,
    pub v21primary: Option<String>,
    pub v22general: Option<String>,
    pub v23town: Option<String>,
    pub page: Option<String>,
}

/// A SQL condition list with its positional parameters.
#[derive(Debug, Default)]
pub struct Conditions {
    clauses: Vec<String>,
    pub params: Vec<Value>,
}

impl Conditions {
    pub fn and(mut self, clause: &str) -> Self {
        self.clauses.push(clause.to_string());
        self
    }

    /// `WHERE a AND b ...`, or nothing when unfiltered.
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl VoterFilter {
    pub fn party(&self) -> Option<&str> {
        non_empty(&self.party_affiliation)
    }

    pub fn min_year(&self) -> Option<i32> {
        non_empty(&self.min_birth_year).and_then(|v| v.parse().ok())
    }

    pub fn max_year(&self) -> Option<i32> {
        non_empty(&self.max_birth_year).and_then(|v| v.parse().ok())
    }

    pub fn score(&self) -> Option<i64> {
        non_empty(&self.voter_score).and_then(|v| v.parse().ok())
    }

    fn election_flag(&self, column: &str) -> Option<&str> {
        let value = match column {
            "v20state" => &self.v20state,
            "v21town" => &self.v21town,
            "v21primary" => &self.v21primary,
            "v22general" => &self.v22general,
            "v23town" => &self.v23town,
            _ => return None,
        };
        non_empty(value)
    }

    /// Elections the voter must have taken part in.
    pub fn required_elections(&self) -> Vec<&'static str> {
        ELECTIONS
            .iter()
            .map(|(column, _)| *column)
            .filter(|column| self.election_flag(column).is_some())
            .collect()
    }

    pub fn conditions(&self) -> Conditions {
        let mut c = Conditions::default();
        if let Some(party) = self.party() {
            c = c.and("TRIM(party_affiliation) = ?");
            c.params.push(Value::Text(party.to_string()));
        }
        if let Some(year) = self.min_year() {
            c = c.and("CAST(strftime('%Y', date_of_birth) AS INTEGER) >= ?");
            c.params.push(Value::Integer(year.into()));
        }
        if let Some(year) = self.max_year() {
            c = c.and("CAST(strftime('%Y', date_of_birth) AS INTEGER) <= ?");
            c.params.push(Value::Integer(year.into()));
        }
        if let Some(score) = self.score() {
            c = c.and("voter_score = ?");
            c.params.push(Value::Integer(score));
        }
        for column in self.required_elections() {
            c = c.and(&format!("{column} = 1"));
        }
        c
    }

    /// The active filter as a query string without `page`, for pagination links.
    pub fn query_string(&self) -> String {
        let mut pairs: Vec<(&str, &str)> = Vec::new();
        if let Some(v) = self.party() {
            pairs.push(("party_affiliation", v));
        }
        if let Some(v) = non_empty(&self.min_birth_year) {
            pairs.push(("min_birth_year", v));
        }
        if let Some(v) = non_empty(&self.max_birth_year) {
            pairs.push(("max_birth_year", v));
        }
        if let Some(v) = non_empty(&self.voter_score) {
            pairs.push(("voter_score", v));
        }
        for column in self.required_elections() {
            pairs.push((column, "on"));
        }
        serde_urlencoded::to_string(&pairs).unwrap_or_default()
    }

    /// Select options and checkbox states for re-rendering the filter form.
    pub fn form(&self, parties: Vec<String>, birth_years: std::ops::Range<i32>) -> FilterForm {
        let party = self.party();
        let min = self.min_year();
        let max = self.max_year();
        let score = self.score();
        FilterForm {
            parties: parties
                .into_iter()
                .map(|p| Choice {
                    selected: party == Some(p.as_str()),
                    value: p,
                })
                .collect(),
            min_years: birth_years
                .clone()
                .map(|y| Choice {
                    value: y.to_string(),
                    selected: min == Some(y),
                })
                .collect(),
            max_years: birth_years
                .map(|y| Choice {
                    value: y.to_string(),
                    selected: max == Some(y),
                })
                .collect(),
            scores: VOTER_SCORES
                .map(|s| Choice {
                    value: s.to_string(),
                    selected: score == Some(s),
                })
                .collect(),
            elections: ELECTIONS
                .iter()
                .map(|&(column, label)| Election {
                    name: column,
                    label,
                    checked: self.election_flag(column).is_some(),
                })
                .collect(),
        }
    }
}

pub struct Choice {
    pub value: String,
    pub selected: bool,
}

pub struct Election {
    pub name: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

pub struct FilterForm {
    pub parties: Vec<Choice>,
    pub min_years: Vec<Choice>,
    pub max_years: Vec<Choice>,
    pub scores: Vec<Choice>,
    pub elections: Vec<Election>,
}
