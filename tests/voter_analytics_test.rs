mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::NaiveDate;
use common::TestApp;
use cs412::apps::voter_analytics::models::{insert_voter, NewVoter};

fn voter(first: &str, last: &str, party: &str, born: i32, score: i64) -> NewVoter {
    NewVoter {
        first_name: first.into(),
        last_name: last.into(),
        residence_address_street_number: "12".into(),
        residence_address_street_name: "Walnut St".into(),
        residence_address_zip: "02460".into(),
        date_of_birth: NaiveDate::from_ymd_opt(born, 6, 1),
        date_of_registration: NaiveDate::from_ymd_opt(2010, 1, 15),
        party_affiliation: party.into(),
        precinct_number: "3".into(),
        v20state: true,
        v22general: score >= 2,
        voter_score: score,
        ..NewVoter::default()
    }
}

fn seed(app: &TestApp) -> Result<Vec<i64>> {
    let conn = app.state.db.conn()?;
    Ok(vec![
        insert_voter(&conn, &voter("Grace", "Hopper", "D", 1956, 2))?,
        insert_voter(&conn, &voter("Alan", "Turing", "R", 1972, 1))?,
        insert_voter(&conn, &voter("Ada", "Lovelace", "D", 1990, 5))?,
    ])
}

#[tokio::test]
async fn list_shows_all_voters() -> Result<()> {
    let app = TestApp::new()?;
    seed(&app)?;
    let (status, body) = app.get("/voter_analytics").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Grace Hopper"));
    assert!(body.contains("Alan Turing"));
    assert!(body.contains("of 3 voters"));
    Ok(())
}

#[tokio::test]
async fn filters_narrow_the_list() -> Result<()> {
    let app = TestApp::new()?;
    seed(&app)?;

    let (_, body) = app.get("/voter_analytics?party_affiliation=D").await?;
    assert!(body.contains("Grace Hopper"));
    assert!(body.contains("Ada Lovelace"));
    assert!(!body.contains("Alan Turing"));

    let (_, body) = app
        .get("/voter_analytics?party_affiliation=D&min_birth_year=1980&max_birth_year=")
        .await?;
    assert!(body.contains("Ada Lovelace"));
    assert!(!body.contains("Grace Hopper"));

    let (_, body) = app.get("/voter_analytics?voter_score=1").await?;
    assert!(body.contains("Alan Turing"));
    assert!(body.contains("of 1 voters"));

    let (_, body) = app.get("/voter_analytics?v22general=on").await?;
    assert!(body.contains("Grace Hopper"));
    assert!(!body.contains("Alan Turing"));
    Ok(())
}

#[tokio::test]
async fn out_of_range_page_is_not_found() -> Result<()> {
    let app = TestApp::new()?;
    seed(&app)?;
    let (status, _) = app.get("/voter_analytics?page=2").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/voter_analytics?page=abc").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.get("/voter_analytics?page=last").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Page 1 of 1"));
    Ok(())
}

#[tokio::test]
async fn detail_page_shows_participation() -> Result<()> {
    let app = TestApp::new()?;
    let ids = seed(&app)?;
    let (status, body) = app.get(&format!("/voter_analytics/voter/{}", ids[0])).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Grace Hopper"));
    assert!(body.contains("1956-06-01"));
    assert!(body.contains("Voted"));
    assert!(body.contains("Did not vote"));

    let (status, _) = app.get("/voter_analytics/voter/9999").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn graphs_render_charts_for_filtered_set() -> Result<()> {
    let app = TestApp::new()?;
    seed(&app)?;
    let (status, body) = app.get("/voter_analytics/graphs?party_affiliation=R").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Plotly"));
    assert!(body.contains("birth-year-graph"));
    assert!(body.contains("party-affiliation-graph"));
    Ok(())
}
