mod common;

use anyhow::Result;
use axum::http::{header, StatusCode};
use common::TestApp;

#[tokio::test]
async fn index_and_health() -> Result<()> {
    let app = TestApp::new()?;
    let (status, body) = app.get("/").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Voter Analytics"));

    let (status, body) = app.get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"healthy\""));
    Ok(())
}

#[tokio::test]
async fn trailing_slash_redirects_to_app_root() -> Result<()> {
    let app = TestApp::new()?;
    let (status, headers, _) = app
        .send(axum::http::Request::get("/hw/").body(axum::body::Body::empty())?)
        .await?;
    assert_eq!(status, StatusCode::PERMANENT_REDIRECT);
    assert_eq!(headers[header::LOCATION], "/hw");
    Ok(())
}

#[tokio::test]
async fn hw_pages_render() -> Result<()> {
    let app = TestApp::new()?;
    let (status, body) = app.get("/hw").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("lucky number"));
    let (status, _) = app.get("/hw/about").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn quotes_pages_render() -> Result<()> {
    let app = TestApp::new()?;
    for uri in ["/quotes/quote", "/quotes/show_all", "/quotes/about", "/quotes"] {
        let (status, _) = app.get(uri).await?;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }
    let (_, body) = app.get("/quotes/show_all").await?;
    assert!(body.contains("The magic is when a song stops being mine"));
    Ok(())
}

#[tokio::test]
async fn quiz_echoes_flavor() -> Result<()> {
    let app = TestApp::new()?;
    let (status, _, body) = app.post_form("/quiz1/submit", "ice_cream=pistachio").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("pistachio"));

    let (_, _, body) = app.post_form("/quiz1/submit", "").await?;
    assert!(body.contains("no ice cream provided"));
    Ok(())
}

#[tokio::test]
async fn formdata_confirms_or_redirects() -> Result<()> {
    let app = TestApp::new()?;
    let (status, _, body) = app.post_form("/formdata/submit", "name=Ada").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Thanks, Ada!"));
    assert!(body.contains("No Color Provided"));

    let (status, headers, _) = app
        .send(axum::http::Request::get("/formdata/submit").body(axum::body::Body::empty())?)
        .await?;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/formdata");
    Ok(())
}

#[tokio::test]
async fn restaurant_order_flow() -> Result<()> {
    let app = TestApp::new()?;
    let (status, body) = app.get("/restaurant/order").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Daily Special"));

    let (status, _, body) = app
        .post_form(
            "/restaurant/confirmation",
            "name=Sam&email=sam%40example.com&phone=555&Hamburger=on&Fries=on&special_instructions=+extra+napkins+",
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Thank you, Sam!"));
    assert!(body.contains("$12.98"));
    assert!(body.contains("Special instructions: extra napkins"));
    Ok(())
}
