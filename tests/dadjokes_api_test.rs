mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn random_endpoints_404_when_empty() -> Result<()> {
    let app = TestApp::new()?;
    let (status, body) = app.json(Method::GET, "/dadjokes/api/random", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Not found." }));

    let (status, _) = app.json(Method::GET, "/dadjokes/api/random_picture", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The HTML page still renders without content.
    let (status, _) = app.get("/dadjokes/random").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn joke_crud_round_trip() -> Result<()> {
    let app = TestApp::new()?;
    let (status, created) = app
        .json(
            Method::POST,
            "/dadjokes/api/jokes",
            Some(json!({ "text": "I'm reading a book on anti-gravity.", "contributor": "Dad" })),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["contributor"], "Dad");

    let (status, patched) = app
        .json(
            Method::PATCH,
            &format!("/dadjokes/api/joke/{id}"),
            Some(json!({ "contributor": "Grandpa" })),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["text"], "I'm reading a book on anti-gravity.");
    assert_eq!(patched["contributor"], "Grandpa");

    let (status, random) = app.json(Method::GET, "/dadjokes/api/", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(random["id"], id);

    let (status, page) = app.get(&format!("/dadjokes/joke/{id}")).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("anti-gravity"));

    let (status, _) = app
        .json(Method::DELETE, &format!("/dadjokes/api/joke/{id}"), None, None)
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .json(Method::GET, &format!("/dadjokes/api/joke/{id}"), None, None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn pictures_list_and_update() -> Result<()> {
    let app = TestApp::new()?;
    {
        let conn = app.state.db.conn()?;
        conn.execute(
            "INSERT INTO pictures (image_url, contributor, timestamp) VALUES ('https://example.com/a.gif', 'Kid', '2024-01-01T00:00:00Z')",
            [],
        )?;
    }
    let (status, list) = app.json(Method::GET, "/dadjokes/api/pictures", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    let id = list[0]["id"].as_i64().unwrap();

    let (status, updated) = app
        .json(
            Method::PUT,
            &format!("/dadjokes/api/picture/{id}"),
            Some(json!({ "image_url": "https://example.com/b.gif" })),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["image_url"], "https://example.com/b.gif");
    assert_eq!(updated["contributor"], "Kid");

    let (status, _) = app.get("/dadjokes/picture/999").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn each_resource_accepts_only_its_own_fields() -> Result<()> {
    let app = TestApp::new()?;
    let (_, joke) = app
        .json(Method::POST, "/dadjokes/api/jokes", Some(json!({ "text": "pun" })), None)
        .await?;
    let id = joke["id"].as_i64().unwrap();
    let uri = format!("/dadjokes/api/joke/{id}");

    let (status, body) = app
        .json(Method::PATCH, &uri, Some(json!({ "image_url": "https://x/y.png" })), None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("image_url"));

    let (status, _) = app
        .json(
            Method::PUT,
            &uri,
            Some(json!({ "text": "pun two", "image_url": "https://x/y.png" })),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, unchanged) = app.json(Method::GET, &uri, None, None).await?;
    assert_eq!(unchanged["text"], "pun");

    {
        let conn = app.state.db.conn()?;
        conn.execute(
            "INSERT INTO pictures (image_url, contributor, timestamp) VALUES ('https://x/a.gif', 'Kid', '2024-01-01T00:00:00Z')",
            [],
        )?;
    }
    let (_, pictures) = app.json(Method::GET, "/dadjokes/api/pictures", None, None).await?;
    let picture_id = pictures[0]["id"].as_i64().unwrap();
    let (status, _) = app
        .json(
            Method::PATCH,
            &format!("/dadjokes/api/picture/{picture_id}"),
            Some(json!({ "text": "not a url" })),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, picture) = app
        .json(Method::GET, &format!("/dadjokes/api/picture/{picture_id}"), None, None)
        .await?;
    assert_eq!(picture["image_url"], "https://x/a.gif");
    Ok(())
}

#[tokio::test]
async fn malformed_joke_body_is_a_json_400() -> Result<()> {
    let app = TestApp::new()?;
    let (status, body) = app
        .json(Method::POST, "/dadjokes/api/jokes", Some(json!({ "text": 42 })), None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    Ok(())
}
