mod common;

use anyhow::Result;
use axum::http::{header, StatusCode};
use common::TestApp;
use cs412::apps::mini_insta::models;

fn seed_profiles(app: &TestApp) -> Result<(i64, i64)> {
    let conn = app.state.db.conn()?;
    let alice = models::create_profile(&conn, "alice", "Alice Liddell", "Down the rabbit hole")?;
    let bob = models::create_profile(&conn, "bob", "Bob Builder", "Can we fix it")?;
    Ok((alice.id, bob.id))
}

fn location(headers: &axum::http::HeaderMap) -> &str {
    headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn profiles_list_and_detail() -> Result<()> {
    let app = TestApp::new()?;
    let (alice, _) = seed_profiles(&app)?;

    let (status, body) = app.get("/mini_insta").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("alice"));
    assert!(body.contains("bob"));

    let (status, body) = app.get(&format!("/mini_insta/profile/{alice}/")).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Alice Liddell"));
    assert!(body.contains("No posts yet."));

    let (status, _) = app.get("/mini_insta/profile/999/").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn create_post_redirects_to_profile() -> Result<()> {
    let app = TestApp::new()?;
    let (alice, _) = seed_profiles(&app)?;

    let (status, body) = app.get(&format!("/mini_insta/profile/{alice}/create_post")).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<form"));

    let (status, headers, _) = app
        .post_form(
            &format!("/mini_insta/profile/{alice}/create_post"),
            "caption=Tea+party&image_url=https%3A%2F%2Fexample.com%2Ftea.jpg",
        )
        .await?;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), format!("/mini_insta/profile/{alice}/"));

    let (_, body) = app.get(&format!("/mini_insta/profile/{alice}/")).await?;
    assert!(body.contains("Tea party"));
    let conn = app.state.db.conn()?;
    let posts = models::posts_by_profile(&conn, alice)?;
    let photos = models::photos_for_post(&conn, posts[0].id)?;
    assert_eq!(photos[0].image_url, "https://example.com/tea.jpg");
    Ok(())
}

#[tokio::test]
async fn invalid_image_url_rerenders_form() -> Result<()> {
    let app = TestApp::new()?;
    let (alice, _) = seed_profiles(&app)?;

    let (status, _, body) = app
        .post_form(
            &format!("/mini_insta/profile/{alice}/create_post"),
            "caption=Broken&image_url=not+a+url",
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Enter a valid URL."));

    let (status, _, body) = app
        .post_form(
            &format!("/mini_insta/profile/{alice}/update"),
            "display_name=Alice&bio_text=hi&profile_image_url=ftp%3A%2F%2Fnope",
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Enter a valid URL."));

    let (status, headers, _) = app
        .post_form(
            &format!("/mini_insta/profile/{alice}/update"),
            "display_name=Queen+Alice&bio_text=hi&profile_image_url=",
        )
        .await?;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), format!("/mini_insta/profile/{alice}/"));
    let (_, body) = app.get(&format!("/mini_insta/profile/{alice}/")).await?;
    assert!(body.contains("Queen Alice"));
    Ok(())
}

#[tokio::test]
async fn follow_like_comment_and_feed() -> Result<()> {
    let app = TestApp::new()?;
    let (alice, bob) = seed_profiles(&app)?;
    let post_id = {
        let mut conn = app.state.db.conn()?;
        models::create_post(&mut conn, bob, "Fixed the roof", None)?.id
    };

    let (_, body) = app.get(&format!("/mini_insta/profile/{alice}/feed")).await?;
    assert!(!body.contains("Fixed the roof"));

    let (status, headers, _) = app
        .post_form(&format!("/mini_insta/profile/{alice}/follow/{bob}"), "")
        .await?;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), format!("/mini_insta/profile/{bob}/"));

    let (_, body) = app.get(&format!("/mini_insta/profile/{alice}/feed")).await?;
    assert!(body.contains("Fixed the roof"));
    let (_, body) = app.get(&format!("/mini_insta/profile/{bob}/followers")).await?;
    assert!(body.contains("alice"));
    let (_, body) = app.get(&format!("/mini_insta/profile/{alice}/following")).await?;
    assert!(body.contains("bob"));

    let (status, headers, _) = app
        .post_form(&format!("/mini_insta/profile/{alice}/like/{post_id}"), "")
        .await?;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), format!("/mini_insta/post/{post_id}/"));
    {
        let conn = app.state.db.conn()?;
        assert!(models::has_liked(&conn, alice, post_id)?);
    }

    let (status, _, _) = app
        .post_form(&format!("/mini_insta/profile/{bob}/like/{post_id}"), "")
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.post_form(&format!("/mini_insta/profile/{alice}/comment/{post_id}"), "text=Nice+work")
        .await?;
    let (_, body) = app.get(&format!("/mini_insta/post/{post_id}/")).await?;
    assert!(body.contains("Nice work"));

    app.post_form(&format!("/mini_insta/profile/{alice}/delete_like/{post_id}"), "")
        .await?;
    app.post_form(&format!("/mini_insta/profile/{alice}/delete_follow/{bob}"), "")
        .await?;
    let conn = app.state.db.conn()?;
    assert!(!models::has_liked(&conn, alice, post_id)?);
    assert!(!models::is_following(&conn, alice, bob)?);
    Ok(())
}

#[tokio::test]
async fn search_finds_profiles_and_posts() -> Result<()> {
    let app = TestApp::new()?;
    let (alice, bob) = seed_profiles(&app)?;
    {
        let mut conn = app.state.db.conn()?;
        models::create_post(&mut conn, bob, "Building a rabbit hutch", None)?;
    }

    let (status, body) = app.get(&format!("/mini_insta/profile/{alice}/search")).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("rabbit hutch"));

    let (status, body) = app
        .get(&format!("/mini_insta/profile/{alice}/search?query=RABBIT"))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Building a rabbit hutch"));
    assert!(body.contains("Alice Liddell"));
    Ok(())
}

#[tokio::test]
async fn update_and_delete_post() -> Result<()> {
    let app = TestApp::new()?;
    let (alice, _) = seed_profiles(&app)?;
    let post_id = {
        let mut conn = app.state.db.conn()?;
        models::create_post(&mut conn, alice, "First draft", None)?.id
    };

    let (status, headers, _) = app
        .post_form(&format!("/mini_insta/post/{post_id}/update"), "caption=Final+draft")
        .await?;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), format!("/mini_insta/post/{post_id}/"));
    let (_, body) = app.get(&format!("/mini_insta/post/{post_id}/")).await?;
    assert!(body.contains("Final draft"));

    let (status, body) = app.get(&format!("/mini_insta/post/{post_id}/delete")).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Final draft"));

    let (status, headers, _) = app
        .post_form(&format!("/mini_insta/post/{post_id}/delete"), "")
        .await?;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), format!("/mini_insta/profile/{alice}/"));
    let (status, _) = app.get(&format!("/mini_insta/post/{post_id}/")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
