//! Mini Insta: profiles, posts with photos, follows, likes and comments.

pub mod forms;
pub mod handlers;
pub mod models;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub const MOUNT: &str = "/mini_insta";

pub fn router() -> Router<AppState> {
    use handlers::*;

    Router::new()
        .route("/", get(show_all_profiles))
        .route("/profile/:pk/", get(show_profile))
        .route("/post/:pk/", get(show_post))
        .route(
            "/profile/:pk/create_post",
            get(create_post_form).post(create_post),
        )
        .route(
            "/profile/:pk/update",
            get(update_profile_form).post(update_profile),
        )
        .route("/post/:pk/delete", get(delete_post_form).post(delete_post))
        .route("/post/:pk/update", get(update_post_form).post(update_post))
        .route("/profile/:pk/followers", get(show_followers))
        .route("/profile/:pk/following", get(show_following))
        .route("/profile/:pk/feed", get(show_feed))
        .route("/profile/:pk/search", get(search))
        .route("/profile/:pk/follow/:other", post(follow))
        .route("/profile/:pk/delete_follow/:other", post(delete_follow))
        .route("/profile/:pk/like/:post", post(like))
        .route("/profile/:pk/delete_like/:post", post(delete_like))
        .route("/profile/:pk/comment/:post", post(comment))
}
