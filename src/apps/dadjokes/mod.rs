//! Dad jokes: random joke and picture pages plus a JSON API over both.

pub mod api;
pub mod models;
pub mod pages;

use axum::{routing::get, Router};

use crate::state::AppState;

pub const MOUNT: &str = "/dadjokes";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::random_page))
        .route("/random", get(pages::random_page))
        .route("/jokes", get(pages::joke_list))
        .route("/joke/:pk", get(pages::joke_detail))
        .route("/pictures", get(pages::picture_list))
        .route("/picture/:pk", get(pages::picture_detail))
        .route("/api/", get(api::random_joke))
        .route("/api/random", get(api::random_joke))
        .route("/api/random_picture", get(api::random_picture))
        .route("/api/jokes", get(api::list_jokes).post(api::create_joke))
        .route(
            "/api/joke/:pk",
            get(api::get_joke)
                .put(api::update_joke)
                .patch(api::update_joke)
                .delete(api::delete_joke),
        )
        .route("/api/pictures", get(api::list_pictures))
        .route(
            "/api/picture/:pk",
            get(api::get_picture)
                .put(api::update_picture)
                .patch(api::update_picture)
                .delete(api::delete_picture),
        )
}
