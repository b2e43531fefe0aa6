//! Run tracker JSON API: token auth, runs, profiles, proximity search,
//! groups and badges.

pub mod api;
pub mod auth;
pub mod badges;
pub mod geo;
pub mod models;
pub mod populate;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

pub const MOUNT: &str = "/runtracker";

pub fn router() -> Router<AppState> {
    use api::*;

    // Segment parameters share a name wherever routes overlap.
    Router::new()
        .route("/login/", post(login))
        .route("/register/", post(register))
        .route("/runs/", get(list_runs).post(create_run))
        .route(
            "/runs/:pk/",
            get(get_run).put(update_run).patch(update_run).delete(delete_run),
        )
        .route("/runs/:pk/nearby/", get(nearby))
        .route("/profile/:pk/", get(profile))
        .route("/groups/", get(list_groups).post(create_group))
        .route(
            "/groups/:pk/",
            get(get_group)
                .put(update_group)
                .patch(update_group)
                .delete(delete_group),
        )
        .route("/groups/:pk/members/", get(group_members))
        .route("/groups/:pk/members/add/", post(add_member))
        .route("/groups/:pk/members/:user_id/remove/", delete(remove_member))
        .route("/badges/", get(list_badges))
        .route("/badges/:pk/", get(get_badge))
}
