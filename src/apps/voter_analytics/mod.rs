//! Voter analytics: filterable voter list, voter detail and Plotly charts
//! over the Newton voter roll.

pub mod charts;
pub mod filter;
pub mod handlers;
pub mod import;
pub mod models;
pub mod pagination;

use axum::{routing::get, Router};

use crate::state::AppState;

pub const MOUNT: &str = "/voter_analytics";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::voter_list))
        .route("/voter/:pk", get(handlers::voter_detail))
        .route("/graphs", get(handlers::graphs))
}
