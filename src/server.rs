use axum::{
    http::Method,
    response::{IntoResponse, Json, Redirect},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::apps::{dadjokes, formdata, hw, mini_insta, quiz1, quotes, restaurant, runtracker, voter_analytics};
use crate::error::Result;
use crate::state::AppState;
use crate::templates::{render, AppLink, IndexTemplate};

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "cs412",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn app_links() -> Vec<AppLink> {
    vec![
        AppLink { name: "Homework", path: hw::MOUNT, blurb: "Time, random letters and a lucky number" },
        AppLink { name: "Quotes", path: quotes::MOUNT, blurb: "Quote of the day" },
        AppLink { name: "Quiz 1", path: quiz1::MOUNT, blurb: "Favorite ice cream form" },
        AppLink { name: "Form Data", path: formdata::MOUNT, blurb: "Form submission demo" },
        AppLink { name: "Restaurant", path: restaurant::MOUNT, blurb: "Order from the menu" },
        AppLink { name: "Dad Jokes", path: dadjokes::MOUNT, blurb: "Jokes, pictures and a REST API" },
        AppLink { name: "Mini Insta", path: mini_insta::MOUNT, blurb: "Profiles, posts and follows" },
        AppLink { name: "Run Tracker", path: "/runtracker/badges/", blurb: "Running API with badges and groups" },
        AppLink { name: "Voter Analytics", path: voter_analytics::MOUNT, blurb: "Newton voter roll explorer" },
    ]
}

async fn index() -> Result<impl IntoResponse> {
    render(&IndexTemplate { apps: app_links() })
}

/// Nests `app` at `mount` and sends `mount/` to the application root.
fn mount(router: Router<AppState>, mount: &'static str, app: Router<AppState>) -> Router<AppState> {
    router
        .nest(mount, app)
        .route(&format!("{mount}/"), get(move || async move { Redirect::permanent(mount) }))
}

/// Build the router with every application nested under its mount point.
pub fn create_server(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    let static_dir = state.config.server.static_dir.clone();
    let media_dir = state.config.server.media_dir.clone();

    let mut router = Router::new().route("/", get(index)).route("/health", get(health));
    for (prefix, app) in [
        (hw::MOUNT, hw::router()),
        (quotes::MOUNT, quotes::router()),
        (quiz1::MOUNT, quiz1::router()),
        (formdata::MOUNT, formdata::router()),
        (restaurant::MOUNT, restaurant::router()),
        (dadjokes::MOUNT, dadjokes::router()),
        (mini_insta::MOUNT, mini_insta::router()),
        (voter_analytics::MOUNT, voter_analytics::router()),
    ] {
        router = mount(router, prefix, app);
    }

    router
        .nest(runtracker::MOUNT, runtracker::router())
        .nest_service("/static", ServeDir::new(static_dir))
        .nest_service("/media", ServeDir::new(media_dir))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
}

/// Start the HTTP server on the configured address.
pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.bind_address();
    let app = create_server(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server running on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
