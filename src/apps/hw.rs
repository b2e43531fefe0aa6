//! Homework pages: a home and an about page filled with the current time and
//! a few random values.

use askama::Template;
use axum::{response::IntoResponse, routing::get, Router};
use chrono::{DateTime, Local, TimeZone};
use rand::Rng;

use crate::error::Result;
use crate::state::AppState;
use crate::templates::render;

pub const MOUNT: &str = "/hw";

/// `time.ctime()` layout, e.g. `Mon Oct  7 14:03:09 2024`.
pub const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    pub time: String,
    pub letter1: char,
    pub letter2: char,
    pub number: u32,
}

impl PageContext {
    pub fn generate<R: Rng, Tz: TimeZone>(rng: &mut R, now: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            time: now.format(CTIME_FORMAT).to_string(),
            letter1: random_letter(rng),
            letter2: random_letter(rng),
            number: rng.gen_range(1..=10),
        }
    }
}

fn random_letter<R: Rng>(rng: &mut R) -> char {
    char::from(rng.gen_range(b'A'..=b'Z'))
}

#[derive(Template)]
#[template(path = "hw/home.html")]
struct HomeTemplate {
    ctx: PageContext,
}

#[derive(Template)]
#[template(path = "hw/about.html")]
struct AboutTemplate {
    ctx: PageContext,
}

fn current_context() -> PageContext {
    PageContext::generate(&mut rand::thread_rng(), &Local::now())
}

async fn home_page() -> Result<impl IntoResponse> {
    render(&HomeTemplate {
        ctx: current_context(),
    })
}

async fn about() -> Result<impl IntoResponse> {
    render(&AboutTemplate {
        ctx: current_context(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home_page))
        .route("/about", get(about))
}
