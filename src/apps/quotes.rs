//! Quote of the day: a random quote and photo of Del Water Gap.

use askama::Template;
use axum::{response::IntoResponse, routing::get, Router};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::Result;
use crate::state::AppState;
use crate::templates::render;

pub const MOUNT: &str = "/quotes";

pub const IMAGES: [&str; 4] = [
    "https://upload.wikimedia.org/wikipedia/commons/thumb/7/77/DWGNYC2020_%28cropped%29.jpg/960px-DWGNYC2020_%28cropped%29.jpg",
    "https://mp-admin.tps-dev.co.uk/wp-content/uploads/2023/09/MAINDelWaterGapAWEDIT1creditEricaSnydercopy.jpg",
    "https://cdn.grove.wgbh.org/7c/9d/a23817c1a1ec2654123eb1860e02/img-3718.jpg",
    "https://imgix.bustle.com/uploads/image/2023/9/21/31bf58cb-af97-4008-8b2a-c539e46e9b37-new-faces_-delwatergap.jpg?w=414&h=518&fit=crop&crop=focalpoint&dpr=2&fp-x=0.423&fp-y=0.2635",
];

pub const QUOTES: [&str; 4] = [
    "Therapy. Please y'all, call a therapist",
    "Call me Midas in reverse, ’cause everything I touch turns eventually to dirt.",
    "When we’re struggling—whether with anxiety, loneliness, or addiction—often we get this horrible solipsistic feeling, like, ‘No one else could possibly feel this bad.’ A lot of my recent work has come from that feeling, and it has been very cathartic to see it resonate with a lot of other people. It’s absolutely cathartic; it’s therapy that results from therapy. I’ll see my therapist, then I’ll go home and write a song.",
    "The magic is when a song stops being mine and starts belonging to everyone in the room.",
];

#[derive(Template)]
#[template(path = "quotes/quote_page.html")]
struct QuoteTemplate {
    display_quote: &'static str,
    display_image: &'static str,
}

#[derive(Template)]
#[template(path = "quotes/show_all_page.html")]
struct ShowAllTemplate {
    quotes: &'static [&'static str],
    images: &'static [&'static str],
}

#[derive(Template)]
#[template(path = "quotes/about_page.html")]
struct AboutTemplate;

/// Quote and image are drawn independently.
pub fn pick<R: Rng>(rng: &mut R) -> (&'static str, &'static str) {
    let quote = QUOTES.choose(rng).copied().unwrap_or(QUOTES[0]);
    let image = IMAGES.choose(rng).copied().unwrap_or(IMAGES[0]);
    (quote, image)
}

async fn quote_page() -> Result<impl IntoResponse> {
    let (display_quote, display_image) = pick(&mut rand::thread_rng());
    render(&QuoteTemplate {
        display_quote,
        display_image,
    })
}

async fn show_all_page() -> Result<impl IntoResponse> {
    render(&ShowAllTemplate {
        quotes: &QUOTES,
        images: &IMAGES,
    })
}

async fn about_page() -> Result<impl IntoResponse> {
    render(&AboutTemplate)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(quote_page))
        .route("/quote", get(quote_page))
        .route("/show_all", get(show_all_page))
        .route("/about", get(about_page))
}
