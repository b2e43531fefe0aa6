//! Restaurant ordering demo: a landing page, an order form with a random daily
//! special, and an order confirmation that totals the checked items.

use askama::Template;
use axum::{
    response::IntoResponse,
    routing::{get, post},
    Form, Router,
};
use chrono::{DateTime, Duration, Local, TimeZone};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use tracing::info;

use crate::error::Result;
use crate::state::AppState;
use crate::templates::render;

pub const MOUNT: &str = "/restaurant";

pub const SPECIALS: [&str; 4] = [
    "Chicken Sandwich",
    "Philly Cheese Steak",
    "Veggie Burger",
    "Fish Sandwich",
];

/// Form field name and price, in menu order.
pub const MENU: [(&str, f64); 6] = [
    ("Hamburger", 8.99),
    ("Cheeseburger", 9.99),
    ("Fries", 3.99),
    ("Curly Fries", 4.99),
    ("Add veggies", 1.00),
    ("special", 10.99),
];

const SPECIAL_FIELD: &str = "special";

#[derive(Debug, Clone, PartialEq)]
pub struct OrderConfirmation {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub ordered_items: Vec<String>,
    pub total_price: f64,
    pub ready_time: String,
    pub instructions: String,
}

impl OrderConfirmation {
    /// Build a confirmation from raw form fields. Unchecked boxes are simply
    /// absent from the submission; an empty value counts as unchecked.
    pub fn from_fields<Tz: TimeZone>(
        fields: &HashMap<String, String>,
        now: &DateTime<Tz>,
        ready_in_minutes: i64,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let field = |key: &str, default: &str| {
            fields
                .get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let mut ordered_items = Vec::new();
        let mut total_price = 0.0;
        for (item, price) in MENU {
            let Some(value) = fields.get(item).filter(|v| !v.is_empty()) else {
                continue;
            };
            if item == SPECIAL_FIELD {
                ordered_items.push(format!("{value} (Daily Special)"));
            } else {
                ordered_items.push(item.to_string());
            }
            total_price += price;
        }

        let ready = now.clone() + Duration::minutes(ready_in_minutes);

        Self {
            name: field("name", "No Name Provided"),
            email: field("email", "No Email Provided"),
            phone: field("phone", "No Phone Provided"),
            ordered_items,
            total_price,
            ready_time: ready.format("%I:%M %p").to_string(),
            instructions: field("special_instructions", "").trim().to_string(),
        }
    }
}

pub fn daily_special<R: Rng>(rng: &mut R) -> &'static str {
    SPECIALS.choose(rng).copied().unwrap_or(SPECIALS[0])
}

#[derive(Template)]
#[template(path = "restaurant/main.html")]
struct MainTemplate;

#[derive(Template)]
#[template(path = "restaurant/order.html")]
struct OrderTemplate {
    special: &'static str,
    special_price: f64,
    items: Vec<MenuItem>,
}

struct MenuItem {
    name: &'static str,
    price: f64,
}

#[derive(Template)]
#[template(path = "restaurant/confirmation.html")]
struct ConfirmationTemplate {
    order: OrderConfirmation,
}

async fn main_page() -> Result<impl IntoResponse> {
    render(&MainTemplate)
}

async fn order() -> Result<impl IntoResponse> {
    let (items, special): (Vec<_>, Vec<_>) = MENU
        .iter()
        .map(|&(name, price)| MenuItem { name, price })
        .partition(|item| item.name != SPECIAL_FIELD);
    render(&OrderTemplate {
        special: daily_special(&mut rand::thread_rng()),
        special_price: special.first().map_or(0.0, |item| item.price),
        items,
    })
}

async fn confirmation(Form(fields): Form<HashMap<String, String>>) -> Result<impl IntoResponse> {
    let minutes = rand::thread_rng().gen_range(30..=60);
    let order = OrderConfirmation::from_fields(&fields, &Local::now(), minutes);
    info!(
        items = order.ordered_items.len(),
        total = order.total_price,
        "Order placed"
    );
    render(&ConfirmationTemplate { order })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(main_page))
        .route("/main", get(main_page))
        .route("/order", get(order))
        .route("/confirmation", post(confirmation))
}
