use askama::Template;
use axum::{
    response::{IntoResponse, Redirect},
    routing::get,
    Form, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::state::AppState;
use crate::templates::render;

pub const MOUNT: &str = "/formdata";

#[derive(Debug, Default, Deserialize)]
pub struct ColorForm {
    pub name: Option<String>,
    pub favorite_color: Option<String>,
}

#[derive(Template)]
#[template(path = "formdata/form.html")]
struct FormTemplate;

#[derive(Template)]
#[template(path = "formdata/confirmation.html")]
struct ConfirmationTemplate {
    name: String,
    favorite_color: String,
}

impl From<ColorForm> for ConfirmationTemplate {
    fn from(form: ColorForm) -> Self {
        Self {
            name: form.name.unwrap_or_else(|| "No Name Provided".to_string()),
            favorite_color: form
                .favorite_color
                .unwrap_or_else(|| "No Color Provided".to_string()),
        }
    }
}

async fn show_form() -> Result<impl IntoResponse> {
    render(&FormTemplate)
}

async fn submit(Form(form): Form<ColorForm>) -> Result<impl IntoResponse> {
    render(&ConfirmationTemplate::from(form))
}

// A bare GET on the submit URL has nothing to confirm.
async fn submit_without_form() -> Redirect {
    Redirect::to(MOUNT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show_form))
        .route("/submit", get(submit_without_form).post(submit))
}
