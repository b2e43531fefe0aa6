use askama::Template;
use axum::{response::IntoResponse, routing::{get, post}, Form, Router};
use serde::Deserialize;

use crate::error::Result;
use crate::state::AppState;
use crate::templates::render;

pub const MOUNT: &str = "/quiz1";

const NO_ICE_CREAM: &str = "no ice cream provided";

#[derive(Debug, Default, Deserialize)]
pub struct IceCreamForm {
    pub ice_cream: Option<String>,
}

impl IceCreamForm {
    pub fn flavor(self) -> String {
        self.ice_cream.unwrap_or_else(|| NO_ICE_CREAM.to_string())
    }
}

#[derive(Template)]
#[template(path = "quiz1/main.html")]
struct MainTemplate;

#[derive(Template)]
#[template(path = "quiz1/display.html")]
struct DisplayTemplate {
    ice_cream: String,
}

async fn main_page() -> Result<impl IntoResponse> {
    render(&MainTemplate)
}

async fn submit_page(Form(form): Form<IceCreamForm>) -> Result<impl IntoResponse> {
    render(&DisplayTemplate {
        ice_cream: form.flavor(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(main_page))
        .route("/submit", post(submit_page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_flavor_uses_placeholder() {
        assert_eq!(IceCreamForm::default().flavor(), NO_ICE_CREAM);
        let form = IceCreamForm {
            ice_cream: Some("mint".into()),
        };
        assert_eq!(form.flavor(), "mint");
    }
}
