use askama::Template;
use axum::response::Html;

use crate::error::Result;

/// Render an askama template into an HTML response body.
pub fn render<T: Template>(template: &T) -> Result<Html<String>> {
    Ok(Html(template.render()?))
}

pub struct AppLink {
    pub name: &'static str,
    pub path: &'static str,
    pub blurb: &'static str,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub apps: Vec<AppLink>,
}
