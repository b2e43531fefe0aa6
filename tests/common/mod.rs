#![allow(dead_code)]

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use cs412::config::Config;
use cs412::db::Database;
use cs412::server::create_server;
use cs412::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        let db = Database::open_in_memory()?;
        let state = AppState::new(db, Config::default());
        Ok(Self {
            router: create_server(state.clone()),
            state,
        })
    }

    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, axum::http::HeaderMap, String)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, headers, String::from_utf8(bytes.to_vec())?))
    }

    pub async fn get(&self, uri: &str) -> Result<(StatusCode, String)> {
        let (status, _, body) = self.send(Request::get(uri).body(Body::empty())?).await?;
        Ok((status, body))
    }

    pub async fn post_form(&self, uri: &str, form: &str) -> Result<(StatusCode, axum::http::HeaderMap, String)> {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))?;
        self.send(request).await
    }

    /// JSON request with an optional `X-Auth-Token`.
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("X-Auth-Token", token);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        let (status, _, text) = self.send(request).await?;
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        Ok((status, value))
    }
}
