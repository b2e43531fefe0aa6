use askama::Template;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use super::models::{self, Joke, Order, Picture};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::templates::render;

#[derive(Template)]
#[template(path = "dadjokes/random.html")]
struct RandomTemplate {
    joke: Option<Joke>,
    picture: Option<Picture>,
}

#[derive(Template)]
#[template(path = "dadjokes/joke_list.html")]
struct JokeListTemplate {
    jokes: Vec<Joke>,
}

#[derive(Template)]
#[template(path = "dadjokes/picture_list.html")]
struct PictureListTemplate {
    pictures: Vec<Picture>,
}

#[derive(Template)]
#[template(path = "dadjokes/joke_detail.html")]
struct JokeDetailTemplate {
    joke: Joke,
}

#[derive(Template)]
#[template(path = "dadjokes/picture_detail.html")]
struct PictureDetailTemplate {
    picture: Picture,
}

pub async fn random_page(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let template = {
        let conn = state.db.conn()?;
        let mut rng = rand::thread_rng();
        RandomTemplate {
            joke: models::random(&conn, &mut rng)?,
            picture: models::random(&conn, &mut rng)?,
        }
    };
    render(&template)
}

pub async fn joke_list(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let jokes = models::all(&*state.db.conn()?, Order::NewestFirst)?;
    render(&JokeListTemplate { jokes })
}

pub async fn picture_list(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let pictures = models::all(&*state.db.conn()?, Order::NewestFirst)?;
    render(&PictureListTemplate { pictures })
}

pub async fn joke_detail(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<impl IntoResponse> {
    let joke = models::get(&*state.db.conn()?, pk)?.ok_or(AppError::NotFound("Joke"))?;
    render(&JokeDetailTemplate { joke })
}

pub async fn picture_detail(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<impl IntoResponse> {
    let picture = models::get(&*state.db.conn()?, pk)?.ok_or(AppError::NotFound("Picture"))?;
    render(&PictureDetailTemplate { picture })
}
