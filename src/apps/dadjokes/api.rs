use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::models::{self, Contribution, ContributionInput, Joke, JokeInput, Order, Picture, PictureInput};
use crate::error::{ApiResult, AppError};
use crate::extract::ApiJson;
use crate::state::AppState;

async fn random_item<T: Contribution + serde::Serialize>(state: AppState) -> ApiResult<Json<T>> {
    let item = models::random::<T, _>(&*state.db.conn()?, &mut rand::thread_rng())?
        .ok_or(AppError::NotFound(T::LABEL))?;
    Ok(Json(item))
}

pub async fn random_joke(State(state): State<AppState>) -> ApiResult<Json<Joke>> {
    random_item(state).await
}

pub async fn random_picture(State(state): State<AppState>) -> ApiResult<Json<Picture>> {
    random_item(state).await
}

pub async fn list_jokes(State(state): State<AppState>) -> ApiResult<Json<Vec<Joke>>> {
    Ok(Json(models::all(&*state.db.conn()?, Order::Id)?))
}

pub async fn create_joke(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<JokeInput>,
) -> ApiResult<impl IntoResponse> {
    let joke: Joke = models::create(&*state.db.conn()?, input.into())?;
    Ok((StatusCode::CREATED, Json(joke)))
}

pub async fn list_pictures(State(state): State<AppState>) -> ApiResult<Json<Vec<Picture>>> {
    Ok(Json(models::all(&*state.db.conn()?, Order::Id)?))
}

async fn fetch<T: Contribution + serde::Serialize>(state: AppState, pk: i64) -> ApiResult<Json<T>> {
    let item = models::get::<T>(&*state.db.conn()?, pk)?.ok_or(AppError::NotFound(T::LABEL))?;
    Ok(Json(item))
}

async fn modify<T: Contribution + serde::Serialize>(
    state: AppState,
    pk: i64,
    input: ContributionInput,
) -> ApiResult<Json<T>> {
    let item = models::update::<T>(&*state.db.conn()?, pk, input)?.ok_or(AppError::NotFound(T::LABEL))?;
    Ok(Json(item))
}

async fn remove<T: Contribution>(state: AppState, pk: i64) -> ApiResult<StatusCode> {
    if models::delete::<T>(&*state.db.conn()?, pk)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(T::LABEL).into())
    }
}

pub async fn get_joke(State(state): State<AppState>, Path(pk): Path<i64>) -> ApiResult<Json<Joke>> {
    fetch(state, pk).await
}

pub async fn update_joke(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    ApiJson(input): ApiJson<JokeInput>,
) -> ApiResult<Json<Joke>> {
    modify(state, pk, input.into()).await
}

pub async fn delete_joke(State(state): State<AppState>, Path(pk): Path<i64>) -> ApiResult<StatusCode> {
    remove::<Joke>(state, pk).await
}

pub async fn get_picture(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> ApiResult<Json<Picture>> {
    fetch(state, pk).await
}

pub async fn update_picture(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    ApiJson(input): ApiJson<PictureInput>,
) -> ApiResult<Json<Picture>> {
    modify(state, pk, input.into()).await
}

pub async fn delete_picture(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> ApiResult<StatusCode> {
    remove::<Picture>(state, pk).await
}
