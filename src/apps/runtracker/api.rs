use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::auth::MaybeUser;
use super::models::{self, Badge, Group, GroupInput, Membership, NearbyRun, ProfileStats, Run, RunInput};
use crate::error::{ApiResult, AppError};
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(creds): ApiJson<Credentials>,
) -> ApiResult<Json<TokenResponse>> {
    let conn = state.db.conn()?;
    let user = models::authenticate(&conn, &creds.username, &creds.password)?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;
    let token = models::get_or_create_token(&conn, user.id)?;
    Ok(Json(TokenResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(creds): ApiJson<Credentials>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.conn()?;
    let user = models::create_user(&mut conn, &creds.username, &creds.password, &creds.email)?;
    let token = models::get_or_create_token(&conn, user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token,
            user_id: user.id,
            username: user.username,
        }),
    ))
}

// Runs

pub async fn list_runs(State(state): State<AppState>, caller: MaybeUser) -> ApiResult<Json<Vec<Run>>> {
    let runs = match caller.id() {
        Some(id) => models::runs_for_user(&*state.db.conn()?, id)?,
        None => Vec::new(),
    };
    Ok(Json(runs))
}

pub async fn create_run(
    State(state): State<AppState>,
    caller: MaybeUser,
    ApiJson(input): ApiJson<RunInput>,
) -> ApiResult<impl IntoResponse> {
    let user = caller.require()?;
    let mut conn = state.db.conn()?;
    let recorded = models::record_run(&mut conn, user.id, input)?;
    info!(
        "{} recorded run {} ({} km)",
        user.username, recorded.run.id, recorded.run.distance_km
    );
    Ok((StatusCode::CREATED, Json(recorded.run)))
}

pub async fn get_run(State(state): State<AppState>, Path(pk): Path<i64>) -> ApiResult<Json<Run>> {
    Ok(Json(models::require_run(&*state.db.conn()?, pk)?))
}

fn check_owner(caller: MaybeUser, owner_id: i64, action: &str) -> ApiResult<()> {
    let user = caller.require()?;
    if user.id != owner_id {
        return Err(AppError::Forbidden(format!("Only the owner can {action} this run.")).into());
    }
    Ok(())
}

pub async fn update_run(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    caller: MaybeUser,
    ApiJson(input): ApiJson<RunInput>,
) -> ApiResult<Json<Run>> {
    let mut conn = state.db.conn()?;
    let run = models::require_run(&conn, pk)?;
    check_owner(caller, run.user.id, "edit")?;
    Ok(Json(models::update_run(&mut conn, pk, input)?))
}

pub async fn delete_run(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    caller: MaybeUser,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.conn()?;
    let run = models::require_run(&conn, pk)?;
    check_owner(caller, run.user.id, "delete")?;
    models::delete_run(&mut conn, pk)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn profile(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<ProfileStats>> {
    let stats = models::profile_stats(&*state.db.conn()?, user_id)?.ok_or(AppError::NotFound("Profile"))?;
    Ok(Json(stats))
}

pub async fn nearby(State(state): State<AppState>, Path(run_id): Path<i64>) -> ApiResult<Response> {
    let threshold = state.config.runtracker.proximity_threshold_meters;
    match models::nearby_runs(&*state.db.conn()?, run_id, threshold) {
        Ok(runs) => Ok(Json::<Vec<NearbyRun>>(runs).into_response()),
        Err(AppError::NotFound(_)) => Ok(not_found("Run not found")),
        Err(e) => Err(e.into()),
    }
}

fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
}

// Groups

pub async fn list_groups(State(state): State<AppState>, caller: MaybeUser) -> ApiResult<Json<Vec<Group>>> {
    Ok(Json(models::all_groups(&*state.db.conn()?, caller.id())?))
}

pub async fn create_group(
    State(state): State<AppState>,
    caller: MaybeUser,
    ApiJson(input): ApiJson<GroupInput>,
) -> ApiResult<impl IntoResponse> {
    let user = caller.require()?;
    let mut conn = state.db.conn()?;
    let group = models::create_group(&mut conn, user.id, &input)?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn get_group(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    caller: MaybeUser,
) -> ApiResult<Json<Group>> {
    Ok(Json(models::require_group(&*state.db.conn()?, pk, caller.id())?))
}

fn check_creator(group: &Group, action: &str) -> ApiResult<()> {
    if group.is_creator {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Only the group creator can {action} this group!")).into())
    }
}

pub async fn update_group(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    caller: MaybeUser,
    ApiJson(input): ApiJson<GroupInput>,
) -> ApiResult<Json<Group>> {
    let user = caller.require()?;
    let conn = state.db.conn()?;
    let group = models::require_group(&conn, pk, Some(user.id))?;
    check_creator(&group, "edit")?;
    Ok(Json(models::update_group(&conn, pk, &input, Some(user.id))?))
}

pub async fn delete_group(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    caller: MaybeUser,
) -> ApiResult<StatusCode> {
    let user = caller.require()?;
    let conn = state.db.conn()?;
    let group = models::require_group(&conn, pk, Some(user.id))?;
    check_creator(&group, "delete")?;
    models::delete_group(&conn, pk)?;
    info!("{} deleted group {}", user.username, pk);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn group_members(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
    caller: MaybeUser,
) -> ApiResult<Json<Vec<Membership>>> {
    Ok(Json(models::members(&*state.db.conn()?, group_id, caller.id())?))
}

#[derive(Debug, Deserialize)]
pub struct AddMember {
    pub user_id: Option<i64>,
}

pub async fn add_member(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
    caller: MaybeUser,
    ApiJson(body): ApiJson<AddMember>,
) -> ApiResult<Response> {
    let user = caller.require()?;
    let conn = state.db.conn()?;
    models::require_group(&conn, group_id, Some(user.id))?;
    if !models::is_member(&conn, group_id, user.id)? {
        return Err(AppError::Forbidden("only group members can invite others!".into()).into());
    }
    let invitee = match body.user_id {
        Some(id) => models::get_user(&conn, id)?,
        None => None,
    }
    .ok_or(AppError::NotFound("User"))?;

    let response = if models::add_member(&conn, group_id, invitee.id)? {
        info!("{} added {} to group {}", user.username, invitee.username, group_id);
        (StatusCode::CREATED, Json(json!({ "message": "Member added successfully" })))
    } else {
        (StatusCode::OK, Json(json!({ "message": "User is already a member" })))
    };
    Ok(response.into_response())
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(i64, i64)>,
    caller: MaybeUser,
) -> ApiResult<Response> {
    let user = caller.require()?;
    let conn = state.db.conn()?;
    let group = models::require_group(&conn, group_id, Some(user.id))?;
    if !group.is_creator {
        return Err(AppError::Forbidden("Only the group creator can remove members".into()).into());
    }
    if models::remove_member(&conn, group_id, user_id)? {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(not_found("User is not a member of this group"))
    }
}

// Badges

pub async fn list_badges(State(state): State<AppState>) -> ApiResult<Json<Vec<Badge>>> {
    Ok(Json(models::all_badges(&*state.db.conn()?)?))
}

pub async fn get_badge(State(state): State<AppState>, Path(pk): Path<i64>) -> ApiResult<Json<Badge>> {
    let badge = models::get_badge(&*state.db.conn()?, pk)?.ok_or(AppError::NotFound("Badge"))?;
    Ok(Json(badge))
}

