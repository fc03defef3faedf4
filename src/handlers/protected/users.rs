// handlers/protected/users.rs - Panel user management
//
// GET    /api/users                     list (search + pagination done locally)
// POST   /api/users                     create
// GET    /api/users/:identifier         fetch one
// PATCH  /api/users/:identifier         update
// DELETE /api/users/:identifier         delete
// POST   /api/users/:identifier/reset   reset traffic
// POST   /api/users/:identifier/revoke  revoke subscription

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

use super::validate_identifier;
use crate::app::AppState;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::mapping::{apply_rules, CREATE_USER_RULES, UPDATE_USER_RULES};
use crate::models::user::validate_squads;
use crate::models::{UserCreate, UserResponse, UsersListResponse};
use crate::panel::PanelError;

/// Upper bound on users pulled from the panel for local search and stats.
pub const PANEL_FETCH_LIMIT: u32 = 1000;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub status: Option<String>,
}

impl ListUsersQuery {
    fn page(&self) -> Result<(usize, usize), ApiError> {
        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(ApiError::invalid_field("offset", "must be greater than or equal to 0"));
        }
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(ApiError::invalid_field("limit", format!("must be between 1 and {}", MAX_PAGE_SIZE)));
        }
        Ok((offset as usize, limit as usize))
    }
}

/**
 * GET /api/users - Page through panel users
 *
 * The panel has no username search, so up to PANEL_FETCH_LIMIT users are
 * fetched (status filter forwarded), filtered by case-insensitive username
 * substring, then sliced by offset/limit. `total` is the filtered count.
 */
pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<UsersListResponse>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let (offset, limit) = query.page()?;

    let status = query.status.as_deref().filter(|s| !s.is_empty());
    let result = state
        .panel
        .list_users(0, PANEL_FETCH_LIMIT, status)
        .await
        .map_err(|e| ApiError::upstream("fetch users", &e))?;

    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let matching: Vec<Value> = users_array(result)
        .into_iter()
        .filter(|user| match &needle {
            Some(needle) => user
                .get("username")
                .and_then(Value::as_str)
                .is_some_and(|name| name.to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .collect();

    let total = matching.len();
    let users = matching
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(UserResponse::from_panel)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(UsersListResponse { users, total }))
}

/// GET /api/users/:identifier
pub async fn get_user(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let identifier = validate_identifier(&identifier)?;
    let user = state
        .panel
        .get_user(identifier)
        .await
        .map_err(|e| not_found_or("fetch user", e))?;

    Ok(Json(UserResponse::from_panel(user)?))
}

/**
 * POST /api/users - Create a panel user
 *
 * Input is the Mini App form; `data_limit` and `expire` are renamed to the
 * panel's `trafficLimitBytes` / `expireAt`, null optionals are dropped.
 */
pub async fn create_user(
    State(state): State<AppState>,
    Extension(admin): Extension<Principal>,
    payload: Result<Json<UserCreate>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    if payload.username.trim().is_empty() {
        return Err(ApiError::invalid_field("username", "must not be empty"));
    }

    let body = apply_rules(payload.into_object(), CREATE_USER_RULES);
    validate_squads(&body)?;

    let created = state
        .panel
        .create_user(body)
        .await
        .map_err(|e| ApiError::upstream("create user", &e))?;
    let created = UserResponse::from_panel(created)?;

    info!("Admin {} created user {}", admin.id_label(), created.username);
    Ok(Json(created))
}

/**
 * PATCH /api/users/:identifier - Update a panel user
 *
 * The panel updates by uuid, so the current record is resolved first. A
 * record without a username or uuid is treated as missing.
 */
pub async fn update_user(
    State(state): State<AppState>,
    Extension(admin): Extension<Principal>,
    Path(identifier): Path<String>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let identifier = validate_identifier(&identifier)?;
    let Json(payload) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let current = state
        .panel
        .get_user(identifier)
        .await
        .map_err(|e| not_found_or("update user", e))?;

    let has_username = current
        .get("username")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.is_empty());
    let uuid = current
        .get("uuid")
        .and_then(Value::as_str)
        .filter(|uuid| !uuid.is_empty() && has_username)
        .ok_or_else(|| ApiError::not_found("User not found or username missing"))?;

    let body = apply_rules(payload, UPDATE_USER_RULES);
    validate_squads(&body)?;

    let updated = state
        .panel
        .update_user(uuid, body)
        .await
        .map_err(|e| not_found_or("update user", e))?;

    info!("Admin {} updated user {}", admin.id_label(), identifier);
    Ok(Json(UserResponse::from_panel(updated)?))
}

/// DELETE /api/users/:identifier
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(admin): Extension<Principal>,
    Path(identifier): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let identifier = validate_identifier(&identifier)?;
    state
        .panel
        .delete_user(identifier)
        .await
        .map_err(|e| not_found_or("delete user", e))?;

    info!("Admin {} deleted user {}", admin.id_label(), identifier);
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

/// POST /api/users/:identifier/reset
pub async fn reset_user_traffic(
    State(state): State<AppState>,
    Extension(admin): Extension<Principal>,
    Path(identifier): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let identifier = validate_identifier(&identifier)?;
    let data = state
        .panel
        .reset_user_traffic(identifier)
        .await
        .map_err(|e| not_found_or("reset traffic", e))?;

    info!("Admin {} reset traffic for user {}", admin.id_label(), identifier);
    Ok(Json(json!({ "message": "Traffic reset successfully", "data": data })))
}

/// POST /api/users/:identifier/revoke
pub async fn revoke_subscription(
    State(state): State<AppState>,
    Extension(admin): Extension<Principal>,
    Path(identifier): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let identifier = validate_identifier(&identifier)?;
    let data = state
        .panel
        .revoke_subscription(identifier)
        .await
        .map_err(|e| not_found_or("revoke subscription", e))?;

    info!("Admin {} revoked subscription for user {}", admin.id_label(), identifier);
    Ok(Json(json!({ "message": "Subscription revoked successfully", "data": data })))
}

/// `users` array of a panel list response; anything else reads as empty.
pub(crate) fn users_array(result: Value) -> Vec<Value> {
    match result {
        Value::Object(mut object) => match object.remove("users") {
            Some(Value::Array(users)) => users,
            _ => Vec::new(),
        },
        Value::Array(users) => users,
        _ => Vec::new(),
    }
}

fn not_found_or(action: &str, err: PanelError) -> ApiError {
    if err.is_not_found() {
        ApiError::not_found("User not found")
    } else {
        ApiError::upstream(action, &err)
    }
}
