//! Registration, login and the public account listing.
//!
//! The mobile client expects `/registro/` and `/login/` failures flattened to
//! a single `error` key, unlike the rest of the API.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use super::{not_found, AppState};
use crate::error::{AppError, AppResult};
use crate::identity;
use crate::store::accounts::{self, UserRecord};
use crate::validate;

fn user_public(rec: &UserRecord) -> Value {
    json!({
        "id": rec.id,
        "username": rec.username,
        "first_name": rec.first_name,
        "last_name": rec.last_name,
        "email": rec.email,
    })
}

fn flatten(err: AppError) -> Response {
    match err {
        err @ AppError::UserInput { .. } => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": err.message() }))).into_response()
        }
        other => other.into_response(),
    }
}

pub async fn registro(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let outcome =
        validate::body_object(&body).and_then(|fields| identity::register(&state.store, fields));
    match outcome {
        Ok(()) => (
            StatusCode::CREATED,
            Json(json!({ "message": "Usuario creado correctamente." })),
        )
            .into_response(),
        Err(err) => flatten(err),
    }
}

pub async fn login(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let outcome =
        validate::body_object(&body).and_then(|fields| identity::login(&state.store, fields));
    match outcome {
        Ok(success) => {
            let mut resp = json!({ "token": success.token, "user": success.principal });
            if let Some(warning) = success.warning {
                resp["warning"] = json!(warning);
            }
            Json(resp).into_response()
        }
        Err(err) => flatten(err),
    }
}

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let users = state.store.with(accounts::list_users)?;
    Ok(Json(Value::Array(users.iter().map(user_public).collect())))
}

pub async fn retrieve_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let user = state
        .store
        .with(|conn| accounts::user_by_id(conn, id))?
        .ok_or_else(not_found)?;
    Ok(Json(user_public(&user)))
}
