//! The authenticated caller's profile: created lazily, updated partially,
//! and always bound to the caller no matter what the payload claims.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use super::{require_principal, AppState};
use crate::error::AppResult;
use crate::store::profiles::{self, ProfileRecord};
use crate::validate::{self, Patch};

fn profile_body(rec: &ProfileRecord) -> Value {
    json!({
        "user": rec.user_id,
        "phone": rec.phone,
        "address": rec.address,
        "member_since": rec.member_since,
        "rating": rec.rating.map(|d| d.to_string()),
        "products_sold": rec.products_sold,
    })
}

pub async fn me_get(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<Value>> {
    let principal = require_principal(&state.store, &headers)?;
    let profile = state
        .store
        .with(|conn| profiles::get_or_create_profile(conn, principal.id))?;
    Ok(Json(profile_body(&profile)))
}

pub async fn me_patch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let principal = require_principal(&state.store, &headers)?;
    let fields = validate::body_object(&body)?;

    let phone = validate::str_field(fields, "phone")?;
    if let Patch::Set(v) = &phone {
        validate::max_len("phone", v, 20)?;
    }
    let address = validate::str_field(fields, "address")?;
    if let Patch::Set(v) = &address {
        validate::max_len("address", v, 255)?;
    }
    let member_since = validate::str_field(fields, "member_since")?;
    if let Patch::Set(v) = &member_since {
        validate::max_len("member_since", v, 100)?;
    }
    let rating = validate::dec_field(fields, "rating", 3, 2)?;
    let products_sold = validate::i64_field(fields, "products_sold")?;
    // A `user` key in the payload is ignored; the row stays bound to the caller.

    let guard = state.store.0.lock();
    let conn = guard.conn();
    let mut profile = profiles::get_or_create_profile(conn, principal.id)?;
    phone.apply(&mut profile.phone);
    address.apply(&mut profile.address);
    member_since.apply(&mut profile.member_since);
    rating.apply(&mut profile.rating);
    products_sold.apply(&mut profile.products_sold);
    profiles::update_profile(conn, &profile)?;
    Ok(Json(profile_body(&profile)))
}
