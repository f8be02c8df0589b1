//! Profile endpoint tests: lazy creation, partial updates and the binding of
//! the row to the authenticated caller.

use anyhow::Result;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use vendigo::server::{profiles, AppState};
use vendigo::store::SharedStore;

fn state() -> AppState {
    AppState { store: SharedStore::in_memory().expect("in-memory store") }
}

fn seed_user(state: &AppState, username: &str, email: &str) -> i64 {
    state
        .store
        .with(|conn| vendigo::store::accounts::insert_user(conn, username, email, "x", "", ""))
        .expect("seed user")
        .id
}

fn auth(id: i64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-user-id", id.to_string().parse().expect("header value"));
    headers
}

#[tokio::test]
async fn profile_requires_a_caller() -> Result<()> {
    let state = state();

    let err = profiles::me_get(State(state.clone()), HeaderMap::new()).await.unwrap_err();
    assert_eq!(err.http_status(), 401);
    assert_eq!(err.message(), "Authentication credentials were not provided.");

    let err = profiles::me_patch(State(state.clone()), HeaderMap::new(), Json(json!({ "phone": "1" })))
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 401);
    Ok(())
}

#[tokio::test]
async fn first_read_creates_the_row_with_defaults() -> Result<()> {
    let state = state();
    let uid = seed_user(&state, "ana", "ana@x.com");

    let Json(profile) = profiles::me_get(State(state.clone()), auth(uid)).await?;
    assert_eq!(
        profile,
        json!({
            "user": uid,
            "phone": null,
            "address": null,
            "member_since": null,
            "rating": "0.00",
            "products_sold": 0,
        })
    );
    Ok(())
}

#[tokio::test]
async fn patch_merges_and_clears_fields() -> Result<()> {
    let state = state();
    let uid = seed_user(&state, "ana", "ana@x.com");

    profiles::me_patch(
        State(state.clone()),
        auth(uid),
        Json(json!({ "phone": "555-0101", "address": "Calle 10 #4" })),
    )
    .await?;

    let Json(after) = profiles::me_patch(
        State(state.clone()),
        auth(uid),
        Json(json!({ "address": null, "rating": "4.75", "products_sold": 12 })),
    )
    .await?;
    assert_eq!(after["phone"], "555-0101");
    assert_eq!(after["address"], Value::Null);
    assert_eq!(after["rating"], "4.75");
    assert_eq!(after["products_sold"], 12);
    Ok(())
}

#[tokio::test]
async fn payload_user_key_cannot_move_the_row() -> Result<()> {
    let state = state();
    let ana = seed_user(&state, "ana", "ana@x.com");
    let bob = seed_user(&state, "bob", "bob@x.com");

    let Json(updated) = profiles::me_patch(
        State(state.clone()),
        auth(ana),
        Json(json!({ "user": bob, "phone": "555-0101" })),
    )
    .await?;
    assert_eq!(updated["user"], ana);
    assert_eq!(updated["phone"], "555-0101");

    // Bob's profile is untouched by Ana's attempt.
    let Json(bobs) = profiles::me_get(State(state.clone()), auth(bob)).await?;
    assert_eq!(bobs["user"], bob);
    assert_eq!(bobs["phone"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn field_bounds_are_enforced() -> Result<()> {
    let state = state();
    let uid = seed_user(&state, "ana", "ana@x.com");

    let err = profiles::me_patch(
        State(state.clone()),
        auth(uid),
        Json(json!({ "rating": "12.3" })),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code_str(), "rating");
    assert_eq!(err.message(), "Ensure that there are no more than 1 digits before the decimal point.");

    let err = profiles::me_patch(
        State(state.clone()),
        auth(uid),
        Json(json!({ "rating": "0.756" })),
    )
    .await
    .unwrap_err();
    assert_eq!(err.message(), "Ensure that there are no more than 2 decimal places.");

    let err = profiles::me_patch(
        State(state.clone()),
        auth(uid),
        Json(json!({ "phone": "123456789012345678901" })),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code_str(), "phone");
    assert_eq!(err.message(), "Ensure this field has no more than 20 characters.");
    Ok(())
}
