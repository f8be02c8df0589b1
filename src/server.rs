//!
//! vendigo HTTP server
//! -------------------
//! Axum-based JSON API for the marketplace backend. Paths keep the mobile
//! client's trailing-slash forms.
//!
//! Responsibilities:
//! - Route table and shared state wiring.
//! - Caller resolution through the identity strategy chain; reads are public,
//!   writes require a resolved caller.
//! - Registration/login endpoints backed by the `identity` module.
//! - CRUD endpoints for catalog, orders, profiles, sellers and messages.
//! - Listener setup and startup logging.

use std::net::SocketAddr;

use anyhow::Context;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::identity::{self, Principal};
use crate::store::SharedStore;

pub mod accounts;
pub mod catalog;
pub mod messages;
pub mod orders;
pub mod profiles;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
}

/// Resolve the caller or fail with the standard anonymous-write refusal.
pub(crate) fn require_principal(store: &SharedStore, headers: &HeaderMap) -> AppResult<Principal> {
    match identity::resolve_principal(store, headers)? {
        Some(principal) => Ok(principal),
        None => Err(AppError::auth("auth", "Authentication credentials were not provided.")),
    }
}

pub(crate) fn not_found() -> AppError {
    AppError::not_found("not_found", "Not found.")
}

/// Start the vendigo HTTP server on the given port, backed by the SQLite
/// file at `db_path` (created on first run).
pub async fn run_with_port(http_port: u16, db_path: &str) -> anyhow::Result<()> {
    let store = SharedStore::open(db_path)
        .with_context(|| format!("While opening store at: {}", db_path))?;
    info!(target: "startup", "store ready at '{}'", db_path);

    let app = router(AppState { store });

    let addr: SocketAddr = format!("0.0.0.0:{}", http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Convenience entry point using the default port and database file.
pub async fn run() -> anyhow::Result<()> {
    run_with_port(8000, "vendigo.db").await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "vendigo ok" }))
        .route("/registro/", post(accounts::registro))
        .route("/login/", post(accounts::login))
        .route("/users/", get(accounts::list_users))
        .route("/users/{id}/", get(accounts::retrieve_user))
        .route("/user-profiles/me/", get(profiles::me_get).patch(profiles::me_patch))
        .route("/categorias/", get(catalog::list_categorias).post(catalog::create_categoria))
        .route(
            "/categorias/{id}/",
            get(catalog::retrieve_categoria)
                .patch(catalog::update_categoria)
                .delete(catalog::delete_categoria),
        )
        .route("/productos/", get(catalog::list_productos).post(catalog::create_producto))
        .route("/productos/por_categoria/{category_id}/", get(catalog::productos_por_categoria))
        .route(
            "/productos/{id}/",
            get(catalog::retrieve_producto)
                .patch(catalog::update_producto)
                .delete(catalog::delete_producto),
        )
        .route("/pedidos/", get(orders::list_pedidos).post(orders::create_pedido))
        .route(
            "/pedidos/{id}/",
            get(orders::retrieve_pedido)
                .patch(orders::update_pedido)
                .delete(orders::delete_pedido),
        )
        .route("/detalles/", get(orders::list_detalles).post(orders::create_detalle))
        .route(
            "/detalles/{id}/",
            get(orders::retrieve_detalle)
                .patch(orders::update_detalle)
                .delete(orders::delete_detalle),
        )
        .route("/vendedores/", get(messages::list_vendedores).post(messages::create_vendedor))
        .route(
            "/vendedores/{id}/",
            get(messages::retrieve_vendedor)
                .patch(messages::update_vendedor)
                .delete(messages::delete_vendedor),
        )
        .route("/mensajes/", get(messages::list_mensajes).post(messages::create_mensaje))
        .route(
            "/mensajes/{id}/",
            get(messages::retrieve_mensaje)
                .patch(messages::update_mensaje)
                .delete(messages::delete_mensaje),
        )
        .with_state(state)
}
