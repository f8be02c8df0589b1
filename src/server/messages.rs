//! Seller directory and chat message endpoints.
//!
//! Sellers are public profiles with no credentials; messages hang off a
//! seller, tag the client by bare numeric id, and may reference a product.
//! Deleting a product nulls that reference instead of dropping the message.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{not_found, require_principal, AppState};
use crate::error::AppResult;
use crate::store::catalog;
use crate::store::messages::{self, MensajeRecord, VendedorRecord};
use crate::validate::{self, Patch};

// ---- vendedores ----

fn vendedor_body(rec: &VendedorRecord) -> Value {
    json!({ "id": rec.id, "nombre": rec.nombre, "foto": rec.foto })
}

pub async fn list_vendedores(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let vendedores = state.store.with(messages::list_vendedores)?;
    Ok(Json(Value::Array(vendedores.iter().map(vendedor_body).collect())))
}

pub async fn retrieve_vendedor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let vendedor = state
        .store
        .with(|conn| messages::vendedor_by_id(conn, id))?
        .ok_or_else(not_found)?;
    Ok(Json(vendedor_body(&vendedor)))
}

pub async fn create_vendedor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    require_principal(&state.store, &headers)?;
    let fields = validate::body_object(&body)?;
    let nombre = validate::req_str(fields, "nombre")?;
    validate::max_len("nombre", &nombre, 100)?;
    let foto = validate::opt_str(fields, "foto")?;
    if let Some(f) = &foto {
        validate::max_len("foto", f, 100)?;
    }

    let rec = state
        .store
        .with(|conn| messages::insert_vendedor(conn, &nombre, foto.as_deref()))?;
    Ok((StatusCode::CREATED, Json(vendedor_body(&rec))))
}

pub async fn update_vendedor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    require_principal(&state.store, &headers)?;
    let fields = validate::body_object(&body)?;
    let nombre = validate::patch_str(fields, "nombre")?;
    if let Some(n) = &nombre {
        validate::max_len("nombre", n, 100)?;
    }
    let foto = validate::str_field(fields, "foto")?;
    if let Patch::Set(f) = &foto {
        validate::max_len("foto", f, 100)?;
    }

    let guard = state.store.0.lock();
    let conn = guard.conn();
    let mut rec = messages::vendedor_by_id(conn, id)?.ok_or_else(not_found)?;
    if let Some(n) = nombre {
        rec.nombre = n;
    }
    foto.apply(&mut rec.foto);
    messages::update_vendedor(conn, &rec)?;
    Ok(Json(vendedor_body(&rec)))
}

pub async fn delete_vendedor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    require_principal(&state.store, &headers)?;
    state.store.with(|conn| messages::delete_vendedor(conn, id))?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- mensajes ----

#[derive(Debug, Deserialize)]
pub struct MensajeQuery {
    pub vendedor: Option<i64>,
    pub producto: Option<String>,
}

fn mensaje_body(rec: &MensajeRecord) -> Value {
    json!({
        "id": rec.id,
        "vendedor": rec.vendedor_id,
        "cliente_id": rec.cliente_id,
        "producto": rec.producto_id,
        "texto": rec.texto,
        "fecha": rec.fecha,
        "es_vendedor": rec.es_vendedor,
    })
}

pub async fn list_mensajes(
    State(state): State<AppState>,
    Query(params): Query<MensajeQuery>,
) -> AppResult<Json<Value>> {
    let mensajes = state
        .store
        .with(|conn| messages::list_mensajes(conn, params.vendedor, params.producto.as_deref()))?;
    Ok(Json(Value::Array(mensajes.iter().map(mensaje_body).collect())))
}

pub async fn retrieve_mensaje(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let mensaje = state
        .store
        .with(|conn| messages::mensaje_by_id(conn, id))?
        .ok_or_else(not_found)?;
    Ok(Json(mensaje_body(&mensaje)))
}

pub async fn create_mensaje(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    require_principal(&state.store, &headers)?;
    let fields = validate::body_object(&body)?;

    let vendedor_id = validate::req_i64(fields, "vendedor")?;
    let cliente_id = validate::req_i64(fields, "cliente_id")?;
    let producto = validate::opt_str(fields, "producto")?;
    let texto = validate::req_str(fields, "texto")?;
    let es_vendedor = match validate::bool_field(fields, "es_vendedor")? {
        Patch::Missing => false,
        Patch::Null => {
            return Err(validate::field_err("es_vendedor", "This field may not be null."))
        }
        Patch::Set(b) => b,
    };

    let guard = state.store.0.lock();
    let conn = guard.conn();
    if messages::vendedor_by_id(conn, vendedor_id)?.is_none() {
        return Err(validate::field_err(
            "vendedor",
            format!("Invalid pk \"{vendedor_id}\" - object does not exist."),
        ));
    }
    if let Some(pid) = &producto {
        if catalog::producto_by_id(conn, pid)?.is_none() {
            return Err(validate::field_err(
                "producto",
                format!("Invalid pk \"{pid}\" - object does not exist."),
            ));
        }
    }
    let rec = messages::insert_mensaje(
        conn,
        vendedor_id,
        cliente_id,
        producto.as_deref(),
        &texto,
        es_vendedor,
    )?;
    Ok((StatusCode::CREATED, Json(mensaje_body(&rec))))
}

pub async fn update_mensaje(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    require_principal(&state.store, &headers)?;
    let fields = validate::body_object(&body)?;

    let vendedor = validate::i64_field(fields, "vendedor")?;
    let cliente_id = validate::i64_field(fields, "cliente_id")?;
    let producto = validate::str_field(fields, "producto")?;
    let texto = validate::patch_str(fields, "texto")?;
    let es_vendedor = validate::bool_field(fields, "es_vendedor")?;

    let guard = state.store.0.lock();
    let conn = guard.conn();
    let mut rec = messages::mensaje_by_id(conn, id)?.ok_or_else(not_found)?;
    match vendedor {
        Patch::Missing => {}
        Patch::Null => return Err(validate::field_err("vendedor", "This field may not be null.")),
        Patch::Set(vid) => {
            if messages::vendedor_by_id(conn, vid)?.is_none() {
                return Err(validate::field_err(
                    "vendedor",
                    format!("Invalid pk \"{vid}\" - object does not exist."),
                ));
            }
            rec.vendedor_id = vid;
        }
    }
    cliente_id.apply_required("cliente_id", &mut rec.cliente_id)?;
    match producto {
        Patch::Missing => {}
        Patch::Null => rec.producto_id = None,
        Patch::Set(pid) => {
            if catalog::producto_by_id(conn, &pid)?.is_none() {
                return Err(validate::field_err(
                    "producto",
                    format!("Invalid pk \"{pid}\" - object does not exist."),
                ));
            }
            rec.producto_id = Some(pid);
        }
    }
    if let Some(t) = texto {
        rec.texto = t;
    }
    es_vendedor.apply_required("es_vendedor", &mut rec.es_vendedor)?;
    // fecha stays as created.
    messages::update_mensaje(conn, &rec)?;
    Ok(Json(mensaje_body(&rec)))
}

pub async fn delete_mensaje(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    require_principal(&state.store, &headers)?;
    state.store.with(|conn| messages::delete_mensaje(conn, id))?;
    Ok(StatusCode::NO_CONTENT)
}
