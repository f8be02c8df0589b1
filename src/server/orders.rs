//! Order and line-item endpoints.
//!
//! Orders carry the ledger rule: the stored total and the creation timestamp
//! are fixed when the order is created, and no later write changes them. Line
//! items hold a bare product id, so a product deleted afterwards reads back
//! as a line with a null name rather than an error.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use super::{not_found, require_principal, AppState};
use crate::error::{AppError, AppResult};
use crate::store::catalog;
use crate::store::orders::{self, DetalleRecord, PedidoRecord};
use crate::store::{StoreError, StoreResult};
use crate::validate::{self, Patch};

const ESTADOS: &[&str] = &["Pendiente", "Completado", "Cancelado"];

fn duplicate_line() -> AppError {
    AppError::conflict("non_field_errors", "The fields pedido, producto must make a unique set.")
}

// ---- pedidos ----

fn pedido_write_body(rec: &PedidoRecord) -> Value {
    json!({ "id": rec.id, "estado": rec.estado, "comentario": rec.comentario })
}

fn detalle_read_body(rec: &DetalleRecord, producto_nombre: Option<&str>) -> Value {
    json!({
        "producto": rec.producto_id,
        "producto_nombre": producto_nombre,
        "cantidad": rec.cantidad,
        "precio_unidad": rec.precio_unidad.to_string(),
    })
}

fn pedido_read_body(conn: &Connection, rec: &PedidoRecord) -> StoreResult<Value> {
    let detalles = orders::detalles_for_pedido(conn, rec.id)?;
    Ok(json!({
        "id": rec.id,
        "fecha_pedido": rec.fecha_pedido,
        "monto_total": rec.monto_total.to_string(),
        "estado": rec.estado,
        "comentario": rec.comentario,
        "detalles": detalles
            .iter()
            .map(|(d, nombre)| detalle_read_body(d, nombre.as_deref()))
            .collect::<Vec<_>>(),
    }))
}

pub async fn list_pedidos(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let guard = state.store.0.lock();
    let conn = guard.conn();
    let pedidos = orders::list_pedidos(conn)?;
    let mut out = Vec::with_capacity(pedidos.len());
    for p in &pedidos {
        out.push(pedido_read_body(conn, p)?);
    }
    Ok(Json(Value::Array(out)))
}

pub async fn retrieve_pedido(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let guard = state.store.0.lock();
    let conn = guard.conn();
    let pedido = orders::pedido_by_id(conn, id)?.ok_or_else(not_found)?;
    Ok(Json(pedido_read_body(conn, &pedido)?))
}

pub async fn create_pedido(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    require_principal(&state.store, &headers)?;
    let fields = validate::body_object(&body)?;

    let estado = match validate::str_field(fields, "estado")? {
        Patch::Missing => "Pendiente".to_string(),
        Patch::Null => return Err(validate::field_err("estado", "This field may not be null.")),
        Patch::Set(v) => {
            validate::check_choice("estado", &v, ESTADOS)?;
            v
        }
    };
    let comentario = validate::opt_str(fields, "comentario")?;
    // The total is accepted here only; later order writes never touch it.
    let monto_total = validate::dec_field(fields, "monto_total", 10, 2)?
        .into_option()
        .unwrap_or_else(|| Decimal::new(0, 2));

    let pedido = state
        .store
        .with(|conn| orders::insert_pedido(conn, monto_total, &estado, comentario.as_deref()))?;
    Ok((StatusCode::CREATED, Json(pedido_write_body(&pedido))))
}

pub async fn update_pedido(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    require_principal(&state.store, &headers)?;
    let fields = validate::body_object(&body)?;
    let estado = match validate::str_field(fields, "estado")? {
        Patch::Missing => None,
        Patch::Null => return Err(validate::field_err("estado", "This field may not be null.")),
        Patch::Set(v) => {
            validate::check_choice("estado", &v, ESTADOS)?;
            Some(v)
        }
    };
    let comentario = validate::str_field(fields, "comentario")?;

    let guard = state.store.0.lock();
    let conn = guard.conn();
    let mut pedido = orders::pedido_by_id(conn, id)?.ok_or_else(not_found)?;
    if let Some(v) = estado {
        pedido.estado = v;
    }
    comentario.apply(&mut pedido.comentario);
    orders::update_pedido(conn, pedido.id, &pedido.estado, pedido.comentario.as_deref())?;
    Ok(Json(pedido_write_body(&pedido)))
}

pub async fn delete_pedido(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    require_principal(&state.store, &headers)?;
    state.store.with(|conn| orders::delete_pedido(conn, id))?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- detalles ----

fn detalle_write_body(rec: &DetalleRecord) -> Value {
    json!({
        "id": rec.id,
        "pedido": rec.pedido_id,
        "producto": rec.producto_id,
        "cantidad": rec.cantidad,
        "precio_unidad": rec.precio_unidad.to_string(),
    })
}

pub async fn list_detalles(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let guard = state.store.0.lock();
    let conn = guard.conn();
    let detalles = orders::list_detalles(conn)?;
    let mut out = Vec::with_capacity(detalles.len());
    for d in &detalles {
        let nombre = catalog::producto_by_id(conn, &d.producto_id)?.map(|p| p.product_name);
        out.push(detalle_read_body(d, nombre.as_deref()));
    }
    Ok(Json(Value::Array(out)))
}

pub async fn retrieve_detalle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let guard = state.store.0.lock();
    let conn = guard.conn();
    let detalle = orders::detalle_by_id(conn, id)?.ok_or_else(not_found)?;
    let nombre = catalog::producto_by_id(conn, &detalle.producto_id)?.map(|p| p.product_name);
    Ok(Json(detalle_read_body(&detalle, nombre.as_deref())))
}

pub async fn create_detalle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    require_principal(&state.store, &headers)?;
    let fields = validate::body_object(&body)?;

    let pedido_id = validate::req_i64(fields, "pedido")?;
    let producto_id = validate::req_str(fields, "producto")?;
    let cantidad = validate::req_i64(fields, "cantidad")?;
    let precio_unidad = validate::req_dec(fields, "precio_unidad", 10, 2)?;

    let guard = state.store.0.lock();
    let conn = guard.conn();
    if orders::pedido_by_id(conn, pedido_id)?.is_none() {
        return Err(validate::field_err(
            "pedido",
            format!("Invalid pk \"{pedido_id}\" - object does not exist."),
        ));
    }
    if catalog::producto_by_id(conn, &producto_id)?.is_none() {
        return Err(validate::field_err(
            "producto",
            format!("Invalid pk \"{producto_id}\" - object does not exist."),
        ));
    }
    let rec = match orders::insert_detalle(conn, pedido_id, &producto_id, cantidad, precio_unidad) {
        Ok(rec) => rec,
        Err(StoreError::UniqueViolation { .. }) => return Err(duplicate_line()),
        Err(e) => return Err(e.into()),
    };
    Ok((StatusCode::CREATED, Json(detalle_write_body(&rec))))
}

pub async fn update_detalle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    require_principal(&state.store, &headers)?;
    let fields = validate::body_object(&body)?;

    let pedido = validate::i64_field(fields, "pedido")?;
    let producto = validate::str_field(fields, "producto")?;
    let cantidad = validate::i64_field(fields, "cantidad")?;
    let precio = validate::dec_field(fields, "precio_unidad", 10, 2)?;

    let guard = state.store.0.lock();
    let conn = guard.conn();
    let mut rec = orders::detalle_by_id(conn, id)?.ok_or_else(not_found)?;
    match pedido {
        Patch::Missing => {}
        Patch::Null => return Err(validate::field_err("pedido", "This field may not be null.")),
        Patch::Set(pid) => {
            if orders::pedido_by_id(conn, pid)?.is_none() {
                return Err(validate::field_err(
                    "pedido",
                    format!("Invalid pk \"{pid}\" - object does not exist."),
                ));
            }
            rec.pedido_id = pid;
        }
    }
    match producto {
        Patch::Missing => {}
        Patch::Null => return Err(validate::field_err("producto", "This field may not be null.")),
        Patch::Set(prod) => {
            if catalog::producto_by_id(conn, &prod)?.is_none() {
                return Err(validate::field_err(
                    "producto",
                    format!("Invalid pk \"{prod}\" - object does not exist."),
                ));
            }
            rec.producto_id = prod;
        }
    }
    cantidad.apply_required("cantidad", &mut rec.cantidad)?;
    precio.apply_required("precio_unidad", &mut rec.precio_unidad)?;
    match orders::update_detalle(conn, &rec) {
        Ok(()) => {}
        Err(StoreError::UniqueViolation { .. }) => return Err(duplicate_line()),
        Err(e) => return Err(e.into()),
    }
    Ok(Json(detalle_write_body(&rec)))
}

pub async fn delete_detalle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    require_principal(&state.store, &headers)?;
    state.store.with(|conn| orders::delete_detalle(conn, id))?;
    Ok(StatusCode::NO_CONTENT)
}
