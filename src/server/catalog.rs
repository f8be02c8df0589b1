//! Catalog endpoints: categories, products and the product gallery.
//!
//! Products keep the storefront's read/write split: list and retrieve return
//! the nested category and gallery, while create and update accept and echo
//! the flat form with the category as a bare id.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{not_found, require_principal, AppState};
use crate::error::AppResult;
use crate::store::catalog::{self, CategoriaRecord, ProductoRecord};
use crate::store::StoreResult;
use crate::validate::{self, Patch};

// ---- categorias ----

fn categoria_body(rec: &CategoriaRecord) -> Value {
    json!({ "category_id": rec.category_id, "category_name": rec.category_name })
}

pub async fn list_categorias(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let cats = state.store.with(catalog::list_categorias)?;
    Ok(Json(Value::Array(cats.iter().map(categoria_body).collect())))
}

pub async fn create_categoria(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    require_principal(&state.store, &headers)?;
    let fields = validate::body_object(&body)?;
    let category_id = validate::req_str(fields, "category_id")?;
    validate::max_len("category_id", &category_id, 36)?;
    let category_name = validate::req_str(fields, "category_name")?;
    validate::max_len("category_name", &category_name, 40)?;

    let guard = state.store.0.lock();
    let conn = guard.conn();
    if catalog::categoria_by_id(conn, &category_id)?.is_some() {
        return Err(validate::field_err("category_id", "This field must be unique."));
    }
    let rec = CategoriaRecord { category_id, category_name };
    catalog::insert_categoria(conn, &rec)?;
    Ok((StatusCode::CREATED, Json(categoria_body(&rec))))
}

pub async fn retrieve_categoria(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let cat = state
        .store
        .with(|conn| catalog::categoria_by_id(conn, &id))?
        .ok_or_else(not_found)?;
    Ok(Json(categoria_body(&cat)))
}

pub async fn update_categoria(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    require_principal(&state.store, &headers)?;
    let fields = validate::body_object(&body)?;
    let name = validate::patch_str(fields, "category_name")?;
    if let Some(n) = &name {
        validate::max_len("category_name", n, 40)?;
    }

    let guard = state.store.0.lock();
    let conn = guard.conn();
    let mut cat = catalog::categoria_by_id(conn, &id)?.ok_or_else(not_found)?;
    // The key is assigned at creation; a category_id in the payload is ignored.
    if let Some(n) = name {
        cat.category_name = n;
    }
    catalog::update_categoria(conn, &cat.category_id, &cat.category_name)?;
    Ok(Json(categoria_body(&cat)))
}

pub async fn delete_categoria(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    require_principal(&state.store, &headers)?;
    state.store.with(|conn| catalog::delete_categoria(conn, &id))?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- productos ----

#[derive(Debug, Deserialize)]
pub struct ProductoQuery {
    pub search: Option<String>,
}

fn producto_write_body(rec: &ProductoRecord) -> Value {
    json!({
        "product_id": rec.product_id,
        "image": rec.image,
        "category": rec.category_id,
        "id_user": rec.id_user,
        "product_name": rec.product_name,
        "description": rec.description,
        "state": rec.state,
        "price": rec.price.to_string(),
    })
}

fn producto_read_body(conn: &Connection, rec: &ProductoRecord) -> StoreResult<Value> {
    let category = match &rec.category_id {
        Some(cid) => catalog::categoria_by_id(conn, cid)?.map(|c| categoria_body(&c)),
        None => None,
    };
    let imagenes = catalog::imagenes_for(conn, &rec.product_id)?;
    Ok(json!({
        "product_id": rec.product_id,
        "image": rec.image,
        "category": category,
        "id_user": rec.id_user,
        "product_name": rec.product_name,
        "description": rec.description,
        "state": rec.state,
        "price": rec.price.to_string(),
        "imagenes_extra": imagenes
            .iter()
            .map(|i| json!({ "id": i.id, "imagen": i.imagen }))
            .collect::<Vec<_>>(),
    }))
}

pub async fn list_productos(
    State(state): State<AppState>,
    Query(params): Query<ProductoQuery>,
) -> AppResult<Json<Value>> {
    let guard = state.store.0.lock();
    let conn = guard.conn();
    let prods = catalog::list_productos(conn, params.search.as_deref())?;
    let mut out = Vec::with_capacity(prods.len());
    for p in &prods {
        out.push(producto_read_body(conn, p)?);
    }
    Ok(Json(Value::Array(out)))
}

pub async fn productos_por_categoria(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> AppResult<Json<Value>> {
    let guard = state.store.0.lock();
    let conn = guard.conn();
    let prods = catalog::productos_by_category(conn, &category_id)?;
    let mut out = Vec::with_capacity(prods.len());
    for p in &prods {
        out.push(producto_read_body(conn, p)?);
    }
    Ok(Json(Value::Array(out)))
}

pub async fn retrieve_producto(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let guard = state.store.0.lock();
    let conn = guard.conn();
    let rec = catalog::producto_by_id(conn, &id)?.ok_or_else(not_found)?;
    Ok(Json(producto_read_body(conn, &rec)?))
}

pub async fn create_producto(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    require_principal(&state.store, &headers)?;
    let fields = validate::body_object(&body)?;

    let product_name = validate::req_str(fields, "product_name")?;
    validate::max_len("product_name", &product_name, 50)?;
    let state_val = validate::req_i64(fields, "state")?;
    let price = validate::req_dec(fields, "price", 10, 2)?;
    let description = validate::opt_str(fields, "description")?;
    let image = validate::opt_str(fields, "image")?;
    if let Some(img) = &image {
        validate::max_len("image", img, 100)?;
    }
    let id_user = validate::opt_i64(fields, "id_user")?;
    let category = validate::str_field(fields, "category")?.into_option();
    let uploaded = validate::str_list(fields, "uploaded_images")?;
    let delete_ids = validate::int_list(fields, "delete_image_ids")?;
    // A client-supplied product_id is ignored; the key is always generated here.

    let guard = state.store.0.lock();
    let conn = guard.conn();
    if let Some(cid) = &category {
        if catalog::categoria_by_id(conn, cid)?.is_none() {
            return Err(validate::field_err(
                "category",
                format!("Invalid pk \"{cid}\" - object does not exist."),
            ));
        }
    }
    let rec = ProductoRecord {
        product_id: Uuid::new_v4().to_string(),
        image,
        category_id: category,
        id_user,
        product_name,
        description,
        state: state_val,
        price,
    };
    catalog::insert_producto(conn, &rec)?;
    catalog::delete_imagenes(conn, &rec.product_id, &delete_ids)?;
    for imagen in &uploaded {
        catalog::attach_imagen(conn, &rec.product_id, imagen)?;
    }
    Ok((StatusCode::CREATED, Json(producto_write_body(&rec))))
}

pub async fn update_producto(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    require_principal(&state.store, &headers)?;
    let fields = validate::body_object(&body)?;

    let product_name = validate::patch_str(fields, "product_name")?;
    if let Some(n) = &product_name {
        validate::max_len("product_name", n, 50)?;
    }
    let state_patch = validate::i64_field(fields, "state")?;
    let price = validate::dec_field(fields, "price", 10, 2)?;
    let description = validate::str_field(fields, "description")?;
    let image = validate::str_field(fields, "image")?;
    if let Patch::Set(img) = &image {
        validate::max_len("image", img, 100)?;
    }
    let id_user = validate::i64_field(fields, "id_user")?;
    let category = validate::str_field(fields, "category")?;
    let uploaded = validate::str_list(fields, "uploaded_images")?;
    let delete_ids = validate::int_list(fields, "delete_image_ids")?;

    let guard = state.store.0.lock();
    let conn = guard.conn();
    let mut rec = catalog::producto_by_id(conn, &id)?.ok_or_else(not_found)?;
    if let Some(n) = product_name {
        rec.product_name = n;
    }
    state_patch.apply_required("state", &mut rec.state)?;
    price.apply_required("price", &mut rec.price)?;
    description.apply(&mut rec.description);
    image.apply(&mut rec.image);
    id_user.apply(&mut rec.id_user);
    match category {
        Patch::Missing => {}
        Patch::Null => rec.category_id = None,
        Patch::Set(cid) => {
            if catalog::categoria_by_id(conn, &cid)?.is_none() {
                return Err(validate::field_err(
                    "category",
                    format!("Invalid pk \"{cid}\" - object does not exist."),
                ));
            }
            rec.category_id = Some(cid);
        }
    }
    catalog::update_producto(conn, &rec)?;
    catalog::delete_imagenes(conn, &rec.product_id, &delete_ids)?;
    for imagen in &uploaded {
        catalog::attach_imagen(conn, &rec.product_id, imagen)?;
    }
    Ok(Json(producto_write_body(&rec)))
}

pub async fn delete_producto(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    require_principal(&state.store, &headers)?;
    state.store.with(|conn| catalog::delete_producto(conn, &id))?;
    Ok(StatusCode::NO_CONTENT)
}
