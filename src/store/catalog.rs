//! categoria, producto and imagen_producto table queries.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use rust_decimal::Decimal;

use super::{dec_col, StoreResult};

#[derive(Debug, Clone)]
pub struct CategoriaRecord {
    pub category_id: String,
    pub category_name: String,
}

#[derive(Debug, Clone)]
pub struct ProductoRecord {
    pub product_id: String,
    pub image: Option<String>,
    pub category_id: Option<String>,
    pub id_user: Option<i64>,
    pub product_name: String,
    pub description: Option<String>,
    pub state: i64,
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct ImagenRecord {
    pub id: i64,
    pub imagen: String,
}

// ---- categoria ----

pub fn insert_categoria(conn: &Connection, rec: &CategoriaRecord) -> StoreResult<()> {
    let mut stmt = conn
        .prepare_cached("INSERT INTO categoria (category_id, category_name) VALUES (?1, ?2)")?;
    stmt.execute(params![rec.category_id, rec.category_name])?;
    Ok(())
}

pub fn categoria_by_id(conn: &Connection, id: &str) -> StoreResult<Option<CategoriaRecord>> {
    let mut stmt = conn
        .prepare_cached("SELECT category_id, category_name FROM categoria WHERE category_id = ?1")?;
    let rec = stmt
        .query_row(params![id], |row| {
            Ok(CategoriaRecord { category_id: row.get(0)?, category_name: row.get(1)? })
        })
        .optional()?;
    Ok(rec)
}

pub fn list_categorias(conn: &Connection) -> StoreResult<Vec<CategoriaRecord>> {
    let mut stmt = conn
        .prepare_cached("SELECT category_id, category_name FROM categoria ORDER BY rowid")?;
    let rows = stmt.query_map([], |row| {
        Ok(CategoriaRecord { category_id: row.get(0)?, category_name: row.get(1)? })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn update_categoria(conn: &Connection, id: &str, name: &str) -> StoreResult<()> {
    let mut stmt = conn
        .prepare_cached("UPDATE categoria SET category_name = ?2 WHERE category_id = ?1")?;
    if stmt.execute(params![id, name])? == 0 {
        return Err(super::StoreError::NotFound);
    }
    Ok(())
}

pub fn delete_categoria(conn: &Connection, id: &str) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached("DELETE FROM categoria WHERE category_id = ?1")?;
    if stmt.execute(params![id])? == 0 {
        return Err(super::StoreError::NotFound);
    }
    Ok(())
}

// ---- producto ----

const PRODUCTO_COLS: &str =
    "product_id, image, category_id, id_user, product_name, description, state, price";

fn row_to_producto(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProductoRecord> {
    Ok(ProductoRecord {
        product_id: row.get(0)?,
        image: row.get(1)?,
        category_id: row.get(2)?,
        id_user: row.get(3)?,
        product_name: row.get(4)?,
        description: row.get(5)?,
        state: row.get(6)?,
        price: dec_col(row, 7)?,
    })
}

pub fn insert_producto(conn: &Connection, rec: &ProductoRecord) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached(&format!(
        "INSERT INTO producto ({PRODUCTO_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
    ))?;
    stmt.execute(params![
        rec.product_id,
        rec.image,
        rec.category_id,
        rec.id_user,
        rec.product_name,
        rec.description,
        rec.state,
        rec.price.to_string(),
    ])?;
    Ok(())
}

pub fn producto_by_id(conn: &Connection, id: &str) -> StoreResult<Option<ProductoRecord>> {
    let mut stmt = conn
        .prepare_cached(&format!("SELECT {PRODUCTO_COLS} FROM producto WHERE product_id = ?1"))?;
    Ok(stmt.query_row(params![id], row_to_producto).optional()?)
}

/// Escape LIKE wildcards so a search term is matched literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if c == '\\' || c == '%' || c == '_' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Full listing, optionally narrowed by a case-insensitive substring match on
/// the product name. No other field is searchable.
pub fn list_productos(conn: &Connection, search: Option<&str>) -> StoreResult<Vec<ProductoRecord>> {
    let mut out = Vec::new();
    match search {
        Some(term) => {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {PRODUCTO_COLS} FROM producto
                 WHERE product_name LIKE '%' || ?1 || '%' ESCAPE '\\'
                 ORDER BY rowid"
            ))?;
            let rows = stmt.query_map(params![escape_like(term)], row_to_producto)?;
            for row in rows {
                out.push(row?);
            }
        }
        None => {
            let mut stmt = conn
                .prepare_cached(&format!("SELECT {PRODUCTO_COLS} FROM producto ORDER BY rowid"))?;
            let rows = stmt.query_map([], row_to_producto)?;
            for row in rows {
                out.push(row?);
            }
        }
    }
    Ok(out)
}

/// Exact foreign-key match on category, bypassing the search path.
pub fn productos_by_category(conn: &Connection, category_id: &str) -> StoreResult<Vec<ProductoRecord>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {PRODUCTO_COLS} FROM producto WHERE category_id = ?1 ORDER BY rowid"
    ))?;
    let rows = stmt.query_map(params![category_id], row_to_producto)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn update_producto(conn: &Connection, rec: &ProductoRecord) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached(
        "UPDATE producto
         SET image = ?2, category_id = ?3, id_user = ?4, product_name = ?5,
             description = ?6, state = ?7, price = ?8
         WHERE product_id = ?1",
    )?;
    if stmt.execute(params![
        rec.product_id,
        rec.image,
        rec.category_id,
        rec.id_user,
        rec.product_name,
        rec.description,
        rec.state,
        rec.price.to_string(),
    ])? == 0
    {
        return Err(super::StoreError::NotFound);
    }
    Ok(())
}

pub fn delete_producto(conn: &Connection, id: &str) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached("DELETE FROM producto WHERE product_id = ?1")?;
    if stmt.execute(params![id])? == 0 {
        return Err(super::StoreError::NotFound);
    }
    Ok(())
}

// ---- imagen_producto ----

pub fn attach_imagen(conn: &Connection, producto_id: &str, imagen: &str) -> StoreResult<ImagenRecord> {
    let mut stmt = conn
        .prepare_cached("INSERT INTO imagen_producto (producto_id, imagen) VALUES (?1, ?2)")?;
    stmt.execute(params![producto_id, imagen])?;
    Ok(ImagenRecord { id: conn.last_insert_rowid(), imagen: imagen.to_string() })
}

pub fn imagenes_for(conn: &Connection, producto_id: &str) -> StoreResult<Vec<ImagenRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, imagen FROM imagen_producto WHERE producto_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![producto_id], |row| {
        Ok(ImagenRecord { id: row.get(0)?, imagen: row.get(1)? })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Delete gallery rows by id, scoped to the owning product. Ids that belong to
/// another product are ignored.
pub fn delete_imagenes(conn: &Connection, producto_id: &str, ids: &[i64]) -> StoreResult<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let placeholders = (0..ids.len())
        .map(|i| format!("?{}", i + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "DELETE FROM imagen_producto WHERE producto_id = ?1 AND id IN ({placeholders})"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut bound: Vec<rusqlite::types::Value> = Vec::with_capacity(ids.len() + 1);
    bound.push(rusqlite::types::Value::from(producto_id.to_string()));
    for id in ids {
        bound.push(rusqlite::types::Value::from(*id));
    }
    Ok(stmt.execute(params_from_iter(bound))?)
}
