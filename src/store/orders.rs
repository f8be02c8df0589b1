//! pedido and detalle table queries.

use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use super::{dec_col, now_stamp, StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct PedidoRecord {
    pub id: i64,
    pub fecha_pedido: String,
    pub monto_total: Decimal,
    pub estado: String,
    pub comentario: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DetalleRecord {
    pub id: i64,
    pub pedido_id: i64,
    pub producto_id: String,
    pub cantidad: i64,
    pub precio_unidad: Decimal,
}

fn row_to_pedido(row: &rusqlite::Row<'_>) -> rusqlite::Result<PedidoRecord> {
    Ok(PedidoRecord {
        id: row.get(0)?,
        fecha_pedido: row.get(1)?,
        monto_total: dec_col(row, 2)?,
        estado: row.get(3)?,
        comentario: row.get(4)?,
    })
}

fn row_to_detalle(row: &rusqlite::Row<'_>) -> rusqlite::Result<DetalleRecord> {
    Ok(DetalleRecord {
        id: row.get(0)?,
        pedido_id: row.get(1)?,
        producto_id: row.get(2)?,
        cantidad: row.get(3)?,
        precio_unidad: dec_col(row, 4)?,
    })
}

// ---- pedido ----

/// The creation timestamp is set here, once; updates never touch it.
pub fn insert_pedido(
    conn: &Connection,
    monto_total: Decimal,
    estado: &str,
    comentario: Option<&str>,
) -> StoreResult<PedidoRecord> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO pedido (fecha_pedido, monto_total, estado, comentario) VALUES (?1, ?2, ?3, ?4)",
    )?;
    stmt.execute(params![now_stamp(), monto_total.to_string(), estado, comentario])?;
    let id = conn.last_insert_rowid();
    let mut get = conn.prepare_cached(
        "SELECT id, fecha_pedido, monto_total, estado, comentario FROM pedido WHERE id = ?1",
    )?;
    Ok(get.query_row(params![id], row_to_pedido)?)
}

pub fn pedido_by_id(conn: &Connection, id: i64) -> StoreResult<Option<PedidoRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, fecha_pedido, monto_total, estado, comentario FROM pedido WHERE id = ?1",
    )?;
    Ok(stmt.query_row(params![id], row_to_pedido).optional()?)
}

pub fn list_pedidos(conn: &Connection) -> StoreResult<Vec<PedidoRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, fecha_pedido, monto_total, estado, comentario FROM pedido ORDER BY id",
    )?;
    let rows = stmt.query_map([], row_to_pedido)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Only the mutable order-level fields; amount and timestamp stay as created.
pub fn update_pedido(
    conn: &Connection,
    id: i64,
    estado: &str,
    comentario: Option<&str>,
) -> StoreResult<()> {
    let mut stmt = conn
        .prepare_cached("UPDATE pedido SET estado = ?2, comentario = ?3 WHERE id = ?1")?;
    if stmt.execute(params![id, estado, comentario])? == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

pub fn delete_pedido(conn: &Connection, id: i64) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached("DELETE FROM pedido WHERE id = ?1")?;
    if stmt.execute(params![id])? == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

// ---- detalle ----

pub fn insert_detalle(
    conn: &Connection,
    pedido_id: i64,
    producto_id: &str,
    cantidad: i64,
    precio_unidad: Decimal,
) -> StoreResult<DetalleRecord> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO detalle (pedido_id, producto_id, cantidad, precio_unidad) VALUES (?1, ?2, ?3, ?4)",
    )?;
    stmt.execute(params![pedido_id, producto_id, cantidad, precio_unidad.to_string()])?;
    let id = conn.last_insert_rowid();
    Ok(DetalleRecord { id, pedido_id, producto_id: producto_id.to_string(), cantidad, precio_unidad })
}

pub fn detalle_by_id(conn: &Connection, id: i64) -> StoreResult<Option<DetalleRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, pedido_id, producto_id, cantidad, precio_unidad FROM detalle WHERE id = ?1",
    )?;
    Ok(stmt.query_row(params![id], row_to_detalle).optional()?)
}

pub fn list_detalles(conn: &Connection) -> StoreResult<Vec<DetalleRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, pedido_id, producto_id, cantidad, precio_unidad FROM detalle ORDER BY id",
    )?;
    let rows = stmt.query_map([], row_to_detalle)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Lines for one order, each with the live product name when the product row
/// still exists. A dangling reference reads as a missing name, not an error.
pub fn detalles_for_pedido(
    conn: &Connection,
    pedido_id: i64,
) -> StoreResult<Vec<(DetalleRecord, Option<String>)>> {
    let mut stmt = conn.prepare_cached(
        "SELECT d.id, d.pedido_id, d.producto_id, d.cantidad, d.precio_unidad, p.product_name
         FROM detalle d LEFT JOIN producto p ON p.product_id = d.producto_id
         WHERE d.pedido_id = ?1 ORDER BY d.id",
    )?;
    let rows = stmt.query_map(params![pedido_id], |row| {
        Ok((row_to_detalle(row)?, row.get::<_, Option<String>>(5)?))
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn update_detalle(conn: &Connection, rec: &DetalleRecord) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached(
        "UPDATE detalle SET pedido_id = ?2, producto_id = ?3, cantidad = ?4, precio_unidad = ?5
         WHERE id = ?1",
    )?;
    if stmt.execute(params![
        rec.id,
        rec.pedido_id,
        rec.producto_id,
        rec.cantidad,
        rec.precio_unidad.to_string(),
    ])? == 0
    {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

pub fn delete_detalle(conn: &Connection, id: i64) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached("DELETE FROM detalle WHERE id = ?1")?;
    if stmt.execute(params![id])? == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}
