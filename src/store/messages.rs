//! vendedor and mensaje table queries.

use rusqlite::{params, Connection, OptionalExtension};

use super::{now_stamp, StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct VendedorRecord {
    pub id: i64,
    pub nombre: String,
    pub foto: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MensajeRecord {
    pub id: i64,
    pub vendedor_id: i64,
    pub cliente_id: i64,
    pub producto_id: Option<String>,
    pub texto: String,
    pub fecha: String,
    pub es_vendedor: bool,
}

fn row_to_vendedor(row: &rusqlite::Row<'_>) -> rusqlite::Result<VendedorRecord> {
    Ok(VendedorRecord { id: row.get(0)?, nombre: row.get(1)?, foto: row.get(2)? })
}

fn row_to_mensaje(row: &rusqlite::Row<'_>) -> rusqlite::Result<MensajeRecord> {
    Ok(MensajeRecord {
        id: row.get(0)?,
        vendedor_id: row.get(1)?,
        cliente_id: row.get(2)?,
        producto_id: row.get(3)?,
        texto: row.get(4)?,
        fecha: row.get(5)?,
        es_vendedor: row.get(6)?,
    })
}

// ---- vendedor ----

pub fn insert_vendedor(conn: &Connection, nombre: &str, foto: Option<&str>) -> StoreResult<VendedorRecord> {
    let mut stmt = conn.prepare_cached("INSERT INTO vendedor (nombre, foto) VALUES (?1, ?2)")?;
    stmt.execute(params![nombre, foto])?;
    Ok(VendedorRecord {
        id: conn.last_insert_rowid(),
        nombre: nombre.to_string(),
        foto: foto.map(|s| s.to_string()),
    })
}

pub fn vendedor_by_id(conn: &Connection, id: i64) -> StoreResult<Option<VendedorRecord>> {
    let mut stmt = conn.prepare_cached("SELECT id, nombre, foto FROM vendedor WHERE id = ?1")?;
    Ok(stmt.query_row(params![id], row_to_vendedor).optional()?)
}

pub fn list_vendedores(conn: &Connection) -> StoreResult<Vec<VendedorRecord>> {
    let mut stmt = conn.prepare_cached("SELECT id, nombre, foto FROM vendedor ORDER BY id")?;
    let rows = stmt.query_map([], row_to_vendedor)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn update_vendedor(conn: &Connection, rec: &VendedorRecord) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached("UPDATE vendedor SET nombre = ?2, foto = ?3 WHERE id = ?1")?;
    if stmt.execute(params![rec.id, rec.nombre, rec.foto])? == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

pub fn delete_vendedor(conn: &Connection, id: i64) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached("DELETE FROM vendedor WHERE id = ?1")?;
    if stmt.execute(params![id])? == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

// ---- mensaje ----

const MENSAJE_COLS: &str = "id, vendedor_id, cliente_id, producto_id, texto, fecha, es_vendedor";

pub fn insert_mensaje(
    conn: &Connection,
    vendedor_id: i64,
    cliente_id: i64,
    producto_id: Option<&str>,
    texto: &str,
    es_vendedor: bool,
) -> StoreResult<MensajeRecord> {
    let fecha = now_stamp();
    let mut stmt = conn.prepare_cached(
        "INSERT INTO mensaje (vendedor_id, cliente_id, producto_id, texto, fecha, es_vendedor)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    stmt.execute(params![vendedor_id, cliente_id, producto_id, texto, fecha, es_vendedor])?;
    Ok(MensajeRecord {
        id: conn.last_insert_rowid(),
        vendedor_id,
        cliente_id,
        producto_id: producto_id.map(|s| s.to_string()),
        texto: texto.to_string(),
        fecha,
        es_vendedor,
    })
}

pub fn mensaje_by_id(conn: &Connection, id: i64) -> StoreResult<Option<MensajeRecord>> {
    let mut stmt =
        conn.prepare_cached(&format!("SELECT {MENSAJE_COLS} FROM mensaje WHERE id = ?1"))?;
    Ok(stmt.query_row(params![id], row_to_mensaje).optional()?)
}

/// Listing with optional exact filters on the seller and product references.
pub fn list_mensajes(
    conn: &Connection,
    vendedor_id: Option<i64>,
    producto_id: Option<&str>,
) -> StoreResult<Vec<MensajeRecord>> {
    let mut out = Vec::new();
    match (vendedor_id, producto_id) {
        (Some(v), Some(p)) => {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {MENSAJE_COLS} FROM mensaje WHERE vendedor_id = ?1 AND producto_id = ?2 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![v, p], row_to_mensaje)?;
            for row in rows {
                out.push(row?);
            }
        }
        (Some(v), None) => {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {MENSAJE_COLS} FROM mensaje WHERE vendedor_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![v], row_to_mensaje)?;
            for row in rows {
                out.push(row?);
            }
        }
        (None, Some(p)) => {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {MENSAJE_COLS} FROM mensaje WHERE producto_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![p], row_to_mensaje)?;
            for row in rows {
                out.push(row?);
            }
        }
        (None, None) => {
            let mut stmt =
                conn.prepare_cached(&format!("SELECT {MENSAJE_COLS} FROM mensaje ORDER BY id"))?;
            let rows = stmt.query_map([], row_to_mensaje)?;
            for row in rows {
                out.push(row?);
            }
        }
    }
    Ok(out)
}

pub fn update_mensaje(conn: &Connection, rec: &MensajeRecord) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached(
        "UPDATE mensaje
         SET vendedor_id = ?2, cliente_id = ?3, producto_id = ?4, texto = ?5, es_vendedor = ?6
         WHERE id = ?1",
    )?;
    if stmt.execute(params![
        rec.id,
        rec.vendedor_id,
        rec.cliente_id,
        rec.producto_id,
        rec.texto,
        rec.es_vendedor,
    ])? == 0
    {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

pub fn delete_mensaje(conn: &Connection, id: i64) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached("DELETE FROM mensaje WHERE id = ?1")?;
    if stmt.execute(params![id])? == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}
