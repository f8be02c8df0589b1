//! auth_user table queries.

use rusqlite::{params, Connection, OptionalExtension};

use super::{now_stamp, StoreResult};

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: String,
}

const USER_COLS: &str = "id, username, email, password_hash, first_name, last_name, date_joined";

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        date_joined: row.get(6)?,
    })
}

pub fn insert_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
    first_name: &str,
    last_name: &str,
) -> StoreResult<UserRecord> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO auth_user (username, email, password_hash, first_name, last_name, date_joined)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    stmt.execute(params![username, email, password_hash, first_name, last_name, now_stamp()])?;
    let id = conn.last_insert_rowid();
    let mut get = conn.prepare_cached(&format!("SELECT {USER_COLS} FROM auth_user WHERE id = ?1"))?;
    Ok(get.query_row(params![id], row_to_user)?)
}

pub fn user_by_id(conn: &Connection, id: i64) -> StoreResult<Option<UserRecord>> {
    let mut stmt = conn.prepare_cached(&format!("SELECT {USER_COLS} FROM auth_user WHERE id = ?1"))?;
    Ok(stmt.query_row(params![id], row_to_user).optional()?)
}

/// Case-insensitive email lookup, first match by id order.
pub fn user_by_email_ci(conn: &Connection, email: &str) -> StoreResult<Option<UserRecord>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {USER_COLS} FROM auth_user WHERE email = ?1 COLLATE NOCASE ORDER BY id LIMIT 1"
    ))?;
    Ok(stmt.query_row(params![email], row_to_user).optional()?)
}

/// Case-insensitive username lookup, first match by id order.
pub fn user_by_username_ci(conn: &Connection, username: &str) -> StoreResult<Option<UserRecord>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {USER_COLS} FROM auth_user WHERE username = ?1 COLLATE NOCASE ORDER BY id LIMIT 1"
    ))?;
    Ok(stmt.query_row(params![username], row_to_user).optional()?)
}

/// Exact-match existence check used by the registration duplicate-email rule.
pub fn email_exists(conn: &Connection, email: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM auth_user WHERE email = ?1 LIMIT 1")?;
    Ok(stmt.query_row(params![email], |_| Ok(())).optional()?.is_some())
}

pub fn username_exists(conn: &Connection, username: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM auth_user WHERE username = ?1 LIMIT 1")?;
    Ok(stmt.query_row(params![username], |_| Ok(())).optional()?.is_some())
}

pub fn list_users(conn: &Connection) -> StoreResult<Vec<UserRecord>> {
    let mut stmt = conn.prepare_cached(&format!("SELECT {USER_COLS} FROM auth_user ORDER BY id"))?;
    let rows = stmt.query_map([], row_to_user)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
