//! auth_token table queries. One token per account, keyed by the token string.

use rusqlite::{params, Connection, OptionalExtension};

use super::accounts::UserRecord;
use super::{now_stamp, StoreResult};

/// Atomic get-or-create: insert a candidate key, then read back whichever key
/// actually owns the row. Two racing first logins cannot mint two tokens
/// because user_id is unique and the insert is conflict-tolerant.
pub fn get_or_create_token(conn: &Connection, user_id: i64, candidate_key: &str) -> StoreResult<String> {
    let mut ins = conn.prepare_cached(
        "INSERT INTO auth_token (key, user_id, created) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO NOTHING",
    )?;
    ins.execute(params![candidate_key, user_id, now_stamp()])?;
    let mut get = conn.prepare_cached("SELECT key FROM auth_token WHERE user_id = ?1")?;
    Ok(get.query_row(params![user_id], |row| row.get(0))?)
}

pub fn user_by_token(conn: &Connection, key: &str) -> StoreResult<Option<UserRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT u.id, u.username, u.email, u.password_hash, u.first_name, u.last_name, u.date_joined
         FROM auth_token t JOIN auth_user u ON u.id = t.user_id
         WHERE t.key = ?1",
    )?;
    let user = stmt
        .query_row(params![key], |row| {
            Ok(UserRecord {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password_hash: row.get(3)?,
                first_name: row.get(4)?,
                last_name: row.get(5)?,
                date_joined: row.get(6)?,
            })
        })
        .optional()?;
    Ok(user)
}
