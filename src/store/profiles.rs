//! user_profile table queries. One row per account, created lazily.

use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use super::{opt_dec_col, StoreResult};

#[derive(Debug, Clone)]
pub struct ProfileRecord {
    pub user_id: i64,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub member_since: Option<String>,
    pub rating: Option<Decimal>,
    pub products_sold: Option<i64>,
}

fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileRecord> {
    Ok(ProfileRecord {
        user_id: row.get(0)?,
        phone: row.get(1)?,
        address: row.get(2)?,
        member_since: row.get(3)?,
        rating: opt_dec_col(row, 4)?,
        products_sold: row.get(5)?,
    })
}

/// Race-safe get-or-create: the conflict-tolerant insert either creates the
/// row with column defaults or leaves an existing one untouched.
pub fn get_or_create_profile(conn: &Connection, user_id: i64) -> StoreResult<ProfileRecord> {
    let mut ins = conn.prepare_cached(
        "INSERT INTO user_profile (user_id) VALUES (?1) ON CONFLICT(user_id) DO NOTHING",
    )?;
    ins.execute(params![user_id])?;
    let mut get = conn.prepare_cached(
        "SELECT user_id, phone, address, member_since, rating, products_sold
         FROM user_profile WHERE user_id = ?1",
    )?;
    Ok(get.query_row(params![user_id], row_to_profile)?)
}

pub fn update_profile(conn: &Connection, profile: &ProfileRecord) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached(
        "UPDATE user_profile
         SET phone = ?2, address = ?3, member_since = ?4, rating = ?5, products_sold = ?6
         WHERE user_id = ?1",
    )?;
    stmt.execute(params![
        profile.user_id,
        profile.phone,
        profile.address,
        profile.member_since,
        profile.rating.map(|d| d.to_string()),
        profile.products_sold,
    ])?;
    Ok(())
}
