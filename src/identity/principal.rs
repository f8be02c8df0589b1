use serde::{Deserialize, Serialize};

use crate::store::accounts::UserRecord;

/// The resolved identity attached to a request. Carries exactly the public
/// account fields, so it doubles as the login response's `user` object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserRecord> for Principal {
    fn from(u: UserRecord) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
        }
    }
}
