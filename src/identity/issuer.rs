//! Account registration and token-issuing login.
//!
//! This is the only place new accounts or tokens are minted. Registration
//! derives the account handle from the email local part, suffixing 1, 2, ...
//! on collision; login resolves the identifier against email first, then
//! handle, and degrades to a null token when the token store misbehaves.

use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::security;
use crate::store::{accounts, profiles, tokens, SharedStore};
use crate::validate::{check_email, req_str, Fields};

use super::Principal;

pub const MSG_EMAIL_TAKEN: &str = "El correo ya está registrado.";
pub const MSG_LOGIN_FIELDS: &str = "Se requieren usuario y contraseña.";
pub const MSG_BAD_CREDENTIALS: &str = "Credenciales inválidas. Por favor verifica tu usuario/contraseña.";
pub const MSG_TOKEN_UNAVAILABLE: &str = "Token no disponible: el almacén de tokens no está accesible.";

#[derive(Debug)]
pub struct LoginSuccess {
    pub token: Option<String>,
    pub principal: Principal,
    pub warning: Option<String>,
}

/// Create an account from `{user, user_name, password}`. Field checks run in
/// declaration order so the first failure is the one surfaced.
pub fn register(store: &SharedStore, body: &Fields) -> AppResult<()> {
    let email = req_str(body, "user")?;
    check_email("user", &email)?;
    let full_name = req_str(body, "user_name")?;
    let password = req_str(body, "password")?;
    let phc = security::hash_password(&password)?;

    let mut parts = full_name.split_whitespace();
    let first_name = parts.next().unwrap_or("").to_string();
    let last_name = parts.collect::<Vec<_>>().join(" ");

    // Duplicate check, handle derivation and insert all run under one lock so
    // concurrent registrations cannot interleave between check and create.
    let guard = store.0.lock();
    let conn = guard.conn();

    if accounts::email_exists(conn, &email)? {
        return Err(AppError::user("user", MSG_EMAIL_TAKEN));
    }

    let base = email.split('@').next().unwrap_or_default();
    let mut handle = base.to_string();
    let mut suffix = 1u32;
    while accounts::username_exists(conn, &handle)? {
        handle = format!("{base}{suffix}");
        suffix += 1;
    }

    let user = accounts::insert_user(conn, &handle, &email, &phc, &first_name, &last_name)?;

    // Profile bootstrap is a side effect; its failure never fails registration.
    if let Err(e) = profiles::get_or_create_profile(conn, user.id) {
        warn!(target: "vendigo::identity", "profile bootstrap failed for user {}: {e}", user.id);
    }
    Ok(())
}

/// Authenticate `{user|username, password}` and hand back the account token.
/// Email match is tried before handle match, both case-insensitive; a missing
/// account and a wrong password are indistinguishable in the reply.
pub fn login(store: &SharedStore, body: &Fields) -> AppResult<LoginSuccess> {
    let identifier = non_empty_str(body, "user").or_else(|| non_empty_str(body, "username"));
    let password = non_empty_str(body, "password");
    let (Some(identifier), Some(password)) = (identifier, password) else {
        return Err(AppError::user("login", MSG_LOGIN_FIELDS));
    };

    let guard = store.0.lock();
    let conn = guard.conn();

    let mut account = accounts::user_by_email_ci(conn, identifier)?;
    if account.is_none() {
        account = accounts::user_by_username_ci(conn, identifier)?;
    }
    let Some(account) = account else {
        return Err(AppError::user("login", MSG_BAD_CREDENTIALS));
    };
    if !security::verify_password(&account.password_hash, password) {
        return Err(AppError::user("login", MSG_BAD_CREDENTIALS));
    }

    // Idempotent issue: repeat logins return the stored key. A token-store
    // failure degrades to a null token with a warning, not a login failure.
    let issued = security::generate_token_key()
        .and_then(|key| tokens::get_or_create_token(conn, account.id, &key).map_err(AppError::from));
    let (token, warning) = match issued {
        Ok(key) => (Some(key), None),
        Err(e) => {
            warn!(target: "vendigo::identity", "token issue failed for user {}: {e}", account.id);
            (None, Some(MSG_TOKEN_UNAVAILABLE.to_string()))
        }
    };

    Ok(LoginSuccess { token, principal: Principal::from(account), warning })
}

fn non_empty_str<'a>(body: &'a Fields, field: &str) -> Option<&'a str> {
    body.get(field).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}
