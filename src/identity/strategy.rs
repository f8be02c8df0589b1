//! Ordered resolver strategies for request identity.
//!
//! Each strategy inspects the request headers and either resolves a principal,
//! defers to the next strategy, or rejects the request outright. The trusted
//! header runs first; the token check is only reached when no `X-User-Id`
//! header is present. Swapping that order would move the trust boundary, so it
//! is fixed here rather than configurable.

use axum::http::{header, HeaderMap};

use crate::error::AppError;
use crate::store::{accounts, tokens, SharedStore};

use super::Principal;

pub enum Resolution {
    Resolved(Principal),
    Deferred,
    Rejected(AppError),
}

pub trait AuthStrategy: Send + Sync {
    fn resolve(&self, store: &SharedStore, headers: &HeaderMap) -> Resolution;
}

/// `X-User-Id: <integer account id>` — the value is accepted as authoritative
/// identity with no secondary proof. Absent header defers; a malformed value
/// or unknown id is a hard failure, never a fall-through.
pub struct TrustedHeaderStrategy;

const HEADER_USER_ID: &str = "x-user-id";
const MSG_BAD_USER_ID: &str = "Invalid user ID provided in X-User-Id header.";

impl AuthStrategy for TrustedHeaderStrategy {
    fn resolve(&self, store: &SharedStore, headers: &HeaderMap) -> Resolution {
        let Some(raw) = headers.get(HEADER_USER_ID) else {
            return Resolution::Deferred;
        };
        let Ok(text) = raw.to_str() else {
            return Resolution::Rejected(AppError::auth("user_id_header", MSG_BAD_USER_ID));
        };
        let Ok(id) = text.trim().parse::<i64>() else {
            return Resolution::Rejected(AppError::auth("user_id_header", MSG_BAD_USER_ID));
        };
        match store.with(|conn| accounts::user_by_id(conn, id)) {
            Ok(Some(user)) => Resolution::Resolved(Principal::from(user)),
            Ok(None) => Resolution::Rejected(AppError::auth("user_id_header", MSG_BAD_USER_ID)),
            Err(e) => Resolution::Rejected(AppError::from(e)),
        }
    }
}

/// `Authorization: Token <key>` — opaque bearer-token lookup. Any other
/// authorization scheme defers.
pub struct BearerTokenStrategy;

impl AuthStrategy for BearerTokenStrategy {
    fn resolve(&self, store: &SharedStore, headers: &HeaderMap) -> Resolution {
        let Some(raw) = headers.get(header::AUTHORIZATION) else {
            return Resolution::Deferred;
        };
        let parts: Vec<&[u8]> = raw
            .as_bytes()
            .split(u8::is_ascii_whitespace)
            .filter(|p| !p.is_empty())
            .collect();
        let Some(scheme) = parts.first() else {
            return Resolution::Deferred;
        };
        if !scheme.eq_ignore_ascii_case(b"token") {
            return Resolution::Deferred;
        }
        if parts.len() == 1 {
            return Resolution::Rejected(AppError::auth(
                "token_header",
                "Invalid token header. No credentials provided.",
            ));
        }
        if parts.len() > 2 {
            return Resolution::Rejected(AppError::auth(
                "token_header",
                "Invalid token header. Token string should not contain spaces.",
            ));
        }
        let Ok(key) = std::str::from_utf8(parts[1]) else {
            return Resolution::Rejected(AppError::auth(
                "token_header",
                "Invalid token header. Token string should not contain invalid characters.",
            ));
        };
        match store.with(|conn| tokens::user_by_token(conn, key)) {
            Ok(Some(user)) => Resolution::Resolved(Principal::from(user)),
            Ok(None) => Resolution::Rejected(AppError::auth("token", "Invalid token.")),
            Err(e) => Resolution::Rejected(AppError::from(e)),
        }
    }
}

/// Walk the strategies in order; the first non-deferred result wins. When
/// every strategy defers the request proceeds anonymously.
pub fn resolve_principal(store: &SharedStore, headers: &HeaderMap) -> Result<Option<Principal>, AppError> {
    let strategies: [&dyn AuthStrategy; 2] = [&TrustedHeaderStrategy, &BearerTokenStrategy];
    for strategy in strategies {
        match strategy.resolve(store, headers) {
            Resolution::Resolved(p) => return Ok(Some(p)),
            Resolution::Deferred => continue,
            Resolution::Rejected(e) => return Err(e),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    use crate::store::accounts;

    fn store_with_user() -> (SharedStore, i64, String) {
        let store = SharedStore::in_memory().unwrap();
        let (id, key) = store
            .with(|conn| {
                let u = accounts::insert_user(conn, "ana", "ana@x.com", "h", "Ana", "Lopez")?;
                let key = crate::store::tokens::get_or_create_token(
                    conn,
                    u.id,
                    "aaaa1111aaaa1111aaaa1111aaaa1111aaaa1111",
                )?;
                Ok((u.id, key))
            })
            .unwrap();
        (store, id, key)
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(*k, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn no_headers_resolves_anonymous() {
        let (store, _, _) = store_with_user();
        let out = resolve_principal(&store, &HeaderMap::new()).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn trusted_header_resolves_known_account() {
        let (store, id, _) = store_with_user();
        let out = resolve_principal(&store, &headers(&[("x-user-id", &id.to_string())])).unwrap();
        assert_eq!(out.unwrap().username, "ana");
    }

    #[test]
    fn non_numeric_header_rejects_without_falling_through() {
        let (store, _, key) = store_with_user();
        // A valid token is present, but the bad header must win.
        let err = resolve_principal(
            &store,
            &headers(&[("x-user-id", "abc"), ("authorization", &format!("Token {key}"))]),
        )
        .unwrap_err();
        assert_eq!(err.message(), "Invalid user ID provided in X-User-Id header.");
        assert_eq!(err.http_status(), 401);
    }

    #[test]
    fn unknown_id_rejects() {
        let (store, _, _) = store_with_user();
        let err = resolve_principal(&store, &headers(&[("x-user-id", "424242")])).unwrap_err();
        assert_eq!(err.message(), "Invalid user ID provided in X-User-Id header.");
    }

    #[test]
    fn token_path_used_when_header_absent() {
        let (store, id, key) = store_with_user();
        let out = resolve_principal(&store, &headers(&[("authorization", &format!("Token {key}"))])).unwrap();
        assert_eq!(out.unwrap().id, id);
    }

    #[test]
    fn token_scheme_is_case_insensitive() {
        let (store, _, key) = store_with_user();
        let out = resolve_principal(&store, &headers(&[("authorization", &format!("token {key}"))])).unwrap();
        assert!(out.is_some());
    }

    #[test]
    fn bearer_scheme_defers_to_anonymous() {
        let (store, _, key) = store_with_user();
        let out = resolve_principal(&store, &headers(&[("authorization", &format!("Bearer {key}"))])).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn token_header_error_messages() {
        let (store, _, _) = store_with_user();
        let err = resolve_principal(&store, &headers(&[("authorization", "Token")])).unwrap_err();
        assert_eq!(err.message(), "Invalid token header. No credentials provided.");

        let err = resolve_principal(&store, &headers(&[("authorization", "Token a b")])).unwrap_err();
        assert_eq!(err.message(), "Invalid token header. Token string should not contain spaces.");

        let err = resolve_principal(&store, &headers(&[("authorization", "Token wrongkey")])).unwrap_err();
        assert_eq!(err.message(), "Invalid token.");
    }
}
