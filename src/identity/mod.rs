//! Request identity for the marketplace API: who is acting, and how accounts
//! and tokens come to exist. Keep the public surface thin and split
//! implementation across sub-modules.

mod issuer;
mod principal;
mod strategy;

pub use issuer::{
    login, register, LoginSuccess, MSG_BAD_CREDENTIALS, MSG_EMAIL_TAKEN, MSG_LOGIN_FIELDS,
    MSG_TOKEN_UNAVAILABLE,
};
pub use principal::Principal;
pub use strategy::{
    resolve_principal, AuthStrategy, BearerTokenStrategy, Resolution, TrustedHeaderStrategy,
};
