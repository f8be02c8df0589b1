pub mod server;
pub mod store;
pub mod security;
pub mod identity;
pub mod error;
pub mod validate;
