//! Sea-ORM entities backing the accounts tables.

pub mod auth_token;
pub mod user;
