//! Users Domain
//!
//! Accounts, password login and opaque API tokens.
//!
//! A successful `POST /login/` returns the caller's token (created on first
//! login, reused afterwards). Every other request presents it as
//! `Authorization: Token <key>`; [`UserService`] implements
//! [`axum_helpers::TokenAuthenticator`] so the shared middleware can resolve it.

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{AuthToken, CreateUser, LoginRequest, LoginResponse, User};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
