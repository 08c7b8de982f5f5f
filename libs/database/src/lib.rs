//! PostgreSQL plumbing shared by the catalog services.
//!
//! Connection pooling, startup retry, migrations and health probes live here so
//! domain crates only deal with `sea_orm::DatabaseConnection`.
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::postgres::{self, PostgresConfig};
//! use database::RetryConfig;
//! use migration::Migrator;
//!
//! let config = PostgresConfig::from_env()?;
//! let db = postgres::connect_from_config_with_retry(config, Some(RetryConfig::new())).await?;
//! postgres::run_migrations::<Migrator>(&db, "shop_api").await?;
//! ```

pub mod common;
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult, RetryConfig, retry, retry_with_backoff};
