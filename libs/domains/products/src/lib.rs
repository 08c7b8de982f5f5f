//! Products Domain
//!
//! Catalog products with their images: validation, image storage, PostgreSQL
//! persistence and the HTTP API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, JSON/multipart bodies, views
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, write policy, image files
//! └──┬───────┬──┘
//!    │       │
//! ┌──▼───┐ ┌─▼──────────┐
//! │ Repo │ │ ImageStore │  ← Rows (trait + PostgreSQL) / files (trait + local disk)
//! └──┬───┘ └────────────┘
//!    │
//! ┌──▼──────────┐
//! │   Models    │  ← Entities, prices, queries
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::media::MediaConfig;
//! use domain_products::{LocalImageStore, PgProductRepository, ProductService, handlers};
//! use sea_orm::DatabaseConnection;
//!
//! # fn example(db: DatabaseConnection) {
//! let media = MediaConfig::default();
//! let service = ProductService::new(
//!     PgProductRepository::new(db),
//!     LocalImageStore::new(&media.root),
//! );
//! let router = handlers::router(service, media);
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod form;
pub mod handlers;
pub mod images;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod validation;
pub mod views;

pub use error::{ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use images::{ImageStore, ImageUpload, InMemoryImageStore, LocalImageStore};
pub use models::{
    Category, ListParams, NewProduct, Price, Product, ProductChanges, ProductImage, ProductInput,
    ProductPage, ProductQuery, ProductSort, WritePolicy,
};
pub use postgres::PgProductRepository;
pub use repository::{InMemoryProductRepository, ProductRepository};
pub use service::ProductService;
pub use validation::InputMode;
