//! Custom extractors whose rejections render as the failure envelope.

pub mod uuid_path;

pub use uuid_path::{UuidPath, parse_uuid};
