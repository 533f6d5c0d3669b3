//! Persistent metadata storage

mod database;

pub use database::{MetadataDb, UserRecord};
