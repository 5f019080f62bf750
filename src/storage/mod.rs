//! Durable state: the blob store (sqlite) and the preference store (json)

pub mod db;
pub mod error;
pub mod operations;
pub mod prefs;
pub(crate) mod schema;
