pub mod event_store_impl;
pub mod null;
pub mod queries;
pub mod recorder;
pub mod schema;
pub mod store;

pub use null::NullStore;
pub use store::SqliteStore;

/// Re-export the `rusqlite` crate so consumers (especially tests) can use
/// `sitepulse_store::rusqlite::params!` without an extra dependency.
pub use rusqlite;
