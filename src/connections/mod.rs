//! Saved database connections

pub mod memory;
pub mod models;
pub mod postgres;
pub mod traits;

pub use memory::InMemoryConnectionStore;
pub use models::StoredConnection;
pub use postgres::PgConnectionStore;
pub use traits::ConnectionStore;
