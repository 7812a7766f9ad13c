//! Query execution engine: credential vault, adapter cache, backends,
//! result fingerprints and schema lookup

pub mod cache;
pub mod executor;
pub mod fingerprint;
pub mod models;
pub mod neo4j;
pub mod postgres;
pub mod preview;
pub mod schema;
pub mod traits;
pub mod vault;

pub use cache::ConnectionAdapterCache;
pub use executor::{EngineError, QueryExecutor};
pub use fingerprint::compute_result_id;
pub use models::*;
pub use preview::wrap_with_preview_limit;
pub use schema::SchemaService;
pub use traits::{AdapterFactory, DriverAdapterFactory, QueryAdapter, QueryExecutionError};
pub use vault::{CredentialVault, DecryptionError, EncryptionError};

#[cfg(test)]
pub(crate) mod mock;
