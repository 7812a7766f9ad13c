//! Bearer-token authentication for the HTTP API
//!
//! - `jwt`: HS256 token issuing and verification
//! - `middleware`: validates the bearer token, or admits the anonymous user
//!   when no auth section is configured
//! - `extractor`: `AuthUser` handler argument

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use extractor::AuthUser;
pub use jwt::{Claims, JwtAuth, ANONYMOUS_USER_ID};
pub use middleware::require_auth;
