//! HTTP surface of the dangerous-animal alert backend.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
