//! # bz-api
//!
//! The backend-facing layer of Rusty-Bazaar: a request gateway that
//! normalises every response into `Result<T, ClientError>`, a typed facade
//! over the REST endpoints, and the multi-step ad save.

pub mod endpoints;
pub mod gateway;
pub mod saga;

pub use endpoints::MarketApi;
pub use gateway::{Body, RequestGateway};
pub use saga::{AdSave, AdSaveReport, AdSaveSaga, MediaStep};
