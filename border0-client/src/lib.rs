//! Border0 REST API client
//!
//! Resource controllers talk to the platform through the [`Requester`]
//! trait; [`ApiClient`] is its HTTP implementation.

pub mod client;
pub mod error;
pub mod requester;
pub mod types;

pub use client::{ApiClient, DEFAULT_API_URL};
pub use error::{ClientError, ClientResult};
pub use requester::Requester;
