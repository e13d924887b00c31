//! Wire types and a client for the accounts API, shared between the server
//! and anything that talks to it.

/// Requests, responses, and endpoint paths for the accounts API.
pub mod api;
pub use api::Client;
