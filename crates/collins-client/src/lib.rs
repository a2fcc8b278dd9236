//! # Collins Client
//!
//! HTTP client for the [Collins](https://tumblr.github.io/collins/) asset
//! management API: create, query, update, and delete asset records and
//! asset-type definitions over HTTP with Basic authentication.
//!
//! Every API call returns the Collins response envelope
//! (`{"status": ..., "data": ...}`) decoded into [`Envelope`]; the `data`
//! payload is passed through as raw JSON. Non-2xx responses surface as
//! [`ClientError::Api`] carrying the status code, which the idempotency
//! helpers ([`CollinsClient::ensure_asset`],
//! [`CollinsClient::ensure_asset_type`]) use to treat 409 ("already exists")
//! as success.
//!
//! All I/O is synchronous and blocking; each call performs exactly one HTTP
//! round-trip. The `prepare_*` methods build a request without sending it,
//! leaving dispatch to the caller.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod encoding;
pub mod params;
pub mod response;
pub mod search;

pub use client::{ClientError, CollinsClient, LogSeverity};
pub use config::CollinsConfig;
pub use params::Params;
pub use response::Envelope;
pub use search::AssetSearch;
