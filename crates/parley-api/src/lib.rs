//! HTTP client for the document chat backend.
//!
//! [`HttpBackend`] implements the [`parley_core::Backend`] trait against the
//! six-endpoint HTTP API; wire payload shapes live in [`types`].

mod client;
pub mod types;

pub use client::{HttpBackend, default_client};
