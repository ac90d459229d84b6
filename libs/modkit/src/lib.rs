//! # ModKit - shared building blocks for service modules
//!
//! - [`api`]: the uniform JSON response envelope and its axum integration
//! - [`runtime`]: process lifecycle helpers (shutdown signals)

pub use anyhow::Result;

pub mod api;
pub mod runtime;

pub use api::envelope::{
    bad_request, created_json, internal_error, not_found, ok_json, Envelope, EnvelopeResponse,
};
pub use runtime::{shutdown_signal, wait_for_shutdown};
