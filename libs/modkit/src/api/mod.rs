//! HTTP API helpers shared by REST modules.

pub mod envelope;

pub use envelope::{
    bad_request, created_json, internal_error, not_found, ok_json, Envelope, EnvelopeResponse,
};
