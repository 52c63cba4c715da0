//! Shared HTTP plumbing for Conduit feature crates

#![allow(clippy::must_use_candidate)]

mod error;
mod extract;

pub use error::{ErrorBody, HttpError, error_response};
pub use extract::JsonPayload;
