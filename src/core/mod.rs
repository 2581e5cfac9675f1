//! Core components of the `sdwan-rs` client.
//!
//! This module contains the foundational building blocks of the library, including:
//! - The main [`SdwanClient`] and its builder.
//! - The primary [`SdwanError`] type.
//! - The request ([`Req`]), response ([`Res`]) and body ([`Body`]) types.
//! - Internal networking, authentication and retry logic.

/// JSON body builder for request payloads.
pub mod body;
/// The main client (`SdwanClient`), builder, retry policy and authentication.
pub mod client;
/// The primary error type (`SdwanError`) for the crate.
pub mod error;
/// Outbound request description.
pub mod request;
/// Parsed response payload.
pub mod res;

pub(crate) mod net;

// convenient re-exports so most code can just `use crate::core::SdwanClient`
pub use body::Body;
pub use client::{RetryPolicy, SdwanClient, SdwanClientBuilder};
pub use error::{AuthError, AuthStage, SdwanError};
pub use request::Req;
pub use res::Res;
