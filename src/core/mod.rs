//! Core components of the `vh-rewards` client.
//!
//! This module contains the foundational building blocks of the crate:
//! - The main [`VhClient`] and its builder.
//! - The primary [`VhError`] type.
//! - The retry policy ([`RetryConfig`], [`Backoff`]) shared by every upstream call.

/// The main client (`VhClient`), builder, and retry configuration.
pub mod client;
/// The primary error type (`VhError`) for the crate.
pub mod error;

pub use client::{Backoff, CacheMode, RetryConfig, VhClient, VhClientBuilder};
pub use error::VhError;
