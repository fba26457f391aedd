//! Shopkit Core - Shared types library.
//!
//! This crate provides common types used across all Shopkit components:
//! - `client` - Storefront client library (cache, provider, collections)
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, composite line keys, and decimal price math

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
