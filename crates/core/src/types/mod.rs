//! Core types for Shopkit.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod key;
pub mod price;

pub use id::*;
pub use key::LineKey;
pub use price::apply_discount_percent;
