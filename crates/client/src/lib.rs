//! Shopkit client library.
//!
//! Client-side data layer for a Shopkit storefront UI: a keyed, timestamped
//! cache of read-mostly catalog data, a bulk-fetch provider that keeps it
//! fresh, and optimistic mutation controllers for the cart, saved-for-later,
//! and wishlist collections.
//!
//! # Architecture
//!
//! - [`api::RemoteClient`] - thin `reqwest` wrapper over the storefront REST
//!   backend (bearer auth, explicit timeout, JSON error extraction)
//! - [`cache::CacheStore`] - keyed entries with timestamp-based staleness
//! - [`provider::DataProvider`] - one coalesced bulk fetch, normalized into
//!   the fixed cache key set; a newer refresh supersedes an older one
//! - [`collection`] - optimistic collections: local state mutated
//!   immediately, remote call issued, rollback to snapshot on failure
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shopkit_client::api::RemoteClient;
//! use shopkit_client::auth::MemoryTokenStore;
//! use shopkit_client::config::ClientConfig;
//! use shopkit_client::provider::DataProvider;
//!
//! let config = ClientConfig::from_env()?;
//! let tokens = Arc::new(MemoryTokenStore::default());
//! let client = Arc::new(RemoteClient::new(&config, tokens)?);
//!
//! let provider = DataProvider::new(Arc::clone(&client), config.staleness_threshold);
//! provider.refresh(false).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cache;
pub mod collection;
pub mod config;
pub mod error;
pub mod provider;
pub mod telemetry;
pub mod types;

pub use error::ApiError;
