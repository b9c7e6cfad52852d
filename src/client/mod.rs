//! Stores API client and authentication.
//!
//! This module provides the [`StoresClient`] for the paginated store details
//! API, along with its authentication type ([`Auth`]).

mod auth;
mod stores;

pub use auth::{API_KEY_HEADER, Auth};
pub use stores::StoresClient;
