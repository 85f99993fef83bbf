//! # TimeKeeper
//!
//! Backend service for an e-commerce watch store, usable both as a
//! standalone binary and as a library.
//!
//! Anyone can browse the catalog, leave a review, or place and cancel a
//! purchase. Administrators, marked by the `admin` role on their user
//! document, manage the catalog, ship orders, and grant the role to
//! other users. Requests authenticate with bearer identity tokens; the
//! auth gate attaches a verified email to the request when one checks
//! out and lets the request through either way.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! timekeeper = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use timekeeper::auth::StoreIdentityProvider;
//! use timekeeper::server::{AppState, create_router};
//! use timekeeper::store::SqliteStore;
//!
//! let store = Arc::new(SqliteStore::new(PathBuf::from("./data/timekeeper.db")).unwrap());
//! store.initialize().unwrap();
//!
//! let identity = Arc::new(StoreIdentityProvider::new(store.clone()));
//! let state = Arc::new(AppState::new(store, identity));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
