//! Passtrack - a local mirror of a remote beatmap catalog and per-user
//! completion history.
//!
//! The library keeps a SQLite database current against a large remote
//! catalog without re-downloading history on every refresh. Three
//! cooperating loops (see [`sync`]) discover newly published mapsets, admit
//! stale users into a durable work queue, and drain that queue one user at a
//! time, choosing between an incremental recent-scores pass and a resumable
//! full historical rescan.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use passtrack::api::{ApiClient, ApiCredentials, ApiRateLimiter};
//! use passtrack::sync::{Lifecycle, SyncContext, spawn_engine};
//!
//! let db = passtrack::connect_and_migrate("sqlite://passtrack.db?mode=rwc").await?;
//! let api = Arc::new(ApiClient::new(ApiCredentials {
//!     client_id: "...".into(),
//!     client_secret: "...".into(),
//! }));
//! let ctx = Arc::new(SyncContext::new(db, api, ApiRateLimiter::default()));
//!
//! let lifecycle = Lifecycle::new();
//! let loops = spawn_engine(ctx, &lifecycle);
//! // ... on shutdown:
//! lifecycle.drain();
//! for handle in loops {
//!     handle.await?;
//! }
//! ```

pub mod api;
pub mod db;
pub mod entity;
pub mod migration;
pub mod store;
pub mod sync;

pub use db::{connect, connect_and_migrate};
pub use entity::prelude::*;
pub use store::StoreError;
pub use sync::{SyncContext, SyncError};
