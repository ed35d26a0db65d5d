//! Typed store operations over the passtrack schema.
//!
//! The store exclusively owns all persisted state; the sync loops coordinate
//! entirely through it (existence of rows, not in-memory locks). Operations
//! that participate in a caller's transaction are generic over
//! [`sea_orm::ConnectionTrait`] so they work against both a connection and an
//! open transaction.

pub mod catalog;
pub mod completions;
mod errors;
pub mod queue;
pub mod users;

pub use errors::{Result, StoreError};
pub use users::ProfileUpdate;
