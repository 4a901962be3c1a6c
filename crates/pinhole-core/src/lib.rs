//! Core types and traits for the Pinhole URL shortener.
//!
//! This crate defines the storage contract ([`UrlStore`]) shared by every
//! backend adapter, together with the record types and the error taxonomy
//! used across the workspace.

pub mod error;
pub mod store;

pub use error::{Result, StoreError};
pub use store::{AddOutcome, Stats, UrlStore, UserUrl};
