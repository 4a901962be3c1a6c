//! URL shortener orchestration for Pinhole.
//!
//! This crate wires a [`UrlStore`][pinhole_core::UrlStore] backend and a
//! [`Generator`][pinhole_generator::Generator] into the service the
//! transports talk to, and owns the asynchronous deletion queue.

pub mod deletion;
pub mod error;
pub mod service;

pub use deletion::DeletionQueue;
pub use error::ShortenerError;
pub use service::{BatchItem, BatchResult, Created, OwnedUrl, Resolution, ShortenerService};
