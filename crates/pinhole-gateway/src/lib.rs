//! HTTP surface for Pinhole.
//!
//! A thin axum layer over [`ShortenerService`][pinhole_shortener::ShortenerService]:
//! shorten, redirect, per-user listing, bulk delete, and stats. The caller's
//! identity arrives as an opaque `x-user-id` header set by an upstream
//! authentication layer; this crate only requires that it is present.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use error::AppError;
pub use state::AppState;
