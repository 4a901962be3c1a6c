//! Disposable infrastructure for Pinhole integration tests.
//!
//! Currently a single fixture: a throwaway PostgreSQL server backed by
//! testcontainers, used by the relational store's integration tests.

pub mod error;
pub mod postgres;

pub use error::{Result, TestInfraError};
pub use postgres::{PostgresConfig, PostgresServer};
