//! kickwatch library crate.
//!
//! Exposes the polling engine for integration testing.

pub mod config;
pub mod database;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod monitor;

pub use error::{Error, Result};
