//! # Homestay Common Library
//!
//! Shared code for the Homestay listing service:
//! - Error type and result alias
//! - Configuration loading and root folder resolution
//! - Database initialization (schema for homes, users, sessions)

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
