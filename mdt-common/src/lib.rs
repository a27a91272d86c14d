//! # MDT Common Library
//!
//! Shared code for the municipal debt tracker services:
//! - Error type shared by all crates
//! - TOML bootstrap configuration and config file resolution
//! - Local database initialization (debtors, phone cache)

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
