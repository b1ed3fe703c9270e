//! # MediaVault Common Library
//!
//! Shared code for the MediaVault backend including:
//! - Database models and schema initialization
//! - Error taxonomy
//! - Static configuration loading
//! - System settings store (singleton row + cached snapshot)
//! - Authentication primitives (PIN resolution, tokens, authorization)

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod settings;

pub use error::{Error, Result};
