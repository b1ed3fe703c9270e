//! Database operations for the API crate

pub mod guests;
pub mod media;
