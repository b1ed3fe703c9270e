//! HTTP API handlers for mediavault-api

pub mod auth;
pub mod guests;
pub mod health;
pub mod media;
pub mod settings;
pub mod spa;

pub use auth::auth_routes;
pub use guests::guest_routes;
pub use health::health_routes;
pub use media::media_routes;
pub use settings::settings_routes;
pub use spa::{spa_fallback, static_not_found};
