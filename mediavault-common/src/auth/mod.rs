//! Authentication primitives: PIN resolution, tokens, authorization policy

pub mod guard;
pub mod pin;
pub mod token;

pub use guard::{authorize, Capability, Role};
pub use pin::{generate_pin, resolve_credential, Credential};
pub use token::{Claims, TokenService};
