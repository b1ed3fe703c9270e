//! Background services and storage collaborators

pub mod catalog;
pub mod mailer;
pub mod store;

pub use catalog::{CatalogEngine, MediaUpdate, UploadRequest};
pub use mailer::{spawn_mailer, MailerHandle, PinEmail};
pub use store::MediaStore;
