pub mod error;
pub mod layout;
pub mod loader;
pub mod manifest;
pub mod placement;
pub mod progress;
pub mod reconcile;
pub mod validate;
