//! Shared types for the webmail client workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
