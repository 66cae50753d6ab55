//! Shared building blocks for the virtual therapist relay: configuration,
//! the top-level error type, and the wire types exchanged with clients.

pub mod config;
pub mod error;
pub mod types;

pub use config::TherapistConfig;
pub use error::{Result, TherapistError};
pub use types::*;
