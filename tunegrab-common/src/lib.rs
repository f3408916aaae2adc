//! # Tunegrab Common Library
//!
//! Shared code for the tunegrab services including:
//! - Error types
//! - Configuration loading
//! - Search result and candidate models
//! - Progress event types and the ProgressBus

pub mod config;
pub mod error;
pub mod events;
pub mod model;

pub use error::{Error, Result};
pub use events::{ProgressBus, ProgressEvent};
