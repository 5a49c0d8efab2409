//! # Reel Common Library
//!
//! Shared code for the Reel search workspace including:
//! - Error types
//! - Configuration loading (CLI → ENV → TOML → compiled defaults)
//! - Search session events and the EventBus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
