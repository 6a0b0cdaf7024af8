//! # Core Module
//!
//! Configuration types shared by the session and the context manager.

pub mod config;

pub use config::{
    SessionConfig,
    WindowConfig,
    MIN_WINDOW_DIMENSION,
    MAX_WINDOW_DIMENSION,
};
