//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Generational handle types for windows and resources
//! - Logging utilities

pub mod collections;
pub mod logging;
