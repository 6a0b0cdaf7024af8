//! # GL Lifecycle
//!
//! Ownership and lifetime management for GPU objects, rendering contexts and
//! monitor handles on top of a windowing system.
//!
//! ## Features
//!
//! - **Context-gated resources**: textures, shader programs and vertex-array
//!   objects remember the context they were created in and refuse GPU work
//!   while another context is current
//! - **Deterministic teardown**: every resource is deleted under its own
//!   context before any window goes away
//! - **Monitor cache**: display handles are cached and invalidated as one
//!   batch whenever a display is plugged in or out
//! - **Headless backends**: an in-memory platform and a recording GPU for
//!   tests and tooling
//! - **GLFW backend**: behind the `glfw` feature
//!
//! ## Quick Start
//!
//! ```rust
//! use gl_lifecycle::prelude::*;
//! use gl_lifecycle::backend::headless::{HeadlessPlatform, RecordingGpu};
//!
//! fn main() -> Result<(), GfxError> {
//!     let mut session = GraphicsSession::init(HeadlessPlatform::new(), RecordingGpu::new())?;
//!     let window = session.create_window(&WindowConfig::new(800, 600).with_title("demo"))?;
//!
//!     let pixels = TextureData::solid_color(4, 4, [255, 255, 255, 255]);
//!     let texture = session.create_texture(&pixels, TextureOptions::default())?;
//!     session.bind_texture(texture, TextureSlot::T0)?;
//!
//!     session.update(window)?;
//!     session.terminate()?;
//!     assert!(session.is_deleted(texture));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;

pub mod foundation;
pub mod config;
pub mod assets;
pub mod backend;
pub mod context;
pub mod error;
pub mod monitor;
pub mod resource;

mod session;

pub use error::{ErrorKind, GfxError, GfxResult};
pub use session::GraphicsSession;

/// Common imports for users of the crate
pub mod prelude {
    pub use crate::{
        GraphicsSession,
        error::{CompileStage, ErrorKind, GfxError, GfxResult, ShaderCompileError},
        foundation::collections::{ResourceId, TypedHandle, WindowId},
        assets::{AssetLoader, TextureData},
        backend::{GpuApi, Platform, PlatformEvent, VideoMode},
        monitor::Monitor,
        resource::{
            ResizeFilter, ShaderHandle, ShaderStage, TextureHandle, TextureOptions, TextureSlot,
            VertexArray, VertexArrayHandle, WrapMode,
        },
        core::config::{SessionConfig, WindowConfig},
        config::Config,
    };
}
