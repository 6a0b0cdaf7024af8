//! Error types shared by every subsystem of the crate
//!
//! All failures are reported synchronously through [`GfxResult`]. None of them
//! are transient: retrying a call that failed with a wrong context, a deleted
//! resource or a destroyed window gives the same answer until the caller
//! changes the state it depends on.

use thiserror::Error;

use crate::foundation::collections::WindowId;
use crate::resource::ResourceKind;

/// Broad classification of a [`GfxError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An argument was out of range or otherwise unusable. Nothing was mutated.
    PreconditionViolation,
    /// The target object (or the session) is in a state that forbids the call.
    InvalidState,
    /// A resource was touched while a context other than its owner was current.
    WrongContextActive,
    /// The windowing or graphics backend refused to create something.
    NativeCallFailure,
}

/// Errors raised by the session, the registries and the resource types
#[derive(Error, Debug)]
pub enum GfxError {
    /// Generic argument validation failure
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Window dimensions outside of the legal range
    #[error("Illegal window dimensions: {width}x{height}")]
    IllegalDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// The resource was already deleted (explicitly or by bulk teardown)
    #[error("{kind} was already deleted")]
    ResourceDeleted {
        /// Kind of resource the handle referred to
        kind: ResourceKind,
    },

    /// The window was already destroyed
    #[error("Window was already destroyed")]
    WindowDestroyed,

    /// A resource was about to be created with no context current
    #[error("No rendering context is current")]
    NoCurrentContext,

    /// The window owning the resource no longer exists
    #[error("The context owning this {kind} was already destroyed")]
    OwnerContextDestroyed {
        /// Kind of resource whose owner is gone
        kind: ResourceKind,
    },

    /// The session was terminated, no further calls are legal
    #[error("Graphics session was already terminated")]
    SessionTerminated,

    /// The resource's owning context is not the current one
    #[error("The wrong rendering context is current (owner {owner:?}, current {current:?})")]
    WrongContextActive {
        /// Context the resource was created in
        owner: WindowId,
        /// Context current at the time of the call
        current: Option<WindowId>,
    },

    /// A native creation call failed
    #[error("Native call failed: {0}")]
    NativeCallFailed(String),

    /// Shader compilation or program linking failed
    #[error(transparent)]
    ShaderCompile(#[from] ShaderCompileError),

    /// Bulk teardown could not make a resource's owner current
    #[error("Teardown could not make the owning context of a {kind} current: {source}")]
    TeardownContextLost {
        /// Kind of the resource that would have leaked
        kind: ResourceKind,
        /// Why the context switch failed
        #[source]
        source: Box<GfxError>,
    },
}

impl GfxError {
    /// Classify this error into one of the four failure kinds
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::IllegalDimensions { .. } => {
                ErrorKind::PreconditionViolation
            }
            Self::ResourceDeleted { .. }
            | Self::WindowDestroyed
            | Self::NoCurrentContext
            | Self::OwnerContextDestroyed { .. }
            | Self::SessionTerminated
            | Self::TeardownContextLost { .. } => ErrorKind::InvalidState,
            Self::WrongContextActive { .. } => ErrorKind::WrongContextActive,
            Self::NativeCallFailed(_) | Self::ShaderCompile(_) => ErrorKind::NativeCallFailure,
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }
}

/// Pipeline stage a shader failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileStage {
    /// Vertex shader compilation
    Vertex,
    /// Fragment shader compilation
    Fragment,
    /// Program linking
    Link,
}

/// Compile or link failure, carrying the native info log
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ShaderCompileError {
    /// Stage that failed
    pub stage: CompileStage,
    /// Short human readable description
    pub message: String,
    /// Info log reported by the driver
    pub log: String,
}

impl ShaderCompileError {
    pub(crate) fn new(stage: CompileStage, log: impl Into<String>) -> Self {
        let message = match stage {
            CompileStage::Vertex => "Vertex shader could not compile",
            CompileStage::Fragment => "Fragment shader could not compile",
            CompileStage::Link => "Shader program could not link",
        };
        Self {
            stage,
            message: message.to_string(),
            log: log.into(),
        }
    }
}

/// Result alias used across the crate
pub type GfxResult<T> = Result<T, GfxError>;
