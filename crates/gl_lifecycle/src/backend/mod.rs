//! Backend contracts for windowing and GPU access
//!
//! The lifecycle layer never talks to a native API directly. It drives two
//! narrow traits instead:
//!
//! ```text
//! ┌─────────────────────────────────┐
//! │  GraphicsSession                │
//! │  ContextManager / Registries    │
//! └──────┬───────────────────┬──────┘
//!        │ Platform          │ GpuApi
//! ┌──────▼──────────┐ ┌──────▼──────────┐
//! │ GlfwPlatform    │ │ application GL  │
//! │ HeadlessPlatform│ │ RecordingGpu    │
//! └─────────────────┘ └─────────────────┘
//! ```
//!
//! Both traits are implemented by [`headless`] for tests and tooling. The
//! GLFW implementation of [`Platform`] lives behind the `glfw` feature.
//!
//! Native calls on these traits are assumed to succeed unless their signature
//! says otherwise; all ordering and ownership checks happen above them.

pub mod headless;
#[cfg(feature = "glfw")]
pub mod glfw_platform;

use crate::resource::shader::ShaderStage;
use crate::resource::texture::{ResizeFilter, TextureSlot, WrapMode};

/// Opaque native window (and context) handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeWindow(pub u64);

/// Opaque native monitor handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeMonitor(pub u64);

/// Current video mode of a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoMode {
    /// Horizontal resolution in screen coordinates
    pub width: u32,
    /// Vertical resolution in screen coordinates
    pub height: u32,
    /// Refresh rate in Hz
    pub refresh_rate: u32,
}

/// One entry of a monitor enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInfo {
    /// Native handle
    pub native: NativeMonitor,
    /// Human readable name reported by the system
    pub name: String,
}

/// Parameters for creating a native window and its context
///
/// Windows are always created hidden; the context manager positions them and
/// shows them once the context is set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRequest<'a> {
    /// Title bar text
    pub title: &'a str,
    /// Client area width
    pub width: u32,
    /// Client area height
    pub height: u32,
    /// Whether the user may resize the window
    pub resizable: bool,
    /// Monitor to go full screen on, windowed when `None`
    pub fullscreen: Option<NativeMonitor>,
}

/// Events drained from the native event queue by [`Platform::poll_events`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlatformEvent {
    /// A display was connected
    MonitorConnected(NativeMonitor),
    /// A display was disconnected
    MonitorDisconnected(NativeMonitor),
    /// The user asked for the window to close
    CloseRequested(NativeWindow),
    /// The window's client area changed size
    Resized {
        /// Affected window
        window: NativeWindow,
        /// New width
        width: i32,
        /// New height
        height: i32,
    },
    /// The window's framebuffer changed size
    FramebufferResized {
        /// Affected window
        window: NativeWindow,
        /// New framebuffer width
        width: i32,
        /// New framebuffer height
        height: i32,
    },
    /// The cursor moved inside the window
    CursorMoved {
        /// Affected window
        window: NativeWindow,
        /// Cursor x relative to the content area
        x: f64,
        /// Cursor y relative to the content area
        y: f64,
    },
}

impl PlatformEvent {
    /// Whether this event changes the display topology
    pub fn is_hotplug(&self) -> bool {
        matches!(self, Self::MonitorConnected(_) | Self::MonitorDisconnected(_))
    }
}

/// Windowing system contract
///
/// Implementations are single-threaded: every call happens on the thread that
/// owns the session. Geometry queries follow the native convention of signed
/// coordinates.
pub trait Platform {
    /// Initialize the windowing system
    fn init(&mut self) -> Result<(), String>;

    /// Shut the windowing system down. Called once, after every window is gone.
    fn terminate(&mut self);

    /// Create a hidden window with its own rendering context
    ///
    /// Returns `None` when the native call fails.
    fn create_window(&mut self, request: &WindowRequest<'_>) -> Option<NativeWindow>;

    /// Free the window's callbacks, then its context and the window itself
    fn destroy_window(&mut self, window: NativeWindow);

    /// Make the window's context current on this thread, or detach with `None`
    fn make_context_current(&mut self, window: Option<NativeWindow>);

    /// Swap interval for the current context (0 disables vertical sync)
    fn set_swap_interval(&mut self, interval: u32);

    /// Make a hidden window visible
    fn show_window(&mut self, window: NativeWindow);

    /// Move the window's top-left corner
    fn set_window_position(&mut self, window: NativeWindow, x: i32, y: i32);

    /// Window position in screen coordinates
    fn window_position(&self, window: NativeWindow) -> (i32, i32);

    /// Client area size in screen coordinates
    fn window_size(&self, window: NativeWindow) -> (i32, i32);

    /// Framebuffer size in pixels
    fn framebuffer_size(&self, window: NativeWindow) -> (i32, i32);

    /// Cursor position relative to the content area
    fn cursor_position(&self, window: NativeWindow) -> (f64, f64);

    /// Whether the user asked for the window to close
    fn should_close(&self, window: NativeWindow) -> bool;

    /// Present the back buffer
    fn swap_buffers(&mut self, window: NativeWindow);

    /// Process pending native events and return them in arrival order
    fn poll_events(&mut self) -> Vec<PlatformEvent>;

    /// Enumerate connected monitors, primary first
    fn monitors(&mut self) -> Vec<MonitorInfo>;

    /// Current video mode of a monitor, `None` if it is gone
    fn video_mode(&mut self, monitor: NativeMonitor) -> Option<VideoMode>;

    /// Top-left corner of a monitor on the virtual desktop, `None` if it is gone
    fn monitor_position(&mut self, monitor: NativeMonitor) -> Option<(i32, i32)>;
}

/// Target of a buffer upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data
    Array,
    /// Index data
    ElementArray,
}

impl BufferTarget {
    /// OpenGL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Array => 0x8892,
            Self::ElementArray => 0x8893,
        }
    }
}

/// GPU call contract, issued against whichever context is current
///
/// Object-creating calls return `0` on failure, like their GL counterparts.
pub trait GpuApi {
    /// `glGenTextures`
    fn gen_texture(&mut self) -> u32;
    /// `glActiveTexture`
    fn active_texture(&mut self, slot: TextureSlot);
    /// `glBindTexture(GL_TEXTURE_2D, ..)`, `0` unbinds
    fn bind_texture(&mut self, texture: u32);
    /// Wrap and filter parameters of the bound 2D texture
    fn set_texture_parameters(&mut self, wrap: WrapMode, filter: ResizeFilter);
    /// `glTexImage2D` with RGBA8 pixels
    fn upload_texture_rgba8(&mut self, width: u32, height: u32, pixels: &[u8]);
    /// `glDeleteTextures`
    fn delete_texture(&mut self, texture: u32);

    /// `glCreateShader`
    fn create_shader(&mut self, stage: ShaderStage) -> u32;
    /// Upload source and compile; the error carries the info log
    fn compile_shader(&mut self, shader: u32, source: &str) -> Result<(), String>;
    /// `glDeleteShader`
    fn delete_shader(&mut self, shader: u32);
    /// `glCreateProgram`
    fn create_program(&mut self) -> u32;
    /// `glAttachShader`
    fn attach_shader(&mut self, program: u32, shader: u32);
    /// `glDetachShader`
    fn detach_shader(&mut self, program: u32, shader: u32);
    /// Link; the error carries the info log
    fn link_program(&mut self, program: u32) -> Result<(), String>;
    /// `glUseProgram`, `0` stops using any program
    fn use_program(&mut self, program: u32);
    /// `glGetUniformLocation`
    fn uniform_location(&mut self, program: u32, name: &str) -> i32;
    /// `glDeleteProgram`
    fn delete_program(&mut self, program: u32);

    /// `glGenVertexArrays`
    fn gen_vertex_array(&mut self) -> u32;
    /// `glBindVertexArray`, `0` unbinds
    fn bind_vertex_array(&mut self, vertex_array: u32);
    /// `glDeleteVertexArrays`
    fn delete_vertex_array(&mut self, vertex_array: u32);
    /// `glGenBuffers`
    fn gen_buffer(&mut self) -> u32;
    /// Bind and fill a buffer with static data
    fn upload_buffer(&mut self, target: BufferTarget, buffer: u32, bytes: &[u8]);
    /// `glVertexAttribPointer` for tightly packed floats
    fn vertex_attrib_pointer(&mut self, index: u32, components: u32);
    /// `glEnableVertexAttribArray` / `glDisableVertexAttribArray`
    fn set_attrib_enabled(&mut self, index: u32, enabled: bool);
    /// `glDrawElements(GL_TRIANGLES, count, GL_UNSIGNED_INT, 0)`
    fn draw_indexed_triangles(&mut self, count: u32);
    /// `glDeleteBuffers`
    fn delete_buffer(&mut self, buffer: u32);
}
