//! In-memory backends for tests and headless tooling
//!
//! [`HeadlessPlatform`] simulates windows, contexts and monitors, including
//! hotplug events that surface on the next poll exactly like a native event
//! queue. [`RecordingGpu`] records every GPU call and tracks which object
//! names are still alive, so leaks and stray calls are observable.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{
    BufferTarget, GpuApi, MonitorInfo, NativeMonitor, NativeWindow, Platform, PlatformEvent,
    VideoMode, WindowRequest,
};
use crate::resource::shader::ShaderStage;
use crate::resource::texture::{ResizeFilter, TextureSlot, WrapMode};

/// State of one simulated window
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWindow {
    /// Title it was created with
    pub title: String,
    /// Client area width
    pub width: i32,
    /// Client area height
    pub height: i32,
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Resizable hint
    pub resizable: bool,
    /// Whether `show_window` was called
    pub visible: bool,
    /// Monitor the window is full screen on
    pub fullscreen: Option<NativeMonitor>,
    /// Swap interval applied while this window's context was current
    pub swap_interval: u32,
    /// Cursor position
    pub cursor: (f64, f64),
    /// Close flag
    pub close_requested: bool,
    /// Number of buffer swaps
    pub frames_presented: u64,
}

/// Counters of native calls made against a [`HeadlessPlatform`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlatformStats {
    /// `make_context_current` calls
    pub context_switches: usize,
    /// `monitors` enumerations
    pub monitor_queries: usize,
    /// `poll_events` calls
    pub polls: usize,
    /// Successful window creations
    pub windows_created: usize,
    /// Window destructions
    pub windows_destroyed: usize,
}

#[derive(Debug, Clone)]
struct HeadlessMonitor {
    info: MonitorInfo,
    mode: VideoMode,
    origin: (i32, i32),
}

/// Simulated windowing system
#[derive(Debug)]
pub struct HeadlessPlatform {
    initialized: bool,
    terminated: bool,
    fail_init: bool,
    fail_next_window: bool,
    next_handle: u64,
    windows: BTreeMap<NativeWindow, HeadlessWindow>,
    monitors: Vec<HeadlessMonitor>,
    pending: Vec<PlatformEvent>,
    current: Option<NativeWindow>,
    content_scale: i32,
    stats: PlatformStats,
}

impl HeadlessPlatform {
    /// A platform with a single 1920x1080 monitor
    pub fn new() -> Self {
        Self::with_monitors([VideoMode {
            width: 1920,
            height: 1080,
            refresh_rate: 60,
        }])
    }

    /// A platform with one monitor per video mode, the first being primary
    ///
    /// Monitors are laid out left to right along the top edge of the desktop.
    pub fn with_monitors(modes: impl IntoIterator<Item = VideoMode>) -> Self {
        let mut platform = Self {
            initialized: false,
            terminated: false,
            fail_init: false,
            fail_next_window: false,
            next_handle: 1,
            windows: BTreeMap::new(),
            monitors: Vec::new(),
            pending: Vec::new(),
            current: None,
            content_scale: 1,
            stats: PlatformStats::default(),
        };
        for mode in modes {
            platform.add_monitor(mode);
        }
        platform
    }

    /// A platform that reports no displays at all
    pub fn without_monitors() -> Self {
        Self::with_monitors([])
    }

    /// Framebuffer pixels per screen coordinate
    pub fn with_content_scale(mut self, scale: i32) -> Self {
        self.content_scale = scale.max(1);
        self
    }

    /// Make the next `init` call fail
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Make the next `create_window` call fail
    pub fn fail_next_window(&mut self) {
        self.fail_next_window = true;
    }

    /// Plug in a display; the hotplug event is delivered on the next poll
    pub fn connect_monitor(&mut self, mode: VideoMode) -> NativeMonitor {
        let native = self.add_monitor(mode);
        self.pending.push(PlatformEvent::MonitorConnected(native));
        native
    }

    /// Unplug a display; the hotplug event is delivered on the next poll
    pub fn disconnect_monitor(&mut self, monitor: NativeMonitor) -> bool {
        let before = self.monitors.len();
        self.monitors.retain(|entry| entry.info.native != monitor);
        let removed = self.monitors.len() != before;
        if removed {
            self.pending.push(PlatformEvent::MonitorDisconnected(monitor));
        }
        removed
    }

    /// Simulate the user clicking the close button
    pub fn request_close(&mut self, window: NativeWindow) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.close_requested = true;
            self.pending.push(PlatformEvent::CloseRequested(window));
        }
    }

    /// Simulate cursor movement
    pub fn move_cursor(&mut self, window: NativeWindow, x: f64, y: f64) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.cursor = (x, y);
            self.pending.push(PlatformEvent::CursorMoved { window, x, y });
        }
    }

    /// Simulate a user resize
    pub fn resize(&mut self, window: NativeWindow, width: i32, height: i32) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.width = width;
            state.height = height;
            let scale = self.content_scale;
            self.pending.push(PlatformEvent::Resized { window, width, height });
            self.pending.push(PlatformEvent::FramebufferResized {
                window,
                width: width * scale,
                height: height * scale,
            });
        }
    }

    /// State of a live window
    pub fn window(&self, window: NativeWindow) -> Option<&HeadlessWindow> {
        self.windows.get(&window)
    }

    /// Number of native windows still alive
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Context currently bound on the (simulated) thread
    pub fn current_context(&self) -> Option<NativeWindow> {
        self.current
    }

    /// Call counters
    pub fn stats(&self) -> PlatformStats {
        self.stats
    }

    /// Whether `init` succeeded
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether `terminate` ran
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn add_monitor(&mut self, mode: VideoMode) -> NativeMonitor {
        let native = NativeMonitor(self.next_handle);
        self.next_handle += 1;
        let info = MonitorInfo {
            native,
            name: format!("Headless-{}", native.0),
        };
        let right_edge = self
            .monitors
            .iter()
            .map(|entry| entry.origin.0.saturating_add(i32::try_from(entry.mode.width).unwrap_or(i32::MAX)))
            .max()
            .unwrap_or(0);
        self.monitors.push(HeadlessMonitor {
            info,
            mode,
            origin: (right_edge, 0),
        });
        native
    }

    fn monitor(&self, monitor: NativeMonitor) -> Option<&HeadlessMonitor> {
        self.monitors.iter().find(|entry| entry.info.native == monitor)
    }

    fn ready(&self) -> bool {
        self.initialized && !self.terminated
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for HeadlessPlatform {
    fn init(&mut self) -> Result<(), String> {
        if self.terminated {
            return Err("windowing system was already terminated".to_string());
        }
        if self.initialized {
            return Err("windowing system was already initialized".to_string());
        }
        if self.fail_init {
            return Err("simulated initialization failure".to_string());
        }
        self.initialized = true;
        Ok(())
    }

    fn terminate(&mut self) {
        self.windows.clear();
        self.current = None;
        self.terminated = true;
    }

    fn create_window(&mut self, request: &WindowRequest<'_>) -> Option<NativeWindow> {
        if !self.ready() || std::mem::take(&mut self.fail_next_window) {
            return None;
        }

        let (width, height) = match request.fullscreen {
            Some(monitor) => {
                let mode = self.video_mode(monitor)?;
                (mode.width, mode.height)
            }
            None => (request.width, request.height),
        };

        let native = NativeWindow(self.next_handle);
        self.next_handle += 1;
        self.windows.insert(
            native,
            HeadlessWindow {
                title: request.title.to_string(),
                width: i32::try_from(width).ok()?,
                height: i32::try_from(height).ok()?,
                x: 0,
                y: 0,
                resizable: request.resizable,
                visible: false,
                fullscreen: request.fullscreen,
                swap_interval: 0,
                cursor: (0.0, 0.0),
                close_requested: false,
                frames_presented: 0,
            },
        );
        self.stats.windows_created += 1;
        Some(native)
    }

    fn destroy_window(&mut self, window: NativeWindow) {
        if self.windows.remove(&window).is_some() {
            self.stats.windows_destroyed += 1;
        }
        if self.current == Some(window) {
            self.current = None;
        }
    }

    fn make_context_current(&mut self, window: Option<NativeWindow>) {
        self.stats.context_switches += 1;
        self.current = window.filter(|w| self.windows.contains_key(w));
    }

    fn set_swap_interval(&mut self, interval: u32) {
        if let Some(state) = self.current.and_then(|w| self.windows.get_mut(&w)) {
            state.swap_interval = interval;
        }
    }

    fn show_window(&mut self, window: NativeWindow) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.visible = true;
        }
    }

    fn set_window_position(&mut self, window: NativeWindow, x: i32, y: i32) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.x = x;
            state.y = y;
        }
    }

    fn window_position(&self, window: NativeWindow) -> (i32, i32) {
        self.windows.get(&window).map_or((0, 0), |w| (w.x, w.y))
    }

    fn window_size(&self, window: NativeWindow) -> (i32, i32) {
        self.windows.get(&window).map_or((0, 0), |w| (w.width, w.height))
    }

    fn framebuffer_size(&self, window: NativeWindow) -> (i32, i32) {
        let (width, height) = self.window_size(window);
        (width * self.content_scale, height * self.content_scale)
    }

    fn cursor_position(&self, window: NativeWindow) -> (f64, f64) {
        self.windows.get(&window).map_or((0.0, 0.0), |w| w.cursor)
    }

    fn should_close(&self, window: NativeWindow) -> bool {
        self.windows.get(&window).is_some_and(|w| w.close_requested)
    }

    fn swap_buffers(&mut self, window: NativeWindow) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.frames_presented += 1;
        }
    }

    fn poll_events(&mut self) -> Vec<PlatformEvent> {
        self.stats.polls += 1;
        std::mem::take(&mut self.pending)
    }

    fn monitors(&mut self) -> Vec<MonitorInfo> {
        self.stats.monitor_queries += 1;
        self.monitors.iter().map(|entry| entry.info.clone()).collect()
    }

    fn video_mode(&mut self, monitor: NativeMonitor) -> Option<VideoMode> {
        self.monitor(monitor).map(|entry| entry.mode)
    }

    fn monitor_position(&mut self, monitor: NativeMonitor) -> Option<(i32, i32)> {
        self.monitor(monitor).map(|entry| entry.origin)
    }
}

/// One recorded GPU call
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum GpuCall {
    GenTexture(u32),
    ActiveTexture(TextureSlot),
    BindTexture(u32),
    TextureParameters { wrap: WrapMode, filter: ResizeFilter },
    UploadTexture { width: u32, height: u32, bytes: usize },
    DeleteTexture(u32),
    CreateShader(ShaderStage, u32),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader { program: u32, shader: u32 },
    DetachShader { program: u32, shader: u32 },
    LinkProgram(u32),
    UseProgram(u32),
    UniformLocation { program: u32, name: String },
    DeleteProgram(u32),
    GenVertexArray(u32),
    BindVertexArray(u32),
    DeleteVertexArray(u32),
    GenBuffer(u32),
    UploadBuffer { target: BufferTarget, buffer: u32, bytes: usize },
    VertexAttribPointer { index: u32, components: u32 },
    SetAttribEnabled { index: u32, enabled: bool },
    DrawIndexedTriangles(u32),
    DeleteBuffer(u32),
}

/// GPU backend that records calls instead of issuing them
#[derive(Debug, Default)]
pub struct RecordingGpu {
    calls: Vec<GpuCall>,
    next_name: u32,
    live: BTreeSet<u32>,
    shader_stages: HashMap<u32, ShaderStage>,
    compile_failures: HashMap<ShaderStage, String>,
    link_failure: Option<String>,
    uniforms: HashMap<String, i32>,
    fail_allocation_in: Option<usize>,
}

impl RecordingGpu {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call recorded so far, oldest first
    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    /// Drain the recorded calls
    pub fn take_calls(&mut self) -> Vec<GpuCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of recorded calls
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    /// Number of object names created and not yet deleted
    pub fn live_object_count(&self) -> usize {
        self.live.len()
    }

    /// Make the next compile of a `stage` shader fail with `log`
    pub fn fail_compile(&mut self, stage: ShaderStage, log: impl Into<String>) {
        self.compile_failures.insert(stage, log.into());
    }

    /// Make the next program link fail with `log`
    pub fn fail_link(&mut self, log: impl Into<String>) {
        self.link_failure = Some(log.into());
    }

    /// Make the next object allocation return `0`
    pub fn fail_next_allocation(&mut self) {
        self.fail_allocation_after(0);
    }

    /// Let `successes` more allocations through, then make one return `0`
    pub fn fail_allocation_after(&mut self, successes: usize) {
        self.fail_allocation_in = Some(successes);
    }

    /// Give a uniform name a location in every program
    pub fn declare_uniform(&mut self, name: impl Into<String>, location: i32) {
        self.uniforms.insert(name.into(), location);
    }

    fn allocate(&mut self) -> u32 {
        match self.fail_allocation_in {
            Some(0) => {
                self.fail_allocation_in = None;
                return 0;
            }
            Some(remaining) => self.fail_allocation_in = Some(remaining - 1),
            None => {}
        }
        self.next_name += 1;
        self.live.insert(self.next_name);
        self.next_name
    }

    fn release(&mut self, name: u32) {
        self.live.remove(&name);
    }
}

impl GpuApi for RecordingGpu {
    fn gen_texture(&mut self) -> u32 {
        let name = self.allocate();
        self.calls.push(GpuCall::GenTexture(name));
        name
    }

    fn active_texture(&mut self, slot: TextureSlot) {
        self.calls.push(GpuCall::ActiveTexture(slot));
    }

    fn bind_texture(&mut self, texture: u32) {
        self.calls.push(GpuCall::BindTexture(texture));
    }

    fn set_texture_parameters(&mut self, wrap: WrapMode, filter: ResizeFilter) {
        self.calls.push(GpuCall::TextureParameters { wrap, filter });
    }

    fn upload_texture_rgba8(&mut self, width: u32, height: u32, pixels: &[u8]) {
        self.calls.push(GpuCall::UploadTexture {
            width,
            height,
            bytes: pixels.len(),
        });
    }

    fn delete_texture(&mut self, texture: u32) {
        self.release(texture);
        self.calls.push(GpuCall::DeleteTexture(texture));
    }

    fn create_shader(&mut self, stage: ShaderStage) -> u32 {
        let name = self.allocate();
        if name != 0 {
            self.shader_stages.insert(name, stage);
        }
        self.calls.push(GpuCall::CreateShader(stage, name));
        name
    }

    fn compile_shader(&mut self, shader: u32, _source: &str) -> Result<(), String> {
        self.calls.push(GpuCall::CompileShader(shader));
        let stage = self.shader_stages.get(&shader).copied();
        match stage.and_then(|stage| self.compile_failures.remove(&stage)) {
            Some(log) => Err(log),
            None => Ok(()),
        }
    }

    fn delete_shader(&mut self, shader: u32) {
        self.release(shader);
        self.shader_stages.remove(&shader);
        self.calls.push(GpuCall::DeleteShader(shader));
    }

    fn create_program(&mut self) -> u32 {
        let name = self.allocate();
        self.calls.push(GpuCall::CreateProgram(name));
        name
    }

    fn attach_shader(&mut self, program: u32, shader: u32) {
        self.calls.push(GpuCall::AttachShader { program, shader });
    }

    fn detach_shader(&mut self, program: u32, shader: u32) {
        self.calls.push(GpuCall::DetachShader { program, shader });
    }

    fn link_program(&mut self, program: u32) -> Result<(), String> {
        self.calls.push(GpuCall::LinkProgram(program));
        self.link_failure.take().map_or(Ok(()), Err)
    }

    fn use_program(&mut self, program: u32) {
        self.calls.push(GpuCall::UseProgram(program));
    }

    fn uniform_location(&mut self, program: u32, name: &str) -> i32 {
        self.calls.push(GpuCall::UniformLocation {
            program,
            name: name.to_string(),
        });
        self.uniforms.get(name).copied().unwrap_or(-1)
    }

    fn delete_program(&mut self, program: u32) {
        self.release(program);
        self.calls.push(GpuCall::DeleteProgram(program));
    }

    fn gen_vertex_array(&mut self) -> u32 {
        let name = self.allocate();
        self.calls.push(GpuCall::GenVertexArray(name));
        name
    }

    fn bind_vertex_array(&mut self, vertex_array: u32) {
        self.calls.push(GpuCall::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&mut self, vertex_array: u32) {
        self.release(vertex_array);
        self.calls.push(GpuCall::DeleteVertexArray(vertex_array));
    }

    fn gen_buffer(&mut self) -> u32 {
        let name = self.allocate();
        self.calls.push(GpuCall::GenBuffer(name));
        name
    }

    fn upload_buffer(&mut self, target: BufferTarget, buffer: u32, bytes: &[u8]) {
        self.calls.push(GpuCall::UploadBuffer {
            target,
            buffer,
            bytes: bytes.len(),
        });
    }

    fn vertex_attrib_pointer(&mut self, index: u32, components: u32) {
        self.calls.push(GpuCall::VertexAttribPointer { index, components });
    }

    fn set_attrib_enabled(&mut self, index: u32, enabled: bool) {
        self.calls.push(GpuCall::SetAttribEnabled { index, enabled });
    }

    fn draw_indexed_triangles(&mut self, count: u32) {
        self.calls.push(GpuCall::DrawIndexedTriangles(count));
    }

    fn delete_buffer(&mut self, buffer: u32) {
        self.release(buffer);
        self.calls.push(GpuCall::DeleteBuffer(buffer));
    }
}
