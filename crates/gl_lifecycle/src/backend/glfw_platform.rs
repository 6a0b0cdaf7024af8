//! Window management using GLFW
//!
//! Creates OpenGL 3.3 core windows, drives the event queue and enumerates
//! monitors. Hotplug is detected by comparing the monitor list after every
//! poll, so the notification arrives in the same poll that observed the change.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use glfw::Context;

use super::{MonitorInfo, NativeMonitor, NativeWindow, Platform, PlatformEvent, VideoMode, WindowRequest};

struct GlfwWindow {
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

/// [`Platform`] implementation on top of the `glfw` crate
#[derive(Default)]
pub struct GlfwPlatform {
    glfw: Option<glfw::Glfw>,
    windows: HashMap<NativeWindow, GlfwWindow>,
    next_window: u64,
    known_monitors: Vec<NativeMonitor>,
}

impl GlfwPlatform {
    /// Create an uninitialized platform
    pub fn new() -> Self {
        Self::default()
    }

    fn enumerate(glfw: &mut glfw::Glfw) -> Vec<MonitorInfo> {
        glfw.with_connected_monitors(|_, monitors| {
            monitors
                .iter()
                .map(|monitor| MonitorInfo {
                    native: monitor_handle(monitor),
                    name: monitor.get_name().unwrap_or_default(),
                })
                .collect()
        })
    }

    fn detect_hotplug(&mut self) -> Vec<PlatformEvent> {
        let Some(glfw) = self.glfw.as_mut() else {
            return Vec::new();
        };
        let current: Vec<NativeMonitor> = Self::enumerate(glfw).into_iter().map(|info| info.native).collect();

        let mut events: Vec<PlatformEvent> = self
            .known_monitors
            .iter()
            .filter(|monitor| !current.contains(monitor))
            .map(|monitor| PlatformEvent::MonitorDisconnected(*monitor))
            .collect();
        events.extend(
            current
                .iter()
                .filter(|monitor| !self.known_monitors.contains(monitor))
                .map(|monitor| PlatformEvent::MonitorConnected(*monitor)),
        );

        self.known_monitors = current;
        events
    }
}

/// Stable identity of a monitor for as long as it stays connected
fn monitor_handle(monitor: &glfw::Monitor) -> NativeMonitor {
    let mut hasher = DefaultHasher::new();
    monitor.get_name().hash(&mut hasher);
    monitor.get_pos().hash(&mut hasher);
    NativeMonitor(hasher.finish())
}

impl Platform for GlfwPlatform {
    fn init(&mut self) -> Result<(), String> {
        if self.glfw.is_some() {
            return Err("GLFW was already initialized".to_string());
        }
        let mut glfw = glfw::init(glfw::log_errors).map_err(|err| format!("{err:?}"))?;
        self.known_monitors = Self::enumerate(&mut glfw).into_iter().map(|info| info.native).collect();
        self.glfw = Some(glfw);
        log::debug!("GLFW initialized with {} monitor(s)", self.known_monitors.len());
        Ok(())
    }

    fn terminate(&mut self) {
        glfw::make_context_current(None);
        self.windows.clear();
        self.known_monitors.clear();
        // last reference, dropping it terminates GLFW
        self.glfw = None;
    }

    fn create_window(&mut self, request: &WindowRequest<'_>) -> Option<NativeWindow> {
        let glfw = self.glfw.as_mut()?;

        glfw.default_window_hints();
        glfw.window_hint(glfw::WindowHint::Visible(false));
        glfw.window_hint(glfw::WindowHint::Resizable(request.resizable));
        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));

        let (mut window, events) = match request.fullscreen {
            Some(target) => glfw.with_connected_monitors(|glfw, monitors| {
                let monitor = monitors.iter().find(|m| monitor_handle(m) == target)?;
                let mode = monitor.get_video_mode()?;
                glfw.create_window(mode.width, mode.height, request.title, glfw::WindowMode::FullScreen(monitor))
            }),
            None => glfw.create_window(request.width, request.height, request.title, glfw::WindowMode::Windowed),
        }?;

        window.set_close_polling(true);
        window.set_size_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_cursor_pos_polling(true);

        self.next_window += 1;
        let native = NativeWindow(self.next_window);
        self.windows.insert(native, GlfwWindow { window, events });
        Some(native)
    }

    fn destroy_window(&mut self, window: NativeWindow) {
        if let Some(state) = self.windows.remove(&window) {
            if state.window.is_current() {
                glfw::make_context_current(None);
            }
        }
    }

    fn make_context_current(&mut self, window: Option<NativeWindow>) {
        match window.and_then(|native| self.windows.get_mut(&native)) {
            Some(state) => state.window.make_current(),
            None => glfw::make_context_current(None),
        }
    }

    fn set_swap_interval(&mut self, interval: u32) {
        if let Some(glfw) = self.glfw.as_mut() {
            let interval = if interval == 0 {
                glfw::SwapInterval::None
            } else {
                glfw::SwapInterval::Sync(interval)
            };
            glfw.set_swap_interval(interval);
        }
    }

    fn show_window(&mut self, window: NativeWindow) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.window.show();
        }
    }

    fn set_window_position(&mut self, window: NativeWindow, x: i32, y: i32) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.window.set_pos(x, y);
        }
    }

    fn window_position(&self, window: NativeWindow) -> (i32, i32) {
        self.windows.get(&window).map_or((0, 0), |state| state.window.get_pos())
    }

    fn window_size(&self, window: NativeWindow) -> (i32, i32) {
        self.windows.get(&window).map_or((0, 0), |state| state.window.get_size())
    }

    fn framebuffer_size(&self, window: NativeWindow) -> (i32, i32) {
        self.windows
            .get(&window)
            .map_or((0, 0), |state| state.window.get_framebuffer_size())
    }

    fn cursor_position(&self, window: NativeWindow) -> (f64, f64) {
        self.windows
            .get(&window)
            .map_or((0.0, 0.0), |state| state.window.get_cursor_pos())
    }

    fn should_close(&self, window: NativeWindow) -> bool {
        self.windows
            .get(&window)
            .is_some_and(|state| state.window.should_close())
    }

    fn swap_buffers(&mut self, window: NativeWindow) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.window.swap_buffers();
        }
    }

    fn poll_events(&mut self) -> Vec<PlatformEvent> {
        let Some(glfw) = self.glfw.as_mut() else {
            return Vec::new();
        };
        glfw.poll_events();

        let mut events = Vec::new();
        for (&native, state) in &self.windows {
            for (_, event) in glfw::flush_messages(&state.events) {
                match event {
                    glfw::WindowEvent::Close => events.push(PlatformEvent::CloseRequested(native)),
                    glfw::WindowEvent::Size(width, height) => events.push(PlatformEvent::Resized {
                        window: native,
                        width,
                        height,
                    }),
                    glfw::WindowEvent::FramebufferSize(width, height) => {
                        events.push(PlatformEvent::FramebufferResized {
                            window: native,
                            width,
                            height,
                        });
                    }
                    glfw::WindowEvent::CursorPos(x, y) => {
                        events.push(PlatformEvent::CursorMoved { window: native, x, y });
                    }
                    _ => {}
                }
            }
        }
        events.extend(self.detect_hotplug());
        events
    }

    fn monitors(&mut self) -> Vec<MonitorInfo> {
        self.glfw.as_mut().map(Self::enumerate).unwrap_or_default()
    }

    fn video_mode(&mut self, monitor: NativeMonitor) -> Option<VideoMode> {
        let glfw = self.glfw.as_mut()?;
        glfw.with_connected_monitors(|_, monitors| {
            let mode = monitors
                .iter()
                .find(|m| monitor_handle(m) == monitor)?
                .get_video_mode()?;
            Some(VideoMode {
                width: mode.width,
                height: mode.height,
                refresh_rate: mode.refresh_rate,
            })
        })
    }

    fn monitor_position(&mut self, monitor: NativeMonitor) -> Option<(i32, i32)> {
        let glfw = self.glfw.as_mut()?;
        glfw.with_connected_monitors(|_, monitors| {
            monitors
                .iter()
                .find(|m| monitor_handle(m) == monitor)
                .map(glfw::Monitor::get_pos)
        })
    }
}
