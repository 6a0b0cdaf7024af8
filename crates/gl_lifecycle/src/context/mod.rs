//! Window and rendering context lifecycle
//!
//! Every window owns exactly one rendering context, so a [`WindowId`] doubles
//! as the context handle that resources record as their owner. A window is
//! either live or destroyed; destruction is one-way and removes the id from the
//! table, so a stale id is always reported as [`GfxError::WindowDestroyed`].
//!
//! The manager also tracks which context is current on the owning thread. The
//! only ways to change it are creating a window (the new window becomes
//! current), making another window current and destroying the current window.
//! All of these go through the session, which refuses them once the windowing
//! system is terminated.

use slotmap::SlotMap;

use crate::backend::{NativeMonitor, NativeWindow, Platform, PlatformEvent, WindowRequest};
use crate::core::config::WindowConfig;
use crate::error::{GfxError, GfxResult};
use crate::foundation::collections::WindowId;
use crate::monitor::{Monitor, MonitorRegistry};

/// Bookkeeping for one live window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRecord {
    native: NativeWindow,
    title: String,
    vsync: bool,
    fullscreen: Option<NativeMonitor>,
}

impl WindowRecord {
    /// Native window handle
    pub fn native(&self) -> NativeWindow {
        self.native
    }

    /// Title the window was created with
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether buffer swaps wait for vertical sync
    pub fn vsync(&self) -> bool {
        self.vsync
    }

    /// Monitor the window is full screen on
    pub fn fullscreen_monitor(&self) -> Option<NativeMonitor> {
        self.fullscreen
    }
}

/// Owner of the live window set and of the current-context marker
#[derive(Debug, Default)]
pub struct ContextManager {
    windows: SlotMap<WindowId, WindowRecord>,
    order: Vec<WindowId>,
    current: Option<WindowId>,
}

impl ContextManager {
    /// Create a manager with no windows
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a window and make its context current
    ///
    /// Windowed configurations are centered on `target`, or on the primary
    /// monitor when `target` is absent or stale. Full-screen configurations
    /// cover `target` (same fallback) at its video mode.
    pub(crate) fn create_window<P: Platform>(
        &mut self,
        platform: &mut P,
        monitors: &mut MonitorRegistry,
        config: &WindowConfig,
        target: Option<&Monitor>,
    ) -> GfxResult<WindowId> {
        config.validate()?;
        let title = config.resolved_title();

        let target = match target {
            Some(monitor) if monitor.is_valid() => Some(monitor.clone()),
            _ => monitors.primary(platform),
        };
        let area = target.as_ref().and_then(|monitor| {
            let mode = monitors.video_mode(platform, monitor)?;
            let origin = monitors.position(platform, monitor)?;
            Some((origin, mode))
        });

        let fullscreen = if config.fullscreen {
            match &target {
                Some(monitor) => Some(monitor.native()),
                None => {
                    return Err(GfxError::NativeCallFailed(
                        "no monitor available for a full-screen window".to_string(),
                    ))
                }
            }
        } else {
            None
        };

        let request = WindowRequest {
            title,
            width: config.width,
            height: config.height,
            resizable: config.resizable && !config.fullscreen,
            fullscreen,
        };
        let native = platform
            .create_window(&request)
            .ok_or_else(|| GfxError::NativeCallFailed(format!("failed to create window '{title}'")))?;

        match area {
            Some(((left, top), mode)) => {
                let (width, height) = platform.window_size(native);
                platform.set_window_position(
                    native,
                    left + (saturate(mode.width) - width) / 2,
                    top + (saturate(mode.height) - height) / 2,
                );
            }
            None => log::warn!("No monitor video mode available, window '{}' is not centered", title),
        }

        platform.make_context_current(Some(native));
        platform.set_swap_interval(u32::from(config.vsync));
        platform.show_window(native);

        let id = self.windows.insert(WindowRecord {
            native,
            title: title.to_string(),
            vsync: config.vsync,
            fullscreen,
        });
        self.order.push(id);
        self.current = Some(id);

        log::info!(
            "Created window {:?} '{}' ({}x{}, fullscreen: {})",
            id,
            title,
            config.width,
            config.height,
            fullscreen.is_some()
        );
        Ok(id)
    }

    /// Context current on the calling thread
    pub fn current_context(&self) -> Option<WindowId> {
        self.current
    }

    /// Whether `window` is the current context
    pub fn is_current(&self, window: WindowId) -> bool {
        self.current == Some(window)
    }

    /// Make `window`'s context current
    pub(crate) fn make_current<P: Platform>(&mut self, platform: &mut P, window: WindowId) -> GfxResult<()> {
        let native = self.record(window)?.native;
        platform.make_context_current(Some(native));
        self.current = Some(window);
        log::trace!("Context of window {:?} is now current", window);
        Ok(())
    }

    /// Whether `window` is still live
    pub fn is_live(&self, window: WindowId) -> bool {
        self.windows.contains_key(window)
    }

    /// Bookkeeping of a live window
    pub fn record(&self, window: WindowId) -> GfxResult<&WindowRecord> {
        self.windows.get(window).ok_or(GfxError::WindowDestroyed)
    }

    /// Live windows in creation order
    pub fn live_windows(&self) -> &[WindowId] {
        &self.order
    }

    /// Number of live windows
    pub fn window_count(&self) -> usize {
        self.order.len()
    }

    /// Live window wrapping `native`, if any
    pub fn window_for_native(&self, native: NativeWindow) -> Option<WindowId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.windows[*id].native == native)
    }

    /// Window position in screen coordinates
    pub fn window_position<P: Platform>(&self, platform: &P, window: WindowId) -> GfxResult<(i32, i32)> {
        Ok(platform.window_position(self.record(window)?.native))
    }

    /// Client area size in screen coordinates
    pub fn window_size<P: Platform>(&self, platform: &P, window: WindowId) -> GfxResult<(i32, i32)> {
        Ok(platform.window_size(self.record(window)?.native))
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size<P: Platform>(&self, platform: &P, window: WindowId) -> GfxResult<(i32, i32)> {
        Ok(platform.framebuffer_size(self.record(window)?.native))
    }

    /// Cursor position relative to the content area
    pub fn cursor_position<P: Platform>(&self, platform: &P, window: WindowId) -> GfxResult<(f64, f64)> {
        Ok(platform.cursor_position(self.record(window)?.native))
    }

    /// Whether the user asked for the window to close
    pub fn is_close_requested<P: Platform>(&self, platform: &P, window: WindowId) -> GfxResult<bool> {
        Ok(platform.should_close(self.record(window)?.native))
    }

    /// Present the window's frame and drain the native event queue
    ///
    /// `on_event` runs synchronously for every drained event before this
    /// returns; the events are also handed back to the caller.
    pub(crate) fn update<P, F>(&mut self, platform: &mut P, window: WindowId, mut on_event: F) -> GfxResult<Vec<PlatformEvent>>
    where
        P: Platform,
        F: FnMut(&PlatformEvent),
    {
        let native = self.record(window)?.native;
        platform.swap_buffers(native);

        let events = platform.poll_events();
        for event in &events {
            on_event(event);
        }
        Ok(events)
    }

    /// Destroy a window together with its context and callbacks
    pub(crate) fn destroy<P: Platform>(&mut self, platform: &mut P, window: WindowId) -> GfxResult<()> {
        let record = self.windows.remove(window).ok_or(GfxError::WindowDestroyed)?;
        platform.destroy_window(record.native);

        self.order.retain(|id| *id != window);
        if self.current == Some(window) {
            self.current = None;
        }

        log::info!("Destroyed window {:?} '{}'", window, record.title);
        Ok(())
    }

    /// Destroy every live window, oldest first
    ///
    /// Returns how many windows were destroyed.
    pub(crate) fn destroy_all<P: Platform>(&mut self, platform: &mut P) -> GfxResult<usize> {
        let mut destroyed = 0;
        while let Some(&first) = self.order.first() {
            self.destroy(platform, first)?;
            destroyed += 1;
        }
        Ok(destroyed)
    }
}

fn saturate(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
