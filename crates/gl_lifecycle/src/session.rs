//! # Graphics Session
//!
//! Top-level owner of everything with a native lifetime: the windowing
//! platform, the GPU call surface, the live windows, the monitor cache and the
//! live resources. One session corresponds to one initialization of the
//! windowing system.
//!
//! ## Lifecycle
//!
//! ```text
//! init ──► create_window / create_* / update ... ──► terminate
//!                                                    │
//!                        delete_all ◄────────────────┘
//!                        destroy_all
//!                        invalidate monitors
//!                        platform terminate
//! ```
//!
//! Dropping a running session terminates it. Every call after termination
//! fails with [`GfxError::SessionTerminated`].
//!
//! The session is neither `Send` nor `Sync`: the current context is a
//! per-thread notion, so all calls must come from the thread that created it.

use crate::assets::TextureData;
use crate::backend::{GpuApi, Platform, PlatformEvent, VideoMode};
use crate::context::{ContextManager, WindowRecord};
use crate::core::config::{SessionConfig, WindowConfig};
use crate::error::{GfxError, GfxResult};
use crate::foundation::collections::{TypedHandle, WindowId};
use crate::foundation::logging;
use crate::monitor::{Monitor, MonitorRegistry};
use crate::resource::{
    GpuResource, Resource, ResourceRegistry, ShaderHandle, ShaderProgram, Texture, TextureHandle,
    TextureOptions, TextureSlot, VertexArray, VertexArrayHandle, VertexArrayObject,
};

/// Owner of the windowing system, its windows and every GPU resource
pub struct GraphicsSession<P: Platform, G: GpuApi> {
    platform: P,
    gpu: G,
    contexts: ContextManager,
    monitors: MonitorRegistry,
    resources: ResourceRegistry,
    running: bool,
}

impl<P: Platform, G: GpuApi> GraphicsSession<P, G> {
    /// Initialize the windowing system and start a session
    pub fn init(mut platform: P, gpu: G) -> GfxResult<Self> {
        platform
            .init()
            .map_err(|reason| GfxError::NativeCallFailed(format!("windowing system init failed: {reason}")))?;

        log::info!("Graphics session started");
        Ok(Self {
            platform,
            gpu,
            contexts: ContextManager::new(),
            monitors: MonitorRegistry::new(),
            resources: ResourceRegistry::new(),
            running: true,
        })
    }

    /// Install logging, start a session and open the configured main window
    pub fn from_config(platform: P, gpu: G, config: &SessionConfig) -> GfxResult<(Self, WindowId)> {
        config
            .validate()
            .map_err(|err| GfxError::invalid_argument(err.to_string()))?;
        if logging::init_with_filter(&config.log_level).is_err() {
            log::debug!("Logger already installed, keeping it");
        }

        let mut session = Self::init(platform, gpu)?;
        let window = session.create_window(&config.window)?;
        Ok((session, window))
    }

    /// Whether [`terminate`](Self::terminate) has not run yet
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Delete all resources, destroy all windows and shut the windowing
    /// system down
    ///
    /// The whole sequence always runs. Resources of every live context are
    /// deleted; resources whose context could not be made current are
    /// abandoned once the windows are gone and the first error is returned.
    pub fn terminate(&mut self) -> GfxResult<()> {
        self.ensure_running()?;

        let deleted = self
            .resources
            .delete_all(&mut self.contexts, &mut self.platform, &mut self.gpu);
        let destroyed = self.contexts.destroy_all(&mut self.platform);
        if !self.resources.is_empty() {
            let leaked = self.resources.abandon_all();
            log::error!("{} resource(s) could not be deleted before their context was destroyed", leaked);
        }
        self.monitors.invalidate_all();
        self.platform.terminate();
        self.running = false;

        let deleted = deleted?;
        let destroyed = destroyed?;
        log::info!(
            "Graphics session terminated ({} resource(s) deleted, {} window(s) destroyed)",
            deleted,
            destroyed
        );
        Ok(())
    }

    fn ensure_running(&self) -> GfxResult<()> {
        if self.running {
            Ok(())
        } else {
            Err(GfxError::SessionTerminated)
        }
    }

    // ------------------------------------------------------------------
    // Windows and contexts
    // ------------------------------------------------------------------

    /// Create a window centered on the primary monitor and make it current
    pub fn create_window(&mut self, config: &WindowConfig) -> GfxResult<WindowId> {
        self.ensure_running()?;
        self.contexts
            .create_window(&mut self.platform, &mut self.monitors, config, None)
    }

    /// Create a window on `monitor`, falling back to the primary monitor if
    /// the handle went stale
    pub fn create_window_on(&mut self, config: &WindowConfig, monitor: &Monitor) -> GfxResult<WindowId> {
        self.ensure_running()?;
        self.contexts
            .create_window(&mut self.platform, &mut self.monitors, config, Some(monitor))
    }

    /// Make `window`'s context current
    pub fn make_current(&mut self, window: WindowId) -> GfxResult<()> {
        self.ensure_running()?;
        self.contexts.make_current(&mut self.platform, window)
    }

    /// Context current on this thread
    pub fn current_context(&self) -> Option<WindowId> {
        self.contexts.current_context()
    }

    /// Bookkeeping of a live window
    pub fn window(&self, window: WindowId) -> GfxResult<&WindowRecord> {
        self.ensure_running()?;
        self.contexts.record(window)
    }

    /// Number of live windows
    pub fn window_count(&self) -> usize {
        self.contexts.window_count()
    }

    /// Window position in screen coordinates
    pub fn window_position(&self, window: WindowId) -> GfxResult<(i32, i32)> {
        self.ensure_running()?;
        self.contexts.window_position(&self.platform, window)
    }

    /// Client area size in screen coordinates
    pub fn window_size(&self, window: WindowId) -> GfxResult<(i32, i32)> {
        self.ensure_running()?;
        self.contexts.window_size(&self.platform, window)
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self, window: WindowId) -> GfxResult<(i32, i32)> {
        self.ensure_running()?;
        self.contexts.framebuffer_size(&self.platform, window)
    }

    /// Cursor position relative to the content area
    pub fn cursor_position(&self, window: WindowId) -> GfxResult<(f64, f64)> {
        self.ensure_running()?;
        self.contexts.cursor_position(&self.platform, window)
    }

    /// Whether the user asked for the window to close
    pub fn is_close_requested(&self, window: WindowId) -> GfxResult<bool> {
        self.ensure_running()?;
        self.contexts.is_close_requested(&self.platform, window)
    }

    /// Present `window` and process pending events
    ///
    /// Hotplug events invalidate every monitor handle before this returns.
    pub fn update(&mut self, window: WindowId) -> GfxResult<Vec<PlatformEvent>> {
        self.ensure_running()?;
        let monitors = &mut self.monitors;
        self.contexts.update(&mut self.platform, window, |event| {
            if event.is_hotplug() {
                log::debug!("Display topology changed: {:?}", event);
                monitors.invalidate_all();
            }
        })
    }

    /// Destroy a window and its context
    ///
    /// Resources still owned by it become unusable; delete them first.
    pub fn destroy_window(&mut self, window: WindowId) -> GfxResult<()> {
        self.ensure_running()?;
        let owned = self.resources.owned_by(window);
        if owned > 0 && self.contexts.is_live(window) {
            log::warn!("Destroying window {:?} while it still owns {} resource(s)", window, owned);
        }
        self.contexts.destroy(&mut self.platform, window)
    }

    // ------------------------------------------------------------------
    // Monitors
    // ------------------------------------------------------------------

    /// All connected monitors, primary first
    pub fn monitors(&mut self) -> GfxResult<&[Monitor]> {
        self.ensure_running()?;
        Ok(self.monitors.monitors(&mut self.platform))
    }

    /// The primary monitor, if any
    pub fn primary_monitor(&mut self) -> GfxResult<Option<Monitor>> {
        self.ensure_running()?;
        Ok(self.monitors.primary(&mut self.platform))
    }

    /// Video mode of a monitor, `None` once the handle went stale
    pub fn video_mode(&mut self, monitor: &Monitor) -> GfxResult<Option<VideoMode>> {
        self.ensure_running()?;
        Ok(self.monitors.video_mode(&mut self.platform, monitor))
    }

    /// Top-left corner of a monitor on the virtual desktop, `None` for stale
    /// handles
    pub fn monitor_position(&mut self, monitor: &Monitor) -> GfxResult<Option<(i32, i32)>> {
        self.ensure_running()?;
        Ok(self.monitors.position(&mut self.platform, monitor))
    }

    /// Invalidate every monitor handle issued so far
    pub fn invalidate_monitors(&mut self) {
        self.monitors.invalidate_all();
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    fn creation_owner(&self) -> GfxResult<WindowId> {
        self.ensure_running()?;
        self.contexts.current_context().ok_or(GfxError::NoCurrentContext)
    }

    fn with_resource<T, R>(&mut self, handle: TypedHandle<T>, op: impl FnOnce(&mut T, &mut G) -> R) -> GfxResult<R>
    where
        T: GpuResource,
    {
        self.ensure_running()?;
        let resource = self.resources.get_checked_mut(handle, &self.contexts)?;
        Ok(op(resource, &mut self.gpu))
    }

    /// Upload a texture into the current context
    pub fn create_texture(&mut self, data: &TextureData, options: TextureOptions) -> GfxResult<TextureHandle> {
        let owner = self.creation_owner()?;
        let texture = Texture::create(&mut self.gpu, data, options)?;
        Ok(self.resources.register(owner, texture))
    }

    /// Bind a texture to `slot`
    pub fn bind_texture(&mut self, texture: TextureHandle, slot: TextureSlot) -> GfxResult<()> {
        self.with_resource(texture, |texture, gpu| texture.bind(gpu, slot))
    }

    /// Clear the slot the texture was last bound to
    pub fn unbind_texture(&mut self, texture: TextureHandle) -> GfxResult<()> {
        self.with_resource(texture, |texture, gpu| texture.unbind(gpu))
    }

    /// Texture dimensions; readable from any context
    pub fn texture_size(&self, texture: TextureHandle) -> GfxResult<(u32, u32)> {
        self.ensure_running()?;
        let texture = self.resources.get(texture)?;
        Ok((texture.width(), texture.height()))
    }

    /// Compile and link a shader program in the current context
    pub fn create_shader(&mut self, vertex_source: &str, fragment_source: &str) -> GfxResult<ShaderHandle> {
        let owner = self.creation_owner()?;
        let program = ShaderProgram::compile(&mut self.gpu, vertex_source, fragment_source)?;
        Ok(self.resources.register(owner, program))
    }

    /// Make the program active
    pub fn use_shader(&mut self, shader: ShaderHandle) -> GfxResult<()> {
        self.with_resource(shader, |program, gpu| program.use_program(gpu))
    }

    /// Deactivate programs
    pub fn stop_shader(&mut self, shader: ShaderHandle) -> GfxResult<()> {
        self.with_resource(shader, |program, gpu| program.stop_use(gpu))
    }

    /// Location of a uniform, `-1` if the program has no such uniform
    pub fn uniform_location(&mut self, shader: ShaderHandle, name: &str) -> GfxResult<i32> {
        self.with_resource(shader, |program, gpu| program.uniform_location(gpu, name))?
    }

    /// Build a vertex-array object in the current context
    pub fn create_vertex_array(&mut self, arrays: &[VertexArray], indices: &[u32]) -> GfxResult<VertexArrayHandle> {
        let owner = self.creation_owner()?;
        let vao = VertexArrayObject::create(&mut self.gpu, arrays, indices)?;
        Ok(self.resources.register(owner, vao))
    }

    /// Bind a vertex-array object
    pub fn bind_vertex_array(&mut self, vao: VertexArrayHandle) -> GfxResult<()> {
        self.with_resource(vao, |vao, gpu| vao.bind(gpu))
    }

    /// Unbind whichever vertex-array object is bound
    pub fn unbind_vertex_array(&mut self, vao: VertexArrayHandle) -> GfxResult<()> {
        self.with_resource(vao, |vao, gpu| vao.unbind(gpu))
    }

    /// Enable every attribute of a vertex-array object
    pub fn enable_vertex_array(&mut self, vao: VertexArrayHandle) -> GfxResult<()> {
        self.with_resource(vao, |vao, gpu| vao.enable(gpu))
    }

    /// Disable every attribute of a vertex-array object
    pub fn disable_vertex_array(&mut self, vao: VertexArrayHandle) -> GfxResult<()> {
        self.with_resource(vao, |vao, gpu| vao.disable(gpu))
    }

    /// Draw the index list as triangles
    pub fn draw_vertex_array(&mut self, vao: VertexArrayHandle) -> GfxResult<()> {
        self.with_resource(vao, |vao, gpu| vao.draw(gpu))
    }

    /// Delete a resource; its owner must be current
    pub fn delete<T: GpuResource>(&mut self, handle: TypedHandle<T>) -> GfxResult<()> {
        self.ensure_running()?;
        self.resources.delete(handle, &self.contexts, &mut self.gpu)
    }

    /// Whether a resource was deleted or unregistered
    pub fn is_deleted<T: GpuResource>(&self, handle: TypedHandle<T>) -> bool {
        self.resources.is_deleted(handle.key())
    }

    /// Stop tracking a resource without releasing it
    ///
    /// Mainly useful for resources whose context was destroyed, since the
    /// driver reclaimed their names together with the context.
    pub fn unregister<T: GpuResource>(&mut self, handle: TypedHandle<T>) -> GfxResult<Resource> {
        self.ensure_running()?;
        self.resources
            .unregister(handle.key())
            .ok_or(GfxError::ResourceDeleted { kind: T::KIND })
    }

    /// Delete every live resource, switching to each owner once
    pub fn delete_all(&mut self) -> GfxResult<usize> {
        self.ensure_running()?;
        self.resources
            .delete_all(&mut self.contexts, &mut self.platform, &mut self.gpu)
    }

    /// Number of live resources
    pub fn live_resource_count(&self) -> usize {
        self.resources.len()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Windowing backend
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Windowing backend, e.g. to inject events in tests
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// GPU backend
    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    /// GPU backend
    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    /// Window table
    pub fn contexts(&self) -> &ContextManager {
        &self.contexts
    }

    /// Monitor cache
    pub fn monitor_registry(&self) -> &MonitorRegistry {
        &self.monitors
    }

    /// Live resources
    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }
}

impl<P: Platform, G: GpuApi> Drop for GraphicsSession<P, G> {
    fn drop(&mut self) {
        if self.running {
            if let Err(err) = self.terminate() {
                log::error!("Graphics session teardown failed: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::{GpuCall, HeadlessPlatform, RecordingGpu};
    use crate::error::ErrorKind;

    type Session = GraphicsSession<HeadlessPlatform, RecordingGpu>;

    fn session() -> Session {
        GraphicsSession::init(HeadlessPlatform::new(), RecordingGpu::new()).unwrap()
    }

    #[test]
    fn test_init_failure_is_native() {
        let err = GraphicsSession::init(HeadlessPlatform::new().failing_init(), RecordingGpu::new())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::NativeCallFailure);
    }

    #[test]
    fn test_creation_requires_current_context() {
        let mut session = session();
        let err = session
            .create_texture(&TextureData::solid_color(2, 2, [0; 4]), TextureOptions::default())
            .unwrap_err();
        assert!(matches!(err, GfxError::NoCurrentContext));
        assert_eq!(session.gpu().call_count(), 0);
    }

    #[test]
    fn test_terminate_is_one_shot() {
        let mut session = session();
        let window = session.create_window(&WindowConfig::default()).unwrap();
        session
            .create_texture(&TextureData::solid_color(2, 2, [0; 4]), TextureOptions::default())
            .unwrap();

        session.terminate().unwrap();
        assert!(!session.is_running());
        assert!(session.platform().is_terminated());
        assert_eq!(session.live_resource_count(), 0);
        assert_eq!(session.gpu().live_object_count(), 0);

        assert!(matches!(session.terminate(), Err(GfxError::SessionTerminated)));
        assert!(matches!(session.window_size(window), Err(GfxError::SessionTerminated)));
        assert!(matches!(session.create_window(&WindowConfig::default()), Err(GfxError::SessionTerminated)));
    }

    #[test]
    fn test_terminate_abandons_orphans_and_reports() {
        let mut session = session();
        let window = session.create_window(&WindowConfig::default()).unwrap();
        session
            .create_texture(&TextureData::solid_color(2, 2, [0; 4]), TextureOptions::default())
            .unwrap();
        session.destroy_window(window).unwrap();

        let err = session.terminate().unwrap_err();
        assert!(matches!(err, GfxError::TeardownContextLost { .. }));
        assert_eq!(session.live_resource_count(), 0);
        assert!(session.platform().is_terminated());
    }

    #[test]
    fn test_terminate_still_deletes_resources_of_live_windows() {
        let mut session = session();
        let lost = session.create_window(&WindowConfig::default()).unwrap();
        session
            .create_texture(&TextureData::solid_color(2, 2, [0; 4]), TextureOptions::default())
            .unwrap();
        session.create_window(&WindowConfig::default()).unwrap();
        let kept = session
            .create_texture(&TextureData::solid_color(2, 2, [0; 4]), TextureOptions::default())
            .unwrap();
        let kept_name = session.resources().get(kept).unwrap().native_handle();
        session.destroy_window(lost).unwrap();

        let err = session.terminate().unwrap_err();
        assert!(matches!(err, GfxError::TeardownContextLost { .. }));
        assert!(session.is_deleted(kept));
        assert!(session.gpu().calls().contains(&GpuCall::DeleteTexture(kept_name)));
        assert_eq!(session.gpu().live_object_count(), 1);
        assert_eq!(session.live_resource_count(), 0);
    }

    #[test]
    fn test_shader_operations_reach_gpu() {
        let mut session = session();
        session.create_window(&WindowConfig::default()).unwrap();
        session.gpu_mut().declare_uniform("u_color", 7);
        let shader = session
            .create_shader("void main() {}", "void main() {}")
            .unwrap();
        let program = session.resources().get(shader).unwrap().native_handle();

        session.use_shader(shader).unwrap();
        assert_eq!(session.uniform_location(shader, "u_color").unwrap(), 7);
        session.stop_shader(shader).unwrap();
        assert!(session.uniform_location(shader, "bad\0name").is_err());

        let calls = session.gpu_mut().take_calls();
        assert!(calls.contains(&GpuCall::UseProgram(program)));
        assert_eq!(calls.last(), Some(&GpuCall::UseProgram(0)));
    }

    #[test]
    fn test_from_config_opens_main_window() {
        let config = SessionConfig::new(WindowConfig::new(640, 480).with_title("main")).with_log_level("warn");
        let (session, window) =
            GraphicsSession::from_config(HeadlessPlatform::new(), RecordingGpu::new(), &config).unwrap();

        assert_eq!(session.window(window).unwrap().title(), "main");
        assert_eq!(session.current_context(), Some(window));
    }
}
