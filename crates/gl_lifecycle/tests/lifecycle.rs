//! End-to-end lifecycle tests against the headless backends
//!
//! Covers deletion, context gating, teardown and monitor invalidation through
//! the public session API only.

use gl_lifecycle::backend::headless::{GpuCall, HeadlessPlatform, RecordingGpu};
use gl_lifecycle::prelude::*;

type Session = GraphicsSession<HeadlessPlatform, RecordingGpu>;

const VERTEX: &str = "#version 330 core\nlayout(location = 0) in vec2 p;\nvoid main() { gl_Position = vec4(p, 0.0, 1.0); }";
const FRAGMENT: &str = "#version 330 core\nout vec4 color;\nvoid main() { color = vec4(1.0); }";

fn session_with(platform: HeadlessPlatform) -> Session {
    GraphicsSession::init(platform, RecordingGpu::new()).unwrap()
}

fn session() -> Session {
    session_with(HeadlessPlatform::new())
}

fn pixels() -> TextureData {
    TextureData::solid_color(4, 4, [255, 128, 0, 255])
}

fn triangle() -> (Vec<VertexArray>, Vec<u32>) {
    let positions = VertexArray::new(vec![0.0, 0.5, -0.5, -0.5, 0.5, -0.5], 2).unwrap();
    (vec![positions], vec![0, 1, 2])
}

fn mode(width: u32, height: u32) -> VideoMode {
    VideoMode { width, height, refresh_rate: 60 }
}

#[test]
fn test_second_delete_reports_invalid_state_without_native_calls() {
    let mut session = session();
    session.create_window(&WindowConfig::default()).unwrap();
    let texture = session.create_texture(&pixels(), TextureOptions::default()).unwrap();
    let shader = session.create_shader(VERTEX, FRAGMENT).unwrap();
    let (arrays, indices) = triangle();
    let vao = session.create_vertex_array(&arrays, &indices).unwrap();

    session.delete(texture).unwrap();
    session.delete(shader).unwrap();
    session.delete(vao).unwrap();
    let calls = session.gpu().call_count();

    assert_eq!(session.delete(texture).unwrap_err().kind(), ErrorKind::InvalidState);
    assert_eq!(session.delete(shader).unwrap_err().kind(), ErrorKind::InvalidState);
    assert_eq!(session.delete(vao).unwrap_err().kind(), ErrorKind::InvalidState);
    assert_eq!(session.bind_texture(texture, TextureSlot::T0).unwrap_err().kind(), ErrorKind::InvalidState);
    assert_eq!(session.gpu().call_count(), calls);
    assert_eq!(session.gpu().live_object_count(), 0);
}

#[test]
fn test_every_mutating_operation_is_context_gated() {
    let mut session = session();
    let first = session.create_window(&WindowConfig::default()).unwrap();
    let texture = session.create_texture(&pixels(), TextureOptions::default()).unwrap();
    let shader = session.create_shader(VERTEX, FRAGMENT).unwrap();
    let (arrays, indices) = triangle();
    let vao = session.create_vertex_array(&arrays, &indices).unwrap();

    session.create_window(&WindowConfig::default()).unwrap();
    assert_ne!(session.current_context(), Some(first));
    let calls = session.gpu().call_count();

    let results = [
        session.bind_texture(texture, TextureSlot::new(3).unwrap()),
        session.unbind_texture(texture),
        session.use_shader(shader),
        session.stop_shader(shader),
        session.uniform_location(shader, "u_color").map(|_| ()),
        session.bind_vertex_array(vao),
        session.unbind_vertex_array(vao),
        session.enable_vertex_array(vao),
        session.disable_vertex_array(vao),
        session.draw_vertex_array(vao),
        session.delete(texture),
        session.delete(shader),
        session.delete(vao),
    ];
    for result in results {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::WrongContextActive);
    }
    assert_eq!(session.gpu().call_count(), calls);
    assert_eq!(session.live_resource_count(), 3);

    // read-only state stays available from any context
    assert_eq!(session.texture_size(texture).unwrap(), (4, 4));

    session.make_current(first).unwrap();
    session.bind_texture(texture, TextureSlot::T0).unwrap();
    session.delete(texture).unwrap();
}

#[test]
fn test_delete_all_leaves_registry_empty() {
    let mut session = session();
    let mut handles = Vec::new();
    for _ in 0..3 {
        session.create_window(&WindowConfig::default()).unwrap();
        handles.push(session.create_texture(&pixels(), TextureOptions::default()).unwrap());
    }
    let shader = session.create_shader(VERTEX, FRAGMENT).unwrap();

    assert_eq!(session.delete_all().unwrap(), 4);
    assert_eq!(session.live_resource_count(), 0);
    assert!(handles.iter().all(|handle| session.is_deleted(*handle)));
    assert!(session.is_deleted(shader));
    assert_eq!(session.gpu().live_object_count(), 0);

    // idempotent once empty
    assert_eq!(session.delete_all().unwrap(), 0);
}

#[test]
fn test_destroy_order_does_not_matter_for_teardown() {
    let mut session = session();
    let windows: Vec<WindowId> = (0..5)
        .map(|i| {
            session
                .create_window(&WindowConfig::new(320 + i * 10, 240).with_title(format!("w{i}")))
                .unwrap()
        })
        .collect();
    session.destroy_window(windows[3]).unwrap();
    session.destroy_window(windows[0]).unwrap();
    session.make_current(windows[2]).unwrap();

    session.terminate().unwrap();
    assert_eq!(session.window_count(), 0);
    assert_eq!(session.platform().window_count(), 0);
    assert_eq!(session.platform().stats().windows_destroyed, 5);
    assert_eq!(session.current_context(), None);
}

#[test]
fn test_hotplug_invalidates_every_monitor_at_once() {
    let mut session = session_with(HeadlessPlatform::with_monitors([mode(1920, 1080), mode(1280, 1024), mode(1024, 768)]));
    let window = session.create_window(&WindowConfig::default()).unwrap();
    let issued: Vec<Monitor> = session.monitors().unwrap().to_vec();
    assert_eq!(issued.len(), 3);

    let added = session.platform_mut().connect_monitor(mode(3840, 2160));
    // the change is only observed by the poll
    assert!(issued.iter().all(Monitor::is_valid));

    let events = session.update(window).unwrap();
    assert_eq!(events, vec![PlatformEvent::MonitorConnected(added)]);
    assert!(issued.iter().all(|monitor| !monitor.is_valid()));

    let fresh = session.monitors().unwrap().to_vec();
    assert_eq!(fresh.len(), 4);
    assert!(fresh.iter().all(Monitor::is_valid));
    assert!(fresh.iter().all(|new| issued.iter().all(|old| !new.same_handle(old))));
}

#[test]
fn test_disconnect_invalidates_too() {
    let mut session = session_with(HeadlessPlatform::with_monitors([mode(1920, 1080), mode(1280, 1024)]));
    let window = session.create_window(&WindowConfig::default()).unwrap();
    let secondary = session.monitors().unwrap()[1].clone();

    assert!(session.platform_mut().disconnect_monitor(secondary.native()));
    session.update(window).unwrap();

    assert!(!secondary.is_valid());
    assert_eq!(session.video_mode(&secondary).unwrap(), None);
    assert_eq!(session.monitors().unwrap().len(), 1);
}

#[test]
fn test_window_on_secondary_monitor_is_centered_there() {
    let mut session = session_with(HeadlessPlatform::with_monitors([mode(1920, 1080), mode(1280, 720)]));
    let secondary = session.monitors().unwrap()[1].clone();
    let (left, top) = session.monitor_position(&secondary).unwrap().unwrap();
    assert_eq!((left, top), (1920, 0));

    let window = session
        .create_window_on(&WindowConfig::new(800, 600), &secondary)
        .unwrap();
    let (x, y) = session.window_position(window).unwrap();

    assert_eq!((x, y), (left + 240, top + 60));
    assert!(x >= 1920 && x + 800 <= 1920 + 1280);
    assert_eq!(session.current_context(), Some(window));
}

#[test]
fn test_stale_target_falls_back_to_primary_monitor() {
    let mut session = session_with(HeadlessPlatform::with_monitors([mode(1920, 1080), mode(1280, 720)]));
    let secondary = session.monitors().unwrap()[1].clone();
    session.invalidate_monitors();

    let window = session
        .create_window_on(&WindowConfig::new(800, 600), &secondary)
        .unwrap();
    assert_eq!(session.window_position(window).unwrap(), (560, 240));
    assert_eq!(session.monitor_position(&secondary).unwrap(), None);
}

#[test]
fn scenario_a_window_queries_fail_after_destroy() {
    let mut session = session();
    let window = session
        .create_window(&WindowConfig::new(800, 600).with_resizable(false))
        .unwrap();
    assert_eq!(session.window_size(window).unwrap().0, 800);

    session.destroy_window(window).unwrap();
    let err = session.window_size(window).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert!(matches!(err, GfxError::WindowDestroyed));
    assert!(matches!(session.destroy_window(window), Err(GfxError::WindowDestroyed)));
}

#[test]
fn scenario_b_use_under_foreign_context_fails() {
    let mut session = session();
    let w1 = session.create_window(&WindowConfig::default()).unwrap();
    let w2 = session.create_window(&WindowConfig::default()).unwrap();
    session.make_current(w1).unwrap();
    let shader = session.create_shader(VERTEX, FRAGMENT).unwrap();

    session.make_current(w2).unwrap();
    let before = session.gpu().call_count();
    let err = session.use_shader(shader).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::WrongContextActive);
    assert_eq!(session.gpu().call_count(), before);
}

#[test]
fn scenario_c_teardown_switches_once_per_owner() {
    let mut session = session();
    let w1 = session.create_window(&WindowConfig::default()).unwrap();
    let a = session.create_texture(&pixels(), TextureOptions::default()).unwrap();
    let w2 = session.create_window(&WindowConfig::default()).unwrap();
    let b = session.create_shader(VERTEX, FRAGMENT).unwrap();
    session.make_current(w1).unwrap();
    let (arrays, indices) = triangle();
    let c = session.create_vertex_array(&arrays, &indices).unwrap();
    assert_eq!(session.resources().owner(b.key()), Some(w2));

    let switches = session.platform().stats().context_switches;
    assert_eq!(session.delete_all().unwrap(), 3);

    assert_eq!(session.platform().stats().context_switches - switches, 2);
    assert!(session.is_deleted(a));
    assert!(session.is_deleted(b));
    assert!(session.is_deleted(c));
}

#[test]
fn scenario_d_monitor_snapshot_identity() {
    let mut session = session_with(HeadlessPlatform::with_monitors([mode(1920, 1080), mode(1280, 720)]));
    let first = session.monitors().unwrap().to_vec();
    let second = session.monitors().unwrap().to_vec();
    assert!(first.iter().zip(&second).all(|(a, b)| a.same_handle(b)));
    assert_eq!(session.platform().stats().monitor_queries, 1);

    session.invalidate_monitors();
    let third = session.monitors().unwrap().to_vec();
    assert_eq!(third.len(), 2);
    assert!(!third[0].same_handle(&first[0]));
    assert_eq!(third[0].native(), first[0].native());
    assert_eq!(session.platform().stats().monitor_queries, 2);
}

#[test]
fn test_shader_failure_registers_nothing() {
    let mut session = session();
    session.create_window(&WindowConfig::default()).unwrap();
    session
        .gpu_mut()
        .fail_compile(ShaderStage::Fragment, "0:3: 'colr' : undeclared identifier");

    let err = session.create_shader(VERTEX, FRAGMENT).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NativeCallFailure);
    match err {
        GfxError::ShaderCompile(compile) => {
            assert_eq!(compile.stage, CompileStage::Fragment);
            assert!(compile.log.contains("undeclared"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(session.live_resource_count(), 0);
    assert_eq!(session.gpu().live_object_count(), 0);
}

#[test]
fn test_frame_loop_draws_with_bound_state() {
    let mut session = session();
    let window = session.create_window(&WindowConfig::new(640, 480).with_title("frame")).unwrap();
    let texture = session.create_texture(&pixels(), TextureOptions::default()).unwrap();
    let shader = session.create_shader(VERTEX, FRAGMENT).unwrap();
    let (arrays, indices) = triangle();
    let vao = session.create_vertex_array(&arrays, &indices).unwrap();
    session.gpu_mut().take_calls();

    session.use_shader(shader).unwrap();
    session.bind_texture(texture, TextureSlot::T0).unwrap();
    session.bind_vertex_array(vao).unwrap();
    session.enable_vertex_array(vao).unwrap();
    session.draw_vertex_array(vao).unwrap();
    session.disable_vertex_array(vao).unwrap();
    session.unbind_vertex_array(vao).unwrap();
    session.unbind_texture(texture).unwrap();
    session.stop_shader(shader).unwrap();
    session.update(window).unwrap();

    let calls = session.gpu_mut().take_calls();
    assert!(calls.contains(&GpuCall::DrawIndexedTriangles(3)));
    assert_eq!(session.platform().window(session.window(window).unwrap().native()).unwrap().frames_presented, 1);
    assert!(!session.is_close_requested(window).unwrap());
}

#[test]
fn test_close_request_and_geometry_events() {
    let mut session = session_with(HeadlessPlatform::new().with_content_scale(2));
    let window = session.create_window(&WindowConfig::new(400, 300).with_resizable(true)).unwrap();
    let native = session.window(window).unwrap().native();

    session.platform_mut().resize(native, 500, 400);
    session.platform_mut().move_cursor(native, 12.5, 40.0);
    session.platform_mut().request_close(native);
    let events = session.update(window).unwrap();

    assert_eq!(events.len(), 4);
    assert_eq!(session.window_size(window).unwrap(), (500, 400));
    assert_eq!(session.framebuffer_size(window).unwrap(), (1000, 800));
    assert_eq!(session.cursor_position(window).unwrap(), (12.5, 40.0));
    assert!(session.is_close_requested(window).unwrap());
}

#[test]
fn test_resources_of_destroyed_window_are_orphaned() {
    let mut session = session();
    let w1 = session.create_window(&WindowConfig::default()).unwrap();
    let texture = session.create_texture(&pixels(), TextureOptions::default()).unwrap();
    session.create_window(&WindowConfig::default()).unwrap();
    session.destroy_window(w1).unwrap();

    let err = session.bind_texture(texture, TextureSlot::T0).unwrap_err();
    assert!(matches!(err, GfxError::OwnerContextDestroyed { .. }));

    session.unregister(texture).unwrap();
    assert!(session.is_deleted(texture));
    assert!(session.terminate().is_ok());
}
