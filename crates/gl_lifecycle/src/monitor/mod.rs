//! Monitor handle cache
//!
//! Display handles are fetched lazily and cached as one snapshot. Any change
//! of the display topology invalidates the whole snapshot at once: every
//! [`Monitor`] issued so far reports `is_valid() == false` afterwards, even if
//! its physical display is still connected. Callers must re-query.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::backend::{NativeMonitor, Platform, VideoMode};

#[derive(Debug)]
struct MonitorState {
    native: NativeMonitor,
    name: String,
    valid: Cell<bool>,
}

/// Shared handle to a detected display
///
/// Clones refer to the same underlying handle, so invalidation is visible
/// through every clone. The handle is `!Send`; monitors belong to the thread
/// that owns the session.
#[derive(Clone)]
pub struct Monitor {
    state: Rc<MonitorState>,
}

impl Monitor {
    fn new(native: NativeMonitor, name: String) -> Self {
        Self {
            state: Rc::new(MonitorState {
                native,
                name,
                valid: Cell::new(true),
            }),
        }
    }

    /// Native handle of the display
    pub fn native(&self) -> NativeMonitor {
        self.state.native
    }

    /// Name reported by the system
    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// Whether the handle still belongs to the current monitor snapshot
    pub fn is_valid(&self) -> bool {
        self.state.valid.get()
    }

    /// Whether both values are the same handle (not merely the same display)
    pub fn same_handle(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("native", &self.state.native)
            .field("name", &self.state.name)
            .field("valid", &self.state.valid.get())
            .finish()
    }
}

/// Lazily filled cache of monitor handles
#[derive(Debug, Default)]
pub struct MonitorRegistry {
    cache: Option<Vec<Monitor>>,
    invalidations: u64,
}

impl MonitorRegistry {
    /// Create an empty registry; nothing is queried until first use
    pub fn new() -> Self {
        Self::default()
    }

    /// All connected monitors, primary first
    ///
    /// The first call after construction or invalidation queries the platform;
    /// later calls return the same handles.
    pub fn monitors<P: Platform>(&mut self, platform: &mut P) -> &[Monitor] {
        self.cache.get_or_insert_with(|| {
            let monitors: Vec<Monitor> = platform
                .monitors()
                .into_iter()
                .map(|info| Monitor::new(info.native, info.name))
                .collect();
            log::debug!("Detected {} monitor(s)", monitors.len());
            monitors
        })
    }

    /// The primary monitor, `None` if the system reports no display
    pub fn primary<P: Platform>(&mut self, platform: &mut P) -> Option<Monitor> {
        self.monitors(platform).first().cloned()
    }

    /// Current video mode of a monitor, `None` for stale handles
    pub fn video_mode<P: Platform>(&self, platform: &mut P, monitor: &Monitor) -> Option<VideoMode> {
        if !monitor.is_valid() {
            return None;
        }
        platform.video_mode(monitor.native())
    }

    /// Top-left corner of a monitor on the virtual desktop, `None` for stale
    /// handles
    pub fn position<P: Platform>(&self, platform: &mut P, monitor: &Monitor) -> Option<(i32, i32)> {
        if !monitor.is_valid() {
            return None;
        }
        platform.monitor_position(monitor.native())
    }

    /// Invalidate every issued handle and drop the snapshot
    ///
    /// Bound to the hotplug notification; also safe to call directly.
    pub fn invalidate_all(&mut self) {
        if let Some(monitors) = self.cache.take() {
            for monitor in &monitors {
                monitor.state.valid.set(false);
            }
            self.invalidations += 1;
            log::debug!("Invalidated {} monitor handle(s)", monitors.len());
        }
    }

    /// Whether a snapshot is currently cached
    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// How many cached snapshots have been invalidated so far
    pub fn invalidation_count(&self) -> u64 {
        self.invalidations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessPlatform;

    fn mode(width: u32, height: u32) -> VideoMode {
        VideoMode { width, height, refresh_rate: 60 }
    }

    #[test]
    fn test_snapshot_is_reused() {
        let mut platform = HeadlessPlatform::with_monitors([mode(1920, 1080), mode(1280, 720)]);
        let mut registry = MonitorRegistry::new();

        let first: Vec<Monitor> = registry.monitors(&mut platform).to_vec();
        let second: Vec<Monitor> = registry.monitors(&mut platform).to_vec();

        assert_eq!(first.len(), 2);
        assert!(first.iter().zip(&second).all(|(a, b)| a.same_handle(b)));
        assert_eq!(platform.stats().monitor_queries, 1);
    }

    #[test]
    fn test_invalidate_all_is_batch() {
        let mut platform = HeadlessPlatform::with_monitors([mode(1920, 1080), mode(1280, 720), mode(800, 600)]);
        let mut registry = MonitorRegistry::new();
        let issued: Vec<Monitor> = registry.monitors(&mut platform).to_vec();

        registry.invalidate_all();

        assert!(issued.iter().all(|m| !m.is_valid()));
        assert!(!registry.is_cached());

        let fresh = registry.monitors(&mut platform).to_vec();
        assert_eq!(fresh.len(), 3);
        assert!(fresh.iter().all(Monitor::is_valid));
        assert!(!fresh[0].same_handle(&issued[0]));
        assert_eq!(platform.stats().monitor_queries, 2);
    }

    #[test]
    fn test_primary_is_first_or_none() {
        let mut platform = HeadlessPlatform::with_monitors([mode(2560, 1440), mode(1920, 1080)]);
        let mut registry = MonitorRegistry::new();
        let primary = registry.primary(&mut platform).unwrap();
        assert!(primary.same_handle(&registry.monitors(&mut platform)[0]));

        let mut empty = HeadlessPlatform::without_monitors();
        assert!(MonitorRegistry::new().primary(&mut empty).is_none());
    }

    #[test]
    fn test_stale_handle_has_no_video_mode() {
        let mut platform = HeadlessPlatform::new();
        let mut registry = MonitorRegistry::new();
        let primary = registry.primary(&mut platform).unwrap();
        assert_eq!(registry.video_mode(&mut platform, &primary), Some(mode(1920, 1080)));

        registry.invalidate_all();
        assert_eq!(registry.video_mode(&mut platform, &primary), None);
    }

    #[test]
    fn test_positions_follow_desktop_layout() {
        let mut platform = HeadlessPlatform::with_monitors([mode(1920, 1080), mode(1280, 720)]);
        let mut registry = MonitorRegistry::new();
        let monitors = registry.monitors(&mut platform).to_vec();

        assert_eq!(registry.position(&mut platform, &monitors[0]), Some((0, 0)));
        assert_eq!(registry.position(&mut platform, &monitors[1]), Some((1920, 0)));

        registry.invalidate_all();
        assert_eq!(registry.position(&mut platform, &monitors[1]), None);
    }

    #[test]
    fn test_invalidate_without_snapshot_is_noop() {
        let mut registry = MonitorRegistry::new();
        registry.invalidate_all();
        assert_eq!(registry.invalidation_count(), 0);
    }
}
