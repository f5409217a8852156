//! Device context snapshotter.
//!
//! Produces the `context` payload attached to each sample. Screen and
//! network state are cheap and sampled live; the battery broadcast is
//! costly and slow-moving, so it is cached and refreshed at most every 30
//! seconds. Activity and foreground state are pushed in from the activity
//! adapter and the lifecycle hooks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::models::{DeviceContext, NetworkType};

pub const BATTERY_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Battery probe result.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatteryState {
    /// Charge in [0, 1], when the platform reports one.
    pub level: Option<f64>,
    pub charging: Option<bool>,
}

/// Host-implemented probe for platform state the SDK cannot read itself.
pub trait PlatformProbe: Send + Sync {
    fn screen_on(&self) -> Option<bool>;

    fn network_type(&self) -> NetworkType;

    fn battery(&self) -> BatteryState;
}

struct BatteryCache {
    sampled_at: Instant,
    state: BatteryState,
}

pub struct ContextSnapshotter {
    probe: Arc<dyn PlatformProbe>,
    battery: Mutex<Option<BatteryCache>>,
    battery_ttl: Duration,
    foreground: AtomicBool,
    activity: Mutex<Option<String>>,
}

impl ContextSnapshotter {
    pub fn new(probe: Arc<dyn PlatformProbe>) -> Self {
        Self::with_battery_ttl(probe, BATTERY_REFRESH_INTERVAL)
    }

    pub fn with_battery_ttl(probe: Arc<dyn PlatformProbe>, battery_ttl: Duration) -> Self {
        Self {
            probe,
            battery: Mutex::new(None),
            battery_ttl,
            foreground: AtomicBool::new(true),
            activity: Mutex::new(None),
        }
    }

    /// Fresh context record. Battery fields come from the cache unless it
    /// has expired.
    pub fn snapshot(&self) -> DeviceContext {
        let battery = self.battery_state();
        DeviceContext {
            screen_on: self.probe.screen_on(),
            app_foreground: Some(self.foreground.load(Ordering::Relaxed)),
            battery_level: battery.level,
            charging: battery.charging,
            network: self.probe.network_type(),
            motion_activity: self.lock_activity().clone(),
        }
    }

    pub fn set_foreground(&self, foreground: bool) {
        self.foreground.store(foreground, Ordering::Relaxed);
    }

    pub fn set_activity(&self, activity: Option<String>) {
        *self.lock_activity() = activity;
    }

    /// Drops cached state from a previous session.
    pub fn reset(&self) {
        *self.lock_activity() = None;
        match self.battery.lock() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    fn battery_state(&self) -> BatteryState {
        let mut cache = match self.battery.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let expired = cache
            .as_ref()
            .map(|entry| entry.sampled_at.elapsed() >= self.battery_ttl)
            .unwrap_or(true);
        if expired {
            *cache = Some(BatteryCache {
                sampled_at: Instant::now(),
                state: self.probe.battery(),
            });
        }
        cache.as_ref().map(|entry| entry.state).unwrap_or_default()
    }

    fn lock_activity(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        match self.activity.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
