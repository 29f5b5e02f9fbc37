//! Quality tiers, device heuristics, and the runtime frame-rate monitor.
//!
//! The tier is picked once at start-up from what the GPU adapter reports and
//! can only ever move down afterwards, when the measured frame rate stays
//! below [`FPS_FLOOR`].

use log::{debug, info, warn};

/// Frames averaged by the FPS monitor before it makes a decision.
pub const FPS_WINDOW: usize = 90;
/// Average frame rate below which the tier drops one step.
pub const FPS_FLOOR: f32 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualityTier {
    Low,
    Medium,
    High,
}

impl QualityTier {
    pub fn particle_multiplier(self) -> f32 {
        match self {
            QualityTier::Low => 0.3,
            QualityTier::Medium => 0.6,
            QualityTier::High => 1.0,
        }
    }

    pub fn bloom(self) -> bool {
        true
    }

    /// Factor applied to bloom strength when the frame is built.
    pub fn bloom_strength_scale(self) -> f32 {
        match self {
            QualityTier::Low => 0.6,
            QualityTier::Medium | QualityTier::High => 1.0,
        }
    }

    /// Resolution of the bloom buffer relative to the framebuffer.
    pub fn bloom_resolution_scale(self) -> f32 {
        match self {
            QualityTier::Low => 0.25,
            QualityTier::Medium => 0.5,
            QualityTier::High => 1.0,
        }
    }

    pub fn anti_alias(self) -> bool {
        true
    }

    pub fn film_grain(self) -> bool {
        self >= QualityTier::Medium
    }

    /// Chromatic aberration and lens distortion only run at the top tier.
    pub fn effect_units(self) -> bool {
        self == QualityTier::High
    }

    /// One tier lower, or `None` at the bottom.
    pub fn step_down(self) -> Option<Self> {
        match self {
            QualityTier::High => Some(QualityTier::Medium),
            QualityTier::Medium => Some(QualityTier::Low),
            QualityTier::Low => None,
        }
    }

    fn saturating_step_down(self) -> Self {
        self.step_down().unwrap_or(self)
    }
}

impl std::str::FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(QualityTier::Low),
            "medium" | "med" => Ok(QualityTier::Medium),
            "high" => Ok(QualityTier::High),
            other => Err(format!("unknown quality tier '{other}'")),
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            QualityTier::Low => "LOW",
            QualityTier::Medium => "MEDIUM",
            QualityTier::High => "HIGH",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceKind {
    Discrete,
    Integrated,
    Virtual,
    Cpu,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatteryStatus {
    /// Charge in [0, 1].
    pub level: f32,
    pub charging: bool,
}

impl BatteryStatus {
    pub fn is_low(&self) -> bool {
        !self.charging && self.level < 0.2
    }
}

/// What is known about the device when the tier is chosen.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceProfile {
    pub renderer: String,
    pub kind: DeviceKind,
    pub mobile: bool,
    pub memory_gb: Option<f32>,
    pub battery: Option<BatteryStatus>,
}

impl DeviceProfile {
    pub fn new(renderer: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            renderer: renderer.into(),
            kind,
            mobile: cfg!(any(target_os = "android", target_os = "ios")),
            memory_gb: None,
            battery: None,
        }
    }

    pub fn from_adapter_info(info: &wgpu::AdapterInfo) -> Self {
        let kind = match info.device_type {
            wgpu::DeviceType::DiscreteGpu => DeviceKind::Discrete,
            wgpu::DeviceType::IntegratedGpu => DeviceKind::Integrated,
            wgpu::DeviceType::VirtualGpu => DeviceKind::Virtual,
            wgpu::DeviceType::Cpu => DeviceKind::Cpu,
            wgpu::DeviceType::Other => DeviceKind::Other,
        };
        let mut profile = Self::new(info.name.clone(), kind);
        profile.memory_gb = host_memory_gb();
        profile.battery = host_battery();
        profile
    }

    pub fn is_software(&self) -> bool {
        let name = self.renderer.to_ascii_lowercase();
        self.kind == DeviceKind::Cpu
            || ["llvmpipe", "swiftshader", "software"]
                .iter()
                .any(|needle| name.contains(needle))
    }

    /// Initial tier for this device.
    pub fn suggested_tier(&self) -> QualityTier {
        if self.is_software() {
            return QualityTier::Low;
        }

        let mut tier = if self.mobile || self.kind == DeviceKind::Integrated {
            QualityTier::Medium
        } else {
            QualityTier::High
        };

        if self.memory_gb.is_some_and(|gb| gb < 4.0) {
            tier = tier.saturating_step_down();
        }
        if self.battery.is_some_and(|b| b.is_low()) {
            tier = tier.saturating_step_down();
        }
        tier
    }
}

/// Installed system memory in GiB, when the platform reports it.
pub fn host_memory_gb() -> Option<f32> {
    let mut system = sysinfo::System::new();
    system.refresh_memory();
    let bytes = system.total_memory();
    if bytes == 0 {
        return None;
    }
    Some(bytes as f32 / (1024.0 * 1024.0 * 1024.0))
}

/// Charge of the first readable battery, or `None` on machines without one.
pub fn host_battery() -> Option<BatteryStatus> {
    let manager = match starship_battery::Manager::new() {
        Ok(manager) => manager,
        Err(e) => {
            debug!(target: "stellar::quality", "battery state unavailable: {e}");
            return None;
        }
    };
    let battery = manager.batteries().ok()?.find_map(Result::ok)?;
    let charging = matches!(
        battery.state(),
        starship_battery::State::Charging | starship_battery::State::Full
    );
    Some(BatteryStatus {
        level: battery.state_of_charge().value.clamp(0.0, 1.0),
        charging,
    })
}

/// Rolling frame-rate average over [`FPS_WINDOW`] frames.
#[derive(Clone, Debug, Default)]
pub struct FpsMonitor {
    frames: usize,
    elapsed: f32,
}

impl FpsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame; returns the average FPS each time a window fills.
    pub fn record(&mut self, dt: f32) -> Option<f32> {
        if !dt.is_finite() || dt <= 0.0 {
            return None;
        }
        self.frames += 1;
        self.elapsed += dt;
        if self.frames < FPS_WINDOW {
            return None;
        }
        let fps = self.frames as f32 / self.elapsed;
        self.frames = 0;
        self.elapsed = 0.0;
        Some(fps)
    }
}

/// Holds the current tier and lowers it when frames run slow.
#[derive(Clone, Debug)]
pub struct QualityAdapter {
    tier: QualityTier,
    monitor: FpsMonitor,
}

impl QualityAdapter {
    pub fn new(tier: QualityTier) -> Self {
        Self {
            tier,
            monitor: FpsMonitor::new(),
        }
    }

    pub fn detect(profile: &DeviceProfile) -> Self {
        let tier = profile.suggested_tier();
        info!(target: "stellar::quality", "{} ({:?}) -> {tier}", profile.renderer, profile.kind);
        Self::new(tier)
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    /// Feed one frame time. Returns the new tier when it just dropped.
    pub fn record_frame(&mut self, dt: f32) -> Option<QualityTier> {
        let fps = self.monitor.record(dt)?;
        if fps >= FPS_FLOOR {
            return None;
        }
        let lower = self.tier.step_down()?;
        warn!(target: "stellar::quality", "average {fps:.1} fps, dropping to {lower}");
        self.tier = lower;
        Some(lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(adapter: &mut QualityAdapter, fps: f32, frames: usize) -> Vec<QualityTier> {
        (0..frames)
            .filter_map(|_| adapter.record_frame(1.0 / fps))
            .collect()
    }

    #[test]
    fn software_renderers_start_low() {
        let profile = DeviceProfile::new("llvmpipe (LLVM 17.0.6, 256 bits)", DeviceKind::Other);
        assert_eq!(profile.suggested_tier(), QualityTier::Low);
        let cpu = DeviceProfile::new("Whatever", DeviceKind::Cpu);
        assert_eq!(cpu.suggested_tier(), QualityTier::Low);
    }

    #[test]
    fn integrated_and_constrained_devices_step_down() {
        let mut profile = DeviceProfile::new("Intel Iris Xe", DeviceKind::Integrated);
        profile.mobile = false;
        assert_eq!(profile.suggested_tier(), QualityTier::Medium);

        profile.memory_gb = Some(2.0);
        assert_eq!(profile.suggested_tier(), QualityTier::Low);

        let mut discrete = DeviceProfile::new("RTX", DeviceKind::Discrete);
        discrete.mobile = false;
        discrete.battery = Some(BatteryStatus {
            level: 0.1,
            charging: false,
        });
        assert_eq!(discrete.suggested_tier(), QualityTier::Medium);
    }

    #[test]
    fn host_memory_and_battery_are_plausible() {
        let memory = host_memory_gb().expect("total memory");
        assert!(memory > 0.0);
        if let Some(battery) = host_battery() {
            assert!((0.0..=1.0).contains(&battery.level));
        }
    }

    #[test]
    fn manual_profiles_leave_host_fields_unset() {
        let profile = DeviceProfile::new("RTX", DeviceKind::Discrete);
        assert_eq!(profile.memory_gb, None);
        assert_eq!(profile.battery, None);
    }

    #[test]
    fn slow_frames_drop_one_step_per_window() {
        let mut adapter = QualityAdapter::new(QualityTier::High);
        assert_eq!(run(&mut adapter, 20.0, FPS_WINDOW), vec![QualityTier::Medium]);
        assert_eq!(run(&mut adapter, 20.0, FPS_WINDOW * 3), vec![QualityTier::Low]);
        assert_eq!(adapter.tier(), QualityTier::Low);
    }

    #[test]
    fn fast_frames_never_upgrade() {
        let mut adapter = QualityAdapter::new(QualityTier::High);
        run(&mut adapter, 10.0, FPS_WINDOW);
        assert_eq!(adapter.tier(), QualityTier::Medium);
        assert!(run(&mut adapter, 144.0, FPS_WINDOW * 10).is_empty());
        assert_eq!(adapter.tier(), QualityTier::Medium);
    }

    #[test]
    fn tier_gates() {
        assert!(!QualityTier::Low.film_grain());
        assert!(QualityTier::Medium.film_grain());
        assert!(!QualityTier::Medium.effect_units());
        assert!(QualityTier::High.effect_units());
        assert_eq!("Medium".parse::<QualityTier>(), Ok(QualityTier::Medium));
        assert!("ultra".parse::<QualityTier>().is_err());
    }
}
