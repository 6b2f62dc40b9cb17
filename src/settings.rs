use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use crate::capture::{EstimationConfig, LoopOptions};
use crate::pipeline::Platform;
use crate::pose::SkeletonModel;
use crate::sample::{SampleSource, DEFAULT_CAPACITY, DEFAULT_SETTLE_DELAY};

pub const SERVER_URL_ENV: &str = "POSECAP_SERVER_URL";
pub const SECRET_ENV: &str = "POSECAP_SECRET";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureMode {
    /// Collect a full window of `capacity` frames after the settle delay.
    Timed,
    /// Grab a single frame right away.
    Single,
}

impl Default for CaptureMode {
    fn default() -> Self {
        CaptureMode::Timed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureSettings {
    pub server_url: String,
    pub secret: String,
    pub mode: CaptureMode,
    pub capacity: usize,
    pub settle_delay_ms: u64,
    pub min_keypoint_score: f32,
    pub flip_horizontal: bool,
    pub skeleton: SkeletonModel,
    pub sample_source: SampleSource,
    pub min_tick_interval_ms: Option<u64>,
    pub platform: Platform,
    pub portrait: bool,
    pub window_width: f32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000/poses".into(),
            secret: String::new(),
            mode: CaptureMode::Timed,
            capacity: DEFAULT_CAPACITY,
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            min_keypoint_score: 0.3,
            flip_horizontal: true,
            skeleton: SkeletonModel::BlazePose,
            sample_source: SampleSource::World3d,
            min_tick_interval_ms: None,
            platform: Platform::Android,
            portrait: true,
            window_width: 390.0,
        }
    }
}

impl CaptureSettings {
    pub fn effective_capacity(&self) -> usize {
        match self.mode {
            CaptureMode::Timed => self.capacity.max(1),
            CaptureMode::Single => 1,
        }
    }

    pub fn effective_settle_delay(&self) -> Duration {
        match self.mode {
            CaptureMode::Timed => Duration::from_millis(self.settle_delay_ms),
            CaptureMode::Single => Duration::ZERO,
        }
    }

    pub fn loop_options(&self) -> LoopOptions {
        LoopOptions {
            min_keypoint_score: self.min_keypoint_score,
            skeleton: self.skeleton,
            estimation: EstimationConfig {
                flip_horizontal: self.flip_horizontal,
            },
            min_tick_interval: self.min_tick_interval_ms.map(Duration::from_millis),
        }
    }

    /// Apply `POSECAP_SERVER_URL` / `POSECAP_SECRET` on top of the file values.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(
            std::env::var(SERVER_URL_ENV).ok(),
            std::env::var(SECRET_ENV).ok(),
        );
        self
    }

    fn apply_overrides(&mut self, server_url: Option<String>, secret: Option<String>) {
        if let Some(url) = server_url.filter(|v| !v.trim().is_empty()) {
            self.server_url = url;
        }
        if let Some(secret) = secret {
            self.secret = secret;
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<CaptureSettings>,
}

impl SettingsStore {
    /// Missing file means defaults; an unreadable or malformed one is an error.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid settings in {}", path.display()))?
        } else {
            CaptureSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> CaptureSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Settings as the capture session should use them, env overrides applied.
    pub fn effective(&self) -> CaptureSettings {
        self.settings().with_env_overrides()
    }

    pub fn update(&self, settings: CaptureSettings) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &CaptureSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
