//! Engine and session tuning
//!
//! Every section is `#[serde(default)]` so partial JSON files only override
//! what they name.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Play field bounds (origin top-left, y grows downward)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub width: f32,
    pub height: f32,
    /// Distance beyond any edge after which a ball is removed
    pub cleanup_margin: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: FIELD_WIDTH,
            height: FIELD_HEIGHT,
            cleanup_margin: CLEANUP_MARGIN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConfig {
    pub x: f32,
    pub y: f32,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: GRAVITY_Y,
        }
    }
}

/// Ball body and material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallConfig {
    pub radius: f32,
    /// Launch speed (units/s)
    pub speed: f32,
    pub restitution: f32,
    pub friction: f32,
    pub linear_damping: f32,
    pub density: f32,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            radius: BALL_RADIUS,
            speed: BALL_SPEED,
            restitution: BALL_RESTITUTION,
            friction: BALL_FRICTION,
            linear_damping: BALL_LINEAR_DAMPING,
            density: BALL_DENSITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    pub restitution: f32,
    pub friction: f32,
    pub thickness: f32,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            restitution: WALL_RESTITUTION,
            friction: WALL_FRICTION,
            thickness: WALL_THICKNESS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    pub hit: u64,
    pub destroy: u64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            hit: POINTS_HIT,
            destroy: POINTS_DESTROY,
        }
    }
}

/// Frame clamping and sub-stepping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteppingConfig {
    /// Elapsed time per tick is clamped to this (ms)
    pub max_frame_ms: f32,
    pub substeps: u32,
    /// Typical object size handed to the solver for its tolerances
    pub length_unit: f32,
}

impl Default for SteppingConfig {
    fn default() -> Self {
        Self {
            max_frame_ms: TARGET_FRAME_MS,
            substeps: SUBSTEPS,
            length_unit: 100.0,
        }
    }
}

/// Sound cue names queued on ball-brick contacts (none by default)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundCues {
    pub hit: Option<String>,
    pub destroy: Option<String>,
}

/// Simulation engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub field: FieldConfig,
    pub gravity: GravityConfig,
    pub ball: BallConfig,
    pub wall: WallConfig,
    pub points: PointsConfig,
    pub stepping: SteppingConfig,
    pub dedup_window_ms: f64,
    pub sounds: SoundCues,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            field: FieldConfig::default(),
            gravity: GravityConfig::default(),
            ball: BallConfig::default(),
            wall: WallConfig::default(),
            points: PointsConfig::default(),
            stepping: SteppingConfig::default(),
            dedup_window_ms: DEDUP_WINDOW_MS,
            sounds: SoundCues::default(),
        }
    }
}

impl EngineConfig {
    /// Zero gravity variant (handy for straight-line shots)
    pub fn without_gravity() -> Self {
        Self {
            gravity: GravityConfig { x: 0.0, y: 0.0 },
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        let problems = config.validate();
        if !problems.is_empty() {
            return Err(ConfigError::Invalid(problems));
        }
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// List configuration problems (empty means valid)
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !(self.field.width > 0.0) || !(self.field.height > 0.0) {
            problems.push(format!(
                "field size must be positive (got {}x{})",
                self.field.width, self.field.height
            ));
        }
        if !(self.field.cleanup_margin >= 0.0) {
            problems.push("field.cleanup_margin must be >= 0".to_string());
        }
        if !(self.ball.radius > 0.0) {
            problems.push("ball.radius must be > 0".to_string());
        }
        if !(self.ball.speed >= 0.0) {
            problems.push("ball.speed must be >= 0".to_string());
        }
        if !(self.ball.density > 0.0) {
            problems.push("ball.density must be > 0".to_string());
        }
        if !(self.wall.thickness > 0.0) {
            problems.push("wall.thickness must be > 0".to_string());
        }
        if self.stepping.substeps == 0 {
            problems.push("stepping.substeps must be >= 1".to_string());
        }
        if !(self.stepping.max_frame_ms > 0.0) {
            problems.push("stepping.max_frame_ms must be > 0".to_string());
        }
        if !(self.stepping.length_unit > 0.0) {
            problems.push("stepping.length_unit must be > 0".to_string());
        }
        if !(self.dedup_window_ms >= 0.0) {
            problems.push("dedup_window_ms must be >= 0".to_string());
        }
        problems
    }
}

/// Star thresholds as percentages of bricks destroyed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarThresholds {
    pub one: f32,
    pub two: f32,
    pub three: f32,
}

impl Default for StarThresholds {
    fn default() -> Self {
        Self {
            one: 70.0,
            two: 90.0,
            three: 100.0,
        }
    }
}

impl StarThresholds {
    /// Stars earned for a completion percentage
    pub fn stars_for(&self, percentage: f32) -> u8 {
        if percentage >= self.three {
            3
        } else if percentage >= self.two {
            2
        } else if percentage >= self.one {
            1
        } else {
            0
        }
    }
}

/// Level attempt controller tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Time between automatic shots (ms)
    pub shoot_interval_ms: f64,
    /// Countdown before shooting starts (ms)
    pub countdown_ms: f64,
    /// Per-frame elapsed cap applied by the driver (ms)
    pub frame_cap_ms: f64,
    /// Aim clamp (degrees either side of straight up)
    pub max_aim_deg: f32,
    /// Degrees of rotation for a drag across the full field width
    pub drag_sensitivity_deg: f32,
    /// Cannon base distance from the bottom edge
    pub cannon_bottom_offset: f32,
    /// Horizontal cannon drift per degree of aim, when advancing
    pub cannon_drift: f32,
    /// Horizontal muzzle drift per degree of aim, when shooting
    pub muzzle_drift: f32,
    /// Vertical cannon offset when advancing (negative is up)
    pub cannon_lift: f32,
    /// Vertical muzzle offset when shooting
    pub muzzle_lift: f32,
    pub stars: StarThresholds,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shoot_interval_ms: 200.0,
            countdown_ms: 3000.0,
            frame_cap_ms: 32.0,
            max_aim_deg: 80.0,
            drag_sensitivity_deg: 160.0,
            cannon_bottom_offset: 80.0,
            cannon_drift: 0.3,
            muzzle_drift: 0.5,
            cannon_lift: -30.0,
            muzzle_lift: 20.0,
            stars: StarThresholds::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        let problems = config.validate();
        if !problems.is_empty() {
            return Err(ConfigError::Invalid(problems));
        }
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded session config from {}", path.display());
        Ok(config)
    }

    /// List configuration problems (empty means valid)
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !(self.shoot_interval_ms > 0.0) || !self.shoot_interval_ms.is_finite() {
            problems.push("shoot_interval_ms must be > 0".to_string());
        }
        if !(self.countdown_ms >= 0.0) || !self.countdown_ms.is_finite() {
            problems.push("countdown_ms must be >= 0".to_string());
        }
        if !(self.frame_cap_ms >= 0.0) || !self.frame_cap_ms.is_finite() {
            problems.push("frame_cap_ms must be >= 0".to_string());
        }
        if !(self.max_aim_deg >= 0.0) || !self.max_aim_deg.is_finite() {
            problems.push("max_aim_deg must be >= 0".to_string());
        }
        if !self.drag_sensitivity_deg.is_finite() {
            problems.push("drag_sensitivity_deg must be finite".to_string());
        }
        let stars = &self.stars;
        if !(stars.one >= 0.0 && stars.one <= stars.two && stars.two <= stars.three && stars.three <= 100.0) {
            problems.push(format!(
                "stars must satisfy 0 <= one <= two <= three <= 100 (got {}/{}/{})",
                stars.one, stars.two, stars.three
            ));
        }
        problems
    }
}
