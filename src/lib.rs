//! Star Breaker - A cannon brick-breaker arcade game
//!
//! Core modules:
//! - `sim`: Simulation engine (rigid-body world, contacts, scoring, snapshots)
//! - `level`: Level catalog and brick layout expansion
//! - `session`: One level attempt (countdown, ammo, stars, outcome)
//! - `progress`: Best stars and level unlocks
//! - `config`: Data-driven engine and session tuning

pub mod config;
pub mod error;
pub mod level;
pub mod progress;
pub mod session;
pub mod sim;

pub use config::{EngineConfig, SessionConfig};
pub use error::{ConfigError, EngineError, LevelError};
pub use level::{BrickSpec, LevelCatalog, LevelData};
pub use progress::Progress;
pub use session::{LevelSession, SessionEvent, SessionPhase};
pub use sim::{Engine, FrameSnapshot};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Target display frame duration in milliseconds (60 Hz)
    pub const TARGET_FRAME_MS: f32 = 1000.0 / 60.0;
    /// Physics sub-steps per display frame
    pub const SUBSTEPS: u32 = 3;
    /// Balls further than this beyond any field edge are removed
    pub const CLEANUP_MARGIN: f32 = 100.0;
    /// Contacts between the same ball and brick within this window count once
    pub const DEDUP_WINDOW_MS: f64 = 100.0;

    /// Play field defaults (portrait phone screen, y grows downward)
    pub const FIELD_WIDTH: f32 = 390.0;
    pub const FIELD_HEIGHT: f32 = 844.0;

    /// Gravity (units/s², y-down)
    pub const GRAVITY_Y: f32 = 4000.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 6.0;
    /// Launch speed (units/s)
    pub const BALL_SPEED: f32 = 3600.0;
    pub const BALL_RESTITUTION: f32 = 1.0;
    pub const BALL_FRICTION: f32 = 0.001;
    pub const BALL_LINEAR_DAMPING: f32 = 0.006;
    pub const BALL_DENSITY: f32 = 0.002;

    /// Boundary walls
    pub const WALL_THICKNESS: f32 = 50.0;
    pub const WALL_RESTITUTION: f32 = 1.0;
    pub const WALL_FRICTION: f32 = 0.001;

    /// Brick defaults
    pub const BRICK_WIDTH: f32 = 40.0;
    pub const BRICK_HEIGHT: f32 = 20.0;
    pub const BRICK_GAP: f32 = 4.0;
    pub const BRICK_HEALTH: u32 = 2;
    pub const BRICK_RESTITUTION: f32 = 1.0;
    pub const BRICK_FRICTION: f32 = 0.001;

    /// Points
    pub const POINTS_HIT: u64 = 10;
    pub const POINTS_DESTROY: u64 = 20;

    /// Aim angle of 0° points straight up
    pub const AIM_OFFSET_DEG: f32 = 90.0;

    /// Ammunition when a level does not specify it
    pub const DEFAULT_STOCK: u32 = 20;
}

/// Unit direction for a cannon rotation in degrees.
///
/// 0° points straight up (negative y); positive angles rotate clockwise on screen.
#[inline]
pub fn aim_direction(rotation_deg: f32) -> Vec2 {
    let theta = (rotation_deg - consts::AIM_OFFSET_DEG).to_radians();
    Vec2::new(theta.cos(), theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aim_zero_points_up() {
        let dir = aim_direction(0.0);
        assert!(dir.x.abs() < 1e-6);
        assert!((dir.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_aim_right_and_left() {
        let right = aim_direction(90.0);
        assert!((right.x - 1.0).abs() < 1e-6);
        assert!(right.y.abs() < 1e-6);

        let left = aim_direction(-45.0);
        assert!(left.x < 0.0 && left.y < 0.0);
        assert!((left.length() - 1.0).abs() < 1e-6);
    }
}
