//! Simulation entities and per-frame event values

use glam::Vec2;
use rapier2d::prelude::{ColliderHandle, RigidBodyHandle};
use serde::{Deserialize, Serialize};

/// Boundary wall side (there is no bottom wall)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallSide {
    Left,
    Right,
    Top,
}

/// What a collider belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyTag {
    Ball(u32),
    Brick(u32),
    Wall(WallSide),
}

/// A dynamic ball
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: u32,
    pub radius: f32,
    pub(crate) body: RigidBodyHandle,
    pub(crate) collider: ColliderHandle,
}

/// A static brick
#[derive(Debug, Clone)]
pub struct Brick {
    pub id: u32,
    /// Center position
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    pub health: u32,
    pub initial_health: u32,
    pub(crate) body: RigidBodyHandle,
    pub(crate) collider: ColliderHandle,
}

/// A static boundary wall
#[derive(Debug, Clone)]
pub struct Wall {
    pub side: WallSide,
    pub center: Vec2,
    pub half_extents: Vec2,
}

/// Emitted once per destroyed brick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    /// Brick health just before the destroying hit
    pub health: u32,
}

/// Haptic cue strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HapticIntensity {
    /// Brick hit but not destroyed
    Light,
    /// Brick destroyed
    Medium,
}

impl HapticIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            HapticIntensity::Light => "light",
            HapticIntensity::Medium => "medium",
        }
    }
}

/// Events accumulated between publishes
#[derive(Debug, Clone, Default)]
pub struct FrameEvents {
    pub explosions: Vec<Explosion>,
    pub sounds: Vec<String>,
    pub haptics: Vec<HapticIntensity>,
}

impl FrameEvents {
    pub fn is_empty(&self) -> bool {
        self.explosions.is_empty() && self.sounds.is_empty() && self.haptics.is_empty()
    }

    /// Take all pending events, leaving the buffers empty
    pub fn drain(&mut self) -> FrameEvents {
        std::mem::take(self)
    }
}

/// Score bookkeeping for one level attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u64,
    pub bricks_destroyed: u32,
    pub total_bricks: u32,
}

impl Scoreboard {
    pub fn reset(&mut self, total_bricks: u32) {
        *self = Self {
            score: 0,
            bricks_destroyed: 0,
            total_bricks,
        };
    }
}
