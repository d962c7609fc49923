//! Gameplay rules
//!
//! Turns counted ball-brick contacts into health loss, score, explosions and
//! feedback cues. Ball-wall and ball-ball contacts never reach this module.

use super::collision::BrickContact;
use super::state::{Explosion, FrameEvents, HapticIntensity, Scoreboard};
use super::world::PhysicsWorld;
use crate::config::{EngineConfig, PointsConfig, SoundCues};

/// What a counted contact did to its brick
#[derive(Debug, Clone, PartialEq)]
pub enum ContactOutcome {
    /// Brick survived with `health` remaining
    Hit { brick_id: u32, health: u32 },
    /// Brick destroyed and removed
    Destroyed { brick_id: u32, explosion: Explosion },
}

/// Score, event buffers and the rule constants they are computed from
#[derive(Debug, Clone)]
pub struct GameplayRules {
    points: PointsConfig,
    sounds: SoundCues,
    next_explosion_id: u64,
    pub scoreboard: Scoreboard,
    pub events: FrameEvents,
}

impl GameplayRules {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            points: config.points.clone(),
            sounds: config.sounds.clone(),
            next_explosion_id: 0,
            scoreboard: Scoreboard::default(),
            events: FrameEvents::default(),
        }
    }

    /// Start a fresh attempt: zero the score and drop pending events.
    /// Explosion ids keep counting so renderers never see a reused id.
    pub fn reset(&mut self, total_bricks: u32) {
        self.scoreboard.reset(total_bricks);
        self.events = FrameEvents::default();
    }

    /// Apply one counted contact. Returns `None` when the brick is already gone.
    pub fn apply(&mut self, world: &mut PhysicsWorld, contact: BrickContact) -> Option<ContactOutcome> {
        let brick = world.brick_mut(contact.brick_id)?;
        let previous_health = brick.health;
        brick.health = brick.health.saturating_sub(1);

        if brick.health > 0 {
            let health = brick.health;
            self.scoreboard.score += self.points.hit;
            self.events.haptics.push(HapticIntensity::Light);
            if let Some(cue) = &self.sounds.hit {
                self.events.sounds.push(cue.clone());
            }
            log::debug!(
                "Ball {} hit brick {} ({} left)",
                contact.ball_id,
                contact.brick_id,
                health
            );
            return Some(ContactOutcome::Hit {
                brick_id: contact.brick_id,
                health,
            });
        }

        let pos = brick.pos;
        world.remove_brick(contact.brick_id);

        let explosion = Explosion {
            id: self.next_explosion_id,
            x: pos.x,
            y: pos.y,
            health: previous_health,
        };
        self.next_explosion_id += 1;

        self.scoreboard.score += self.points.destroy;
        self.scoreboard.bricks_destroyed += 1;
        self.events.explosions.push(explosion.clone());
        self.events.haptics.push(HapticIntensity::Medium);
        if let Some(cue) = &self.sounds.destroy {
            self.events.sounds.push(cue.clone());
        }
        log::debug!("Ball {} destroyed brick {}", contact.ball_id, contact.brick_id);

        Some(ContactOutcome::Destroyed {
            brick_id: contact.brick_id,
            explosion,
        })
    }
}
