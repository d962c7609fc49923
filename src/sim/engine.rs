//! Simulation engine
//!
//! The only entry point a driver needs: load a level, shoot balls, advance
//! one frame at a time and subscribe to the resulting snapshots. After
//! `destroy()` every mutating call fails with [`EngineError::Destroyed`].

use glam::Vec2;

use super::rules::GameplayRules;
use super::snapshot::{FrameSnapshot, Publisher, SubscriptionId};
use super::tick::{Stepper, TickInput, TickReport};
use super::world::PhysicsWorld;
use crate::aim_direction;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::level::LevelData;

/// Live simulation state, dropped on teardown
struct Simulation {
    world: PhysicsWorld,
    rules: GameplayRules,
    stepper: Stepper,
    next_ball_id: u32,
    next_brick_id: u32,
}

/// Brick-breaker simulation engine
pub struct Engine {
    config: EngineConfig,
    sim: Option<Simulation>,
    publisher: Publisher,
    last_report: TickReport,
}

impl Engine {
    /// Build the world (gravity + boundary walls). No bricks exist yet.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let problems = config.validate();
        if !problems.is_empty() {
            return Err(EngineError::InvalidConfig(problems.join("; ")));
        }

        let sim = Simulation {
            world: PhysicsWorld::new(&config),
            rules: GameplayRules::new(&config),
            stepper: Stepper::new(&config),
            next_ball_id: 0,
            next_brick_id: 0,
        };
        log::info!(
            "Engine ready: field {}x{}, gravity ({}, {}), dedup window {}ms",
            config.field.width,
            config.field.height,
            config.gravity.x,
            config.gravity.y,
            config.dedup_window_ms
        );

        Ok(Self {
            config,
            sim: Some(sim),
            publisher: Publisher::new(),
            last_report: TickReport::default(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_destroyed(&self) -> bool {
        self.sim.is_none()
    }

    fn sim_mut(&mut self) -> Result<&mut Simulation, EngineError> {
        self.sim.as_mut().ok_or(EngineError::Destroyed)
    }

    /// Replace the bricks with the level's layout and zero the score.
    ///
    /// In-flight balls and pending events from the previous attempt are
    /// discarded too, so a retry starts from a clean field.
    pub fn load_level(&mut self, level: &LevelData) -> Result<(), EngineError> {
        let sim = self.sim_mut()?;

        sim.world.clear_bricks();
        sim.world.clear_balls();
        sim.stepper.reset_contacts();
        sim.next_brick_id = 0;

        for spec in &level.bricks {
            let id = sim.next_brick_id;
            sim.next_brick_id += 1;
            sim.world.add_brick(id, spec);
        }
        sim.rules.reset(level.bricks.len() as u32);

        log::info!(
            "Loaded level: {} bricks, stock {}",
            level.bricks.len(),
            level.stock
        );
        Ok(())
    }

    /// Spawn one ball at `position` aimed `aim_deg` degrees from straight up.
    /// Returns the new ball id. Ammunition and cadence are the caller's job.
    pub fn shoot_ball(&mut self, position: Vec2, aim_deg: f32) -> Result<u32, EngineError> {
        let velocity = aim_direction(aim_deg) * self.config.ball.speed;
        let sim = self.sim.as_mut().ok_or(EngineError::Destroyed)?;

        let id = sim.next_ball_id;
        sim.next_ball_id += 1;
        sim.world.spawn_ball(id, position, velocity, &self.config);
        log::debug!(
            "Shot ball {} from ({:.0}, {:.0}) at {:.1} deg",
            id,
            position.x,
            position.y,
            aim_deg
        );
        Ok(id)
    }

    /// Advance one display frame and publish its snapshot to every subscriber
    pub fn advance(
        &mut self,
        elapsed_ms: f32,
        aim_deg: f32,
        cannon: Vec2,
    ) -> Result<FrameSnapshot, EngineError> {
        let sim = self.sim.as_mut().ok_or(EngineError::Destroyed)?;

        let input = TickInput {
            elapsed_ms,
            aim_deg,
            cannon,
        };
        let report = sim.stepper.advance(&mut sim.world, &mut sim.rules, &input);

        let events = sim.rules.events.drain();
        let snapshot = FrameSnapshot::capture(&sim.world, &sim.rules.scoreboard, events);
        self.last_report = report;

        self.publisher.publish(&snapshot);
        Ok(snapshot)
    }

    /// Register a snapshot listener; listeners run in registration order
    pub fn subscribe<F>(&mut self, listener: F) -> Result<SubscriptionId, EngineError>
    where
        F: FnMut(&FrameSnapshot) + 'static,
    {
        if self.is_destroyed() {
            return Err(EngineError::Destroyed);
        }
        Ok(self.publisher.subscribe(listener))
    }

    /// Remove a listener. Safe at any time, including after `destroy()`.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.publisher.unsubscribe(id)
    }

    /// Release the physics world and all listeners. Calling it twice is harmless.
    pub fn destroy(&mut self) {
        if self.sim.take().is_some() {
            log::info!("Engine destroyed");
        }
        self.publisher.clear();
    }

    /// Current score, if the engine is alive
    pub fn score(&self) -> Option<u64> {
        self.sim.as_ref().map(|sim| sim.rules.scoreboard.score)
    }

    /// Number of live balls (0 after teardown)
    pub fn ball_count(&self) -> usize {
        self.sim.as_ref().map_or(0, |sim| sim.world.balls().len())
    }

    /// Number of live bricks (0 after teardown)
    pub fn brick_count(&self) -> usize {
        self.sim.as_ref().map_or(0, |sim| sim.world.bricks().len())
    }

    /// Details of the most recent `advance`
    pub fn last_report(&self) -> &TickReport {
        &self.last_report
    }

    pub fn subscriber_count(&self) -> usize {
        self.publisher.len()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("destroyed", &self.is_destroyed())
            .field("balls", &self.ball_count())
            .field("bricks", &self.brick_count())
            .field("publisher", &self.publisher)
            .finish()
    }
}
