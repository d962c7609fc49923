//! Frame stepping
//!
//! One external frame becomes a fixed number of solver sub-steps. The frame
//! delta is clamped first so a stalled frame can never produce a huge step.

use glam::Vec2;

use super::collision::{BrickContact, ContactDeduper};
use super::rules::{ContactOutcome, GameplayRules};
use super::world::PhysicsWorld;
use crate::config::{EngineConfig, FieldConfig, SteppingConfig};

/// Per-frame input from the driver
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Wall-clock time since the previous frame (ms)
    pub elapsed_ms: f32,
    /// Current cannon rotation (degrees); informational
    pub aim_deg: f32,
    /// Current cannon position; informational
    pub cannon: Vec2,
}

/// How a frame's time is split
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSchedule {
    /// Sanitized wall-clock elapsed (ms), drives the contact clock
    pub elapsed_ms: f32,
    /// Elapsed after clamping to one target frame (ms)
    pub clamped_ms: f32,
    pub substeps: u32,
    /// Solver step per sub-step (seconds)
    pub sub_dt: f32,
}

impl StepSchedule {
    pub fn new(elapsed_ms: f32, stepping: &SteppingConfig) -> Self {
        // Negative, NaN and infinite deltas all mean "no time passed"
        let elapsed_ms = if elapsed_ms.is_finite() {
            elapsed_ms.max(0.0)
        } else {
            0.0
        };
        let clamped_ms = elapsed_ms.min(stepping.max_frame_ms);
        let substeps = stepping.substeps.max(1);
        Self {
            elapsed_ms,
            clamped_ms,
            substeps,
            sub_dt: clamped_ms / substeps as f32 / 1000.0,
        }
    }
}

/// Summary of one frame, mostly for logging and tests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub substeps_run: u32,
    pub outcomes: Vec<ContactOutcome>,
    pub suppressed_contacts: u32,
    pub balls_removed: Vec<u32>,
}

/// Owns the contact clock and the de-duplication window
#[derive(Debug, Clone)]
pub struct Stepper {
    stepping: SteppingConfig,
    field: FieldConfig,
    dedup: ContactDeduper,
    /// Accumulated wall-clock time (ms)
    clock_ms: f64,
}

impl Stepper {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            stepping: config.stepping.clone(),
            field: config.field.clone(),
            dedup: ContactDeduper::new(config.dedup_window_ms),
            clock_ms: 0.0,
        }
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Forget counted contacts (brick ids restart on level load)
    pub fn reset_contacts(&mut self) {
        self.dedup.clear();
    }

    /// Sub-step the solver, feed each sub-step's contacts through the rules,
    /// then remove balls that left the field
    pub fn advance(
        &mut self,
        world: &mut PhysicsWorld,
        rules: &mut GameplayRules,
        input: &TickInput,
    ) -> TickReport {
        let schedule = StepSchedule::new(input.elapsed_ms, &self.stepping);
        let mut report = TickReport::default();

        log::trace!(
            "tick {:.3}ms (clamped {:.3}ms) aim {:.1} cannon ({:.0}, {:.0})",
            schedule.elapsed_ms,
            schedule.clamped_ms,
            input.aim_deg,
            input.cannon.x,
            input.cannon.y
        );

        let clock_slice = schedule.elapsed_ms as f64 / schedule.substeps as f64;

        if schedule.sub_dt > 0.0 {
            for _ in 0..schedule.substeps {
                self.clock_ms += clock_slice;
                let contacts = world.step(schedule.sub_dt);
                self.apply_contacts(world, rules, contacts, &mut report);
                report.substeps_run += 1;
            }
        } else {
            self.clock_ms += schedule.elapsed_ms as f64;
        }

        report.balls_removed = cleanup_out_of_bounds(world, &self.field);
        report
    }

    /// Count one sub-step's contacts at the current clock. Repeats of a pair
    /// still inside the window are suppressed instead of reaching the rules.
    pub fn apply_contacts(
        &mut self,
        world: &mut PhysicsWorld,
        rules: &mut GameplayRules,
        contacts: Vec<BrickContact>,
        report: &mut TickReport,
    ) {
        for contact in contacts {
            if !self.dedup.admit(contact, self.clock_ms) {
                report.suppressed_contacts += 1;
                continue;
            }
            if let Some(outcome) = rules.apply(world, contact) {
                report.outcomes.push(outcome);
            }
        }
    }

    /// Move the contact clock forward without stepping the solver
    pub fn advance_clock(&mut self, ms: f64) {
        if ms.is_finite() && ms > 0.0 {
            self.clock_ms += ms;
        }
    }
}

/// True when a ball center is more than the margin beyond any field edge
pub fn is_out_of_bounds(pos: Vec2, field: &FieldConfig) -> bool {
    let m = field.cleanup_margin;
    pos.x < -m || pos.x > field.width + m || pos.y < -m || pos.y > field.height + m
}

/// Remove every ball outside the field plus margin; returns removed ids
pub fn cleanup_out_of_bounds(world: &mut PhysicsWorld, field: &FieldConfig) -> Vec<u32> {
    let gone: Vec<u32> = world
        .balls()
        .iter()
        .filter(|ball| {
            world
                .ball_position(ball)
                .is_none_or(|pos| is_out_of_bounds(pos, field))
        })
        .map(|ball| ball.id)
        .collect();

    for id in &gone {
        world.remove_ball(*id);
        log::debug!("Ball {} left the field", id);
    }
    gone
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::level::BrickSpec;

    #[test]
    fn test_schedule_clamps_and_splits() {
        let stepping = SteppingConfig::default();

        let slow = StepSchedule::new(250.0, &stepping);
        assert_eq!(slow.elapsed_ms, 250.0);
        assert!((slow.clamped_ms - TARGET_FRAME_MS).abs() < 1e-4);
        assert_eq!(slow.substeps, 3);
        assert!((slow.sub_dt - TARGET_FRAME_MS / 3.0 / 1000.0).abs() < 1e-7);

        let fast = StepSchedule::new(8.0, &stepping);
        assert!((fast.clamped_ms - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_schedule_sanitizes_bad_deltas() {
        let stepping = SteppingConfig::default();
        for bad in [-5.0, f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let schedule = StepSchedule::new(bad, &stepping);
            assert_eq!(schedule.clamped_ms, 0.0);
            assert_eq!(schedule.sub_dt, 0.0);
        }
    }

    #[test]
    fn test_out_of_bounds_margin() {
        let field = FieldConfig::default();
        assert!(!is_out_of_bounds(Vec2::new(-100.0, 10.0), &field));
        assert!(is_out_of_bounds(Vec2::new(-100.5, 10.0), &field));
        assert!(is_out_of_bounds(Vec2::new(field.width + 101.0, 10.0), &field));
        assert!(is_out_of_bounds(Vec2::new(10.0, -101.0), &field));
        assert!(is_out_of_bounds(Vec2::new(10.0, field.height + 101.0), &field));
        assert!(!is_out_of_bounds(Vec2::new(10.0, field.height + 99.0), &field));
    }

    #[test]
    fn test_cleanup_removes_only_escaped_balls() {
        let config = EngineConfig::without_gravity();
        let mut world = PhysicsWorld::new(&config);
        world.spawn_ball(0, Vec2::new(100.0, 100.0), Vec2::ZERO, &config);
        world.spawn_ball(1, Vec2::new(100.0, config.field.height + 150.0), Vec2::ZERO, &config);

        let removed = cleanup_out_of_bounds(&mut world, &config.field);
        assert_eq!(removed, vec![1]);
        assert_eq!(world.balls().len(), 1);
        assert_eq!(world.balls()[0].id, 0);
    }

    #[test]
    fn test_zero_elapsed_runs_no_substeps() {
        let config = EngineConfig::default();
        let mut world = PhysicsWorld::new(&config);
        let mut rules = GameplayRules::new(&config);
        let mut stepper = Stepper::new(&config);
        world.spawn_ball(0, Vec2::new(100.0, 100.0), Vec2::ZERO, &config);

        let report = stepper.advance(&mut world, &mut rules, &TickInput::default());
        assert_eq!(report.substeps_run, 0);
        let pos = world.ball_position(&world.balls()[0]).unwrap();
        assert!((pos.y - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_contact_clock_tracks_wall_time() {
        let config = EngineConfig::default();
        let mut world = PhysicsWorld::new(&config);
        let mut rules = GameplayRules::new(&config);
        let mut stepper = Stepper::new(&config);

        let input = TickInput {
            elapsed_ms: 40.0,
            ..Default::default()
        };
        let report = stepper.advance(&mut world, &mut rules, &input);
        assert_eq!(report.substeps_run, 3);
        assert!((stepper.clock_ms() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_shot_into_brick_counts_once() {
        let config = EngineConfig::without_gravity();
        let mut world = PhysicsWorld::new(&config);
        let mut rules = GameplayRules::new(&config);
        let mut stepper = Stepper::new(&config);
        world.add_brick(0, &BrickSpec::new(195.0, 200.0, 3));
        rules.reset(1);
        world.spawn_ball(0, Vec2::new(195.0, 400.0), Vec2::new(0.0, -3600.0), &config);

        let input = TickInput {
            elapsed_ms: TARGET_FRAME_MS,
            ..Default::default()
        };
        let mut outcomes = Vec::new();
        for _ in 0..40 {
            outcomes.extend(stepper.advance(&mut world, &mut rules, &input).outcomes);
        }
        assert_eq!(outcomes, vec![ContactOutcome::Hit { brick_id: 0, health: 2 }]);
        assert_eq!(rules.scoreboard.score, 10);
        // Ball bounced down and out of the field
        assert!(world.balls().is_empty());
    }

    #[test]
    fn test_repeated_contact_inside_window_costs_one_health() {
        let config = EngineConfig::without_gravity();
        let mut world = PhysicsWorld::new(&config);
        let mut rules = GameplayRules::new(&config);
        let mut stepper = Stepper::new(&config);
        world.add_brick(0, &BrickSpec::new(195.0, 200.0, 5));
        rules.reset(1);

        let contact = BrickContact {
            ball_id: 3,
            brick_id: 0,
        };
        let sub_step_ms = TARGET_FRAME_MS as f64 / 3.0;
        let mut report = TickReport::default();

        // Same pair reported on three back-to-back sub-steps
        for _ in 0..3 {
            stepper.advance_clock(sub_step_ms);
            stepper.apply_contacts(&mut world, &mut rules, vec![contact], &mut report);
        }
        assert_eq!(report.outcomes, vec![ContactOutcome::Hit { brick_id: 0, health: 4 }]);
        assert_eq!(report.suppressed_contacts, 2);
        assert_eq!(world.bricks()[0].health, 4);
        assert_eq!(rules.scoreboard.score, 10);

        // Window elapsed: a fresh contact episode
        stepper.advance_clock(config.dedup_window_ms);
        let mut later = TickReport::default();
        stepper.apply_contacts(&mut world, &mut rules, vec![contact], &mut later);
        assert_eq!(later.outcomes, vec![ContactOutcome::Hit { brick_id: 0, health: 3 }]);
        assert_eq!(later.suppressed_contacts, 0);
        assert_eq!(world.bricks()[0].health, 3);
    }

    #[test]
    fn test_other_pairs_not_suppressed() {
        let config = EngineConfig::without_gravity();
        let mut world = PhysicsWorld::new(&config);
        let mut rules = GameplayRules::new(&config);
        let mut stepper = Stepper::new(&config);
        world.add_brick(0, &BrickSpec::new(100.0, 200.0, 3));
        world.add_brick(1, &BrickSpec::new(200.0, 200.0, 3));
        rules.reset(2);

        let contacts = vec![
            BrickContact { ball_id: 0, brick_id: 0 },
            BrickContact { ball_id: 0, brick_id: 1 },
            BrickContact { ball_id: 1, brick_id: 0 },
        ];
        let mut report = TickReport::default();
        stepper.advance_clock(5.0);
        stepper.apply_contacts(&mut world, &mut rules, contacts, &mut report);
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.suppressed_contacts, 0);
        assert_eq!(world.bricks()[0].health, 1);
        assert_eq!(world.bricks()[1].health, 2);
    }
}
