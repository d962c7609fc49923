//! Level attempt controller
//!
//! Drives one attempt at a level on top of the [`Engine`]: countdown,
//! cannon aim, automatic firing while ammunition lasts, star milestones and
//! the final win/lose decision.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, SessionConfig};
use crate::error::EngineError;
use crate::level::LevelData;
use crate::sim::{Engine, FrameSnapshot};

/// Cheers shown when a star milestone is reached
const MILESTONE_MESSAGES: &[&str] = &[
    "NICE SHOT!",
    "GREAT!",
    "SUPERB!",
    "AWESOME!",
    "INCREDIBLE!",
    "FANTASTIC!",
    "IMPRESSIVE!",
    "BRILLIANT!",
    "BRAVO!",
    "KEEP GOING!",
    "ON FIRE!",
    "UNSTOPPABLE!",
];

/// Where an attempt currently stands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Level loaded, waiting for `start()`
    Idle,
    /// Counting down before firing begins
    Countdown { remaining_ms: f64 },
    /// Cannon firing, outcome undecided
    Playing,
    Won,
    Lost,
}

impl SessionPhase {
    /// Aim input is accepted only while the attempt is under way
    pub fn accepts_aim(&self) -> bool {
        matches!(self, SessionPhase::Countdown { .. } | SessionPhase::Playing)
    }

    pub fn is_over(&self) -> bool {
        matches!(self, SessionPhase::Won | SessionPhase::Lost)
    }
}

/// Things the presentation layer reacts to, beyond the snapshot itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A new star milestone below the maximum
    StarEarned { stars: u8, message: String },
    Victory,
    Defeat,
}

/// Result of one session frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub snapshot: FrameSnapshot,
    pub phase: SessionPhase,
    pub events: Vec<SessionEvent>,
}

/// One attempt at one level
pub struct LevelSession {
    config: SessionConfig,
    engine: Engine,
    level: LevelData,
    phase: SessionPhase,
    aim_deg: f32,
    drag_start_deg: f32,
    stock: u32,
    stars: u8,
    /// Time accumulated toward the next shot (ms)
    shot_timer_ms: f64,
    rng: Pcg32,
}

impl LevelSession {
    /// Build the engine and load `level`; the session starts Idle.
    /// Invalid session tuning is rejected before the engine is built.
    pub fn new(
        engine_config: EngineConfig,
        config: SessionConfig,
        level: LevelData,
        seed: u64,
    ) -> Result<Self, EngineError> {
        let problems = config.validate();
        if !problems.is_empty() {
            return Err(EngineError::InvalidConfig(problems.join("; ")));
        }
        let mut engine = Engine::new(engine_config)?;
        engine.load_level(&level)?;
        let stock = level.stock;

        Ok(Self {
            config,
            engine,
            level,
            phase: SessionPhase::Idle,
            aim_deg: 0.0,
            drag_start_deg: 0.0,
            stock,
            stars: 0,
            shot_timer_ms: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn aim_deg(&self) -> f32 {
        self.aim_deg
    }

    /// Balls left to fire
    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn max_stock(&self) -> u32 {
        self.level.stock
    }

    pub fn stars(&self) -> u8 {
        self.stars
    }

    pub fn level(&self) -> &LevelData {
        &self.level
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Mutable engine access, mainly for subscribing to snapshots
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Whole seconds left on the countdown, for display
    pub fn countdown_seconds(&self) -> Option<u32> {
        match self.phase {
            SessionPhase::Countdown { remaining_ms } => {
                Some((remaining_ms / 1000.0).ceil().max(0.0) as u32)
            }
            _ => None,
        }
    }

    /// Cannon base position for the current aim
    pub fn cannon_position(&self) -> Vec2 {
        let (cx, cy) = self.cannon_anchor();
        Vec2::new(
            cx + self.aim_deg * self.config.cannon_drift,
            cy + self.config.cannon_lift,
        )
    }

    /// Where the next ball spawns
    pub fn muzzle_position(&self) -> Vec2 {
        let (cx, cy) = self.cannon_anchor();
        Vec2::new(
            cx + self.aim_deg * self.config.muzzle_drift,
            cy + self.config.muzzle_lift,
        )
    }

    fn cannon_anchor(&self) -> (f32, f32) {
        let field = &self.engine.config().field;
        (
            field.width / 2.0,
            field.height - self.config.cannon_bottom_offset,
        )
    }

    /// Idle -> Countdown. Returns false from any other phase.
    pub fn start(&mut self) -> bool {
        if self.phase != SessionPhase::Idle {
            return false;
        }
        self.phase = SessionPhase::Countdown {
            remaining_ms: self.config.countdown_ms,
        };
        log::info!("Countdown started ({} balls)", self.stock);
        true
    }

    /// Clamp and apply an absolute aim; ignored outside Countdown/Playing
    pub fn set_aim(&mut self, deg: f32) -> bool {
        if !self.phase.accepts_aim() || !deg.is_finite() {
            return false;
        }
        let max = self.config.max_aim_deg;
        self.aim_deg = deg.clamp(-max, max);
        true
    }

    /// Remember the aim at the start of a drag gesture
    pub fn begin_drag(&mut self) {
        self.drag_start_deg = self.aim_deg;
    }

    /// Rotate relative to the drag start by a horizontal offset in field units
    pub fn drag_to(&mut self, dx: f32) -> bool {
        let width = self.engine.config().field.width;
        let delta = dx / width * self.config.drag_sensitivity_deg;
        self.set_aim(self.drag_start_deg + delta)
    }

    /// Advance the attempt by one display frame
    pub fn frame(&mut self, elapsed_ms: f64) -> Result<FrameReport, EngineError> {
        let elapsed_ms = if elapsed_ms.is_finite() {
            elapsed_ms.clamp(0.0, self.config.frame_cap_ms)
        } else {
            0.0
        };

        if let SessionPhase::Countdown { remaining_ms } = self.phase {
            let remaining_ms = remaining_ms - elapsed_ms;
            self.phase = if remaining_ms <= 0.0 {
                log::info!("Firing");
                SessionPhase::Playing
            } else {
                SessionPhase::Countdown { remaining_ms }
            };
        } else if self.phase == SessionPhase::Playing {
            self.shot_timer_ms += elapsed_ms;
            if self.shot_timer_ms >= self.config.shoot_interval_ms {
                self.shot_timer_ms -= self.config.shoot_interval_ms;
                if self.stock > 0 {
                    self.engine.shoot_ball(self.muzzle_position(), self.aim_deg)?;
                    self.stock -= 1;
                }
            }
        }

        let snapshot =
            self.engine
                .advance(elapsed_ms as f32, self.aim_deg, self.cannon_position())?;

        let events = if self.phase == SessionPhase::Playing {
            self.evaluate(&snapshot)
        } else {
            Vec::new()
        };

        Ok(FrameReport {
            snapshot,
            phase: self.phase,
            events,
        })
    }

    /// Star milestones, then the win/lose decision
    fn evaluate(&mut self, snapshot: &FrameSnapshot) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        let percentage =
            snapshot.bricks_destroyed as f32 / snapshot.total_bricks.max(1) as f32 * 100.0;
        let earned = self.config.stars.stars_for(percentage);
        if earned > self.stars {
            self.stars = earned;
            if earned < 3 {
                let message = self.milestone_message();
                log::debug!("Star {} earned: {}", earned, message);
                events.push(SessionEvent::StarEarned {
                    stars: earned,
                    message,
                });
            }
        }

        if snapshot.bricks.is_empty() {
            self.finish(true, &mut events);
        } else if self.stock == 0 && snapshot.balls.is_empty() {
            self.finish(self.stars >= 1, &mut events);
        }
        events
    }

    fn finish(&mut self, won: bool, events: &mut Vec<SessionEvent>) {
        if won {
            self.phase = SessionPhase::Won;
            events.push(SessionEvent::Victory);
        } else {
            self.phase = SessionPhase::Lost;
            events.push(SessionEvent::Defeat);
        }
        log::info!(
            "Level {} with {} star(s), score {}",
            if won { "won" } else { "lost" },
            self.stars,
            self.engine.score().unwrap_or(0)
        );
    }

    fn milestone_message(&mut self) -> String {
        let index = self.rng.random_range(0..MILESTONE_MESSAGES.len());
        MILESTONE_MESSAGES[index].to_string()
    }

    /// Reload the level and return to Idle with full ammunition
    pub fn retry(&mut self) -> Result<(), EngineError> {
        self.engine.load_level(&self.level)?;
        self.phase = SessionPhase::Idle;
        self.stock = self.level.stock;
        self.aim_deg = 0.0;
        self.drag_start_deg = 0.0;
        self.stars = 0;
        self.shot_timer_ms = 0.0;
        log::info!("Level reset for retry");
        Ok(())
    }

    /// Tear down the engine; later frames fail with `EngineError::Destroyed`
    pub fn destroy(&mut self) {
        self.engine.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::BrickSpec;
    use crate::sim::{BallView, BrickView};

    fn session(level: LevelData) -> LevelSession {
        LevelSession::new(
            EngineConfig::without_gravity(),
            SessionConfig::default(),
            level,
            7,
        )
        .unwrap()
    }

    fn one_brick(x: f32, y: f32, health: u32, stock: u32) -> LevelData {
        LevelData::new(vec![BrickSpec::new(x, y, health)], stock)
    }

    /// Run frames until the attempt ends, collecting every event
    fn play_out(session: &mut LevelSession, max_frames: usize) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for _ in 0..max_frames {
            let report = session.frame(16.0).unwrap();
            events.extend(report.events);
            if report.phase.is_over() {
                break;
            }
        }
        events
    }

    fn snapshot(destroyed: u32, total: u32, bricks_left: usize, balls: usize) -> FrameSnapshot {
        FrameSnapshot {
            bricks: (0..bricks_left)
                .map(|i| BrickView {
                    id: i as u32,
                    x: 0.0,
                    y: 0.0,
                    width: 40.0,
                    height: 20.0,
                    health: 1,
                })
                .collect(),
            balls: (0..balls)
                .map(|i| BallView {
                    id: i as u32,
                    x: 0,
                    y: 0,
                })
                .collect(),
            bricks_destroyed: destroyed,
            total_bricks: total,
            ..Default::default()
        }
    }

    #[test]
    fn test_countdown_then_playing() {
        let mut s = session(one_brick(30.0, 100.0, 2, 5));
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert!(s.start());
        assert!(!s.start());
        assert_eq!(s.countdown_seconds(), Some(3));

        // Huge deltas are capped per frame
        s.frame(1000.0).unwrap();
        match s.phase() {
            SessionPhase::Countdown { remaining_ms } => assert!((remaining_ms - 2968.0).abs() < 1e-9),
            other => panic!("unexpected phase {other:?}"),
        }

        for _ in 0..100 {
            s.frame(32.0).unwrap();
        }
        assert_eq!(s.phase(), SessionPhase::Playing);
        assert_eq!(s.countdown_seconds(), None);
    }

    #[test]
    fn test_aim_clamped_and_gated() {
        let mut s = session(LevelData::empty());
        assert!(!s.set_aim(30.0));
        assert_eq!(s.aim_deg(), 0.0);

        s.start();
        assert!(s.set_aim(120.0));
        assert_eq!(s.aim_deg(), 80.0);
        assert!(s.set_aim(-95.0));
        assert_eq!(s.aim_deg(), -80.0);
        assert!(!s.set_aim(f32::NAN));
        assert_eq!(s.aim_deg(), -80.0);
    }

    #[test]
    fn test_drag_maps_width_to_sensitivity() {
        let mut s = session(LevelData::empty());
        s.start();
        s.set_aim(10.0);
        s.begin_drag();
        let width = s.engine().config().field.width;

        assert!(s.drag_to(width / 4.0));
        assert!((s.aim_deg() - 50.0).abs() < 1e-4);
        s.drag_to(width);
        assert_eq!(s.aim_deg(), 80.0);
        s.drag_to(-width / 8.0);
        assert!((s.aim_deg() - -10.0).abs() < 1e-4);
    }

    #[test]
    fn test_cannon_follows_aim() {
        let mut s = session(LevelData::empty());
        s.start();
        s.set_aim(20.0);
        let muzzle = s.muzzle_position();
        let cannon = s.cannon_position();
        assert!((muzzle.x - (195.0 + 10.0)).abs() < 1e-4);
        assert!((muzzle.y - (844.0 - 80.0 + 20.0)).abs() < 1e-4);
        assert!((cannon.x - (195.0 + 6.0)).abs() < 1e-4);
        assert!((cannon.y - (844.0 - 80.0 - 30.0)).abs() < 1e-4);
    }

    #[test]
    fn test_clearing_the_level_wins() {
        let mut s = session(one_brick(195.0, 200.0, 1, 3));
        s.start();
        let events = play_out(&mut s, 600);

        assert_eq!(s.phase(), SessionPhase::Won);
        assert_eq!(s.stars(), 3);
        // Three stars at once: no milestone message
        assert_eq!(events, vec![SessionEvent::Victory]);
        assert!(s.stock() < 3);
        assert_eq!(s.engine().score(), Some(20));
    }

    #[test]
    fn test_running_out_of_balls_loses() {
        // Brick off to the side; straight shots never touch it
        let mut s = session(one_brick(30.0, 100.0, 2, 1));
        s.start();
        let events = play_out(&mut s, 600);

        assert_eq!(s.phase(), SessionPhase::Lost);
        assert_eq!(events, vec![SessionEvent::Defeat]);
        assert_eq!(s.stock(), 0);
        assert_eq!(s.stars(), 0);
    }

    #[test]
    fn test_star_milestones() {
        let mut s = session(one_brick(30.0, 100.0, 2, 5));
        s.phase = SessionPhase::Playing;

        assert!(s.evaluate(&snapshot(6, 10, 4, 1)).is_empty());

        let events = s.evaluate(&snapshot(7, 10, 3, 1));
        assert!(matches!(events.as_slice(), [SessionEvent::StarEarned { stars: 1, .. }]));

        // Same tier again: nothing new
        assert!(s.evaluate(&snapshot(8, 10, 2, 1)).is_empty());

        let events = s.evaluate(&snapshot(9, 10, 1, 1));
        assert!(matches!(events.as_slice(), [SessionEvent::StarEarned { stars: 2, .. }]));

        let events = s.evaluate(&snapshot(10, 10, 0, 1));
        assert_eq!(events, vec![SessionEvent::Victory]);
        assert_eq!(s.stars(), 3);
        assert_eq!(s.phase(), SessionPhase::Won);
    }

    #[test]
    fn test_out_of_balls_with_a_star_still_wins() {
        let mut s = session(one_brick(30.0, 100.0, 2, 5));
        s.phase = SessionPhase::Playing;
        s.stock = 0;

        // Balls still in flight: undecided
        s.evaluate(&snapshot(7, 10, 3, 2));
        assert_eq!(s.phase(), SessionPhase::Playing);

        let events = s.evaluate(&snapshot(7, 10, 3, 0));
        assert_eq!(events, vec![SessionEvent::Victory]);
        assert_eq!(s.phase(), SessionPhase::Won);
    }

    #[test]
    fn test_empty_level_wins_on_first_playing_frame() {
        let mut s = session(LevelData::empty());
        s.phase = SessionPhase::Playing;
        let report = s.frame(16.0).unwrap();
        assert_eq!(report.phase, SessionPhase::Won);
        assert_eq!(report.events, vec![SessionEvent::Victory]);
        assert_eq!(s.stars(), 0);
    }

    #[test]
    fn test_milestone_messages_follow_seed() {
        let messages = |seed| {
            let mut s = LevelSession::new(
                EngineConfig::without_gravity(),
                SessionConfig::default(),
                LevelData::empty(),
                seed,
            )
            .unwrap();
            (0..5).map(|_| s.milestone_message()).collect::<Vec<_>>()
        };
        assert_eq!(messages(42), messages(42));
        assert!(messages(42).iter().all(|m| MILESTONE_MESSAGES.contains(&m.as_str())));
    }

    #[test]
    fn test_retry_restores_attempt() {
        let mut s = session(one_brick(195.0, 200.0, 1, 3));
        s.start();
        play_out(&mut s, 600);
        assert_eq!(s.phase(), SessionPhase::Won);

        s.retry().unwrap();
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.stock(), 3);
        assert_eq!(s.stars(), 0);
        assert_eq!(s.aim_deg(), 0.0);
        assert_eq!(s.engine().brick_count(), 1);
        assert_eq!(s.engine().score(), Some(0));
    }

    #[test]
    fn test_destroyed_session_errors() {
        let mut s = session(LevelData::empty());
        s.destroy();
        assert!(matches!(s.frame(16.0), Err(EngineError::Destroyed)));
        assert!(matches!(s.retry(), Err(EngineError::Destroyed)));
    }

    #[test]
    fn test_invalid_session_config_rejected() {
        let bad_configs = [
            SessionConfig {
                max_aim_deg: -10.0,
                ..SessionConfig::default()
            },
            SessionConfig {
                frame_cap_ms: -1.0,
                ..SessionConfig::default()
            },
            SessionConfig {
                shoot_interval_ms: 0.0,
                ..SessionConfig::default()
            },
            SessionConfig {
                countdown_ms: f64::NAN,
                ..SessionConfig::default()
            },
        ];
        for config in bad_configs {
            let result = LevelSession::new(
                EngineConfig::without_gravity(),
                config.clone(),
                LevelData::empty(),
                1,
            );
            assert!(
                matches!(result, Err(EngineError::InvalidConfig(_))),
                "accepted {config:?}"
            );
        }

        let parsed: SessionConfig = serde_json::from_str(r#"{"max_aim_deg": -10}"#).unwrap();
        assert!(matches!(
            LevelSession::new(EngineConfig::default(), parsed, LevelData::empty(), 1),
            Err(EngineError::InvalidConfig(_))
        ));
    }
}
