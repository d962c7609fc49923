//! Simulation module
//!
//! Everything that decides what happens on the field lives here:
//! - Rigid-body world with continuous collision for fast balls
//! - Sub-stepped frames with a clamped delta
//! - Contact de-duplication per (ball, brick) pair
//! - Scoring, explosions and feedback cues
//! - One immutable snapshot per frame for the presentation layer
//!
//! Iteration order is always by entity id so identical inputs replay identically.

pub mod collision;
pub mod engine;
pub mod rules;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod world;

pub use collision::{BrickContact, ContactDeduper};
pub use engine::Engine;
pub use rules::{ContactOutcome, GameplayRules};
pub use snapshot::{BallView, BrickView, FrameSnapshot, Publisher, SubscriptionId};
pub use state::{
    Ball, BodyTag, Brick, Explosion, FrameEvents, HapticIntensity, Scoreboard, Wall, WallSide,
};
pub use tick::{StepSchedule, Stepper, TickInput, TickReport};
pub use world::PhysicsWorld;
