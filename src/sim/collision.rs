//! Collision filtering and contact de-duplication
//!
//! The rigid-body solver does the geometry. This module decides which bodies
//! may touch, turns solver events into ball-brick contacts, and makes sure one
//! physical contact is only counted once even when the solver reports the pair
//! again a few milliseconds later.

use std::collections::HashMap;

use rapier2d::prelude::{Group, InteractionGroups};

use super::state::BodyTag;

/// Collision category bits (mutually exclusive)
pub const CATEGORY_BALL: Group = Group::GROUP_1;
pub const CATEGORY_BRICK: Group = Group::GROUP_2;
pub const CATEGORY_WALL: Group = Group::GROUP_3;

/// Balls hit everything
pub fn ball_groups() -> InteractionGroups {
    InteractionGroups::new(CATEGORY_BALL, CATEGORY_BALL | CATEGORY_BRICK | CATEGORY_WALL)
}

/// Bricks only ever touch balls
pub fn brick_groups() -> InteractionGroups {
    InteractionGroups::new(CATEGORY_BRICK, CATEGORY_BALL)
}

/// Walls only ever touch balls
pub fn wall_groups() -> InteractionGroups {
    InteractionGroups::new(CATEGORY_WALL, CATEGORY_BALL)
}

/// A ball touching a brick; also the de-duplication key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BrickContact {
    pub ball_id: u32,
    pub brick_id: u32,
}

/// Reduce a solver contact to a ball-brick contact (in either order)
pub fn classify(a: BodyTag, b: BodyTag) -> Option<BrickContact> {
    match (a, b) {
        (BodyTag::Ball(ball_id), BodyTag::Brick(brick_id))
        | (BodyTag::Brick(brick_id), BodyTag::Ball(ball_id)) => {
            Some(BrickContact { ball_id, brick_id })
        }
        _ => None,
    }
}

/// Time-windowed set of recently counted contacts
#[derive(Debug, Clone)]
pub struct ContactDeduper {
    window_ms: f64,
    /// Contact -> time (ms) at which it may be counted again
    expiry: HashMap<BrickContact, f64>,
}

impl ContactDeduper {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms: window_ms.max(0.0),
            expiry: HashMap::new(),
        }
    }

    /// Forget contacts whose window has elapsed
    pub fn expire(&mut self, now_ms: f64) {
        self.expiry.retain(|_, until| *until > now_ms);
    }

    /// Returns true if the contact should be counted, recording it if so
    pub fn admit(&mut self, contact: BrickContact, now_ms: f64) -> bool {
        self.expire(now_ms);
        if self.expiry.contains_key(&contact) {
            log::debug!(
                "Suppressed repeat contact ball {} / brick {}",
                contact.ball_id,
                contact.brick_id
            );
            return false;
        }
        self.expiry.insert(contact, now_ms + self.window_ms);
        true
    }

    pub fn clear(&mut self) {
        self.expiry.clear();
    }

    pub fn len(&self) -> usize {
        self.expiry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiry.is_empty()
    }
}
