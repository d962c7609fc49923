//! Frame snapshots and subscriber fan-out
//!
//! One immutable snapshot is built per tick. Serialized field names are
//! camelCase and stable so renderers can diff ball/brick lists by id.

use serde::{Deserialize, Serialize};

use super::state::{Explosion, FrameEvents, HapticIntensity, Scoreboard};
use super::world::PhysicsWorld;

/// Live ball position, rounded to whole units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallView {
    pub id: u32,
    pub x: i32,
    pub y: i32,
}

/// Live brick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickView {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub health: u32,
}

/// Everything a presentation layer needs for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    pub balls: Vec<BallView>,
    pub bricks: Vec<BrickView>,
    pub score: u64,
    /// Explosions since the previous snapshot
    pub explosions: Vec<Explosion>,
    pub bricks_destroyed: u32,
    pub total_bricks: u32,
    /// Sound cue names since the previous snapshot
    pub sound_events: Vec<String>,
    /// Haptic cues since the previous snapshot
    pub haptic_events: Vec<HapticIntensity>,
}

impl FrameSnapshot {
    /// Build from the world state and the events drained for this frame
    pub fn capture(world: &PhysicsWorld, scoreboard: &Scoreboard, events: FrameEvents) -> Self {
        let balls = world
            .balls()
            .iter()
            .filter_map(|ball| {
                world.ball_position(ball).map(|pos| BallView {
                    id: ball.id,
                    x: pos.x.round() as i32,
                    y: pos.y.round() as i32,
                })
            })
            .collect();

        let bricks = world
            .bricks()
            .iter()
            .map(|brick| BrickView {
                id: brick.id,
                x: brick.pos.x,
                y: brick.pos.y,
                width: brick.width,
                height: brick.height,
                health: brick.health,
            })
            .collect();

        Self {
            balls,
            bricks,
            score: scoreboard.score,
            explosions: events.explosions,
            bricks_destroyed: scoreboard.bricks_destroyed,
            total_bricks: scoreboard.total_bricks,
            sound_events: events.sounds,
            haptic_events: events.haptics,
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Snapshot listener
pub type Listener = Box<dyn FnMut(&FrameSnapshot)>;

/// Ordered listener registry
#[derive(Default)]
pub struct Publisher {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl Publisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&FrameSnapshot) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the handle was unknown (already removed or cleared)
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Invoke every listener, in registration order, with the same snapshot
    pub fn publish(&mut self, snapshot: &FrameSnapshot) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(snapshot);
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_publish_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut publisher = Publisher::new();

        for tag in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            publisher.subscribe(move |snap: &FrameSnapshot| {
                log.borrow_mut().push((tag, snap.score));
            });
        }

        let snapshot = FrameSnapshot {
            score: 42,
            ..Default::default()
        };
        publisher.publish(&snapshot);
        assert_eq!(*log.borrow(), vec![("a", 42), ("b", 42), ("c", 42)]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut publisher = Publisher::new();
        let c = Rc::clone(&count);
        let id = publisher.subscribe(move |_| *c.borrow_mut() += 1);

        publisher.publish(&FrameSnapshot::default());
        assert!(publisher.unsubscribe(id));
        assert!(!publisher.unsubscribe(id));
        publisher.publish(&FrameSnapshot::default());
        assert_eq!(*count.borrow(), 1);

        // Unsubscribing after clear is harmless
        let id = publisher.subscribe(|_| {});
        publisher.clear();
        assert!(!publisher.unsubscribe(id));
        assert!(publisher.is_empty());
    }

    #[test]
    fn test_snapshot_wire_names() {
        let snapshot = FrameSnapshot {
            balls: vec![BallView { id: 1, x: 10, y: 20 }],
            total_bricks: 3,
            haptic_events: vec![HapticIntensity::Light],
            ..Default::default()
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["totalBricks"], 3);
        assert_eq!(json["bricksDestroyed"], 0);
        assert_eq!(json["hapticEvents"][0], "light");
        assert!(json["soundEvents"].as_array().unwrap().is_empty());
        assert_eq!(json["balls"][0]["x"], 10);
    }
}
