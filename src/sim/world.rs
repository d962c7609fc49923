//! Physics world
//!
//! Owns the rapier sets and the game-side registry of balls, bricks and
//! walls. All body creation and removal goes through here so the collider
//! lookup table never drifts from the solver's contents.

use std::collections::HashMap;

use glam::Vec2;
use rapier2d::crossbeam::channel::{Receiver, unbounded};
use rapier2d::prelude::*;

use super::collision::{BrickContact, ball_groups, brick_groups, classify, wall_groups};
use super::state::{Ball, BodyTag, Brick, Wall, WallSide};
use crate::config::EngineConfig;
use crate::level::BrickSpec;

#[inline]
fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

#[inline]
fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// rapier simulation state plus the entity registry
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    event_collector: ChannelEventCollector,
    collision_recv: Receiver<CollisionEvent>,
    /// Collider -> owning entity, for translating solver events
    tags: HashMap<ColliderHandle, BodyTag>,
    /// Live balls (sorted by id)
    balls: Vec<Ball>,
    /// Live bricks (sorted by id)
    bricks: Vec<Brick>,
    walls: Vec<Wall>,
}

impl PhysicsWorld {
    /// Create a world with gravity and the three boundary walls
    pub fn new(config: &EngineConfig) -> Self {
        let (collision_send, collision_recv) = unbounded::<CollisionEvent>();
        let (force_send, _force_recv) = unbounded::<ContactForceEvent>();

        let mut integration_params = IntegrationParameters::default();
        integration_params.length_unit = config.stepping.length_unit;

        let mut world = Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![config.gravity.x, config.gravity.y],
            integration_params,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            event_collector: ChannelEventCollector::new(collision_send, force_send),
            collision_recv,
            tags: HashMap::new(),
            balls: Vec::new(),
            bricks: Vec::new(),
            walls: Vec::new(),
        };
        world.create_walls(config);
        world
    }

    /// Left, right and top walls sit just outside the field; the bottom is open
    fn create_walls(&mut self, config: &EngineConfig) {
        let w = config.field.width;
        let h = config.field.height;
        let t = config.wall.thickness;

        let layout = [
            (WallSide::Left, Vec2::new(-t / 2.0, h / 2.0), Vec2::new(t / 2.0, h / 2.0)),
            (WallSide::Right, Vec2::new(w + t / 2.0, h / 2.0), Vec2::new(t / 2.0, h / 2.0)),
            (WallSide::Top, Vec2::new(w / 2.0, -t / 2.0), Vec2::new(w / 2.0, t / 2.0)),
        ];

        for (side, center, half_extents) in layout {
            let body = self
                .bodies
                .insert(RigidBodyBuilder::fixed().translation(to_vector(center)).build());
            let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y)
                .restitution(config.wall.restitution)
                .friction(config.wall.friction)
                .collision_groups(wall_groups())
                .build();
            let collider = self
                .colliders
                .insert_with_parent(collider, body, &mut self.bodies);
            self.tags.insert(collider, BodyTag::Wall(side));
            self.walls.push(Wall {
                side,
                center,
                half_extents,
            });
        }
    }

    /// Add a static brick body
    pub fn add_brick(&mut self, id: u32, spec: &BrickSpec) -> &Brick {
        let pos = Vec2::new(spec.x, spec.y);
        let health = spec.spawn_health();
        let body = self
            .bodies
            .insert(RigidBodyBuilder::fixed().translation(to_vector(pos)).build());
        let collider = ColliderBuilder::cuboid(spec.width / 2.0, spec.height / 2.0)
            .restitution(spec.restitution)
            .friction(spec.friction)
            .collision_groups(brick_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);
        self.tags.insert(collider, BodyTag::Brick(id));

        let index = self.bricks.partition_point(|b| b.id < id);
        self.bricks.insert(
            index,
            Brick {
                id,
                pos,
                width: spec.width,
                height: spec.height,
                health,
                initial_health: health,
                body,
                collider,
            },
        );
        &self.bricks[index]
    }

    /// Spawn a dynamic ball with CCD enabled
    pub fn spawn_ball(&mut self, id: u32, pos: Vec2, vel: Vec2, config: &EngineConfig) -> &Ball {
        let ball_cfg = &config.ball;
        let body = self.bodies.insert(
            RigidBodyBuilder::dynamic()
                .translation(to_vector(pos))
                .linvel(to_vector(vel))
                .linear_damping(ball_cfg.linear_damping)
                .ccd_enabled(true)
                .build(),
        );
        let collider = ColliderBuilder::ball(ball_cfg.radius)
            .restitution(ball_cfg.restitution)
            .friction(ball_cfg.friction)
            .density(ball_cfg.density)
            .collision_groups(ball_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);
        self.tags.insert(collider, BodyTag::Ball(id));

        let index = self.balls.partition_point(|b| b.id < id);
        self.balls.insert(
            index,
            Ball {
                id,
                radius: ball_cfg.radius,
                body,
                collider,
            },
        );
        &self.balls[index]
    }

    fn remove_body(&mut self, body: RigidBodyHandle, collider: ColliderHandle) {
        self.tags.remove(&collider);
        self.bodies.remove(
            body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Remove a brick from the registry and the solver
    pub fn remove_brick(&mut self, id: u32) -> Option<Brick> {
        let index = self.bricks.iter().position(|b| b.id == id)?;
        let brick = self.bricks.remove(index);
        self.remove_body(brick.body, brick.collider);
        Some(brick)
    }

    /// Remove a ball from the registry and the solver
    pub fn remove_ball(&mut self, id: u32) -> Option<Ball> {
        let index = self.balls.iter().position(|b| b.id == id)?;
        let ball = self.balls.remove(index);
        self.remove_body(ball.body, ball.collider);
        Some(ball)
    }

    pub fn clear_bricks(&mut self) {
        let ids: Vec<u32> = self.bricks.iter().map(|b| b.id).collect();
        for id in ids {
            self.remove_brick(id);
        }
    }

    pub fn clear_balls(&mut self) {
        let ids: Vec<u32> = self.balls.iter().map(|b| b.id).collect();
        for id in ids {
            self.remove_ball(id);
        }
    }

    /// Advance the solver by `dt` seconds and return the ball-brick contacts
    /// that began during the step, ordered by (ball id, brick id)
    pub fn step(&mut self, dt: f32) -> Vec<BrickContact> {
        self.integration_params.dt = dt;

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &self.event_collector,
        );

        let mut contacts = Vec::new();
        while let Ok(event) = self.collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _flags) = event {
                let (Some(&a), Some(&b)) = (self.tags.get(&h1), self.tags.get(&h2)) else {
                    continue;
                };
                if let Some(contact) = classify(a, b) {
                    contacts.push(contact);
                }
            }
        }
        contacts.sort();
        contacts
    }

    pub fn ball_position(&self, ball: &Ball) -> Option<Vec2> {
        self.bodies
            .get(ball.body)
            .map(|rb| from_vector(rb.translation()))
    }

    pub fn ball_velocity(&self, ball: &Ball) -> Option<Vec2> {
        self.bodies.get(ball.body).map(|rb| from_vector(rb.linvel()))
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    pub fn brick_mut(&mut self, id: u32) -> Option<&mut Brick> {
        self.bricks.iter_mut().find(|b| b.id == id)
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    /// Number of rigid bodies held by the solver (walls included)
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}
