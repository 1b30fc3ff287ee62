//! The platformer scene: consumes the input state once per frame, drives
//! the player body, owns the projectiles and the debug overlay text.
//!
//! `advance` is the single per-frame entry point and owns the ordering
//! contract around the input state's edge history: all edge queries
//! happen inside it, and it ends by rolling the history forward.

use tracing::debug;

use crate::game::body::PhysicsBody;
use crate::input::state::InputState;

/// Size of one logical pixel in world points.
pub const PIXEL_SIZE: f32 = 4.0;
/// Height of the ground strip at the bottom of the world.
pub const GROUND_HEIGHT: f32 = 50.0;
/// Player sprite extent, an 8x8 logical-pixel square.
pub const PLAYER_EXTENT: f32 = PIXEL_SIZE * 8.0;
/// Projectile sprite extent.
pub const PROJECTILE_EXTENT: f32 = PIXEL_SIZE * 2.0;

const MOVE_SPEED: f32 = 120.0;
const JUMP_FORCE: f32 = 400.0;
const PROJECTILE_SPEED: f32 = 300.0;
const PROJECTILE_LIFETIME: f32 = 3.0;
const PROJECTILE_SPAWN_GAP: f32 = 10.0;
const GROUND_CHECK_SLACK: f32 = 5.0;
const GROUND_REST_SPEED: f32 = 10.0;
// Scales the velocity error into the steering force.
const RESPONSIVENESS: f32 = 10.0;

#[derive(Debug, Clone)]
pub struct Projectile {
    pub x: f32,
    pub y: f32,
    vx: f32,
    age: f32,
}

pub struct PlatformScene {
    world_size: (f32, f32),
    projectiles: Vec<Projectile>,
    overlay_enabled: bool,
    overlay_text: String,
}

impl PlatformScene {
    pub fn new(world_size: (f32, f32), overlay_enabled: bool) -> Self {
        Self {
            world_size,
            projectiles: Vec::new(),
            overlay_enabled,
            overlay_text: String::new(),
        }
    }

    /// The presentation layer re-reports the world size every frame since
    /// the window may be resized.
    pub fn set_world_size(&mut self, world_size: (f32, f32)) {
        self.world_size = world_size;
    }

    pub fn set_overlay_enabled(&mut self, enabled: bool) {
        self.overlay_enabled = enabled;
        if !enabled {
            self.overlay_text.clear();
        }
    }

    /// Runs one simulation frame: steer the player, fire edge-triggered
    /// actions, age the projectiles, refresh the overlay, then advance
    /// the input edge history exactly once.
    pub fn advance(&mut self, input: &mut InputState, body: &mut dyn PhysicsBody, dt: f32) {
        self.handle_input(input, body);
        self.update_projectiles(dt);
        if self.overlay_enabled {
            self.update_overlay(input, body);
        }
        input.update_previous_states();
    }

    fn handle_input(&mut self, input: &InputState, body: &mut dyn PhysicsBody) {
        // Quantized movement steers toward a stepped target velocity
        // instead of applying raw analog values.
        let movement = input.pixel_perfect_movement();
        let target_vx = movement.x as f32 * MOVE_SPEED;
        let (vx, _) = body.velocity();
        let force_x = (target_vx - vx) * body.mass() * RESPONSIVENESS;
        body.apply_force(force_x, 0.0);

        if input.is_jump_just_pressed() && on_ground(body) {
            debug!("Jump impulse applied");
            body.apply_impulse(0.0, JUMP_FORCE);
        }

        if input.is_attack_just_pressed() {
            self.spawn_projectile(body);
        }
    }

    fn spawn_projectile(&mut self, body: &dyn PhysicsBody) {
        let (px, py) = body.position();
        let projectile = Projectile {
            x: px + PLAYER_EXTENT / 2.0 + PROJECTILE_SPAWN_GAP,
            y: py,
            vx: PROJECTILE_SPEED,
            age: 0.0,
        };
        debug!("Spawning projectile at ({:.1}, {:.1})", projectile.x, projectile.y);
        self.projectiles.push(projectile);
    }

    fn update_projectiles(&mut self, dt: f32) {
        let right_edge = self.world_size.0 + 50.0;
        for projectile in &mut self.projectiles {
            projectile.x += projectile.vx * dt;
            projectile.age += dt;
        }
        self.projectiles
            .retain(|p| p.age < PROJECTILE_LIFETIME && p.x <= right_edge);
    }

    fn update_overlay(&mut self, input: &InputState, body: &dyn PhysicsBody) {
        let movement = input.pixel_perfect_movement();
        let (vx, vy) = body.velocity();
        self.overlay_text = format!(
            "Input: dx={:.2}, dy={:.2}\n\
             Pixel Movement: x={}, y={}\n\
             Velocity: x={:.1}, y={:.1}\n\
             Jump: {}, Attack: {}\n\
             OnGround: {}",
            input.dx(),
            input.dy(),
            movement.x,
            movement.y,
            vx,
            vy,
            if input.jump_pressed() { "YES" } else { "NO" },
            if input.attack_pressed() { "YES" } else { "NO" },
            if on_ground(body) { "YES" } else { "NO" },
        );
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn overlay_enabled(&self) -> bool {
        self.overlay_enabled
    }

    pub fn overlay_text(&self) -> &str {
        &self.overlay_text
    }
}

/// Ground test matching the resting pose of the player body: close to
/// the ground surface and not moving vertically to speak of.
pub fn on_ground(body: &dyn PhysicsBody) -> bool {
    let ground_level = GROUND_HEIGHT + PLAYER_EXTENT / 2.0 + GROUND_CHECK_SLACK;
    let (_, y) = body.position();
    let (_, vy) = body.velocity();
    y <= ground_level && vy.abs() < GROUND_REST_SPEED
}
