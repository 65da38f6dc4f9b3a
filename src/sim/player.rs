//! The bird: gravity, flapping, tilt and collision against pipe pairs

use glam::Vec2;

use super::pipe::Pipe;
use super::state::GamePhase;
use crate::consts::*;
use crate::renderer::{
    Animation, Renderer, SharedSprite, Sprite, SpriteInstance, Spritesheet, Texture,
};

const PLAYER_Z: i32 = 2;
/// Cell size in the player sheet
const FRAME_W: u32 = 34;
const FRAME_H: u32 = 24;
const FLAP_FRAMES: usize = 3;
/// Hitbox shrink factor applied to both player and pipe extents
const HITBOX: f32 = 0.45;

pub struct Player {
    sprite: SharedSprite,
    anim: Animation,
    /// Downward speed; negative while rising
    vy: f32,
}

impl Player {
    pub fn new(renderer: &mut Renderer, texture: Texture) -> Self {
        let sheet = Spritesheet::new(texture, FRAME_W, FRAME_H);
        let frames: Vec<_> = (0..FLAP_FRAMES).filter_map(|row| sheet.sprite(0, row)).collect();
        if frames.len() < FLAP_FRAMES {
            log::warn!("Player sheet has {} of {FLAP_FRAMES} flap frames", frames.len());
        }
        let first = frames.first().copied().unwrap_or_else(|| Sprite::whole(texture));
        let sprite = SpriteInstance::new(first)
            .with_scale(PLAYER_WIDTH, PLAYER_HEIGHT)
            .with_z(PLAYER_Z)
            .shared();
        renderer.add(&sprite);

        let mut player = Self {
            sprite,
            anim: Animation::new(FLAP_FRAME_MS, frames),
            vy: 0.0,
        };
        player.reset();
        player
    }

    /// Back to the start position, level and at rest
    pub fn reset(&mut self) {
        let (x, y) = PLAYER_START;
        let mut sprite = self.sprite.borrow_mut();
        sprite.position = Vec2::new(x, y);
        sprite.rotation = 0.0;
        self.vy = 0.0;
    }

    pub fn position(&self) -> Vec2 {
        self.sprite.borrow().position
    }

    pub fn x(&self) -> f32 {
        self.position().x
    }

    pub fn y(&self) -> f32 {
        self.position().y
    }

    pub fn rotation(&self) -> f32 {
        self.sprite.borrow().rotation
    }

    pub fn velocity(&self) -> f32 {
        self.vy
    }

    /// Gravity while playing or dying; held still while ready
    pub fn apply_gravity(&mut self, phase: GamePhase, dt: f32) {
        match phase {
            GamePhase::Playing | GamePhase::GameOver => self.vy += GRAVITY * dt,
            GamePhase::Ready => self.vy = 0.0,
        }
        self.vy = self.vy.min(MAX_FALL_SPEED);
    }

    pub fn flap(&mut self) {
        self.vy = -FLAP_IMPULSE;
    }

    /// Move by the current velocity. Returns true if the floor was reached.
    pub fn integrate(&mut self, dt: f32) -> bool {
        let mut sprite = self.sprite.borrow_mut();
        sprite.position.y -= self.vy * dt;
        if sprite.position.y < PLAYER_FLOOR_Y {
            sprite.position.y = PLAYER_FLOOR_Y;
            return true;
        }
        false
    }

    pub fn collides(&self, pipe: &Pipe) -> bool {
        let pos = self.position();
        (pos.x - pipe.x()).abs() < (PLAYER_WIDTH + PIPE_WIDTH) * HITBOX
            && (pos.y - PLAYER_HEIGHT * HITBOX < pipe.gap_y()
                || pos.y + PLAYER_HEIGHT * HITBOX > pipe.gap_y() + PIPE_GAP)
    }

    /// Nose up while rising, dive once falling fast, level while ready
    pub fn update_rotation(&mut self, phase: GamePhase, dt: f32) {
        let mut sprite = self.sprite.borrow_mut();
        match phase {
            GamePhase::Playing | GamePhase::GameOver => {
                if self.vy < MAX_FALL_SPEED * 0.7 {
                    sprite.rotation = PLAYER_MAX_ANGLE;
                } else {
                    sprite.rotation = (sprite.rotation - PLAYER_DIVE_RATE * dt).max(PLAYER_MIN_ANGLE);
                }
            }
            GamePhase::Ready => sprite.rotation = 0.0,
        }
    }

    pub fn animate(&mut self, clock_ms: f64) {
        if let Some(frame) = self.anim.frame(clock_ms) {
            self.sprite.borrow_mut().sprite = *frame;
        }
    }

    #[cfg(test)]
    pub(crate) fn set_position(&mut self, x: f32, y: f32) {
        self.sprite.borrow_mut().position = Vec2::new(x, y);
    }
}
