//! Pipe pairs: a bottom pipe and a flipped top pipe around a gap

use glam::Vec2;
use rand::Rng;

use super::state::GamePhase;
use crate::consts::*;
use crate::renderer::{Renderer, SharedSprite, Sprite, SpriteInstance, Texture};

const PIPE_Z: i32 = 1;

pub struct Pipe {
    top: SharedSprite,
    bottom: SharedSprite,
    x: f32,
    /// Bottom edge of the gap
    gap_y: f32,
    passed: bool,
}

impl Pipe {
    pub fn new<R: Rng>(renderer: &mut Renderer, texture: Texture, x: f32, rng: &mut R) -> Self {
        let make = |rotation: f32| {
            let mut inst = SpriteInstance::new(Sprite::whole(texture))
                .with_scale(PIPE_WIDTH, PIPE_HEIGHT)
                .with_z(PIPE_Z);
            inst.rotation = rotation;
            inst.shared()
        };
        let top = make(std::f32::consts::PI);
        renderer.add(&top);
        let bottom = make(0.0);
        renderer.add(&bottom);

        let mut pipe = Self {
            top,
            bottom,
            x,
            gap_y: 0.0,
            passed: false,
        };
        pipe.reset(rng);
        pipe.sync_sprites();
        pipe
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn gap_y(&self) -> f32 {
        self.gap_y
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn set_x(&mut self, x: f32) {
        self.x = x;
        self.sync_sprites();
    }

    /// New random gap height; the pipe can score again
    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        self.gap_y = rng.random_range(PIPE_MIN_Y..PIPE_MAX_Y);
        self.passed = false;
    }

    /// Wrap, scroll and score. Returns true when the player just passed
    /// this pipe.
    pub fn update<R: Rng>(
        &mut self,
        dt: f32,
        phase: GamePhase,
        player_x: f32,
        pipe_count: usize,
        rng: &mut R,
    ) -> bool {
        // Wrap is checked on the position before this tick's move
        if self.x <= -0.5 * WIDTH - PIPE_WIDTH {
            self.x += pipe_count as f32 * PIPE_SPACING;
            self.reset(rng);
        }
        if phase == GamePhase::Playing {
            self.x -= SCROLL_SPEED * dt;
        }

        let scored = !self.passed && player_x > self.x;
        if scored {
            self.passed = true;
        }
        self.sync_sprites();
        scored
    }

    fn sync_sprites(&mut self) {
        self.top.borrow_mut().position =
            Vec2::new(self.x, self.gap_y + PIPE_HEIGHT / 2.0 + PIPE_GAP);
        self.bottom.borrow_mut().position = Vec2::new(self.x, self.gap_y - PIPE_HEIGHT / 2.0);
    }

    #[cfg(test)]
    pub(crate) fn set_gap(&mut self, gap_y: f32) {
        self.gap_y = gap_y;
        self.sync_sprites();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::TextureId;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn pipe_at(renderer: &mut Renderer, rng: &mut Pcg32, x: f32) -> Pipe {
        Pipe::new(renderer, Texture::new(TextureId(1), 52, 320), x, rng)
    }

    #[test]
    fn test_sprites_bracket_the_gap() {
        let mut renderer = Renderer::new(16);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut pipe = pipe_at(&mut renderer, &mut rng, 100.0);
        pipe.set_gap(-20.0);

        let top = pipe.top.borrow();
        let bottom = pipe.bottom.borrow();
        // Bottom pipe's top edge and top pipe's bottom edge are GAP apart
        assert_eq!(bottom.position.y + PIPE_HEIGHT / 2.0, -20.0);
        assert_eq!(top.position.y - PIPE_HEIGHT / 2.0, -20.0 + PIPE_GAP);
        assert_eq!(top.rotation, std::f32::consts::PI);
        assert_eq!(renderer.sprite_count(), 2);
    }

    #[test]
    fn test_scrolls_only_while_playing() {
        let mut renderer = Renderer::new(16);
        let mut rng = Pcg32::seed_from_u64(2);
        let mut pipe = pipe_at(&mut renderer, &mut rng, 200.0);

        pipe.update(1.0, GamePhase::Ready, -80.0, 3, &mut rng);
        assert_eq!(pipe.x(), 200.0);
        pipe.update(1.0, GamePhase::GameOver, -80.0, 3, &mut rng);
        assert_eq!(pipe.x(), 200.0);
        pipe.update(1.0, GamePhase::Playing, -80.0, 3, &mut rng);
        assert_eq!(pipe.x(), 50.0);
    }

    #[test]
    fn test_wrap_moves_by_row_length_with_fresh_gap() {
        let mut renderer = Renderer::new(16);
        let mut rng = Pcg32::seed_from_u64(3);
        let mut pipe = pipe_at(&mut renderer, &mut rng, 0.0);

        // Scroll until past the left edge, scoring on the way
        let mut steps = 0;
        while pipe.x() > -0.5 * WIDTH - PIPE_WIDTH {
            pipe.update(SIM_DT, GamePhase::Playing, -80.0, 3, &mut rng);
            steps += 1;
        }
        assert!(pipe.passed());
        let before = pipe.x();
        assert!(steps > 0);

        // Next tick wraps first, then moves
        pipe.update(SIM_DT, GamePhase::Playing, -80.0, 3, &mut rng);
        let expected = before + 3.0 * PIPE_SPACING - SCROLL_SPEED * SIM_DT;
        assert!((pipe.x() - expected).abs() < 1e-3);
        assert!(!pipe.passed());
        assert!((PIPE_MIN_Y..PIPE_MAX_Y).contains(&pipe.gap_y()));
    }

    #[test]
    fn test_scores_once_per_pass() {
        let mut renderer = Renderer::new(16);
        let mut rng = Pcg32::seed_from_u64(4);
        let mut pipe = pipe_at(&mut renderer, &mut rng, -70.0);

        assert!(!pipe.update(SIM_DT, GamePhase::Playing, -80.0, 3, &mut rng));
        let mut scored = 0;
        for _ in 0..60 {
            if pipe.update(SIM_DT, GamePhase::Playing, -80.0, 3, &mut rng) {
                scored += 1;
            }
        }
        assert_eq!(scored, 1);
    }
}
