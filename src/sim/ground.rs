//! Two scrolling ground tiles laid side by side

use super::state::GamePhase;
use crate::consts::{GROUND_HEIGHT, GROUND_OFFSET, HEIGHT, SCROLL_SPEED, WIDTH};
use crate::renderer::{Renderer, SharedSprite, Sprite, SpriteInstance, Texture};

const GROUND_Z: i32 = 2;
const TILES: usize = 2;

pub struct Ground {
    tiles: Vec<SharedSprite>,
}

impl Ground {
    pub fn new(renderer: &mut Renderer, texture: Texture) -> Self {
        let y = HEIGHT * -0.5 + GROUND_OFFSET;
        let tiles = (0..TILES)
            .map(|i| {
                let tile = SpriteInstance::new(Sprite::whole(texture))
                    .with_scale(WIDTH, GROUND_HEIGHT)
                    .with_position(i as f32 * WIDTH, y)
                    .with_z(GROUND_Z)
                    .shared();
                renderer.add(&tile);
                tile
            })
            .collect();
        Self { tiles }
    }

    /// Leftmost tile x
    pub fn offset(&self) -> f32 {
        self.tiles[0].borrow().position.x
    }

    /// Scrolls in every phase but game over
    pub fn update(&mut self, dt: f32, phase: GamePhase) {
        if phase == GamePhase::GameOver {
            return;
        }
        let wrap = self.offset() <= -WIDTH;
        for tile in &self.tiles {
            let mut tile = tile.borrow_mut();
            if wrap {
                tile.position.x += WIDTH;
            }
            tile.position.x -= SCROLL_SPEED * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::TextureId;

    #[test]
    fn test_ground_scrolls_and_wraps() {
        let mut renderer = Renderer::new(16);
        let mut ground = Ground::new(&mut renderer, Texture::new(TextureId(1), 336, 112));
        assert_eq!(renderer.sprite_count(), 2);

        ground.update(1.0, GamePhase::Ready);
        assert_eq!(ground.offset(), -150.0);
        ground.update(1.0, GamePhase::GameOver);
        assert_eq!(ground.offset(), -150.0);

        // -150 -> -300 -> -450 (past -WIDTH) -> wrap then move
        ground.update(1.0, GamePhase::Playing);
        ground.update(1.0, GamePhase::Playing);
        assert_eq!(ground.offset(), -450.0);
        ground.update(1.0, GamePhase::Playing);
        assert_eq!(ground.offset(), -450.0 + WIDTH - 150.0);
        // Tiles stay adjacent
        assert_eq!(ground.tiles[1].borrow().position.x - ground.offset(), WIDTH);
    }
}
