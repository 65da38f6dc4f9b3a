//! On-screen score built from digit sprites

use glam::Vec2;

use crate::consts::{DAY_NIGHT_EVERY, DIGIT_HEIGHT, DIGIT_WIDTH, SCORE_DIGITS, SCORE_POS};
use crate::renderer::{Renderer, SharedSprite, Sprite, SpriteInstance, Spritesheet, Texture};

const SCORE_Z: i32 = 3;

pub struct Score {
    sheet: Spritesheet,
    digits: Vec<SharedSprite>,
    /// Digit sprites currently in the renderer
    active: usize,
    value: u32,
}

impl Score {
    pub fn new(renderer: &mut Renderer, texture: Texture) -> Self {
        let sheet = Spritesheet::new(texture, DIGIT_WIDTH as u32, DIGIT_HEIGHT as u32);
        let blank = sheet.sprite(0, 0).unwrap_or_else(|| Sprite::whole(texture));
        let digits = (0..SCORE_DIGITS)
            .map(|_| {
                SpriteInstance::new(blank)
                    .with_scale(DIGIT_WIDTH, DIGIT_HEIGHT)
                    .with_z(SCORE_Z)
                    .shared()
            })
            .collect();

        let mut score = Self {
            sheet,
            digits,
            active: 0,
            value: 0,
        };
        score.set(renderer, 0);
        score
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn visible_digits(&self) -> usize {
        self.active
    }

    /// Add a point. Returns true when the background should change.
    pub fn inc(&mut self, renderer: &mut Renderer) -> bool {
        self.set(renderer, self.value + 1);
        self.value % DAY_NIGHT_EVERY == 0
    }

    /// Show `value`, centred on the score position
    pub fn set(&mut self, renderer: &mut Renderer, value: u32) {
        self.value = value;
        let text = value.to_string();
        let len = text.len();
        let shown = len.min(self.digits.len());
        let (cx, cy) = SCORE_POS;
        let half = DIGIT_WIDTH / 2.0;

        for (i, sprite) in self.digits.iter().enumerate() {
            if i < shown {
                let digit = text.as_bytes()[i] - b'0';
                {
                    let mut inst = sprite.borrow_mut();
                    if let Some(glyph) = self.sheet.sprite(digit as usize, 0) {
                        inst.sprite = glyph;
                    }
                    inst.position = Vec2::new(
                        cx - len as f32 * half + i as f32 * DIGIT_WIDTH + half,
                        cy,
                    );
                }
                if i >= self.active {
                    renderer.add(sprite);
                }
            } else if i < self.active {
                renderer.remove(sprite);
            }
        }
        self.active = shown;
    }
}
