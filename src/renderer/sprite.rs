//! Sprites, spritesheets, sprite instances and frame animations

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use super::texture::Texture;

/// A rectangular region of a texture (or a solid fill when untextured).
///
/// UVs are listed top-left, top-right, bottom-right, bottom-left, matching
/// the corner order the batch emits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    texture: Option<Texture>,
    uvs: [Vec2; 4],
}

const FULL_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

impl Sprite {
    /// The whole texture
    pub fn whole(texture: Texture) -> Self {
        Self {
            texture: Some(texture),
            uvs: FULL_UVS,
        }
    }

    /// A pixel rectangle of the texture, origin at its top-left corner
    pub fn region(texture: Texture, x: u32, y: u32, w: u32, h: u32) -> Self {
        let tw = texture.width() as f32;
        let th = texture.height() as f32;
        let (u0, v0) = (x as f32 / tw, y as f32 / th);
        let (u1, v1) = ((x + w) as f32 / tw, (y + h) as f32 / th);
        Self {
            texture: Some(texture),
            uvs: [
                Vec2::new(u0, v0),
                Vec2::new(u1, v0),
                Vec2::new(u1, v1),
                Vec2::new(u0, v1),
            ],
        }
    }

    /// Untextured quad, drawn with the instance tint only
    pub fn solid() -> Self {
        Self {
            texture: None,
            uvs: FULL_UVS,
        }
    }

    pub fn texture(&self) -> Option<Texture> {
        self.texture
    }

    pub fn uvs(&self) -> &[Vec2; 4] {
        &self.uvs
    }
}

/// A texture cut into a grid of equally sized sprites
#[derive(Debug, Clone)]
pub struct Spritesheet {
    columns: usize,
    sprites: Vec<Sprite>,
}

impl Spritesheet {
    pub fn new(texture: Texture, cell_w: u32, cell_h: u32) -> Self {
        let columns = (texture.width() / cell_w.max(1)) as usize;
        let rows = (texture.height() / cell_h.max(1)) as usize;
        let mut sprites = Vec::with_capacity(columns * rows);
        for row in 0..rows as u32 {
            for col in 0..columns as u32 {
                sprites.push(Sprite::region(
                    texture,
                    col * cell_w,
                    row * cell_h,
                    cell_w,
                    cell_h,
                ));
            }
        }
        Self { columns, sprites }
    }

    pub fn sprite(&self, col: usize, row: usize) -> Option<Sprite> {
        if col >= self.columns {
            return None;
        }
        self.sprites.get(row * self.columns + col).copied()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        if self.columns == 0 {
            0
        } else {
            self.sprites.len() / self.columns
        }
    }
}

/// A placed, tinted occurrence of a sprite in the world
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteInstance {
    pub sprite: Sprite,
    pub position: Vec2,
    /// Radians, counter-clockwise
    pub rotation: f32,
    pub scale: Vec2,
    pub color: [f32; 4],
    /// Render layer; lower draws first
    pub z_index: i32,
}

/// Instances are shared between the owning entity and the batch that draws
/// them. Identity (`Rc::ptr_eq`) is what the renderer removes by.
pub type SharedSprite = Rc<RefCell<SpriteInstance>>;

impl SpriteInstance {
    pub fn new(sprite: Sprite) -> Self {
        Self {
            sprite,
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            color: [1.0; 4],
            z_index: 0,
        }
    }

    pub fn with_z(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_scale(mut self, w: f32, h: f32) -> Self {
        self.scale = Vec2::new(w, h);
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn shared(self) -> SharedSprite {
        Rc::new(RefCell::new(self))
    }

    pub fn texture(&self) -> Option<Texture> {
        self.sprite.texture()
    }

    pub fn set_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.color = [r, g, b, a];
    }
}

/// Looping frame animation driven by a monotonic clock
#[derive(Debug, Clone)]
pub struct Animation {
    frames: Vec<Sprite>,
    frame_ms: f64,
}

impl Animation {
    pub fn new(frame_ms: f64, frames: Vec<Sprite>) -> Self {
        Self { frames, frame_ms }
    }

    pub fn total_ms(&self) -> f64 {
        self.frames.len() as f64 * self.frame_ms
    }

    /// `floor((t mod total) / frame_ms)`
    pub fn frame_index(&self, time_ms: f64) -> usize {
        let total = self.total_ms();
        if total <= 0.0 {
            return 0;
        }
        let idx = (time_ms.rem_euclid(total) / self.frame_ms).floor() as usize;
        idx.min(self.frames.len() - 1)
    }

    pub fn frame(&self, time_ms: f64) -> Option<&Sprite> {
        self.frames.get(self.frame_index(time_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::texture::TextureId;

    fn sheet_texture() -> Texture {
        Texture::new(TextureId(1), 48, 72)
    }

    #[test]
    fn test_region_uvs() {
        let sprite = Sprite::region(sheet_texture(), 24, 36, 24, 36);
        let uvs = sprite.uvs();
        assert_eq!(uvs[0], Vec2::new(0.5, 0.5));
        assert_eq!(uvs[2], Vec2::new(1.0, 1.0));
        assert_eq!(uvs[3], Vec2::new(0.5, 1.0));
    }

    #[test]
    fn test_spritesheet_grid() {
        let sheet = Spritesheet::new(sheet_texture(), 24, 36);
        assert_eq!(sheet.columns(), 2);
        assert_eq!(sheet.rows(), 2);
        let s = sheet.sprite(1, 0).unwrap();
        assert_eq!(s.uvs()[0], Vec2::new(0.5, 0.0));
        assert!(sheet.sprite(2, 0).is_none());
        assert!(sheet.sprite(0, 2).is_none());
    }

    #[test]
    fn test_solid_sprite_has_no_texture() {
        assert!(Sprite::solid().texture().is_none());
        let inst = SpriteInstance::new(Sprite::solid());
        assert_eq!(inst.color, [1.0; 4]);
        assert_eq!(inst.scale, Vec2::ONE);
    }

    #[test]
    fn test_animation_frame_lookup() {
        let sheet = Spritesheet::new(sheet_texture(), 24, 24);
        let frames: Vec<Sprite> = (0..3).map(|row| sheet.sprite(0, row).unwrap()).collect();
        let anim = Animation::new(80.0, frames.clone());

        assert_eq!(anim.frame_index(0.0), 0);
        assert_eq!(anim.frame_index(79.9), 0);
        assert_eq!(anim.frame_index(80.0), 1);
        assert_eq!(anim.frame_index(239.0), 2);
        // Wraps after 240ms
        assert_eq!(anim.frame_index(240.0), 0);
        assert_eq!(anim.frame(1000.0), Some(&frames[(1000.0_f64 % 240.0 / 80.0) as usize]));
    }
}
