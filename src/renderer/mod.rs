//! Batched sprite rendering on WebGPU
//!
//! Everything except [`gpu`] and the `prepare`/`draw` halves of the batch is
//! CPU-side and works with plain [`Texture`] handles, so batching can be
//! exercised without a device.

pub mod batch;
pub mod camera;
pub mod gpu;
pub mod shader;
pub mod sprite;
pub mod sprite_renderer;
pub mod texture;
pub mod vertex;

pub use batch::SpriteBatch;
pub use camera::Camera;
pub use gpu::{RenderError, RenderState, Viewport, letterbox};
pub use sprite::{Animation, SharedSprite, Sprite, SpriteInstance, Spritesheet};
pub use sprite_renderer::Renderer;
pub use texture::{Texture, TextureId, TextureStore};
pub use vertex::Vertex;
