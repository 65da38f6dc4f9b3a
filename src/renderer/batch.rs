//! Sprite batch: one z-layer, up to 8 textures, one draw call
//!
//! A batch owns a dense vertex array sized for `capacity` quads and a static
//! index list computed once. Every frame the live instances are re-packed in
//! insertion order, the whole array is uploaded in a single write, and one
//! indexed draw covers `count * 6` indices.
//!
//! Texture slots are assigned in first-seen order (`slot = index + 1`, slot 0
//! is the untextured fill) and are never released while the batch lives.

use std::rc::Rc;

use glam::Vec2;

use super::shader::ShaderProgram;
use super::sprite::SharedSprite;
use super::texture::{Texture, TextureStore};
use super::vertex::{QUAD_INDICES, QUAD_VERTICES, Vertex, quad_indices};
use crate::consts::MAX_TEXTURE_SLOTS;
use crate::math::rotate;

/// Unit quad corners: top-left, top-right, bottom-right, bottom-left
const CORNERS: [Vec2; 4] = [
    Vec2::new(-0.5, 0.5),
    Vec2::new(0.5, 0.5),
    Vec2::new(0.5, -0.5),
    Vec2::new(-0.5, -0.5),
];

/// GPU resources, created on first upload
struct BatchBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    texture_group: wgpu::BindGroup,
    /// Tracked texture count the bind group was built for
    bound_textures: usize,
}

pub struct SpriteBatch {
    capacity: usize,
    z_index: i32,
    sprites: Vec<SharedSprite>,
    textures: Vec<Texture>,
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
    full: bool,
    gpu: Option<BatchBuffers>,
}

impl SpriteBatch {
    pub fn new(capacity: usize, z_index: i32) -> Self {
        Self {
            capacity,
            z_index,
            sprites: Vec::with_capacity(capacity),
            textures: Vec::with_capacity(MAX_TEXTURE_SLOTS),
            vertices: vec![Vertex::default(); capacity * QUAD_VERTICES],
            indices: quad_indices(capacity),
            full: capacity == 0,
            gpu: None,
        }
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Set once capacity is reached; never cleared by removals
    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn contains(&self, instance: &SharedSprite) -> bool {
        self.sprites.iter().any(|s| Rc::ptr_eq(s, instance))
    }

    /// Slot a texture samples from in this batch (0 = untextured / not tracked)
    pub fn texture_slot(&self, texture: Option<Texture>) -> u32 {
        texture
            .and_then(|tex| self.textures.iter().position(|t| *t == tex))
            .map_or(0, |i| i as u32 + 1)
    }

    /// Whether an instance with this z-index and texture would be accepted.
    /// With all 8 slots taken the batch still takes untextured sprites and
    /// sprites whose texture it already tracks; only `full` (capacity) closes it.
    pub fn accepts(&self, z_index: i32, texture: Option<Texture>) -> bool {
        if self.full || z_index != self.z_index {
            return false;
        }
        match texture {
            None => true,
            Some(tex) => self.textures.contains(&tex) || self.textures.len() < MAX_TEXTURE_SLOTS,
        }
    }

    /// Add an instance if there is room for it and its texture
    pub fn try_insert(&mut self, instance: &SharedSprite) -> bool {
        let (z_index, texture) = {
            let inst = instance.borrow();
            (inst.z_index, inst.texture())
        };
        if !self.accepts(z_index, texture) {
            return false;
        }

        if let Some(tex) = texture {
            if !self.textures.contains(&tex) {
                self.textures.push(tex);
            }
        }
        self.sprites.push(Rc::clone(instance));
        if self.sprites.len() >= self.capacity {
            self.full = true;
        }
        true
    }

    /// Remove by identity, keeping draw order of the remaining sprites
    pub fn remove(&mut self, instance: &SharedSprite) -> bool {
        match self.sprites.iter().position(|s| Rc::ptr_eq(s, instance)) {
            Some(idx) => {
                self.sprites.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Rebuild vertex data for every live sprite and return it
    pub fn pack_vertices(&mut self) -> &[Vertex] {
        for (i, instance) in self.sprites.iter().enumerate() {
            let inst = instance.borrow();
            let slot = self.texture_slot(inst.texture()) as f32;
            let uvs = inst.sprite.uvs();
            let base = i * QUAD_VERTICES;

            for (corner, (offset, uv)) in CORNERS.iter().zip(uvs.iter()).enumerate() {
                let pos = rotate(*offset * inst.scale, inst.rotation) + inst.position;
                self.vertices[base + corner] = Vertex {
                    position: pos.to_array(),
                    color: inst.color,
                    uv: uv.to_array(),
                    tex_slot: slot,
                };
            }
        }
        self.live_vertices()
    }

    pub fn live_vertices(&self) -> &[Vertex] {
        &self.vertices[..self.sprites.len() * QUAD_VERTICES]
    }

    pub fn index_count(&self) -> u32 {
        (self.sprites.len() * QUAD_INDICES) as u32
    }

    /// Pack and upload this frame's vertices, creating GPU buffers on first use
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        program: &ShaderProgram,
        store: &TextureStore,
    ) {
        self.pack_vertices();

        let gpu = match self.gpu.take() {
            Some(mut gpu) => {
                if gpu.bound_textures != self.textures.len() {
                    gpu.texture_group = program.texture_bind_group(device, store, &self.textures);
                    gpu.bound_textures = self.textures.len();
                }
                gpu
            }
            None => self.create_buffers(device, program, store),
        };

        queue.write_buffer(&gpu.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));
        self.gpu = Some(gpu);
    }

    fn create_buffers(
        &self,
        device: &wgpu::Device,
        program: &ShaderProgram,
        store: &TextureStore,
    ) -> BatchBuffers {
        use wgpu::util::DeviceExt;

        log::debug!(
            "Allocating GPU buffers for batch z={} ({} quads)",
            self.z_index,
            self.capacity
        );

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprite_batch_vertices"),
            size: std::mem::size_of_val(self.vertices.as_slice()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprite_batch_indices"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        BatchBuffers {
            vertex_buffer,
            index_buffer,
            texture_group: program.texture_bind_group(device, store, &self.textures),
            bound_textures: self.textures.len(),
        }
    }

    /// Record the single draw call for this batch. Expects the pipeline and
    /// globals group to be bound already.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.sprites.is_empty() {
            return;
        }
        let Some(gpu) = &self.gpu else {
            log::warn!("Batch z={} drawn before prepare", self.z_index);
            return;
        };
        pass.set_bind_group(1, &gpu.texture_group, &[]);
        pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.index_count(), 0, 0..1);
    }
}
