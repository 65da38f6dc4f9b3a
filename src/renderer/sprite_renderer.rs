//! Layered sprite renderer
//!
//! Holds an ordered list of [`SpriteBatch`]es, kept sorted by z-index
//! ascending so that lower layers are drawn first. Batches with equal z keep
//! their creation order. Batches are never destroyed, even when emptied.

use super::batch::SpriteBatch;
use super::shader::ShaderProgram;
use super::sprite::SharedSprite;
use super::texture::TextureStore;

pub struct Renderer {
    batch_capacity: usize,
    batches: Vec<SpriteBatch>,
}

impl Renderer {
    pub fn new(batch_capacity: usize) -> Self {
        Self {
            batch_capacity,
            batches: Vec::new(),
        }
    }

    /// Place an instance in the first batch that can take it, opening a new
    /// batch for its layer if none can. Adding an instance that is already
    /// drawn is a no-op and returns `false`.
    pub fn add(&mut self, instance: &SharedSprite) -> bool {
        if self.contains(instance) {
            log::warn!("Sprite instance added twice, ignoring");
            return false;
        }

        for batch in &mut self.batches {
            if batch.try_insert(instance) {
                return true;
            }
        }

        let z_index = instance.borrow().z_index;
        let mut batch = SpriteBatch::new(self.batch_capacity, z_index);
        let inserted = batch.try_insert(instance);
        self.batches.push(batch);
        // Stable: equal layers keep creation order
        self.batches.sort_by_key(SpriteBatch::z_index);
        log::debug!(
            "Opened batch for z={z_index}, {} batches total",
            self.batches.len()
        );
        inserted
    }

    /// Stop drawing an instance. Returns whether it was found.
    pub fn remove(&mut self, instance: &SharedSprite) -> bool {
        self.batches.iter_mut().any(|batch| batch.remove(instance))
    }

    pub fn contains(&self, instance: &SharedSprite) -> bool {
        self.batches.iter().any(|batch| batch.contains(instance))
    }

    pub fn batches(&self) -> &[SpriteBatch] {
        &self.batches
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn sprite_count(&self) -> usize {
        self.batches.iter().map(SpriteBatch::len).sum()
    }

    /// Pack and upload every batch for this frame
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        program: &ShaderProgram,
        store: &TextureStore,
    ) {
        for batch in &mut self.batches {
            batch.prepare(device, queue, program, store);
        }
    }

    /// One draw call per non-empty batch, in layer order
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        for batch in &self.batches {
            batch.draw(pass);
        }
    }
}
