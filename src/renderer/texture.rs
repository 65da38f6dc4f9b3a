//! Textures: copyable metadata handles plus the GPU-side store
//!
//! Sprites and batches only ever see [`Texture`], a small `Copy` handle
//! carrying the id and pixel size. The `wgpu` objects live in
//! [`TextureStore`], looked up by id when a batch builds its bind group.
//! This keeps all batching logic free of GPU state.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

/// Stable identity of an uploaded texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Handle to a texture: identity and pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    pub const fn new(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// GPU resources for one texture
pub struct GpuTexture {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            rgba,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Owns every uploaded texture plus the shared nearest-neighbour sampler
pub struct TextureStore {
    entries: HashMap<TextureId, GpuTexture>,
    /// Bound to unused slots so every bind group is complete
    fallback: GpuTexture,
    sampler: wgpu::Sampler,
    next_id: u32,
}

impl TextureStore {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let fallback = GpuTexture::from_rgba(device, queue, "white 1x1", 1, 1, &[255; 4]);

        // Nearest filtering keeps pixel art crisp at any scale
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            entries: HashMap::new(),
            fallback,
            sampler,
            next_id: 1,
        }
    }

    /// Upload RGBA8 pixels and return a handle to them
    pub fn insert_rgba(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Texture {
        let id = TextureId(self.next_id);
        self.next_id += 1;
        let gpu = GpuTexture::from_rgba(device, queue, label, width, height, rgba);
        self.entries.insert(id, gpu);
        log::debug!("Uploaded texture {label} ({width}x{height}) as {id:?}");
        Texture::new(id, width, height)
    }

    /// View for a texture, or the white fallback if it is unknown
    pub fn view(&self, id: TextureId) -> &wgpu::TextureView {
        match self.entries.get(&id) {
            Some(entry) => &entry.view,
            None => {
                log::warn!("Texture {id:?} not in store, binding fallback");
                &self.fallback.view
            }
        }
    }

    pub fn fallback_view(&self) -> &wgpu::TextureView {
        &self.fallback.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
