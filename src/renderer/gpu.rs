//! WebGPU render state: device, surface, and the per-frame pass
//!
//! Each frame clears the whole surface to black, then restricts drawing to a
//! letterboxed viewport matching the logical 360:520 aspect and draws every
//! batch in layer order.

use thiserror::Error;
use wgpu::util::DeviceExt;

use super::batch::SpriteBatch;
use super::camera::Camera;
use super::shader::{Globals, ShaderProgram};
use super::sprite::{Sprite, SpriteInstance};
use super::sprite_renderer::Renderer;
use super::texture::{Texture, TextureStore};
use crate::consts::{ASPECT, HEIGHT, WIDTH};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to acquire GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Pixel rectangle the game is drawn into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Integer scissor rect, clipped to the target size
    pub fn scissor(&self, target_w: u32, target_h: u32) -> (u32, u32, u32, u32) {
        let x = (self.x.max(0.0) as u32).min(target_w);
        let y = (self.y.max(0.0) as u32).min(target_h);
        let w = (self.width.max(0.0) as u32).min(target_w - x);
        let h = (self.height.max(0.0) as u32).min(target_h - y);
        (x, y, w, h)
    }
}

/// Grey the letterboxed area shows under every layer
pub const BACKDROP_GREY: f32 = 0.4;

/// Full-viewport solid quad drawn first. Clears ignore the scissor rect, so
/// this stands in for clearing the letterboxed area.
fn backdrop_batch() -> SpriteBatch {
    let mut backdrop = SpriteInstance::new(Sprite::solid())
        .with_scale(WIDTH, HEIGHT)
        .with_z(i32::MIN);
    backdrop.set_color(BACKDROP_GREY, BACKDROP_GREY, BACKDROP_GREY, 1.0);
    let mut batch = SpriteBatch::new(1, i32::MIN);
    batch.try_insert(&backdrop.shared());
    batch
}

/// Largest rect of the logical aspect ratio centred in the canvas
pub fn letterbox(canvas_w: u32, canvas_h: u32) -> Viewport {
    let (cw, ch) = (canvas_w as f32, canvas_h as f32);
    if ch <= 0.0 || cw <= 0.0 {
        return Viewport {
            x: 0.0,
            y: 0.0,
            width: cw.max(0.0),
            height: ch.max(0.0),
        };
    }

    if cw / ch > ASPECT {
        // Bars left and right
        let width = ch * ASPECT;
        Viewport {
            x: ((cw - width) * 0.5).round(),
            y: 0.0,
            width: width.round(),
            height: ch,
        }
    } else {
        // Bars top and bottom
        let height = cw / ASPECT;
        Viewport {
            x: 0.0,
            y: ((ch - height) * 0.5).round(),
            width: cw,
            height: height.round(),
        }
    }
}

pub struct RenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    program: ShaderProgram,
    globals_buffer: wgpu::Buffer,
    globals_group: wgpu::BindGroup,
    textures: TextureStore,
    backdrop: SpriteBatch,
    viewport: Viewport,
}

impl RenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("flappy-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;
        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let program = ShaderProgram::new(&device, surface_format).await;

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_group = program.globals_bind_group(&device, &globals_buffer);
        let textures = TextureStore::new(&device, &queue);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            program,
            globals_buffer,
            globals_group,
            textures,
            backdrop: backdrop_batch(),
            viewport: letterbox(width, height),
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
            self.viewport = letterbox(new_width, new_height);
            log::debug!("Resized to {new_width}x{new_height}, viewport {:?}", self.viewport);
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Upload decoded RGBA8 pixels as a sprite texture
    pub fn upload_texture(&mut self, label: &str, width: u32, height: u32, rgba: &[u8]) -> Texture {
        self.textures
            .insert_rgba(&self.device, &self.queue, label, width, height, rgba)
    }

    /// Draw one frame: clear, letterbox, then every batch in layer order
    pub fn render(
        &mut self,
        renderer: &mut Renderer,
        camera: &mut Camera,
    ) -> Result<(), wgpu::SurfaceError> {
        let globals = Globals::new(camera.projection_matrix(), camera.view_matrix());
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
        self.backdrop
            .prepare(&self.device, &self.queue, &self.program, &self.textures);
        renderer.prepare(&self.device, &self.queue, &self.program, &self.textures);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sprite_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sprite_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let vp = self.viewport;
            let (sx, sy, sw, sh) = vp.scissor(self.config.width, self.config.height);
            if sw > 0 && sh > 0 {
                render_pass.set_viewport(vp.x, vp.y, vp.width, vp.height, 0.0, 1.0);
                render_pass.set_scissor_rect(sx, sy, sw, sh);
                render_pass.set_pipeline(self.program.pipeline());
                render_pass.set_bind_group(0, &self.globals_group, &[]);
                self.backdrop.draw(&mut render_pass);
                renderer.draw(&mut render_pass);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
