//! Sprite shader program: pipeline, bind group layouts and the globals uniform
//!
//! Group 0 holds [`Globals`] (projection and view). Group 1 holds the shared
//! sampler at binding 0 and texture slots 1..=8 at bindings 1..=8. Slot 0 in a
//! vertex means "no texture" and samples white.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::texture::{Texture, TextureStore};
use super::vertex::Vertex;
use crate::consts::MAX_TEXTURE_SLOTS;

/// Camera matrices, uploaded once per frame
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Globals {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

impl Globals {
    pub fn new(projection: Mat4, view: Mat4) -> Self {
        Self {
            projection: projection.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
        }
    }
}

impl Default for Globals {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    globals_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
}

impl ShaderProgram {
    /// Compile the sprite shader and build its pipeline. Shader compile
    /// errors are logged rather than returned.
    pub async fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });
        log_compilation(&module).await;

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let mut texture_entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        }];
        texture_entries.extend((1..=MAX_TEXTURE_SLOTS as u32).map(|binding| {
            wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }
        }));
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite_texture_layout"),
            entries: &texture_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprite_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &texture_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sprite_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    // src_alpha / one_minus_src_alpha
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            globals_layout,
            texture_layout,
        }
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn globals_bind_group(
        &self,
        device: &wgpu::Device,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &self.globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    /// Bind a batch's textures to slots 1..=n; remaining slots get the
    /// white fallback so the group is always complete.
    pub fn texture_bind_group(
        &self,
        device: &wgpu::Device,
        store: &TextureStore,
        textures: &[Texture],
    ) -> wgpu::BindGroup {
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Sampler(store.sampler()),
        }];
        for slot in 0..MAX_TEXTURE_SLOTS {
            let view = match textures.get(slot) {
                Some(tex) => store.view(tex.id()),
                None => store.fallback_view(),
            };
            entries.push(wgpu::BindGroupEntry {
                binding: slot as u32 + 1,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprite_texture_bind_group"),
            layout: &self.texture_layout,
            entries: &entries,
        })
    }
}

async fn log_compilation(module: &wgpu::ShaderModule) {
    let info = module.get_compilation_info().await;
    for message in &info.messages {
        match message.message_type {
            wgpu::CompilationMessageType::Error => {
                log::error!("Sprite shader compile error: {}", message.message)
            }
            wgpu::CompilationMessageType::Warning => {
                log::warn!("Sprite shader: {}", message.message)
            }
            wgpu::CompilationMessageType::Info => {
                log::debug!("Sprite shader: {}", message.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_globals_layout_is_two_column_major_mat4() {
        assert_eq!(std::mem::size_of::<Globals>(), 128);
        let g = Globals::new(Mat4::IDENTITY, crate::math::translation(Vec2::new(3.0, 4.0)));
        // Translation lives in the fourth column
        assert_eq!(g.view[3][0], 3.0);
        assert_eq!(g.view[3][1], 4.0);
        assert_eq!(g.projection[0][0], 1.0);
    }

    #[test]
    fn test_shader_declares_every_slot() {
        let src = include_str!("shader.wgsl");
        for binding in 1..=MAX_TEXTURE_SLOTS {
            assert!(src.contains(&format!("@binding({binding}) var tex{binding}")));
        }
    }
}
