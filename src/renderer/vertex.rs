//! Vertex layout for batched sprites
//!
//! Must match `shader.wgsl`: 9 little-endian f32 per vertex,
//! `[x, y, r, g, b, a, u, v, slot]`.

use bytemuck::{Pod, Zeroable};

/// Floats per vertex
pub const VERTEX_FLOATS: usize = 9;
/// Vertices per sprite quad
pub const QUAD_VERTICES: usize = 4;
/// Indices per sprite quad (two triangles)
pub const QUAD_INDICES: usize = 6;

/// Index pattern for one quad, offset by `4 * quad`
const QUAD_PATTERN: [u16; QUAD_INDICES] = [0, 1, 2, 0, 2, 3];

/// Sprite vertex with tint and texture slot
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
    pub uv: [f32; 2],
    /// 0 = solid fill, 1..=8 = bound texture slot
    pub tex_slot: f32,
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x4,
        2 => Float32x2,
        3 => Float32,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Static index list for `quads` sprites
pub fn quad_indices(quads: usize) -> Vec<u16> {
    debug_assert!(quads * QUAD_VERTICES <= u16::MAX as usize + 1);
    (0..quads)
        .flat_map(|quad| {
            let base = (quad * QUAD_VERTICES) as u16;
            QUAD_PATTERN.iter().map(move |i| base + i)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_stride_is_nine_floats() {
        assert_eq!(std::mem::size_of::<Vertex>(), VERTEX_FLOATS * 4);
        let desc = Vertex::desc();
        assert_eq!(desc.array_stride, 36);
        assert_eq!(desc.attributes[3].offset, 32);
    }

    #[test]
    fn test_vertex_bytes_are_little_endian_floats() {
        let v = Vertex {
            position: [1.0, 2.0],
            color: [0.5, 0.25, 0.0, 1.0],
            uv: [0.0, 1.0],
            tex_slot: 3.0,
        };
        let bytes = bytemuck::bytes_of(&v);
        let slot = f32::from_le_bytes(bytes[32..36].try_into().unwrap());
        assert_eq!(slot, 3.0);
        let x = f32::from_le_bytes(bytes[0..4].try_into().unwrap());
        assert_eq!(x, 1.0);
    }

    #[test]
    fn test_quad_indices() {
        let indices = quad_indices(3);
        assert_eq!(indices.len(), 18);
        assert_eq!(&indices[0..6], &[0, 1, 2, 0, 2, 3]);
        assert_eq!(&indices[12..18], &[8, 9, 10, 8, 10, 11]);
    }
}
