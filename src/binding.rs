use crate::camera::CameraUniform;

/// Bind group holding the camera uniform.
pub const CAMERA_GROUP: u32 = 0;
pub const CAMERA_BINDING: u32 = 0;
/// Colour attachment written by the fragment stage.
pub const FRAGMENT_OUTPUT_LOCATION: u32 = 0;
/// Vertex buffer slot used by every program.
pub const VERTEX_BUFFER_SLOT: u32 = 0;

pub fn camera_layout_entry() -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: CAMERA_BINDING,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(CameraUniform::SIZE),
        },
        count: None,
    }
}

/// Opaque colour target. No blending, so float targets such as
/// `Rgba32Float` are accepted.
pub fn colour_target(format: wgpu::TextureFormat) -> wgpu::ColorTargetState {
    wgpu::ColorTargetState {
        format,
        blend: None,
        write_mask: wgpu::ColorWrites::ALL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_entry_is_a_sized_vertex_uniform() {
        let entry = camera_layout_entry();
        assert_eq!(entry.binding, 0);
        assert_eq!(entry.visibility, wgpu::ShaderStages::VERTEX);
        match entry.ty {
            wgpu::BindingType::Buffer {
                ty,
                has_dynamic_offset,
                min_binding_size,
            } => {
                assert_eq!(ty, wgpu::BufferBindingType::Uniform);
                assert!(!has_dynamic_offset);
                assert_eq!(min_binding_size.map(|size| size.get()), Some(64));
            }
            other => panic!("unexpected binding type {other:?}"),
        }
    }

    #[test]
    fn colour_target_writes_without_blending() {
        let target = colour_target(wgpu::TextureFormat::Rgba32Float);
        assert_eq!(target.format, wgpu::TextureFormat::Rgba32Float);
        assert!(target.blend.is_none());
        assert_eq!(target.write_mask, wgpu::ColorWrites::ALL);
    }
}
