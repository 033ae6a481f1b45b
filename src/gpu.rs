use log::info;
use wgpu::util::DeviceExt;

use crate::binding::{
    camera_layout_entry, colour_target, CAMERA_BINDING, CAMERA_GROUP, VERTEX_BUFFER_SLOT,
};
use crate::camera::CameraUniform;
use crate::program::{ShaderKind, FRAGMENT_ENTRY, VERTEX_ENTRY};

/// Everything a host needs to draw with one of the programs.
pub struct ProgramPipeline {
    pub kind: ShaderKind,
    pub camera_layout: wgpu::BindGroupLayout,
    pub pipeline: wgpu::RenderPipeline,
}

pub fn create_camera_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("camera-bind-layout"),
        entries: &[camera_layout_entry()],
    })
}

pub fn create_camera_buffer(device: &wgpu::Device, camera: &CameraUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("camera-uniform"),
        contents: bytemuck::bytes_of(camera),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn create_camera_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("camera-bind-group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: CAMERA_BINDING,
            resource: buffer.as_entire_binding(),
        }],
    })
}

impl ProgramPipeline {
    /// Compiles `kind` and builds a triangle-list pipeline targeting `format`.
    pub fn new(device: &wgpu::Device, kind: ShaderKind, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(kind.shader_module_descriptor());
        let camera_layout = create_camera_layout(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(kind.name()),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(kind.name()),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: VERTEX_ENTRY,
                buffers: &[kind.vertex_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: FRAGMENT_ENTRY,
                targets: &[Some(colour_target(format))],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });
        info!("built {kind} pipeline for {format:?}");

        Self {
            kind,
            camera_layout,
            pipeline,
        }
    }

    /// Binds the pipeline, camera and vertex buffer, then draws
    /// `vertex_count` vertices as a triangle list.
    pub fn draw<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        camera: &'a wgpu::BindGroup,
        vertices: &'a wgpu::Buffer,
        vertex_count: u32,
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(CAMERA_GROUP, camera, &[]);
        pass.set_vertex_buffer(VERTEX_BUFFER_SLOT, vertices.slice(..));
        pass.draw(0..vertex_count, 0..1);
    }
}
