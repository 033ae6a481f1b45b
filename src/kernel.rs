// CPU versions of the shader stages. Each function mirrors one WGSL
// expression in the same operation order; GPU results agree within float
// tolerance since drivers may fuse multiply-adds.

use glam::{Mat4, Vec3, Vec4};

use crate::camera::CameraUniform;
use crate::program::ShaderKind;
use crate::vertex::{ColourVertex, LitVertex, NormalVertex};

pub const AMBIENT: f32 = 0.5;
/// Weight of `dot(normal, (1, 1, 1))` in the `lit` program.
pub const NORMAL_WEIGHT: f32 = 0.25;

/// `view_proj * vec4(position, 1.0)`.
pub fn clip_position(view_proj: Mat4, position: Vec3) -> Vec4 {
    view_proj * position.extend(1.0)
}

/// Fragment colour of the `colour` program.
pub fn pass_through(colour: Vec3) -> Vec4 {
    colour.extend(1.0)
}

/// Fragment colour of the `normal` program: remaps `[-1, 1]` into `[0, 1]`.
pub fn normal_tint(normal: Vec3) -> Vec4 {
    (normal * 0.5 + Vec3::splat(AMBIENT)).extend(1.0)
}

/// Fragment colour of the `lit` program.
pub fn lit(normal: Vec3, colour: Vec3) -> Vec4 {
    let shade = AMBIENT + NORMAL_WEIGHT * normal.dot(Vec3::ONE);
    (colour * shade).extend(1.0)
}

/// Values that the rasterizer blends across a triangle.
pub trait Interpolate: Copy {
    fn interpolate(values: [Self; 3], weights: Vec3) -> Self;
}

impl Interpolate for Vec3 {
    fn interpolate(values: [Self; 3], weights: Vec3) -> Self {
        values[0] * weights.x + values[1] * weights.y + values[2] * weights.z
    }
}

impl<A: Interpolate, B: Interpolate> Interpolate for (A, B) {
    fn interpolate(values: [Self; 3], weights: Vec3) -> Self {
        let [a, b, c] = values;
        (
            A::interpolate([a.0, b.0, c.0], weights),
            B::interpolate([a.1, b.1, c.1], weights),
        )
    }
}

/// Converts screen-space barycentric weights into perspective-correct ones.
///
/// `clip_w` holds the clip-space `w` of the three vertices. Primitives that
/// reach the fragment stage have been clipped, so every `w` is positive.
pub fn perspective_weights(screen: Vec3, clip_w: Vec3) -> Vec3 {
    let scaled = screen / clip_w;
    scaled / (scaled.x + scaled.y + scaled.z)
}

/// Output of a vertex invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput<V> {
    pub clip_position: Vec4,
    pub varyings: V,
}

/// A vertex/fragment pair with its vertex format and varyings.
pub trait ShaderProgram {
    type Vertex: bytemuck::Pod;
    type Varyings: Interpolate;

    const KIND: ShaderKind;

    fn vertex(
        &self,
        camera: &CameraUniform,
        vertex: &Self::Vertex,
    ) -> VertexOutput<Self::Varyings>;

    fn fragment(&self, varyings: Self::Varyings) -> Vec4;

    /// Runs the vertex stage on a triangle and shades the fragment at the
    /// given screen-space barycentric weights.
    fn shade_at(
        &self,
        camera: &CameraUniform,
        triangle: &[Self::Vertex; 3],
        screen_weights: Vec3,
    ) -> Vec4 {
        let outputs = [
            self.vertex(camera, &triangle[0]),
            self.vertex(camera, &triangle[1]),
            self.vertex(camera, &triangle[2]),
        ];
        let clip_w = Vec3::new(
            outputs[0].clip_position.w,
            outputs[1].clip_position.w,
            outputs[2].clip_position.w,
        );
        let weights = perspective_weights(screen_weights, clip_w);
        let varyings = Self::Varyings::interpolate(
            [outputs[0].varyings, outputs[1].varyings, outputs[2].varyings],
            weights,
        );
        self.fragment(varyings)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ColourProgram;

impl ShaderProgram for ColourProgram {
    type Vertex = ColourVertex;
    type Varyings = Vec3;

    const KIND: ShaderKind = ShaderKind::Colour;

    fn vertex(&self, camera: &CameraUniform, vertex: &ColourVertex) -> VertexOutput<Vec3> {
        VertexOutput {
            clip_position: clip_position(camera.matrix(), vertex.position.into()),
            varyings: vertex.colour.into(),
        }
    }

    fn fragment(&self, colour: Vec3) -> Vec4 {
        pass_through(colour)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalProgram;

impl ShaderProgram for NormalProgram {
    type Vertex = NormalVertex;
    type Varyings = Vec3;

    const KIND: ShaderKind = ShaderKind::Normal;

    fn vertex(&self, camera: &CameraUniform, vertex: &NormalVertex) -> VertexOutput<Vec3> {
        VertexOutput {
            clip_position: clip_position(camera.matrix(), vertex.position.into()),
            varyings: vertex.normal.into(),
        }
    }

    fn fragment(&self, normal: Vec3) -> Vec4 {
        normal_tint(normal)
    }
}

/// Varyings are `(normal, colour)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LitProgram;

impl ShaderProgram for LitProgram {
    type Vertex = LitVertex;
    type Varyings = (Vec3, Vec3);

    const KIND: ShaderKind = ShaderKind::Lit;

    fn vertex(&self, camera: &CameraUniform, vertex: &LitVertex) -> VertexOutput<(Vec3, Vec3)> {
        VertexOutput {
            clip_position: clip_position(camera.matrix(), vertex.position.into()),
            varyings: (vertex.normal.into(), vertex.colour.into()),
        }
    }

    fn fragment(&self, (normal, colour): (Vec3, Vec3)) -> Vec4 {
        lit(normal, colour)
    }
}
