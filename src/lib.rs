//! Flat-colour shader programs and the host-side contract around them.
//!
//! The crate ships three WGSL programs (`colour`, `normal`, `lit`), the
//! wgpu descriptors a host must use to bind them, a naga-based check that
//! the two stay in agreement, and CPU versions of the shader arithmetic that
//! can be evaluated without a GPU.

pub mod binding;
pub mod camera;
pub mod gpu;
pub mod kernel;
pub mod probe;
pub mod program;
pub mod reflect;
pub mod vertex;

pub use camera::{Camera, CameraUniform};
pub use gpu::ProgramPipeline;
pub use kernel::{
    ColourProgram, Interpolate, LitProgram, NormalProgram, ShaderProgram, VertexOutput,
};
pub use probe::{Probe, ProbeResult, ProbeSet};
pub use program::{ShaderKind, UnknownProgram};
pub use reflect::{ContractError, Reflection};
pub use vertex::{ColourVertex, LitVertex, NormalVertex};
