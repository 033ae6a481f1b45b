use log::debug;
use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};
use naga::{
    AddressSpace, Binding, BuiltIn, EntryPoint, GlobalVariable, Handle, Module, ScalarKind,
    ShaderStage, Type, TypeInner, VectorSize,
};
use thiserror::Error;

use crate::binding::{
    camera_layout_entry, CAMERA_BINDING, CAMERA_GROUP, FRAGMENT_OUTPUT_LOCATION,
};
use crate::program::{ShaderKind, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::vertex::float_components;

/// A user-defined `@location` in a stage interface.
///
/// `components` is `None` when the type is not a 32-bit float scalar or
/// vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
    pub location: u32,
    pub components: Option<u32>,
}

impl Location {
    pub const fn float(location: u32, components: u32) -> Self {
        Self {
            location,
            components: Some(components),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBinding {
    pub group: u32,
    pub binding: u32,
    pub name: Option<String>,
    /// The uniform is a `mat4x4<f32>`, directly or as the only struct member.
    pub is_mat4: bool,
    /// Entry point stages that read the uniform.
    pub stages: wgpu::ShaderStages,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageInterface {
    pub inputs: Vec<Location>,
    pub outputs: Vec<Location>,
    pub writes_position: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reflection {
    pub uniforms: Vec<UniformBinding>,
    pub vertex: StageInterface,
    pub fragment: StageInterface,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("WGSL parse error: {0}")]
    Parse(String),
    #[error("WGSL validation error: {0}")]
    Validation(String),
    #[error("missing {stage} entry point `{name}`")]
    MissingEntryPoint {
        stage: &'static str,
        name: &'static str,
    },
    #[error("expected exactly one uniform binding, found {0}")]
    UniformCount(usize),
    #[error("camera uniform is at group {group} binding {binding}, expected group 0 binding 0")]
    UniformSlot { group: u32, binding: u32 },
    #[error("camera uniform is not a mat4x4<f32>")]
    UniformType,
    #[error("camera uniform is read by {stages:?} but only bound for {visible:?}")]
    UniformVisibility {
        stages: wgpu::ShaderStages,
        visible: wgpu::ShaderStages,
    },
    #[error("vertex inputs {found:?} do not match the vertex buffer layout {expected:?}")]
    VertexInputs {
        expected: Vec<Location>,
        found: Vec<Location>,
    },
    #[error("vertex stage does not write @builtin(position)")]
    MissingPosition,
    #[error("vertex outputs {vertex:?} do not match fragment inputs {fragment:?}")]
    Varyings {
        vertex: Vec<Location>,
        fragment: Vec<Location>,
    },
    #[error("expected {expected} vec3<f32> varyings, found {found:?}")]
    VaryingShape {
        expected: usize,
        found: Vec<Location>,
    },
    #[error("fragment outputs {0:?}, expected a single vec4<f32> at location 0")]
    FragmentOutput(Vec<Location>),
}

impl Reflection {
    /// Parses and validates `source`, then records its resource bindings and
    /// the interfaces of the `vs_main`/`fs_main` entry points.
    pub fn from_wgsl(source: &str) -> Result<Self, ContractError> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|err| ContractError::Parse(err.emit_to_string(source)))?;
        let info = Validator::new(ValidationFlags::all(), Capabilities::empty())
            .validate(&module)
            .map_err(|err| ContractError::Validation(err.into_inner().to_string()))?;

        let uniforms = module
            .global_variables
            .iter()
            .filter(|(_, global)| global.space == AddressSpace::Uniform)
            .filter_map(|(handle, global)| {
                global.binding.as_ref().map(|slot| UniformBinding {
                    group: slot.group,
                    binding: slot.binding,
                    name: global.name.clone(),
                    is_mat4: is_mat4(&module, global.ty),
                    stages: stages_using(&module, &info, handle),
                })
            })
            .collect();

        let vertex = entry_point(&module, ShaderStage::Vertex, VERTEX_ENTRY)?;
        let fragment = entry_point(&module, ShaderStage::Fragment, FRAGMENT_ENTRY)?;

        Ok(Self {
            uniforms,
            vertex: stage_interface(&module, vertex),
            fragment: stage_interface(&module, fragment),
        })
    }
}

/// Checks one of the shipped programs against its host-side layout.
pub fn verify(kind: ShaderKind) -> Result<Reflection, ContractError> {
    let reflection = verify_wgsl(kind.source(), &kind.vertex_layout(), kind.varying_count())?;
    debug!(
        "{kind}: contract holds ({} vertex inputs, {} varyings)",
        reflection.vertex.inputs.len(),
        reflection.vertex.outputs.len()
    );
    Ok(reflection)
}

/// Checks an arbitrary WGSL source against a vertex buffer layout and the
/// shared camera/fragment-output contract.
pub fn verify_wgsl(
    source: &str,
    layout: &wgpu::VertexBufferLayout<'_>,
    varying_count: usize,
) -> Result<Reflection, ContractError> {
    let reflection = Reflection::from_wgsl(source)?;

    let [camera] = reflection.uniforms.as_slice() else {
        return Err(ContractError::UniformCount(reflection.uniforms.len()));
    };
    if camera.group != CAMERA_GROUP || camera.binding != CAMERA_BINDING {
        return Err(ContractError::UniformSlot {
            group: camera.group,
            binding: camera.binding,
        });
    }
    if !camera.is_mat4 {
        return Err(ContractError::UniformType);
    }
    let visible = camera_layout_entry().visibility;
    if !visible.contains(camera.stages) {
        return Err(ContractError::UniformVisibility {
            stages: camera.stages,
            visible,
        });
    }

    let mut expected: Vec<Location> = layout
        .attributes
        .iter()
        .map(|attribute| Location {
            location: attribute.shader_location,
            components: float_components(attribute.format),
        })
        .collect();
    expected.sort();
    if expected != reflection.vertex.inputs {
        return Err(ContractError::VertexInputs {
            expected,
            found: reflection.vertex.inputs.clone(),
        });
    }

    if !reflection.vertex.writes_position {
        return Err(ContractError::MissingPosition);
    }
    if reflection.vertex.outputs != reflection.fragment.inputs {
        return Err(ContractError::Varyings {
            vertex: reflection.vertex.outputs.clone(),
            fragment: reflection.fragment.inputs.clone(),
        });
    }
    let varyings = &reflection.vertex.outputs;
    if varyings.len() != varying_count
        || varyings.iter().any(|varying| varying.components != Some(3))
    {
        return Err(ContractError::VaryingShape {
            expected: varying_count,
            found: varyings.clone(),
        });
    }

    if reflection.fragment.outputs != [Location::float(FRAGMENT_OUTPUT_LOCATION, 4)] {
        return Err(ContractError::FragmentOutput(
            reflection.fragment.outputs.clone(),
        ));
    }

    Ok(reflection)
}

fn entry_point<'a>(
    module: &'a Module,
    stage: ShaderStage,
    name: &'static str,
) -> Result<&'a EntryPoint, ContractError> {
    module
        .entry_points
        .iter()
        .find(|entry| entry.stage == stage && entry.name == name)
        .ok_or(ContractError::MissingEntryPoint {
            stage: match stage {
                ShaderStage::Vertex => "vertex",
                ShaderStage::Fragment => "fragment",
                ShaderStage::Compute => "compute",
            },
            name,
        })
}

fn stages_using(
    module: &Module,
    info: &ModuleInfo,
    global: Handle<GlobalVariable>,
) -> wgpu::ShaderStages {
    module
        .entry_points
        .iter()
        .enumerate()
        .filter(|&(index, _)| !info.get_entry_point(index)[global].is_empty())
        .fold(wgpu::ShaderStages::NONE, |stages, (_, entry)| {
            stages
                | match entry.stage {
                    ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
                    ShaderStage::Fragment => wgpu::ShaderStages::FRAGMENT,
                    ShaderStage::Compute => wgpu::ShaderStages::COMPUTE,
                }
        })
}

fn stage_interface(module: &Module, entry: &EntryPoint) -> StageInterface {
    let mut interface = StageInterface::default();

    for argument in &entry.function.arguments {
        for (binding, ty) in bindings_of(module, argument.ty, argument.binding.as_ref()) {
            if let Binding::Location { location, .. } = *binding {
                interface.inputs.push(location_of(module, location, ty));
            }
        }
    }

    if let Some(result) = &entry.function.result {
        for (binding, ty) in bindings_of(module, result.ty, result.binding.as_ref()) {
            match *binding {
                Binding::Location { location, .. } => {
                    interface.outputs.push(location_of(module, location, ty));
                }
                Binding::BuiltIn(BuiltIn::Position { .. }) => interface.writes_position = true,
                Binding::BuiltIn(_) => {}
            }
        }
    }

    interface.inputs.sort();
    interface.outputs.sort();
    interface
}

/// Flattens a binding-less struct argument or result into its members.
fn bindings_of<'a>(
    module: &'a Module,
    ty: Handle<Type>,
    binding: Option<&'a Binding>,
) -> Vec<(&'a Binding, Handle<Type>)> {
    if let Some(binding) = binding {
        return vec![(binding, ty)];
    }
    match module.types[ty].inner {
        TypeInner::Struct { ref members, .. } => members
            .iter()
            .filter_map(|member| member.binding.as_ref().map(|binding| (binding, member.ty)))
            .collect(),
        _ => Vec::new(),
    }
}

fn location_of(module: &Module, location: u32, ty: Handle<Type>) -> Location {
    let components = match module.types[ty].inner {
        TypeInner::Scalar {
            kind: ScalarKind::Float,
            width: 4,
        } => Some(1),
        TypeInner::Vector {
            size,
            kind: ScalarKind::Float,
            width: 4,
        } => Some(size as u32),
        _ => None,
    };
    Location {
        location,
        components,
    }
}

fn is_mat4(module: &Module, ty: Handle<Type>) -> bool {
    match module.types[ty].inner {
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            width: 4,
        } => true,
        TypeInner::Struct { ref members, .. } => {
            matches!(members.as_slice(), [member] if is_mat4(module, member.ty))
        }
        _ => false,
    }
}
