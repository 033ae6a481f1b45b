use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::vertex::{ColourVertex, LitVertex, NormalVertex};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

const COLOUR_SOURCE: &str = include_str!("shaders/colour.wgsl");
const NORMAL_SOURCE: &str = include_str!("shaders/normal.wgsl");
const LIT_SOURCE: &str = include_str!("shaders/lit.wgsl");

/// The shader programs shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Vertex colour passed straight through.
    Colour,
    /// Normal remapped into a visible colour.
    Normal,
    /// Vertex colour modulated by a normal-derived shade.
    Lit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shader program `{0}` (expected colour, normal or lit)")]
pub struct UnknownProgram(pub String);

impl ShaderKind {
    pub const ALL: [ShaderKind; 3] = [Self::Colour, Self::Normal, Self::Lit];

    pub fn name(self) -> &'static str {
        match self {
            Self::Colour => "colour",
            Self::Normal => "normal",
            Self::Lit => "lit",
        }
    }

    pub fn source(self) -> &'static str {
        match self {
            Self::Colour => COLOUR_SOURCE,
            Self::Normal => NORMAL_SOURCE,
            Self::Lit => LIT_SOURCE,
        }
    }

    /// Vertex buffer layout the host must bind at slot 0.
    pub fn vertex_layout(self) -> wgpu::VertexBufferLayout<'static> {
        match self {
            Self::Colour => ColourVertex::layout(),
            Self::Normal => NormalVertex::layout(),
            Self::Lit => LitVertex::layout(),
        }
    }

    /// Number of `vec3<f32>` varyings passed from the vertex to the fragment
    /// stage.
    pub fn varying_count(self) -> usize {
        match self {
            Self::Colour | Self::Normal => 1,
            Self::Lit => 2,
        }
    }

    pub fn shader_module_descriptor(self) -> wgpu::ShaderModuleDescriptor<'static> {
        wgpu::ShaderModuleDescriptor {
            label: Some(self.name()),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(self.source())),
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShaderKind {
    type Err = UnknownProgram;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "colour" | "color" => Ok(Self::Colour),
            "normal" => Ok(Self::Normal),
            "lit" => Ok(Self::Lit),
            _ => Err(UnknownProgram(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in ShaderKind::ALL {
            assert_eq!(kind.name().parse::<ShaderKind>(), Ok(kind));
        }
        assert_eq!("Color".parse::<ShaderKind>(), Ok(ShaderKind::Colour));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = "phong".parse::<ShaderKind>().unwrap_err();
        assert_eq!(err, UnknownProgram("phong".to_string()));
        assert!(err.to_string().contains("phong"));
    }

    #[test]
    fn sources_declare_both_entry_points() {
        for kind in ShaderKind::ALL {
            let source = kind.source();
            assert!(source.contains(&format!("fn {VERTEX_ENTRY}(")), "{kind}");
            assert!(source.contains(&format!("fn {FRAGMENT_ENTRY}(")), "{kind}");
        }
    }

    #[test]
    fn lit_is_the_only_three_attribute_program() {
        assert_eq!(ShaderKind::Lit.vertex_layout().attributes.len(), 3);
        assert_eq!(ShaderKind::Colour.vertex_layout().attributes.len(), 2);
        assert_eq!(ShaderKind::Normal.vertex_layout().attributes.len(), 2);
    }
}
