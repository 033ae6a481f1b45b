use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec3, Vec4};
use log::debug;
use roxmltree::{Document, Node};

use crate::camera::{Camera, CameraUniform};
use crate::kernel::{ColourProgram, LitProgram, NormalProgram, ShaderProgram};
use crate::program::ShaderKind;
use crate::vertex::{ColourVertex, LitVertex, NormalVertex};

/// A set of vertex samples evaluated under one camera.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSet {
    pub view_proj: Mat4,
    pub probes: Vec<Probe>,
}

/// One vertex run through a program's vertex and fragment stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub name: String,
    pub program: ShaderKind,
    pub position: Vec3,
    pub normal: Option<Vec3>,
    pub colour: Option<Vec3>,
}

/// Clip position and fragment colour produced for a probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeResult {
    pub clip_position: Vec4,
    pub colour: Vec4,
}

impl ProbeSet {
    /// Parses a `<probes>` document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid probe XML")?;
        let root = document.root_element();

        let camera = root.children().find(|n| n.has_tag_name("camera"));
        let view_proj = match (camera, optional_text(&root, "view-proj")) {
            (Some(_), Some(_)) => {
                return Err(anyhow!("<camera> and <view-proj> are mutually exclusive"));
            }
            (Some(camera), None) => parse_camera(&camera)?,
            (None, Some(values)) => parse_matrix(&values)?,
            (None, None) => Mat4::IDENTITY,
        };

        let mut probes = Vec::new();
        for node in root.children().filter(|n| n.has_tag_name("probe")) {
            let name = required_text(&node, "name")?;
            let probe = parse_probe(&node, name.clone())
                .with_context(|| format!("invalid probe `{name}`"))?;
            probes.push(probe);
        }

        Ok(Self { view_proj, probes })
    }

    /// Evaluates every probe, in document order.
    pub fn evaluate(&self) -> Result<Vec<ProbeResult>> {
        let camera = CameraUniform::from_matrix(self.view_proj);
        self.probes
            .iter()
            .map(|probe| {
                probe
                    .evaluate(&camera)
                    .with_context(|| format!("probe `{}`", probe.name))
            })
            .collect()
    }
}

impl Probe {
    pub fn evaluate(&self, camera: &CameraUniform) -> Result<ProbeResult> {
        let result = match self.program {
            ShaderKind::Colour => run(
                ColourProgram,
                camera,
                ColourVertex::new(self.position, self.require_colour()?),
            ),
            ShaderKind::Normal => run(
                NormalProgram,
                camera,
                NormalVertex::new(self.position, self.require_normal()?),
            ),
            ShaderKind::Lit => run(
                LitProgram,
                camera,
                LitVertex::new(self.position, self.require_normal()?, self.require_colour()?),
            ),
        };
        debug!("{} ({}): {result:?}", self.name, self.program);
        Ok(result)
    }

    fn require_normal(&self) -> Result<Vec3> {
        self.normal
            .ok_or_else(|| anyhow!("the {} program needs a <normal>", self.program))
    }

    fn require_colour(&self) -> Result<Vec3> {
        self.colour
            .ok_or_else(|| anyhow!("the {} program needs a <colour>", self.program))
    }
}

fn run<P: ShaderProgram>(program: P, camera: &CameraUniform, vertex: P::Vertex) -> ProbeResult {
    let out = program.vertex(camera, &vertex);
    ProbeResult {
        clip_position: out.clip_position,
        colour: program.fragment(out.varyings),
    }
}

fn parse_probe(node: &Node<'_, '_>, name: String) -> Result<Probe> {
    let program = required_text(node, "program")?.parse::<ShaderKind>()?;
    Ok(Probe {
        name,
        program,
        position: parse_vec3(&required_text(node, "position")?)?,
        normal: optional_text(node, "normal")
            .map(|value| parse_vec3(&value))
            .transpose()?,
        colour: optional_text(node, "colour")
            .or_else(|| optional_text(node, "color"))
            .map(|value| parse_vec3(&value))
            .transpose()?,
    })
}

fn parse_camera(node: &Node<'_, '_>) -> Result<Mat4> {
    let mut camera = Camera::default();
    if let Some(eye) = optional_text(node, "eye") {
        camera.eye = parse_vec3(&eye).context("invalid camera <eye>")?;
    }
    if let Some(direction) = optional_text(node, "direction") {
        camera.direction = parse_vec3(&direction).context("invalid camera <direction>")?;
    }
    if let Some(fov) = optional_text(node, "fov") {
        let degrees = parse_f32(&fov)?;
        if !(degrees > 0.0 && degrees < 180.0) {
            return Err(anyhow!("camera <fov> must be between 0 and 180 degrees, got {degrees}"));
        }
        camera.fov = degrees.to_radians();
    }
    if let Some(aspect) = optional_text(node, "aspect") {
        camera.aspect = parse_f32(&aspect)?;
        if !(camera.aspect > 0.0) {
            return Err(anyhow!("camera <aspect> must be positive, got {}", camera.aspect));
        }
    }
    if camera.direction.length_squared() <= f32::EPSILON {
        return Err(anyhow!("camera <direction> must be non-zero"));
    }
    // look_to_rh needs a direction that is not parallel to the up axis.
    if camera.direction.normalize().cross(Vec3::Y).length_squared() <= f32::EPSILON {
        return Err(anyhow!("camera <direction> must not point straight up or down"));
    }
    let view_proj = camera.view_proj();
    if !view_proj.is_finite() {
        return Err(anyhow!("camera produces a non-finite view-projection"));
    }
    Ok(view_proj)
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_floats(value: &str) -> Result<Vec<f32>> {
    value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("failed to parse `{component}`: {err}"))
        })
        .collect()
}

fn parse_vec3(value: &str) -> Result<Vec3> {
    match parse_floats(value)?.as_slice() {
        &[x, y, z] => Ok(Vec3::new(x, y, z)),
        other => Err(anyhow!("expected 3 components, found {}", other.len())),
    }
}

/// Sixteen floats in column-major order, as uploaded to the uniform.
fn parse_matrix(value: &str) -> Result<Mat4> {
    let values = parse_floats(value).context("invalid <view-proj>")?;
    let columns: &[f32; 16] = values
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("<view-proj> needs 16 components, found {}", values.len()))?;
    let view_proj = Mat4::from_cols_array(columns);
    if !view_proj.is_finite() {
        return Err(anyhow!("<view-proj> contains non-finite components"));
    }
    Ok(view_proj)
}

fn parse_f32(value: &str) -> Result<f32> {
    value
        .parse::<f32>()
        .map_err(|err| anyhow!("failed to parse float: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <probes>
        <probe>
            <name>corner</name>
            <program>lit</program>
            <position>1 2 3</position>
            <normal>0 0 1</normal>
            <colour>1 0 0</colour>
        </probe>
        <probe>
            <name>flat</name>
            <program>normal</program>
            <position>0 0 0</position>
            <normal>0 0 0</normal>
        </probe>
    </probes>
    "#;

    #[test]
    fn probes_without_camera_use_identity() {
        let set = ProbeSet::from_xml(SAMPLE).unwrap();
        assert_eq!(set.view_proj, Mat4::IDENTITY);
        assert_eq!(set.probes.len(), 2);
        assert_eq!(set.probes[0].program, ShaderKind::Lit);
        assert_eq!(set.probes[1].colour, None);

        let results = set.evaluate().unwrap();
        assert_eq!(results[0].clip_position, Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(results[0].colour, Vec4::new(0.75, 0.0, 0.0, 1.0));
        assert_eq!(results[1].colour, Vec4::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn explicit_matrix_is_column_major() {
        let xml = r#"
        <probes>
            <view-proj>2 0 0 0  0 2 0 0  0 0 2 0  1 1 1 1</view-proj>
            <probe>
                <name>p</name>
                <program>colour</program>
                <position>1 1 1</position>
                <color>0.2 0.4 0.6</color>
            </probe>
        </probes>
        "#;
        let set = ProbeSet::from_xml(xml).unwrap();
        let results = set.evaluate().unwrap();
        assert_eq!(results[0].clip_position, Vec4::new(3.0, 3.0, 3.0, 1.0));
        assert_eq!(results[0].colour, Vec4::new(0.2, 0.4, 0.6, 1.0));
    }

    #[test]
    fn camera_block_builds_view_projection() {
        let xml = r#"
        <probes>
            <camera>
                <eye>0 0 5</eye>
                <direction>0 0 -1</direction>
                <fov>90</fov>
                <aspect>1</aspect>
            </camera>
        </probes>
        "#;
        let set = ProbeSet::from_xml(xml).unwrap();
        let camera = Camera {
            eye: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::NEG_Z,
            fov: 90f32.to_radians(),
            aspect: 1.0,
        };
        assert_eq!(set.view_proj, camera.view_proj());
        // The origin sits five units in front of the eye.
        let clip = set.view_proj * Vec4::W;
        assert!((clip.w - 5.0).abs() < 1e-5);
    }

    fn camera_error(camera: &str) -> String {
        let xml = format!("<probes><camera>{camera}</camera></probes>");
        let err = ProbeSet::from_xml(&xml).unwrap_err();
        format!("{err:#}")
    }

    #[test]
    fn direction_along_up_axis_is_rejected() {
        let message = camera_error("<eye>0 5 0</eye><direction>0 -1 0</direction>");
        assert!(message.contains("straight up or down"), "{message}");
        let message = camera_error("<direction>0 2 0</direction>");
        assert!(message.contains("straight up or down"), "{message}");
    }

    #[test]
    fn degenerate_projection_is_rejected() {
        assert!(camera_error("<aspect>0</aspect>").contains("<aspect>"));
        assert!(camera_error("<aspect>-1.5</aspect>").contains("<aspect>"));
        assert!(camera_error("<fov>0</fov>").contains("<fov>"));
        assert!(camera_error("<fov>180</fov>").contains("<fov>"));
        assert!(camera_error("<fov>NaN</fov>").contains("<fov>"));
        assert!(camera_error("<direction>0 0 0</direction>").contains("non-zero"));
    }

    #[test]
    fn non_finite_matrix_is_rejected() {
        let xml = "<probes><view-proj>inf 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1</view-proj></probes>";
        let message = format!("{:#}", ProbeSet::from_xml(xml).unwrap_err());
        assert!(message.contains("non-finite"), "{message}");
    }

    #[test]
    fn camera_and_matrix_together_are_rejected() {
        let xml = r#"
        <probes>
            <camera><eye>0 0 5</eye></camera>
            <view-proj>1 0 0 0  0 1 0 0  0 0 1 0  0 0 0 1</view-proj>
        </probes>
        "#;
        let message = format!("{:#}", ProbeSet::from_xml(xml).unwrap_err());
        assert!(message.contains("mutually exclusive"), "{message}");
    }

    #[test]
    fn missing_attribute_names_the_probe() {
        let xml = r#"
        <probes>
            <probe>
                <name>bare</name>
                <program>lit</program>
                <position>0 0 0</position>
                <colour>1 1 1</colour>
            </probe>
        </probes>
        "#;
        let set = ProbeSet::from_xml(xml).unwrap();
        let err = set.evaluate().unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("bare"), "{message}");
        assert!(message.contains("<normal>"), "{message}");
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(ProbeSet::from_xml("<probes><probe><program>lit</program></probe></probes>")
            .is_err());
        let bad_vector = r#"<probes><probe><name>p</name><program>colour</program>
            <position>1 2</position><colour>1 1 1</colour></probe></probes>"#;
        assert!(ProbeSet::from_xml(bad_vector).is_err());
        let bad_program = r#"<probes><probe><name>p</name><program>phong</program>
            <position>1 2 3</position></probe></probes>"#;
        assert!(ProbeSet::from_xml(bad_program).is_err());
        assert!(ProbeSet::from_xml("<probes><view-proj>1 0 0</view-proj></probes>").is_err());
    }
}
