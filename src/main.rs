use std::env;
use std::fs;

use anyhow::{anyhow, Context, Result};
use glam::Vec4;

use flatshade::binding::{
    CAMERA_BINDING, CAMERA_GROUP, FRAGMENT_OUTPUT_LOCATION, VERTEX_BUFFER_SLOT,
};
use flatshade::{reflect, CameraUniform, ProbeSet, ShaderKind};

const USAGE: &str = "Usage: flatshade <source|layout> <colour|normal|lit>\n       flatshade verify\n       flatshade eval <probes.xml>";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    match CliOptions::parse()? {
        CliOptions::Source(kind) => {
            print!("{}", kind.source());
            Ok(())
        }
        CliOptions::Layout(kind) => {
            print_layout(kind);
            Ok(())
        }
        CliOptions::Verify => verify_all(),
        CliOptions::Eval(path) => eval(&path),
    }
}

fn print_layout(kind: ShaderKind) {
    let layout = kind.vertex_layout();
    println!(
        "{kind}: stride {} bytes, vertex buffer slot {VERTEX_BUFFER_SLOT}",
        layout.array_stride
    );
    for attribute in layout.attributes {
        println!(
            "  @location({}) {:?} offset {}",
            attribute.shader_location, attribute.format, attribute.offset
        );
    }
    println!(
        "  camera @group({CAMERA_GROUP}) @binding({CAMERA_BINDING}) mat4x4<f32> ({} bytes)",
        CameraUniform::SIZE
    );
    println!("  output @location({FRAGMENT_OUTPUT_LOCATION}) vec4<f32>");
}

fn verify_all() -> Result<()> {
    let mut failures = 0;
    for kind in ShaderKind::ALL {
        match reflect::verify(kind) {
            Ok(reflection) => println!(
                "{kind}: ok ({} vertex inputs, {} varyings)",
                reflection.vertex.inputs.len(),
                reflection.vertex.outputs.len()
            ),
            Err(err) => {
                println!("{kind}: FAILED: {err}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        return Err(anyhow!("{failures} program(s) break the binding contract"));
    }
    Ok(())
}

fn eval(path: &str) -> Result<()> {
    let xml = fs::read_to_string(path).with_context(|| format!("unable to read {path}"))?;
    let set = ProbeSet::from_xml(&xml).with_context(|| format!("failed to parse {path}"))?;
    let results = set.evaluate()?;

    println!("Loaded {} probe(s)", set.probes.len());
    for (probe, result) in set.probes.iter().zip(results) {
        println!(
            " - {} ({}) clip={} colour={}",
            probe.name,
            probe.program,
            format_vec4(result.clip_position),
            format_vec4(result.colour)
        );
    }
    Ok(())
}

fn format_vec4(value: Vec4) -> String {
    format!(
        "({:.2}, {:.2}, {:.2}, {:.2})",
        value.x, value.y, value.z, value.w
    )
}

enum CliOptions {
    Source(ShaderKind),
    Layout(ShaderKind),
    Verify,
    Eval(String),
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(command) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        let options = match command.as_str() {
            "source" | "layout" => {
                let Some(name) = args.next() else {
                    return Err(anyhow!("`{command}` needs a program name\n{USAGE}"));
                };
                let kind = name.parse::<ShaderKind>()?;
                if command == "source" {
                    Self::Source(kind)
                } else {
                    Self::Layout(kind)
                }
            }
            "verify" => Self::Verify,
            "eval" => {
                let Some(path) = args.next() else {
                    return Err(anyhow!("`eval` needs a probe file\n{USAGE}"));
                };
                Self::Eval(path)
            }
            other => return Err(anyhow!("Unknown command: {other}\n{USAGE}")),
        };
        if let Some(extra) = args.next() {
            return Err(anyhow!("Unexpected argument: {extra}\n{USAGE}"));
        }
        Ok(options)
    }
}
