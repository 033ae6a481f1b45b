use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_probes(xml: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp probe file");
    tmp.write_all(xml.as_bytes()).expect("write probes");
    tmp
}

#[test]
fn eval_prints_clip_position_and_colour() {
    let probes = write_probes(
        r#"<probes>
  <probe>
    <name>corner</name>
    <program>lit</program>
    <position>1 2 3</position>
    <normal>0 0 1</normal>
    <colour>1 0 0</colour>
  </probe>
  <probe>
    <name>tint</name>
    <program>normal</program>
    <position>0 0 0</position>
    <normal>1 0 0</normal>
  </probe>
</probes>
"#,
    );
    let mut cmd = Command::cargo_bin("flatshade").expect("binary exists");
    cmd.arg("eval").arg(probes.path());
    cmd.assert()
        .success()
        .stdout(contains("Loaded 2 probe(s)"))
        .stdout(contains(
            " - corner (lit) clip=(1.00, 2.00, 3.00, 1.00) colour=(0.75, 0.00, 0.00, 1.00)",
        ))
        .stdout(contains(
            " - tint (normal) clip=(0.00, 0.00, 0.00, 1.00) colour=(1.00, 0.50, 0.50, 1.00)",
        ));
}

#[test]
fn eval_reports_missing_attributes() {
    let probes = write_probes(
        r#"<probes>
  <probe>
    <name>bare</name>
    <program>colour</program>
    <position>0 0 0</position>
  </probe>
</probes>
"#,
    );
    let mut cmd = Command::cargo_bin("flatshade").expect("binary exists");
    cmd.arg("eval").arg(probes.path());
    cmd.assert()
        .failure()
        .stderr(contains("probe `bare`"))
        .stderr(contains("<colour>"));
}

#[test]
fn verify_accepts_every_program() {
    let mut cmd = Command::cargo_bin("flatshade").expect("binary exists");
    cmd.arg("verify");
    cmd.assert()
        .success()
        .stdout(contains("colour: ok (2 vertex inputs, 1 varyings)"))
        .stdout(contains("normal: ok (2 vertex inputs, 1 varyings)"))
        .stdout(contains("lit: ok (3 vertex inputs, 2 varyings)"));
}

#[test]
fn layout_lists_attribute_locations() {
    let mut cmd = Command::cargo_bin("flatshade").expect("binary exists");
    cmd.arg("layout").arg("lit");
    cmd.assert()
        .success()
        .stdout(contains("lit: stride 36 bytes, vertex buffer slot 0"))
        .stdout(contains("@location(2) Float32x3 offset 24"))
        .stdout(contains("camera @group(0) @binding(0) mat4x4<f32> (64 bytes)"));
}

#[test]
fn source_prints_wgsl() {
    let mut cmd = Command::cargo_bin("flatshade").expect("binary exists");
    cmd.arg("source").arg("colour");
    cmd.assert()
        .success()
        .stdout(contains("@group(0) @binding(0)"))
        .stdout(contains("fn vs_main("));
}

#[test]
fn unknown_program_is_rejected() {
    let mut cmd = Command::cargo_bin("flatshade").expect("binary exists");
    cmd.arg("source").arg("phong");
    cmd.assert()
        .failure()
        .stderr(contains("unknown shader program `phong`"));
}
