// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const BASIC: &str = r#"
version = 3
name = "misty-step"

[sprites.bramble]
definition = "personas/bramble.md"
fallback = true

[sprites.fern]
definition = "personas/fern.md"
preference = "misty-step/bitterblossom"
provider = "anthropic"
model = "opus"
"#;

fn write_composition(text: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.toml");
    std::fs::write(&path, text).unwrap();
    (dir, path)
}

#[test]
fn loads_and_sorts_sprites() {
    let (_dir, path) = write_composition(BASIC);
    let comp = Composition::load(&path).unwrap();
    assert_eq!(comp.version, 3);
    assert_eq!(comp.name, "misty-step");
    assert_eq!(comp.source_path, path);
    let names: Vec<&str> = comp.sprites.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["bramble", "fern"]);
    assert!(comp.sprites[0].fallback);
    assert!(!comp.sprites[1].fallback);
    assert_eq!(comp.sprites[1].model.as_deref(), Some("opus"));
}

#[test]
fn sprite_specs_derive_persona_from_definition_stem() {
    let (_dir, path) = write_composition(BASIC);
    let comp = Composition::load(&path).unwrap();
    let specs = comp.sprite_specs().unwrap();
    assert_eq!(specs[0].persona, "bramble");
    assert_eq!(specs[1].persona, "fern");
    assert_eq!(specs[1].definition, PathBuf::from("personas/fern.md"));
}

#[test]
fn config_version_renders_as_string() {
    let (_dir, path) = write_composition(BASIC);
    let comp = Composition::load(&path).unwrap();
    assert_eq!(comp.config_version(), "3");
}

#[test]
fn zero_version_renders_empty() {
    assert_eq!(config_version_string(0), "");
    assert_eq!(config_version_string(7), "7");
}

#[yare::parameterized(
    zero_version = { "version = 0\nname = \"x\"\n" },
    missing_version = { "name = \"x\"\n" },
    empty_name = { "version = 1\nname = \"  \"\n" },
)]
fn rejects_invalid_header(text: &str) {
    let (_dir, path) = write_composition(text);
    assert!(Composition::load(&path).is_err());
}

#[test]
fn rejects_invalid_sprite_name() {
    let (_dir, path) = write_composition(
        r#"
version = 1
name = "x"

[sprites.Bad-Name]
definition = "p.md"
"#,
    );
    assert!(matches!(Composition::load(&path), Err(ComposeError::BadSpriteName(_))));
}

#[test]
fn rejects_empty_definition() {
    let (_dir, path) = write_composition(
        r#"
version = 1
name = "x"

[sprites.fern]
definition = ""
"#,
    );
    assert!(matches!(Composition::load(&path), Err(ComposeError::EmptyDefinition(_))));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(Composition::load(&path), Err(ComposeError::Read { .. })));
}

#[test]
fn provider_block_form_parses() {
    let (_dir, path) = write_composition(
        r#"
version = 2
name = "x"

[sprites.moss]
definition = "personas/moss.md"

[sprites.moss.provider]
name = "bedrock"
region = "us-east-1"
"#,
    );
    let comp = Composition::load(&path).unwrap();
    let provider = comp.sprites[0].provider.as_ref().unwrap();
    assert_eq!(provider.name, "bedrock");
    assert_eq!(provider.additional.get("region").map(String::as_str), Some("us-east-1"));
}
