use annotator_patcher::{patch_document, PatcherConfig, PomDocument, ScratchDir};
use std::fs;

const SCRATCH_PLACEHOLDER: &str = "@SCRATCH@";

fn load_fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|err| panic!("failed to load fixture {name}: {err}"))
}

/// Patch `input` and return the rendering with the scratch path normalized.
fn patch_fixture(input: &str) -> (String, usize) {
    let base = tempfile::tempdir().expect("tempdir");
    let scratch = ScratchDir::create_in(base.path()).expect("scratch");

    let mut document = PomDocument::parse(input).expect("parse fixture");
    let summary =
        patch_document(&mut document, &PatcherConfig::default(), &scratch).expect("patch");

    let scratch_path = scratch.annotator_dir().display().to_string();
    let rendered = document.render().replace(&scratch_path, SCRATCH_PLACEHOLDER);
    (rendered, summary.rewritten_args)
}

#[test]
fn patch_existing_processor_paths_fixture() {
    let input = load_fixture("pom.xml.input");
    let expected = load_fixture("pom.xml.expected");

    let (output, rewritten) = patch_fixture(&input);

    assert_eq!(output, expected);
    assert_eq!(rewritten, 1);
}

#[test]
fn patch_plugin_without_configuration_fixture() {
    let input = load_fixture("bare-plugin.xml.input");
    let expected = load_fixture("bare-plugin.xml.expected");

    let (output, rewritten) = patch_fixture(&input);

    assert_eq!(output, expected);
    assert_eq!(rewritten, 0);
}

#[test]
fn untouched_fixture_round_trips() {
    for name in ["pom.xml.input", "bare-plugin.xml.input"] {
        let input = load_fixture(name);
        let document = PomDocument::parse(&input).expect("parse fixture");
        assert_eq!(document.render(), input, "{name} did not round-trip");
    }
}
