//! Runs every program under tests/conformance/.
//!
//! `positive/*.nt` must compile cleanly. Each `negative/NAME.nt` must fail
//! with the category and line recorded in `NAME.expected-error.json`; a
//! `message` field there, when present, must match exactly.

use newton_core::{compile_path, CompileOptions};
use std::path::{Path, PathBuf};

fn conformance_dir(kind: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("conformance")
        .join(kind)
}

fn collect_sources(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "nt"))
        .collect();
    paths.sort();
    paths
}

#[test]
fn positive_programs_compile() {
    let mut failures = Vec::new();
    let sources = collect_sources(&conformance_dir("positive"));
    assert!(!sources.is_empty(), "no positive conformance programs found");
    for path in &sources {
        if let Err(e) = compile_path(path, &CompileOptions::default()) {
            failures.push(e.to_string());
        }
    }
    assert!(failures.is_empty(), "failures:\n{}", failures.join("\n"));
}

#[test]
fn negative_programs_fail_as_expected() {
    let mut failures = Vec::new();
    let sources = collect_sources(&conformance_dir("negative"));
    assert!(!sources.is_empty(), "no negative conformance programs found");
    for path in &sources {
        let expected_path = path.with_extension("expected-error.json");
        let expected: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&expected_path).unwrap()).unwrap();

        let err = match compile_path(path, &CompileOptions::default()) {
            Ok(_) => {
                failures.push(format!("{}: compiled without error", path.display()));
                continue;
            }
            Err(e) => e,
        };
        let actual = err.to_json_value();
        for field in ["category", "line", "message"] {
            if let Some(want) = expected.get(field) {
                if actual[field] != *want {
                    failures.push(format!(
                        "{}: {} was {}, expected {}",
                        path.display(),
                        field,
                        actual[field],
                        want
                    ));
                }
            }
        }
    }
    assert!(failures.is_empty(), "failures:\n{}", failures.join("\n"));
}
