//! Integration Test: Core Boundaries
//!
//! **Policy**: `companion-core` is headless. It MUST NOT depend on terminal or
//! UI crates, and its sources MUST NOT name them. Surfaces depend on the
//! core, never the other way round.

use std::fs;

use architectural_enforcement::{code_part, read_lines, rust_sources, workspace_root};

const FORBIDDEN_CRATES: &[&str] = &["ratatui", "crossterm", "tokio", "companion-tui", "companion_tui"];

fn dependency_names(manifest: &str) -> Vec<String> {
    let mut in_deps = false;
    let mut names = Vec::new();
    for line in manifest.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_deps = line.ends_with("dependencies]");
            continue;
        }
        if in_deps && !line.is_empty() && !line.starts_with('#') {
            if let Some((name, _)) = line.split_once('=') {
                names.push(name.trim().to_string());
            }
        }
    }
    names
}

#[test]
fn test_core_manifest_has_no_ui_dependencies() {
    let path = workspace_root().join("companion/core/Cargo.toml");
    let manifest = fs::read_to_string(&path).expect("read core manifest");
    let deps = dependency_names(&manifest);

    assert!(deps.iter().any(|d| d == "tracing"), "parsed {deps:?}");
    for forbidden in FORBIDDEN_CRATES {
        assert!(
            !deps.iter().any(|d| d == forbidden),
            "companion-core must not depend on {forbidden}"
        );
    }
}

#[test]
fn test_core_sources_do_not_use_ui_crates() {
    let mut violations = Vec::new();
    for path in rust_sources("companion/core/src") {
        for (idx, line) in read_lines(&path).iter().enumerate() {
            let code = code_part(line);
            for forbidden in ["ratatui::", "crossterm::", "tokio::"] {
                if code.contains(forbidden) {
                    violations.push(format!("{}:{} - {}", path.display(), idx + 1, line.trim()));
                }
            }
        }
    }
    assert!(violations.is_empty(), "UI crates used in core:\n{}", violations.join("\n"));
}

#[test]
fn test_tui_depends_on_core() {
    let path = workspace_root().join("tui/Cargo.toml");
    let manifest = fs::read_to_string(&path).expect("read tui manifest");
    assert!(dependency_names(&manifest).iter().any(|d| d == "companion-core"));
}

#[test]
fn test_dependency_parser() {
    let manifest = "[package]\nname = \"x\"\n\n[dependencies]\n# comment\nserde = \"1\"\n\n[dev-dependencies]\ntempfile = \"3\"\n";
    assert_eq!(dependency_names(manifest), vec!["serde", "tempfile"]);
}
