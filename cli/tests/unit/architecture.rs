//! Structural tests for layer boundaries.
//!
//! Scans source files so that `domain` stays pure and `application` never
//! reaches into infrastructure or presentation.

use std::path::{Path, PathBuf};

fn src_dir(layer: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(layer)
}

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Lines of `path` that reference any of `forbidden`, skipping comments.
fn violations(path: &Path, forbidden: &[&str]) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim_start().starts_with("//"))
        .filter(|(_, l)| forbidden.iter().any(|f| l.contains(f)))
        .map(|(n, l)| format!("{}:{}: {}", path.display(), n + 1, l.trim()))
        .collect()
}

fn assert_layer_clean(layer: &str, forbidden: &[&str]) {
    let files = collect_rs_files(&src_dir(layer));
    assert!(!files.is_empty(), "no sources found for {layer}");
    let found: Vec<String> = files
        .iter()
        .flat_map(|f| violations(f, forbidden))
        .collect();
    assert!(
        found.is_empty(),
        "{layer} crosses a layer boundary:\n{}",
        found.join("\n")
    );
}

#[test]
fn domain_has_no_io_dependencies() {
    assert_layer_clean(
        "domain",
        &[
            "crate::application",
            "crate::infra",
            "crate::commands",
            "crate::output",
            "tokio::",
            "reqwest::",
            "std::process",
            "std::fs",
            "clap",
        ],
    );
}

#[test]
fn application_depends_only_on_domain() {
    assert_layer_clean(
        "application",
        &[
            "crate::infra",
            "crate::commands",
            "crate::output",
            "reqwest::",
            "std::process",
            "std::fs",
        ],
    );
}
