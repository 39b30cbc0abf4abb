use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use literate::ParseResult;

/// TOML frontmatter of a `.test.md` fixture.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureConfig {
    /// Human-readable fixture description.
    #[serde(default)]
    pub description: Option<String>,

    /// Id filter passed to the parser.
    #[serde(default)]
    pub ids: Vec<String>,

    /// Exact set of files the document must produce, path to contents.
    #[serde(default)]
    pub expect_files: Option<BTreeMap<String, String>>,

    /// Expected startup script. When absent the document must not set one.
    #[serde(default)]
    pub expect_startup: Option<String>,

    /// Expected diagnostics, one substring each, in order. When absent the
    /// document must compile without diagnostics.
    #[serde(default)]
    pub expect_errors: Vec<String>,
}

/// Split a `.test.md` file into its TOML config and Markdown document.
fn split_fixture(content: &str) -> Result<(FixtureConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let document = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: FixtureConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, document))
}

pub struct FixtureResult {
    pub path: PathBuf,
    pub description: Option<String>,
    /// `None` on success, the failure reasons otherwise.
    pub failure: Option<String>,
}

impl FixtureResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(".test.md"))
                .unwrap_or("?")
        })
    }
}

fn run_fixture(path: &Path) -> FixtureResult {
    let failed = |description: Option<String>, reason: String| FixtureResult {
        path: path.to_path_buf(),
        description,
        failure: Some(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return failed(None, format!("cannot read file: {}", e)),
    };

    let (config, document) = match split_fixture(&content) {
        Ok(pair) => pair,
        Err(e) => return failed(None, format!("frontmatter error: {}", e)),
    };

    let ids: Vec<&str> = config.ids.iter().map(String::as_str).collect();
    let result = literate::parse(document, &ids);
    debug!(path = %path.display(), errors = result.errors.len(), "ran fixture");

    let reasons = check_result(&config, &result);
    FixtureResult {
        path: path.to_path_buf(),
        description: config.description,
        failure: if reasons.is_empty() {
            None
        } else {
            Some(reasons.join("\n"))
        },
    }
}

/// Compare a parse result with the fixture's expectations; one reason per
/// mismatch.
fn check_result(config: &FixtureConfig, result: &ParseResult) -> Vec<String> {
    let mut reasons = Vec::new();

    if let Some(expected) = &config.expect_files {
        let actual: BTreeMap<String, String> = result
            .filesystem
            .files()
            .into_iter()
            .map(|(path, contents)| (path, contents.to_string()))
            .collect();

        for (path, contents) in expected {
            match actual.get(path) {
                None => reasons.push(format!("missing file: {}", path)),
                Some(found) if found.trim() != contents.trim() => reasons.push(format!(
                    "contents mismatch in {}\n  expected: {:?}\n  actual:   {:?}",
                    path, contents, found
                )),
                Some(_) => {}
            }
        }
        for path in actual.keys().filter(|path| !expected.contains_key(*path)) {
            reasons.push(format!("unexpected file: {}", path));
        }
    }

    match (&config.expect_startup, &result.startup) {
        (Some(expected), Some(actual)) if expected.trim() != actual.trim() => {
            reasons.push(format!(
                "startup mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            ));
        }
        (Some(_), None) => reasons.push("expected a startup script, got none".into()),
        (None, Some(actual)) => reasons.push(format!("unexpected startup script: {:?}", actual)),
        _ => {}
    }

    let messages = result.error_messages();
    if messages.len() != config.expect_errors.len() {
        reasons.push(format!(
            "expected {} diagnostic(s), got {}\n  actual diagnostics:\n{}",
            config.expect_errors.len(),
            messages.len(),
            if messages.is_empty() {
                "    (none)".to_string()
            } else {
                messages
                    .iter()
                    .map(|m| format!("    - {}", m))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        ));
    } else {
        for (i, (actual, expected)) in messages.iter().zip(&config.expect_errors).enumerate() {
            if !actual.contains(expected.as_str()) {
                reasons.push(format!(
                    "diagnostic[{}]: expected message containing \"{}\", got: {}",
                    i, expected, actual
                ));
            }
        }
    }

    reasons
}

/// Discover `.test.md` files grouped by category (subfolder relative to
/// `root`). A single file is its own, unnamed category.
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    if root.is_file() {
        categories.insert(String::new(), vec![root.to_path_buf()]);
        return categories;
    }
    collect_fixtures(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_fixtures(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_fixtures(&path, root, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(".test.md"))
        {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

/// Keep only the requested categories (and their subcategories).
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut selected = BTreeMap::new();
    for req in requested {
        let req = req.trim_matches('/');
        let before = selected.len();
        for (cat, files) in all {
            if cat == req || cat.starts_with(&format!("{}/", req)) {
                selected.insert(cat.as_str(), files);
            }
        }
        if selected.len() == before {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    selected
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given fixture path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        eprintln!("  {} ({} fixtures)", category_label(cat), files.len());
    }
}

fn paint(text: &str, ansi: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", ansi, text)
    }
}

/// Run all `.test.md` fixtures under `path` (or a single file).
/// If `categories` is non-empty, only run fixtures in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let all = discover_categorized(path);
    if all.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return 1;
    }

    let selected = select_categories(&all, categories);
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<FixtureResult> = Vec::new();

    for (cat, files) in &selected {
        if !path.is_file() {
            eprintln!();
            eprintln!("{}", paint(category_label(cat), "1", no_color));
        }

        for file in *files {
            let result = run_fixture(file);
            if result.failure.is_none() {
                passed += 1;
                eprintln!("  {}  {}", paint("PASS", "32", no_color), result.label());
            } else {
                eprintln!("  {}  {}", paint("FAIL", "31", no_color), result.label());
                failures.push(result);
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            for line in f.failure.iter().flat_map(|reason| reason.lines()) {
                eprintln!("  {}", line);
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", paint("ok", "32", no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}
