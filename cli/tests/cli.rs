use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};
use tempfile::TempDir;

fn literate(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_literate"))
        .current_dir(dir)
        .arg("--no-color")
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run literate")
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

const README: &str = "\
# Server

```js file://src/server.js
listen(3000);
```

```bash rmsm://startup
node src/server.js
```

# Client

```js
fetch('/');
```
";

#[test]
fn build_prints_the_filesystem_as_json() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "README.md", README);

    let output = literate(dir.path(), &["build", "README.md"]);
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        json!({
            "filesystem": {
                "client-1.js": { "file": { "contents": "fetch('/');" } },
                "src": { "directory": { "server.js": { "file": { "contents": "listen(3000);" } } } }
            },
            "startup": "node src/server.js"
        })
    );
}

#[test]
fn bare_file_argument_means_build() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "README.md", README);

    let output = literate(dir.path(), &["README.md", "--id", "client"]);
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        json!({ "filesystem": { "client-1.js": { "file": { "contents": "fetch('/');" } } } })
    );
}

#[test]
fn documents_are_merged_in_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.md", "```bash rmsm://startup\nnpm install\n```\n\n```txt file://x\nfile\n```\n");
    write(dir.path(), "b.md", "```bash rmsm://startup\nnpm start\n```\n\n```txt file://x/y.txt\nnested\n```\n");

    let output = literate(dir.path(), &["build", "a.md", "b.md"]);
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert_eq!(value["startup"], json!("npm install\nnpm start"));
    assert_eq!(value["filesystem"]["x"], json!({ "file": { "contents": "file" } }));
    assert_eq!(
        value["errors"],
        json!(["x is defined as both a file and a directory"])
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("x is defined as both a file and a directory"));
}

#[test]
fn check_fails_on_diagnostics() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "bad.md", "```js rmsm://bogus\nx\n```\n");
    write(dir.path(), "good.md", "```js file://ok.js\nx\n```\n");

    let bad = literate(dir.path(), &["build", "--check", "bad.md"]);
    assert_eq!(bad.status.code(), Some(1));
    assert!(bad.stdout.is_empty());
    assert!(String::from_utf8_lossy(&bad.stderr).contains("Invalid rmsm protocol value: bogus"));

    let good = literate(dir.path(), &["build", "--check", "good.md"]);
    assert!(good.status.success());
}

#[test]
fn manifest_supplies_documents_and_ids() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "docs/guide.md", README);
    write(
        dir.path(),
        "literate.toml",
        "documents = [\"docs/guide.md\"]\nids = [\"server\"]\n",
    );

    let output = literate(dir.path(), &["build"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let value = stdout_json(&output);
    assert_eq!(value["startup"], json!("node src/server.js"));
    assert!(value["filesystem"].get("client-1.js").is_none());
}

#[test]
fn malformed_manifest_is_reported() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "literate.toml", "documents = \"not a list\"\n");

    let output = literate(dir.path(), &["build"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid manifest"));
}

#[test]
fn missing_document_is_reported() {
    let dir = TempDir::new().unwrap();
    let output = literate(dir.path(), &["build", "nope.md"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read 'nope.md'"));
}

#[test]
fn tree_output_lists_directories_and_startup() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "README.md", README);

    let output = literate(dir.path(), &["build", "--tree", "README.md"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "client-1.js\nsrc/\n  server.js\n\nstartup:\n  node src/server.js\n"
    );
}

#[test]
fn blocks_listing_shows_inclusion_and_targets() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "README.md", README);

    let output = literate(dir.path(), &["build", "--blocks", "--id", "server", "README.md"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "README.md");
    assert!(lines[1].starts_with("  + "));
    assert!(lines[1].contains("src/server.js  [# Server]"));
    assert!(lines[2].contains("rmsm://startup"));
    assert!(lines[3].starts_with("  - "));
    assert!(lines[3].contains("(unnamed)  [# Client]"));
}

#[test]
fn fixtures_pass() {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let output = literate(&fixtures, &["test", "."]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{}", stderr);
    assert!(stderr.contains("9 passed, 0 failed"));
}

#[test]
fn failing_fixture_is_reported() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "wrong.test.md",
        "---\nexpect_files = { \"a.txt\" = \"expected\" }\n---\n```txt file://a.txt\nactual\n```\n",
    );

    let output = literate(dir.path(), &["test", "wrong.test.md"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("FAIL  wrong"));
    assert!(stderr.contains("contents mismatch in a.txt"));
}

#[test]
fn categories_filter_fixtures() {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let output = literate(&fixtures, &["test", ".", "-c", "errors"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{}", stderr);
    assert!(stderr.contains("3 passed, 0 failed"));
    assert!(!stderr.contains("naming"));
}
