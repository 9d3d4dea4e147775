//! End-to-end CLI tests.
//!
//! These drive the compiled `shelf` binary against a temporary database.
//! Commands that need embeddings point the Ollama provider at a mock
//! endpoint hosted inside the test process.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

const DIMS: usize = 768;

fn shelf_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("shelf");
    path
}

/// Token-hash embeddings, same vector for the same text every time.
fn mock_embedding(text: &str, dims: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dims];
    for token in text.split_whitespace() {
        let mut hasher = DefaultHasher::new();
        token.to_lowercase().hash(&mut hasher);
        vec[(hasher.finish() % dims as u64) as usize] += 1.0;
    }
    vec
}

/// Host a mock Ollama embed endpoint on a background thread; returns its
/// base URL. The thread runs for the rest of the test process.
fn spawn_mock_embedder() -> String {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let listener = runtime
        .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
        .unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        runtime.block_on(async move {
            let app = axum::Router::new().route(
                "/api/embed",
                axum::routing::post(|axum::Json(body): axum::Json<serde_json::Value>| async move {
                    let inputs = body
                        .get("input")
                        .and_then(|i| i.as_array())
                        .cloned()
                        .unwrap_or_default();
                    let embeddings: Vec<Vec<f32>> = inputs
                        .iter()
                        .map(|t| mock_embedding(t.as_str().unwrap_or(""), DIMS))
                        .collect();
                    axum::Json(serde_json::json!({ "embeddings": embeddings }))
                }),
            );
            axum::serve(listener, app).await.unwrap();
        });
    });

    format!("http://{}", addr)
}

fn setup_test_env(embedding_section: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/shelf.sqlite"

{}

[server]
bind = "127.0.0.1:7878"
"#,
        root.display(),
        embedding_section
    );
    let config_path = config_dir.join("shelf.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn ollama_section(url: &str) -> String {
    format!(
        r#"[embedding]
provider = "ollama"
model = "mock-embed"
dims = 768
url = "{}"
max_retries = 0
"#,
        url
    )
}

fn run_shelf(config: &PathBuf, args: &[&str]) -> std::process::Output {
    Command::new(shelf_binary())
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("failed to run shelf binary")
}

#[test]
fn test_init_creates_database() {
    let (tmp, config) = setup_test_env("");

    let output = run_shelf(&config, &["init"]);
    assert!(
        output.status.success(),
        "init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("initialized"));
    assert!(tmp.path().join("data/shelf.sqlite").exists());
}

#[test]
fn test_init_is_idempotent() {
    let (_tmp, config) = setup_test_env("");

    assert!(run_shelf(&config, &["init"]).status.success());
    assert!(run_shelf(&config, &["init"]).status.success());
}

#[test]
fn test_stats_on_empty_database() {
    let (_tmp, config) = setup_test_env("");

    assert!(run_shelf(&config, &["init"]).status.success());

    let output = run_shelf(&config, &["stats"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("books: 0"));
    assert!(stdout.contains("768 dims"));
}

#[test]
fn test_add_fails_when_embeddings_disabled() {
    let (_tmp, config) = setup_test_env("");

    assert!(run_shelf(&config, &["init"]).status.success());

    let output = run_shelf(
        &config,
        &["add", "Dune", "Frank Herbert", "12.99", "A desert planet"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("requires embeddings"));
}

#[test]
fn test_add_rejects_negative_price() {
    let url = spawn_mock_embedder();
    let (_tmp, config) = setup_test_env(&ollama_section(&url));

    assert!(run_shelf(&config, &["init"]).status.success());

    let output = run_shelf(
        &config,
        &["add", "Dune", "Frank Herbert", "--", "-1.0", "A desert planet"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("price"));
}

#[test]
fn test_add_and_fuzzy_search() {
    let url = spawn_mock_embedder();
    let (_tmp, config) = setup_test_env(&ollama_section(&url));

    assert!(run_shelf(&config, &["init"]).status.success());

    let output = run_shelf(
        &config,
        &[
            "add",
            "Wizard School",
            "J. Author",
            "15.50",
            "a young wizard attends a school of magic",
            "--copies-sold",
            "5000",
        ],
    );
    assert!(
        output.status.success(),
        "add failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Wizard School"));

    // One edit away from "wizard"
    let output = run_shelf(&config, &["search", "wizzard", "--mode", "fuzzy"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Wizard School"));
}

#[test]
fn test_add_and_semantic_search() {
    let url = spawn_mock_embedder();
    let (_tmp, config) = setup_test_env(&ollama_section(&url));

    assert!(run_shelf(&config, &["init"]).status.success());

    for (name, author, description) in [
        (
            "Space Opera",
            "A. Writer",
            "a starship crew explores distant galaxies and alien worlds",
        ),
        (
            "Cookbook",
            "B. Chef",
            "hearty soups and stews for cold winter evenings",
        ),
    ] {
        let output = run_shelf(&config, &["add", name, author, "9.99", description]);
        assert!(
            output.status.success(),
            "add failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let output = run_shelf(
        &config,
        &["search", "starship crew explores alien worlds", "--mode", "semantic"],
    );
    assert!(
        output.status.success(),
        "search failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("starship"));
}

#[test]
fn test_search_empty_catalog() {
    let (_tmp, config) = setup_test_env("");

    assert!(run_shelf(&config, &["init"]).status.success());

    let output = run_shelf(&config, &["search", "anything", "--mode", "fuzzy"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No results"));
}

#[test]
fn test_search_rejects_unknown_mode() {
    let (_tmp, config) = setup_test_env("");

    assert!(run_shelf(&config, &["init"]).status.success());

    let output = run_shelf(&config, &["search", "anything", "--mode", "regex"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("mode"));
}

#[test]
fn test_rejects_invalid_config() {
    let (_tmp, config) = setup_test_env("[search.vector]\nmetric = \"dot\"");

    let output = run_shelf(&config, &["init"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("metric"));
}
