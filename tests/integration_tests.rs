//! Integration tests for the aula CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to get an aula command isolated from the user's config and token
fn aula(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("aula").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("XDG_DATA_HOME", home.path().join(".local/share"))
        .env_remove("AULA_TOKEN")
        .env_remove("AULA_API_URL")
        .env_remove("AULA_LOG");
    cmd
}

/// Helper to create a workspace in a temp directory
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    aula(&tmp).current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

const ALL_CORRECT: &str = "4,2,5,6,9,15,10,14";

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("eval"))
        .stdout(predicate::str::contains("play"));
}

#[test]
fn test_completions_generate() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("aula"));
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn test_init_creates_structure() {
    let tmp = setup_workspace();

    assert!(tmp.path().join(".aula/config.yaml").is_file());
    assert!(tmp.path().join(".aula/content").is_dir());
    assert!(tmp.path().join(".aula/outbox").is_dir());
    assert!(tmp.path().join(".aula/sessions").is_dir());
}

#[test]
fn test_init_twice_warns() {
    let tmp = setup_workspace();
    aula(&tmp)
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

// ============================================================================
// Content Tests
// ============================================================================

#[test]
fn test_content_list_kinds() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["content", "list", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("counting\t"))
        .stdout(predicate::str::contains("built-in"));
}

#[test]
fn test_content_list_counting_sets() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["content", "list", "counting", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("oa1-v2\tGranja Contador OA1"));
}

#[test]
fn test_content_show_enigma() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["content", "show", "enigmas", "mystery-lost-numbers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("El Misterio de los Números Perdidos"));
}

#[test]
fn test_content_show_objective_by_code() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["content", "show", "objectives", "MAT05-OA04", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"oa_id\": \"1\""));
}

#[test]
fn test_content_show_unknown_id_fails() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["content", "show", "tools", "crystal_ball"])
        .assert()
        .failure();
}

#[test]
fn test_content_validate_reports_bad_file() {
    let tmp = setup_workspace();
    fs::write(
        tmp.path().join(".aula/content/tools.yaml"),
        "tools:\n  - id: broken\n    cost: cheap\n",
    )
    .unwrap();

    aula(&tmp)
        .current_dir(tmp.path())
        .args(["content", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("tools.yaml"));
}

#[test]
fn test_content_override_is_used() {
    let tmp = setup_workspace();
    fs::write(
        tmp.path().join(".aula/content/skins.yaml"),
        "skins:\n  - id: espacio\n    name: Espacio\n    description: Naves y planetas\n",
    )
    .unwrap();

    aula(&tmp)
        .current_dir(tmp.path())
        .args(["content", "list", "skins", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("espacio\tEspacio"));
}

// ============================================================================
// Evaluation Wizard Tests
// ============================================================================

#[test]
fn test_eval_dry_run_prints_payload() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args([
            "eval",
            "new",
            "--class",
            "class-5b",
            "--title",
            "Fracciones",
            "--oa",
            "MAT05-OA04",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"class_id\": \"class-5b\""))
        .stdout(predicate::str::contains("\"type\": \"quiz\""))
        .stdout(predicate::str::contains("\"oa_ids\": [\n    \"1\"\n  ]"));
}

#[test]
fn test_eval_missing_title_fails_on_step_one() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["eval", "new", "--class", "c1", "--oa", "1", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("El título es obligatorio"));
}

#[test]
fn test_eval_requires_class() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["eval", "new", "--title", "Fracciones", "--oa", "1", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Debe seleccionar una clase"));
}

#[test]
fn test_eval_task_requires_deadline() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args([
            "eval", "new", "--class", "c1", "--title", "Informe", "--oa", "1", "--type", "task",
            "--dry-run",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("La fecha límite es obligatoria"));
}

#[test]
fn test_eval_unknown_objective_fails() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["eval", "new", "--class", "c1", "--title", "X", "--oa", "XYZ-OA99", "--dry-run"])
        .assert()
        .failure();
}

#[test]
fn test_eval_ai_rubric_from_objectives() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args([
            "eval", "new", "--class", "c1", "--title", "Sistema solar", "--oa", "3", "--rubric",
            "ai", "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ai_rubric_generated\": true"));
}

#[test]
fn test_eval_offline_goes_to_outbox() {
    let tmp = setup_workspace();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["eval", "new", "--class", "c1", "--title", "Quiz 1", "--oa", "1", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("EVAL-"));

    aula(&tmp)
        .current_dir(tmp.path())
        .args(["eval", "outbox", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/api/evaluation"));
}

#[test]
fn test_eval_without_token_fails() {
    let tmp = setup_workspace();
    aula(&tmp)
        .current_dir(tmp.path())
        .env("AULA_API_URL", "http://127.0.0.1:9")
        .args(["eval", "new", "--class", "c1", "--title", "Quiz 1", "--oa", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("aula login"));
}

// ============================================================================
// Outbox Flush Tests
// ============================================================================

/// Workspace with one evaluation queued offline
fn workspace_with_queued_eval() -> TempDir {
    let tmp = setup_workspace();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["eval", "new", "--class", "c1", "--title", "Quiz 1", "--oa", "1", "--offline"])
        .assert()
        .success();
    assert_eq!(queued(&tmp), 1);
    tmp
}

fn queued(tmp: &TempDir) -> usize {
    fs::read_dir(tmp.path().join(".aula/outbox"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".aula.yaml"))
        .count()
}

async fn platform(status: u16, expected: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/evaluation"))
        .and(body_partial_json(json!({ "class_id": "c1", "title": "Quiz 1" })))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(json!({ "evaluation": { "evaluation_id": "ev-100" } })),
        )
        .expect(expected)
        .mount(&server)
        .await;
    server
}

fn flush(tmp: &TempDir, server: &MockServer, extra: &[&str]) -> assert_cmd::assert::Assert {
    aula(tmp)
        .current_dir(tmp.path())
        .env("AULA_API_URL", server.uri())
        .env("AULA_TOKEN", "test-token")
        .args(["eval", "flush"])
        .args(extra)
        .assert()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_eval_flush_sends_and_removes() {
    let tmp = workspace_with_queued_eval();
    let server = platform(201, 1).await;

    flush(&tmp, &server, &[])
        .success()
        .stdout(predicate::str::contains("ev-100"));

    assert_eq!(queued(&tmp), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_eval_flush_keep_leaves_entries() {
    let tmp = workspace_with_queued_eval();
    let server = platform(201, 1).await;

    flush(&tmp, &server, &["--keep"]).success();

    assert_eq!(queued(&tmp), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_eval_flush_failure_keeps_entry() {
    let tmp = workspace_with_queued_eval();
    let server = platform(500, 1).await;

    flush(&tmp, &server, &[])
        .failure()
        .stderr(predicate::str::contains("could not be sent"));

    assert_eq!(queued(&tmp), 1);
}

// ============================================================================
// Gamified Wizard Tests
// ============================================================================

#[test]
fn test_game_dry_run_maps_grade() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args([
            "game",
            "new",
            "--class",
            "class-3b",
            "--title",
            "Contando animales",
            "--oa",
            "MAT03-OA01",
            "--grade",
            "3º Básico",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"gamified\""))
        .stdout(predicate::str::contains("\"grade_code\": \"3B\""));
}

#[test]
fn test_game_requires_class() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["game", "new", "--title", "Sin clase", "--oa", "MAT03-OA01", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Debe seleccionar una clase"));
}

#[test]
fn test_game_rejects_question_count_out_of_range() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args([
            "game", "new", "--class", "c1", "--title", "Muchas", "--oa", "MAT03-OA01",
            "--questions", "80", "--dry-run",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("entre 1 y 50"));
}

#[test]
fn test_game_templates_listed() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["game", "templates", "--format", "tsv"])
        .assert()
        .success();
}

// ============================================================================
// Mini-game Tests
// ============================================================================

#[test]
fn test_play_counting_scripted() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["play", "counting", "--answers", ALL_CORRECT])
        .assert()
        .success()
        .stdout(predicate::str::contains("¡Juego terminado!"))
        .stdout(predicate::str::contains("Correctas:   8"));
}

#[test]
fn test_play_counting_wrong_choice_fails() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["play", "counting", "--answers", "99"])
        .assert()
        .failure();
}

#[test]
fn test_play_counting_too_few_answers_fails() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["play", "counting", "--answers", "4,2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("8 questions"));
}

#[test]
fn test_play_counting_json() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["play", "counting", "--answers", ALL_CORRECT, "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"set_id\": \"oa1-v2\""));
}

#[test]
fn test_play_enigma_script() {
    let tmp = TempDir::new().unwrap();
    let script = tmp.path().join("moves.txt");
    fs::write(
        &script,
        "# first enigma\nclue 1\nhypothesis van de 1 en 1\nsolve 5,6,7,8,9,10\n",
    )
    .unwrap();

    aula(&tmp)
        .current_dir(tmp.path())
        .args(["play", "enigma", "--script"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("Enigmas resueltos:    1/"))
        .stdout(predicate::str::contains("[x] El Misterio de los Números Perdidos"));
}

#[test]
fn test_saved_sessions_listed() {
    let tmp = setup_workspace();
    aula(&tmp)
        .current_dir(tmp.path())
        .args([
            "play", "counting", "--answers", ALL_CORRECT, "--save", "--player", "Ana",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("PLAY-"));

    aula(&tmp)
        .current_dir(tmp.path())
        .args(["sessions", "list", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("counting\tAna"));
}

#[test]
fn test_sessions_outside_workspace_fails() {
    let tmp = TempDir::new().unwrap();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["sessions", "list"])
        .assert()
        .failure();
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_config_set_and_show() {
    let tmp = setup_workspace();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["config", "set", "default_class", "class-5b"])
        .assert()
        .success();

    aula(&tmp)
        .current_dir(tmp.path())
        .env_remove("AULA_CLASS")
        .args(["config", "show", "default_class"])
        .assert()
        .success()
        .stdout(predicate::str::diff("class-5b\n"));
}

#[test]
fn test_config_default_class_used_by_game() {
    let tmp = setup_workspace();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["config", "set", "default_class", "class-3b"])
        .assert()
        .success();

    aula(&tmp)
        .current_dir(tmp.path())
        .env_remove("AULA_CLASS")
        .args(["game", "new", "--title", "T", "--oa", "MAT03-OA01", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"class_id\": \"class-3b\""));
}

#[test]
fn test_config_rejects_unknown_key() {
    let tmp = setup_workspace();
    aula(&tmp)
        .current_dir(tmp.path())
        .args(["config", "set", "editor", "vim"])
        .assert()
        .failure();
}

// ============================================================================
// Credentials Tests
// ============================================================================

#[test]
fn test_login_status_logout() {
    let tmp = setup_workspace();

    aula(&tmp)
        .current_dir(tmp.path())
        .args(["login", "--status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));

    aula(&tmp)
        .current_dir(tmp.path())
        .args(["login", "--token", "secret-token"])
        .assert()
        .success();

    aula(&tmp)
        .current_dir(tmp.path())
        .args(["login", "--status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in"));

    aula(&tmp)
        .current_dir(tmp.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));
}
