//! Integration tests for a full kitchen lifecycle.
//!
//! Each step builds a fresh `Shim`, the way kitchen-terraform launches a new
//! `terraform` process per step; only the state directory carries over.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::{tempdir, TempDir};
use tgshim_core::{
    DispatchOutcome, EnvName, EnvStore, Invocation, Settings, Shim, ShimError, ENVIRONMENT_VAR,
};
use tgshim_runner::{MockResponse, MockRunner, RelayMode};

const LIVE_CONFIG: &str = "project: live-project\nbilling: 0000-1111\n";
const TEST_CONFIG: &str = "project: kitchen-project\n";

struct Workspace {
    _dir: TempDir,
    home: PathBuf,
    state: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let home = dir.path().join("infra-live");
        fs::create_dir_all(home.join("config")).unwrap();
        fs::create_dir_all(home.join("test").join("integration")).unwrap();
        fs::write(home.join("config").join("root.yaml"), LIVE_CONFIG).unwrap();
        fs::write(
            home.join("test").join("integration").join("root.yaml"),
            TEST_CONFIG,
        )
        .unwrap();

        let state = dir.path().join("tmp");
        fs::create_dir_all(&state).unwrap();

        Self {
            _dir: dir,
            home,
            state,
        }
    }

    fn settings(&self) -> Settings {
        Settings::from_lookup(|key| match key {
            "TK_HOME" => Some(self.home.to_string_lossy().into_owned()),
            "TGSHIM_STATE_DIR" => Some(self.state.to_string_lossy().into_owned()),
            _ => None,
        })
        .unwrap()
    }

    fn live_config(&self) -> String {
        fs::read_to_string(self.home.join("config").join("root.yaml")).unwrap()
    }
}

fn bootstrap_runner() -> MockRunner {
    MockRunner::new()
        .add_response("create-token", MockResponse::success("ya29.a0token\n"))
        .add_response("terraform", MockResponse::success("Terraform v1.5.7\n"))
}

async fn run(ws: &Workspace, runner: &MockRunner, argv: &[&str]) -> Result<DispatchOutcome, ShimError> {
    let shim = Shim::new(ws.settings(), Arc::new(runner.clone()));
    shim.run(Invocation::from_argv(argv.iter().copied())?).await
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_apply_output_destroy_lifecycle() {
    let ws = Workspace::new();

    // apply
    let runner = bootstrap_runner();
    let outcome = run(&ws, &runner, &["terraform", "apply", "-lock=true", "-var=env_name=staging"])
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Ran);
    assert_eq!(
        fs::read_to_string(ws.state.join("env")).unwrap(),
        "staging"
    );

    let apply = &runner.get_program_calls("terragrunt")[0];
    assert_eq!(apply.mode, RelayMode::Streaming);
    assert_eq!(apply.env_var(ENVIRONMENT_VAR), Some("staging"));
    assert_eq!(
        apply.args,
        vec![
            "run-all".to_string(),
            "apply".to_string(),
            "--terragrunt-working-dir".to_string(),
            path_arg(&ws.home.join("terraform").join("staging")),
            "--terragrunt-include-external-dependencies".to_string(),
        ]
    );
    assert_eq!(ws.live_config(), LIVE_CONFIG);

    // output: a new process with no env_name argument
    let raw = "{\"network\": {\"value\": \"vpc-a\"}, \"region\": {\"value\": \"eu\"}}\n\
               {\"region\": {\"value\": \"us\"}}\n";
    let runner = bootstrap_runner()
        .add_response("terragrunt", MockResponse::success(raw))
        .add_response(
            "jq",
            MockResponse::success(
                "[{\"network\": {\"value\": \"vpc-a\"}, \"region\": {\"value\": \"eu\"}},\
                 {\"region\": {\"value\": \"us\"}}]\n",
            ),
        );
    let outcome = run(&ws, &runner, &["terraform", "output", "-json"]).await.unwrap();

    let DispatchOutcome::Print(json) = outcome else {
        panic!("output should print the merged document");
    };
    let merged: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        merged,
        serde_json::json!({
            "network": {"value": "vpc-a"},
            "region": {"value": "us"}
        })
    );

    let output = &runner.get_program_calls("terragrunt")[0];
    assert_eq!(output.mode, RelayMode::Capturing);
    assert_eq!(output.env_var(ENVIRONMENT_VAR), Some("staging"));
    assert!(output
        .args
        .windows(2)
        .any(|w| w == ["--terragrunt-parallelism", "1"]));
    assert_eq!(fs::read_to_string(ws.state.join("out.json")).unwrap(), raw);
    assert_eq!(ws.live_config(), LIVE_CONFIG);

    // destroy
    let runner = bootstrap_runner();
    run(&ws, &runner, &["terraform", "destroy", "-var=env_name=staging"])
        .await
        .unwrap();

    let destroy = &runner.get_program_calls("terragrunt")[0];
    assert!(destroy.has_arg("destroy"));
    assert!(destroy.has_arg(&path_arg(&ws.home.join("terraform").join("staging"))));
    assert_eq!(ws.live_config(), LIVE_CONFIG);
}

#[tokio::test]
async fn test_grouped_env_name() {
    let ws = Workspace::new();
    let runner = bootstrap_runner();

    run(&ws, &runner, &["terraform", "apply", "-var=env_name=prod/us-east"])
        .await
        .unwrap();

    assert_eq!(
        EnvStore::new(&ws.state).read().unwrap(),
        EnvName::new("prod/us-east")
    );
    let apply = &runner.get_program_calls("terragrunt")[0];
    assert_eq!(apply.env_var(ENVIRONMENT_VAR), Some("prod"));
    assert!(apply.has_arg(&path_arg(&ws.home.join("terraform").join("prod/us-east"))));
}

#[tokio::test]
async fn test_output_before_apply_fails_without_terragrunt() {
    let ws = Workspace::new();
    let runner = bootstrap_runner();

    let err = run(&ws, &runner, &["terraform", "output", "-json"])
        .await
        .unwrap_err();

    assert!(matches!(err, ShimError::EnvNotRecorded(_)));
    assert!(!runner.was_called("terragrunt"));
    assert!(!runner.was_called("jq"));
    assert_eq!(ws.live_config(), LIVE_CONFIG);
}

#[tokio::test]
async fn test_live_config_is_byte_identical_after_failures() {
    let ws = Workspace::new();

    let runner = bootstrap_runner()
        .add_response("terragrunt", MockResponse::failure(1, "Error: 403 forbidden"));
    let err = run(&ws, &runner, &["terraform", "destroy", "-var=env_name=staging"])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("403 forbidden"));
    assert_eq!(ws.live_config(), LIVE_CONFIG);

    let runner = bootstrap_runner();
    let err = run(&ws, &runner, &["terraform", "apply"]).await.unwrap_err();
    assert!(matches!(err, ShimError::MissingEnvName));
    assert_eq!(ws.live_config(), LIVE_CONFIG);
}

#[tokio::test]
async fn test_passthrough_forwards_verbatim() {
    let ws = Workspace::new();
    let runner = bootstrap_runner();

    run(&ws, &runner, &["terraform", "show", "-json", "plan.tfplan"])
        .await
        .unwrap();

    let calls = runner.get_program_calls("terraform");
    // -v at bootstrap, then the forwarded command
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].args, vec!["-v"]);
    assert_eq!(calls[1].args, vec!["show", "-json", "plan.tfplan"]);
    assert_eq!(calls[1].mode, RelayMode::Streaming);
}
