#![cfg(unix)]

use refunc_config::shared::{RefuncConfig, S3Config};
use refunc_lambda::executor::ExecutorError;
use refunc_lambda::funcdef::{FuncdefSpec, FunctionDefinition};
use refunc_lambda::startup::{Application, InvokeError, InvokeOptions};
use refunc_telemetry::tracing::init_test_tracing;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use crate::support::fake_api::{Call, FakeFuncdefApi};
use crate::support::scripts::{InvokeScript, echo_script, env_script, failing_script};

mod support;

fn spawn_app(script: &InvokeScript) -> (Arc<FakeFuncdefApi>, Application) {
    let mut config = RefuncConfig::default();
    config.lambda.invoke_binary = script.program();

    let api = Arc::new(FakeFuncdefApi::new());
    api.seed(FunctionDefinition::new("team-a", "resize", FuncdefSpec::default()));

    (api.clone(), Application::build_with_api(config, api))
}

#[tokio::test(flavor = "multi_thread")]
async fn a_stored_function_can_be_invoked() {
    init_test_tracing();
    // Arrange
    let script = echo_script();
    let (api, app) = spawn_app(&script);
    let event = json!({"key": "cat.png"});

    // Act
    let result = app
        .invoke("team-a", "resize", &event, InvokeOptions::default())
        .await
        .unwrap();

    // Assert
    assert_eq!(serde_json::from_str::<Value>(&result.result).unwrap(), event);
    assert_eq!(result.log_output.trim_end(), "args: -n team-a -t 540s resize");
    assert_eq!(
        api.calls(),
        vec![Call::Get {
            namespace: "team-a".to_owned(),
            name: "resize".to_owned()
        }]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn invocation_options_are_honoured() {
    init_test_tracing();
    let script = env_script();
    let (_, app) = spawn_app(&script);
    let options = InvokeOptions {
        envvars: HashMap::from([("GREETING".to_owned(), "hi".to_owned())]),
        // Unknown executors fall back to the default one.
        executor: Some("docker".to_owned()),
        ..InvokeOptions::default()
    };

    let result = app
        .invoke("team-a", "resize", &Value::Null, options)
        .await
        .unwrap();

    assert_eq!(result.result, "hi");
}

#[tokio::test(flavor = "multi_thread")]
async fn a_missing_function_is_not_invoked() {
    init_test_tracing();
    let script = echo_script();
    let (_, app) = spawn_app(&script);

    let err = app
        .invoke("team-a", "thumbnail", &Value::Null, InvokeOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, InvokeError::K8s(err) if err.is_not_found()));
}

#[tokio::test(flavor = "multi_thread")]
async fn a_failing_function_surfaces_the_execution_error() {
    init_test_tracing();
    let script = failing_script();
    let (_, app) = spawn_app(&script);

    let err = app
        .invoke("team-a", "resize", &Value::Null, InvokeOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InvokeError::Executor(ExecutorError::Execution {
            exit_code: Some(2),
            ..
        })
    ));
}

#[test]
fn services_resolve_through_the_configured_endpoint() {
    init_test_tracing();
    let mut config = RefuncConfig::default();
    config.s3 = Some(S3Config {
        endpoint: "http://minio:9000".to_owned(),
        region: Some("eu-central-1".to_owned()),
        access_key_id: "AKIA".to_owned(),
        secret_access_key: "secret".to_owned().into(),
    });

    let app = Application::build_with_api(config, Arc::new(FakeFuncdefApi::new()));

    assert_eq!(app.service_url("s3api").as_deref(), Some("http://minio:9000"));
    assert_eq!(
        app.service_url("lambda").as_deref(),
        Some("http://localhost:4574")
    );
    assert_eq!(app.aws_environment().region, "eu-central-1");
    assert_eq!(
        app.function_arn("resize"),
        "arn:aws:lambda:eu-central-1:000000000000:function:resize"
    );
}
