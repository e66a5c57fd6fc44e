use deskpilot_actions::builtin_catalog;
use deskpilot_registry::ActionRegistry;
use deskpilot_retrieval::RetrievalService;
use deskpilot_server::{app, AppState};
use deskpilot_vector_index::{StubEncoder, MODEL_DIMENSION};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

async fn spawn_app(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.unwrap();
    });
    format!("http://{addr}")
}

fn builtin_state() -> AppState {
    let registry = ActionRegistry::from_descriptors(builtin_catalog()).unwrap();
    let service =
        RetrievalService::new(registry, Arc::new(StubEncoder::new(MODEL_DIMENSION))).unwrap();
    AppState::new(service)
}

async fn execute(client: &reqwest::Client, base: &str, prompt: &str) -> (u16, Value) {
    let response = client
        .post(format!("{base}/execute"))
        .json(&json!({ "prompt": prompt }))
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.unwrap();
    (status, body)
}

#[tokio::test]
async fn execute_resolves_prompt_and_renders_script() {
    let base = spawn_app(builtin_state()).await;
    let client = reqwest::Client::new();

    let (status, body) = execute(&client, &base, "Launch the Google Chrome web browser").await;

    assert_eq!(status, 200);
    assert_eq!(body["function"], "open_chrome");
    let code = body["code"].as_str().unwrap();
    assert!(code.starts_with("#!/bin/sh\n"), "{code}");
    assert!(code.contains("deskpilot run open_chrome"), "{code}");
}

#[tokio::test]
async fn second_prompt_can_hit_actions_by_name() {
    let base = spawn_app(builtin_state()).await;
    let client = reqwest::Client::new();

    let (status, _) = execute(&client, &base, "Launch the Google Chrome web browser").await;
    assert_eq!(status, 200);

    let (status, body) = execute(&client, &base, "Please open calculator now").await;
    assert_eq!(status, 200);
    assert_eq!(body["function"], "open_calculator");
}

#[tokio::test]
async fn follow_up_prompt_resolves_against_the_previous_one() {
    let base = spawn_app(builtin_state()).await;
    let client = reqwest::Client::new();

    let (status, body) = execute(&client, &base, "Launch the Google Chrome web browser").await;
    assert_eq!(status, 200);
    assert_eq!(body["function"], "open_chrome");

    let (status, body) =
        execute(&client, &base, "Show the current CPU utilization percentage").await;
    assert_eq!(status, 200);
    assert_eq!(body["function"], "get_cpu_usage");

    // On its own the prompt names no action; the previous one supplies the
    // topic.
    let (status, body) = execute(&client, &base, "Show it again").await;
    assert_eq!(status, 200);
    assert_eq!(body["function"], "get_cpu_usage");
}

#[tokio::test]
async fn registered_action_joins_the_conversation() {
    let base = spawn_app(builtin_state()).await;
    let client = reqwest::Client::new();

    let (status, _) = execute(&client, &base, "Launch the Google Chrome web browser").await;
    assert_eq!(status, 200);

    let response = client
        .post(format!("{base}/register_function"))
        .json(&json!({
            "name": "say_hello",
            "description": "Greets the person you name",
            "params": ["name"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body = response.json::<Value>().await.unwrap();
    assert_eq!(body["message"], "Function 'say_hello' registered successfully");

    let (status, body) = execute(&client, &base, "Say hello to the world").await;
    assert_eq!(status, 200);
    assert_eq!(body["function"], "say_hello");
    assert!(
        body["code"]
            .as_str()
            .unwrap()
            .contains("deskpilot run say_hello -- world"),
        "{}",
        body["code"]
    );

    // "Say it again" names nothing directly; the previous prompt carries
    // both the action and the greeting target.
    let (status, body) = execute(&client, &base, "Say it again").await;
    assert_eq!(status, 200);
    assert_eq!(body["function"], "say_hello");
    assert!(
        body["code"]
            .as_str()
            .unwrap()
            .contains("deskpilot run say_hello -- world"),
        "{}",
        body["code"]
    );
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let base = spawn_app(builtin_state()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/register_function"))
        .json(&json!({
            "name": "open_chrome",
            "description": "Opens a browser",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body = response.json::<Value>().await.unwrap();
    assert_eq!(body["code"], "duplicate_action");
    assert!(
        body["message"].as_str().unwrap().contains("open_chrome"),
        "{}",
        body["message"]
    );
}

#[tokio::test]
async fn empty_action_name_is_rejected() {
    let base = spawn_app(builtin_state()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/register_function"))
        .json(&json!({ "name": "", "description": "Nameless" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body = response.json::<Value>().await.unwrap();
    assert_eq!(body["code"], "invalid_action");
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let base = spawn_app(builtin_state()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/execute"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body = response.json::<Value>().await.unwrap();
    assert_eq!(body["code"], "invalid_request");
}

#[tokio::test]
async fn unmatched_prompt_reports_no_match() {
    let service = RetrievalService::new(
        ActionRegistry::new(),
        Arc::new(StubEncoder::new(MODEL_DIMENSION)),
    )
    .unwrap();
    let base = spawn_app(AppState::new(service)).await;
    let client = reqwest::Client::new();

    let (status, body) = execute(&client, &base, "Do something for me").await;
    assert_eq!(status, 422);
    assert_eq!(body["code"], "no_match");
}

#[tokio::test]
async fn monitor_lists_resolved_executions_in_order() {
    let base = spawn_app(builtin_state()).await;
    let client = reqwest::Client::new();

    execute(&client, &base, "Launch the Google Chrome web browser").await;
    execute(&client, &base, "Please open calculator now").await;

    let response = client
        .get(format!("{base}/monitor"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body = response.json::<Value>().await.unwrap();
    let executions = body["executions"].as_array().unwrap();
    assert_eq!(executions.len(), 2);
    assert_eq!(executions[0]["function"], "open_chrome");
    assert_eq!(executions[0]["prompt"], "Launch the Google Chrome web browser");
    assert_eq!(executions[1]["function"], "open_calculator");
    assert!(executions[1]["timestamp"].is_string());
}

#[tokio::test]
async fn unresolved_prompts_stay_out_of_the_monitor() {
    let service = RetrievalService::new(
        ActionRegistry::new(),
        Arc::new(StubEncoder::new(MODEL_DIMENSION)),
    )
    .unwrap();
    let base = spawn_app(AppState::new(service)).await;
    let client = reqwest::Client::new();

    execute(&client, &base, "Do something for me").await;

    let response = client
        .get(format!("{base}/monitor"))
        .send()
        .await
        .unwrap();
    let body = response.json::<Value>().await.unwrap();
    assert_eq!(body["executions"].as_array().unwrap().len(), 0);
}
