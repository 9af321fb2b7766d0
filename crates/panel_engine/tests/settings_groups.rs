use std::collections::BTreeSet;

use panel_core::{CategoryRef, GlobalSettings, PanelError, QualityLists, SettingsWrite};
use panel_engine::{load_settings, save_settings, ClientSettings, ReqwestApi};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> ReqwestApi {
    ReqwestApi::new(ClientSettings::new(&server.uri()).unwrap()).unwrap()
}

async fn mount_get(server: &MockServer, route: &str, status: u16, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_reads(server: &MockServer, quality_status: u16) {
    mount_get(
        server,
        "/api/settings/global",
        200,
        json!({
            "OLLAMA_MODEL_NAME": "qwen3:8b",
            "DEFAULT_ARXIV_DOMAINS": ["cs.AI", "cs.CV"],
            "PDF_PARSING_STRATEGY": "fast",
        }),
    )
    .await;
    mount_get(
        server,
        "/api/user/preferences",
        200,
        json!({"selected_categories": [{"domain": "NLP", "task": "QA"}]}),
    )
    .await;
    mount_get(
        server,
        "/api/categories",
        200,
        json!({"NLP": {"tasks": {"QA": {}, "Summarization": {}}}, "CV": {"tasks": {"Detection": {}}}}),
    )
    .await;
    mount_get(server, "/api/settings/available-models", 200, json!(["qwen3:8b", "llama3"])).await;
    let quality = if quality_status == 200 {
        json!({"teams": ["DeepMind"], "authors": [{"name": "Hinton"}]})
    } else {
        json!({"detail": "quality store unavailable"})
    };
    mount_get(server, "/api/quality-lists", quality_status, quality).await;
}

#[tokio::test]
async fn load_combines_all_five_reads() {
    let server = MockServer::start().await;
    mount_reads(&server, 200).await;

    let snapshot = load_settings(&api_for(&server)).await.unwrap();

    assert_eq!(snapshot.global.model_name(), Some("qwen3:8b"));
    assert_eq!(snapshot.global.arxiv_domains(), vec!["cs.AI", "cs.CV"]);
    assert_eq!(
        snapshot.preferences,
        BTreeSet::from([CategoryRef::new("NLP", "QA")])
    );
    assert_eq!(snapshot.taxonomy.task_count(), 3);
    assert_eq!(snapshot.available_models, vec!["qwen3:8b", "llama3"]);
    assert_eq!(snapshot.quality.teams, vec!["DeepMind"]);
    assert_eq!(snapshot.quality.authors, vec![json!({"name": "Hinton"})]);
}

#[tokio::test]
async fn one_failed_read_fails_the_whole_load() {
    let server = MockServer::start().await;
    mount_reads(&server, 500).await;

    let err = load_settings(&api_for(&server)).await.unwrap_err();

    match &err {
        PanelError::Group { resource, .. } => assert_eq!(*resource, "quality lists"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "quality lists: quality store unavailable");
}

fn sample_write() -> SettingsWrite {
    let mut global = GlobalSettings::default();
    global.set("OLLAMA_MODEL_NAME", json!("llama3"));
    global.set("DEFAULT_ARXIV_DOMAINS", json!(["cs.AI"]));
    SettingsWrite {
        global,
        preferences: vec![CategoryRef::new("NLP", "QA")],
        quality: QualityLists {
            teams: vec!["FAIR".to_string()],
            authors: vec![json!({"name": "LeCun"})],
        },
    }
}

async fn mount_post(server: &MockServer, route: &str, body: Value, status: u16) {
    let mock = Mock::given(method("POST"))
        .and(path(route))
        .and(body_json(body))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(json!({"message": "ok", "detail": "write failed"})),
        );
    // Sibling writes may be abandoned once one fails.
    let mock = if status == 200 { mock } else { mock.expect(1) };
    mock.mount(server).await;
}

#[tokio::test]
async fn save_issues_three_writes() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/api/settings/global",
        json!({"OLLAMA_MODEL_NAME": "llama3", "DEFAULT_ARXIV_DOMAINS": ["cs.AI"]}),
        200,
    )
    .await;
    mount_post(
        &server,
        "/api/user/preferences",
        json!({"selected_categories": [{"domain": "NLP", "task": "QA"}]}),
        200,
    )
    .await;
    mount_post(
        &server,
        "/api/quality-lists",
        json!({"teams": ["FAIR"], "authors": [{"name": "LeCun"}]}),
        200,
    )
    .await;

    save_settings(&api_for(&server), &sample_write()).await.unwrap();
}

#[tokio::test]
async fn one_failed_write_fails_the_save() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/api/settings/global",
        json!({"OLLAMA_MODEL_NAME": "llama3", "DEFAULT_ARXIV_DOMAINS": ["cs.AI"]}),
        200,
    )
    .await;
    mount_post(
        &server,
        "/api/user/preferences",
        json!({"selected_categories": [{"domain": "NLP", "task": "QA"}]}),
        500,
    )
    .await;
    mount_post(
        &server,
        "/api/quality-lists",
        json!({"teams": ["FAIR"], "authors": [{"name": "LeCun"}]}),
        200,
    )
    .await;

    let err = save_settings(&api_for(&server), &sample_write())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PanelError::Group {
            resource: "user preferences",
            ..
        }
    ));
}
