use std::sync::Arc;

use ghost_core::{Conversation, DispatchError, Endpoints, PicoClient, Role, FAILURE_MESSAGE};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> PicoClient {
    PicoClient::new(Endpoints {
        text: format!("{}/aero/run/llm-api?pk=test", server.uri()),
        image: format!("{}/aero/run/image-generation-api?pk=test", server.uri()),
    })
}

async fn mount_reply(server: &MockServer, route: &str, prompt: &str, reply: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(route))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "prompt": prompt })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn plain_prompt_goes_to_text_endpoint() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        "/aero/run/llm-api",
        "hello",
        json!({ "status": "success", "text": "hi there" }),
    )
    .await;

    let client = client_for(&server);
    assert_eq!(client.query("hello").await.unwrap(), "hi there");
}

#[tokio::test]
async fn image_prompt_goes_to_image_endpoint() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        "/aero/run/image-generation-api",
        "/image a cat",
        json!({ "status": "success", "text": "https://img.example/cat.png" }),
    )
    .await;

    let client = client_for(&server);
    assert_eq!(
        client.query("/image a cat").await.unwrap(),
        "https://img.example/cat.png"
    );
}

#[tokio::test]
async fn error_status_is_rejected() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        "/aero/run/llm-api",
        "hello",
        json!({ "status": "error" }),
    )
    .await;

    let client = client_for(&server);
    match client.query("hello").await {
        Err(DispatchError::Rejected(status)) => assert_eq!(status, "error"),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn success_without_text_is_an_error() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        "/aero/run/llm-api",
        "hello",
        json!({ "status": "success" }),
    )
    .await;

    let client = client_for(&server);
    assert!(matches!(
        client.query("hello").await,
        Err(DispatchError::MissingText)
    ));
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(matches!(
        client.query("hello").await,
        Err(DispatchError::Malformed(_))
    ));
}

#[tokio::test]
async fn body_wins_over_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "status": "success", "text": "ok" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.query("hello").await.unwrap(), "ok");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let client = PicoClient::new(Endpoints {
        text: "http://127.0.0.1:9/llm".to_string(),
        image: "http://127.0.0.1:9/image".to_string(),
    });

    assert!(matches!(
        client.query("hello").await,
        Err(DispatchError::Transport(_))
    ));
}

#[tokio::test]
async fn conversation_over_http() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        "/aero/run/llm-api",
        "hello",
        json!({ "status": "success", "text": "hi there" }),
    )
    .await;
    mount_reply(
        &server,
        "/aero/run/llm-api",
        "and again",
        json!({ "status": "error", "text": "quota" }),
    )
    .await;

    let mut conversation = Conversation::new(Arc::new(client_for(&server)));

    assert!(conversation.submit("hello"));
    conversation.wait().await;
    assert!(conversation.submit("and again"));
    conversation.wait().await;

    let transcript: Vec<(Role, &str)> = conversation
        .messages()
        .iter()
        .map(|m| (m.role(), m.content()))
        .collect();

    assert_eq!(
        transcript,
        vec![
            (Role::User, "hello"),
            (Role::Assistant, "hi there"),
            (Role::User, "and again"),
            (Role::Assistant, FAILURE_MESSAGE),
        ]
    );
}
