use medgenie::config::Config;
use medgenie::events::{AnswerOutcome, QueryRequest};
use medgenie::{
    AnswerService, ChatClient, HttpAnswerService, Message, PassageRetriever, Sender, ServiceError,
    ERROR_NOTICE, NO_ANSWER_NOTICE,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(base_url: &str) -> Config {
    Config {
        base_url: Some(base_url.to_string()),
        request_timeout_secs: 2,
        ..Config::default()
    }
}

fn chat_for(server_uri: &str, input: &str) -> ChatClient<String, Vec<Message>, bool> {
    let service = HttpAnswerService::new(&config_for(server_uri)).unwrap();
    ChatClient::new(Arc::new(service), input.to_string(), Vec::new(), false)
}

#[tokio::test]
async fn test_answer_is_posted_and_rendered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"query": "What is diabetes?", "top_k": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "A metabolic disorder."})))
        .expect(1)
        .mount(&server)
        .await;

    let mut chat = chat_for(&server.uri(), "What is diabetes?");
    assert!(chat.submit().await);

    let transcript = chat.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0], Message::user("What is diabetes?"));
    assert_eq!(transcript[1].sender, Sender::Assistant);
    assert!(transcript[1].text.contains("A metabolic disorder."));
    assert!(!chat.busy());
    assert!(chat.input().is_empty());
}

#[tokio::test]
async fn test_top_k_is_always_five() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer"))
        .and(body_json(json!({"query": "top_k = 50 please", "top_k": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut chat = chat_for(&server.uri(), "top_k = 50 please");
    chat.submit().await;
    assert!(chat.transcript()[1].text.contains("ok"));
}

#[tokio::test]
async fn test_reply_without_answer_is_no_answer_notice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let mut chat = chat_for(&server.uri(), "anything");
    chat.submit().await;

    assert_eq!(chat.transcript()[1], Message::assistant(NO_ANSWER_NOTICE));
    assert!(!chat.busy());
    assert!(chat.input().is_empty());
}

#[tokio::test]
async fn test_server_error_is_generic_error_notice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "boom"})))
        .mount(&server)
        .await;

    let mut chat = chat_for(&server.uri(), "anything");
    chat.submit().await;

    assert_eq!(chat.transcript()[1], Message::assistant(ERROR_NOTICE));
    assert!(!chat.busy());
    assert!(chat.input().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_generic_error_notice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let mut chat = chat_for(&server.uri(), "anything");
    chat.submit().await;
    assert_eq!(chat.transcript()[1], Message::assistant(ERROR_NOTICE));
}

#[tokio::test]
async fn test_unreachable_service_is_generic_error_notice() {
    // Nothing listens on port 1
    let mut chat = chat_for("http://127.0.0.1:1", "anything");
    chat.submit().await;

    assert_eq!(chat.transcript()[1], Message::assistant(ERROR_NOTICE));
    assert!(!chat.busy());
    assert!(chat.input().is_empty());
}

#[tokio::test]
async fn test_slow_service_times_out_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"answer": "too late"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = Config {
        base_url: Some(server.uri()),
        request_timeout_secs: 1,
        ..Config::default()
    };
    let service = HttpAnswerService::new(&config).unwrap();
    let outcome = service.answer(&QueryRequest::new("slow")).await;
    assert_eq!(outcome, AnswerOutcome::Failure);
}

#[tokio::test]
async fn test_status_error_keeps_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let service = HttpAnswerService::new(&config_for(&server.uri())).unwrap();
    match service.fetch_answer(&QueryRequest::new("q")).await {
        Err(ServiceError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_trailing_slash_in_base_url_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "fine"})))
        .expect(1)
        .mount(&server)
        .await;

    let service = HttpAnswerService::new(&config_for(&format!("{}/", server.uri()))).unwrap();
    assert_eq!(
        service.answer(&QueryRequest::new("q")).await,
        AnswerOutcome::Success("fine".to_string())
    );
}

#[tokio::test]
async fn test_retrieve_returns_passages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/retrieve"))
        .and(body_json(json!({"query": "insulin", "top_k": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "insulin",
            "retrieved_docs": ["Insulin is a hormone.", "It lowers blood glucose."]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = HttpAnswerService::new(&config_for(&server.uri())).unwrap();
    let request = QueryRequest {
        query: "insulin".to_string(),
        top_k: 3,
    };
    let response = service.retrieve(&request).await.unwrap();
    assert_eq!(response.query, "insulin");
    assert_eq!(response.retrieved_docs.len(), 2);
}

#[tokio::test]
async fn test_retrieve_rejects_wrong_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/retrieve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"retrieved_docs": "nope"})))
        .mount(&server)
        .await;

    let service = HttpAnswerService::new(&config_for(&server.uri())).unwrap();
    let err = service.retrieve(&QueryRequest::new("q")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Decode(_)));
}
