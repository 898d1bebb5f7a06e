//! Integration tests for the Ollama generative provider
//!
//! A wiremock server stands in for Ollama's `/api/chat` endpoint.

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use concierge_engine::llm::OllamaGenerator;
use sdk::collaborators::GenerativeProvider;
use sdk::errors::ProviderError;
use sdk::types::{ConversationTurn, PersonalizationContext};

fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "llama3.1:8b",
        "message": { "role": "assistant", "content": content },
        "done": true
    }))
}

fn generator(server: &MockServer) -> OllamaGenerator {
    OllamaGenerator::new(server.uri(), "llama3.1:8b", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_generate_sends_context_and_trims_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.1:8b",
            "stream": false
        })))
        .respond_with(chat_reply("  Sure, here you go.\n"))
        .expect(1)
        .mount(&server)
        .await;

    let context = PersonalizationContext {
        language: "en".to_string(),
        communication_style: "formal".to_string(),
        history: vec![ConversationTurn::user("1", "tell me a joke")],
        ..Default::default()
    };

    let reply = generator(&server)
        .generate("tell me a joke", &context)
        .await
        .unwrap();
    assert_eq!(reply, "Sure, here you go.");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    // system prompt plus the prompt, the matching history turn is not repeated
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert!(messages[0]["content"].as_str().unwrap().contains("formal"));
    assert_eq!(messages[1], json!({"role": "user", "content": "tell me a joke"}));
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let err = generator(&server)
        .generate("hi", &PersonalizationContext::default())
        .await
        .unwrap_err();

    match err {
        ProviderError::Unavailable(msg) => assert!(msg.contains("model not loaded")),
        other => panic!("Expected Unavailable, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = generator(&server)
        .generate("hi", &PersonalizationContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(chat_reply("late").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let generator =
        OllamaGenerator::new(server.uri(), "llama3.1:8b", Duration::from_millis(200)).unwrap();
    let err = generator
        .generate("hi", &PersonalizationContext::default())
        .await
        .unwrap_err();
    assert_eq!(err, ProviderError::Timeout);
}

#[tokio::test]
async fn test_translate_summarize_and_classify() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(chat_reply("Information_Retrieval"))
        .mount(&server)
        .await;

    let generator = generator(&server);

    assert_eq!(
        generator.classify_intent("what is new").await.unwrap(),
        "information_retrieval"
    );
    assert_eq!(generator.summarize("long text", 6).await.unwrap(), "Inform");
    assert_eq!(
        generator.translate("hello", "fr").await.unwrap(),
        "Information_Retrieval"
    );

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[2].body).unwrap();
    assert!(body["messages"][0]["content"]
        .as_str()
        .unwrap()
        .contains("'fr'"));
}
