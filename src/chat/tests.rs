//! Tests for the chat completion client.

use super::*;
use mockito::Matcher;
use serde_json::json;

fn client_for(server: &mockito::Server, api_key: Option<&str>) -> ChatClient {
    let config = ApiConfig {
        base_url: format!("{}/api/v1", server.url()),
        api_key: api_key.map(str::to_string),
        ..ApiConfig::default()
    };
    ChatClient::new(&config).unwrap()
}

#[tokio::test]
async fn sends_prompt_and_returns_answer_record() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .match_header("authorization", "Bearer sk-or-test")
        .match_header("x-title", "freechat")
        .match_body(Matcher::Json(json!({
            "model": "venice/uncensored:free",
            "messages": [{"role": "user", "content": "Hello there"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({
            "choices": [{"message": {"role": "assistant", "content": "General Kenobi"}}]
        }).to_string())
        .create_async()
        .await;

    let record = client_for(&server, Some("sk-or-test"))
        .complete("venice/uncensored:free", "Venice: Uncensored", "  Hello there \n")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(record.answer, "General Kenobi");
    assert_eq!(record.model_id, "venice/uncensored:free");
    assert_eq!(record.model_name, "Venice: Uncensored");
    assert_eq!(record.prompt.as_deref(), Some("Hello there"));
}

#[tokio::test]
async fn missing_api_key_fails_before_request() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let result = client_for(&server, None).complete("m", "M", "hi").await;

    mock.assert_async().await;
    assert_eq!(result.unwrap_err(), FreeChatError::ApiKeyMissing);
}

#[tokio::test]
async fn blank_prompt_fails_before_request() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let result = client_for(&server, Some("sk-or-test")).complete("m", "M", "  \n\t ").await;

    mock.assert_async().await;
    assert_eq!(result.unwrap_err(), FreeChatError::EmptyPrompt);
}

#[tokio::test]
async fn api_key_flag_overrides_config() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .match_header("authorization", "Bearer from-flag")
        .with_status(200)
        .with_body(json!({"choices": [{"message": {"content": "ok"}}]}).to_string())
        .create_async()
        .await;

    let client = client_for(&server, Some("from-config")).with_api_key(Some("from-flag".to_string()));
    client.complete("m", "M", "hi").await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn non_success_status_carries_provider_message() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(429)
        .with_body(json!({"error": {"message": "Rate limit exceeded", "code": 429}}).to_string())
        .create_async()
        .await;

    let err = client_for(&server, Some("sk-or-test"))
        .complete("m", "M", "hi")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        FreeChatError::UpstreamStatus {
            status: 429,
            message: "Rate limit exceeded".to_string(),
        }
    );
}

#[tokio::test]
async fn non_json_error_body_has_empty_message() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(502)
        .with_body("Bad Gateway")
        .create_async()
        .await;

    let err = client_for(&server, Some("sk-or-test"))
        .complete("m", "M", "hi")
        .await
        .unwrap_err();

    assert!(matches!(err, FreeChatError::UpstreamStatus { status: 502, ref message } if message.is_empty()));
}

#[tokio::test]
async fn response_without_choices_is_a_parse_error() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(200)
        .with_body(json!({"choices": []}).to_string())
        .create_async()
        .await;

    let err = client_for(&server, Some("sk-or-test"))
        .complete("m", "M", "hi")
        .await
        .unwrap_err();

    assert!(matches!(err, FreeChatError::ParseError(_)));
}

#[tokio::test]
async fn malformed_json_is_a_parse_error() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(200)
        .with_body("{\"choices\": [")
        .create_async()
        .await;

    let err = client_for(&server, Some("sk-or-test"))
        .complete("m", "M", "hi")
        .await
        .unwrap_err();

    assert!(matches!(err, FreeChatError::ParseError(_)));
}

#[test]
fn extract_answer_reads_first_choice() {
    let body = json!({
        "choices": [
            {"message": {"content": "first"}},
            {"message": {"content": "second"}}
        ]
    })
    .to_string();

    assert_eq!(extract_answer(&body).unwrap(), "first");
}

#[test]
fn extract_answer_rejects_null_content() {
    let body = json!({"choices": [{"message": {"content": null}}]}).to_string();

    assert!(extract_answer(&body).is_err());
}

#[test]
fn prompt_text_skips_blank_prompts() {
    let mut record = AnswerRecord {
        model_id: "m".to_string(),
        model_name: "M".to_string(),
        prompt: Some("   ".to_string()),
        answer: "a".to_string(),
        created_at: Local::now(),
    };
    assert_eq!(record.prompt_text(), None);

    record.prompt = Some("Why?".to_string());
    assert_eq!(record.prompt_text(), Some("Why?"));
}
